use crate::{
    consts,
    registry::{RegistryError, RegistryGenerator},
    scanner::ContractSource,
    settings::SettingsError,
    types::{ContractId, ParseContractIdError},
};
use std::str::FromStr;
use thiserror::Error;

/// Syntactic form of the configured `starting_point`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartingPoint {
    /// A `links.next` token of the list endpoint, used verbatim.
    NextPointer(String),
    ContractId(ContractId),
    EvmAddress(String),
    Unset,
}

impl FromStr for StartingPoint {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            Ok(Self::Unset)
        } else if consts::NEXT_POINTER_REGEX.is_match(s) {
            Ok(Self::NextPointer(s.to_string()))
        } else if consts::CONTRACT_ID_REGEX.is_match(s) {
            ContractId::from_str(s)
                .map(Self::ContractId)
                .map_err(|_| SettingsError::InvalidStartingPoint(s.to_string()))
        } else if consts::EVM_ADDRESS_REGEX.is_match(s) {
            Ok(Self::EvmAddress(s.to_string()))
        } else {
            Err(SettingsError::InvalidStartingPoint(s.to_string()))
        }
    }
}

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("resource not found: starting_point={0}")]
    NotFound(String),
    #[error("resolved contract has an invalid id: {0}")]
    ContractId(#[from] ParseContractIdError),
    #[error("reading the persisted cursor failed: {0}")]
    Registry(#[from] RegistryError),
}

/// Next-page token that starts the scan right after `contract_id`.
pub fn next_pointer_after(contract_id: &ContractId) -> String {
    format!(
        "{}?limit={}&order=asc&contract.id=gt:{contract_id}",
        consts::GET_CONTRACTS_ENDPOINT,
        consts::MAX_SCAN_CONTRACT_LIMIT,
    )
}

/// Determines the cursor the run starts from. `None` means genesis.
///
/// Priority: configured next pointer, configured contract id, configured evm
/// address (resolved through the mirror node), persisted cursor, genesis.
pub async fn resolve_starting_point<S>(
    starting_point: &StartingPoint,
    source: &S,
    registry: &RegistryGenerator,
) -> Result<Option<String>, ResolveError>
where
    S: ContractSource + ?Sized,
{
    match starting_point {
        StartingPoint::NextPointer(next) => {
            log::info!("start indexing the network from next_pointer={next}");
            Ok(Some(next.clone()))
        }
        StartingPoint::ContractId(contract_id) => {
            log::info!("start indexing the network from contract_id={contract_id}");
            Ok(Some(next_pointer_after(contract_id)))
        }
        StartingPoint::EvmAddress(address) => {
            let contract_id = source
                .fetch_detail(address)
                .await
                .and_then(|detail| detail.contract_id)
                .ok_or_else(|| ResolveError::NotFound(address.clone()))?;
            let contract_id = ContractId::from_str(&contract_id)?;
            log::info!(
                "start indexing the network from contract_address={address} ({contract_id})"
            );
            Ok(Some(next_pointer_after(&contract_id)))
        }
        StartingPoint::Unset => match registry.retrieve_cursor().await? {
            Some(next) => {
                log::info!("start indexing the network from stored next_pointer={next}");
                Ok(Some(next))
            }
            None => {
                log::info!("start indexing the network from genesis");
                Ok(None)
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{scanner::fake::FakeSource, types::RawContractDetail};
    use pretty_assertions::assert_eq;

    const ADDRESS: &str = "0x00000000000000000000000000000000000003f5";

    fn registry() -> (tempfile::TempDir, RegistryGenerator) {
        let dir = tempfile::tempdir().unwrap();
        let registry = RegistryGenerator::new(dir.path());
        (dir, registry)
    }

    fn source() -> FakeSource {
        FakeSource::default().with_detail(RawContractDetail {
            contract_id: Some("0.0.1013".into()),
            evm_address: Some(ADDRESS.into()),
            ..Default::default()
        })
    }

    async fn resolve(starting_point: &str, registry: &RegistryGenerator) -> Result<Option<String>, ResolveError> {
        let starting_point = StartingPoint::from_str(starting_point).unwrap();
        resolve_starting_point(&starting_point, &source(), registry).await
    }

    #[test]
    fn parse_starting_point() {
        assert_eq!(StartingPoint::from_str("").unwrap(), StartingPoint::Unset);
        assert_eq!(
            StartingPoint::from_str("0.0.1013").unwrap(),
            StartingPoint::ContractId(ContractId::new(0, 0, 1013))
        );
        assert_eq!(
            StartingPoint::from_str(ADDRESS).unwrap(),
            StartingPoint::EvmAddress(ADDRESS.into())
        );
        assert!(matches!(
            StartingPoint::from_str("/api/v1/contracts?limit=100&order=asc&contract.id=gte:0.0.1").unwrap(),
            StartingPoint::NextPointer(_)
        ));
        for invalid in ["0.0", "0x1234", "/api/v1/contracts?limit=100", "latest"] {
            assert_eq!(
                StartingPoint::from_str(invalid),
                Err(SettingsError::InvalidStartingPoint(invalid.into()))
            );
        }
    }

    #[tokio::test]
    async fn configured_starting_point_wins_over_stored_cursor() {
        let (_dir, registry) = registry();
        registry
            .update_cursor(Some("/api/v1/contracts?limit=100&order=asc&contract.id=gt:0.0.7"))
            .await
            .unwrap();

        let next = "/api/v1/contracts?limit=100&order=asc&contract.id=gt:0.0.5294198";
        assert_eq!(resolve(next, &registry).await.unwrap().as_deref(), Some(next));
        assert_eq!(
            resolve("0.0.1013", &registry).await.unwrap().as_deref(),
            Some("/api/v1/contracts?limit=100&order=asc&contract.id=gt:0.0.1013")
        );
        assert_eq!(
            resolve(ADDRESS, &registry).await.unwrap().as_deref(),
            Some("/api/v1/contracts?limit=100&order=asc&contract.id=gt:0.0.1013")
        );
    }

    #[tokio::test]
    async fn unknown_evm_address() {
        let (_dir, registry) = registry();
        let address = "0x00000000000000000000000000000000000003f6";
        let err = resolve(address, &registry).await.unwrap_err();
        assert!(
            matches!(&err, ResolveError::NotFound(value) if value == address),
            "unexpected error: {err:?}"
        );
    }

    #[tokio::test]
    async fn unset_starting_point_uses_stored_cursor() {
        let (_dir, registry) = registry();
        assert_eq!(resolve("", &registry).await.unwrap(), None);

        let next = "/api/v1/contracts?limit=100&order=asc&contract.id=gt:0.0.7";
        registry.update_cursor(Some(next)).await.unwrap();
        assert_eq!(resolve("", &registry).await.unwrap().as_deref(), Some(next));
    }
}
