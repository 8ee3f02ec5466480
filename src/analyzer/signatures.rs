use crate::types::Standard;
use anyhow::Context;
use regex::RegexSet;
use std::collections::BTreeSet;

/// Capability that tells which token standards a bytecode implements.
pub trait Classify: Send + Sync {
    fn classify(&self, bytecode: &str) -> anyhow::Result<BTreeSet<Standard>>;
}

/// Tags a bytecode with a standard when every selector and event topic of
/// that standard's interface occurs in the code.
#[derive(Debug, Clone)]
pub struct SignatureClassifier {
    patterns: Vec<(Standard, RegexSet)>,
}

impl SignatureClassifier {
    pub fn new() -> Result<Self, regex::Error> {
        let patterns = Standard::ALL
            .into_iter()
            .map(|standard| {
                let signatures = standard
                    .signatures()
                    .iter()
                    .map(|signature| format!("(?i){}", regex::escape(signature)));
                RegexSet::new(signatures).map(|set| (standard, set))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { patterns })
    }
}

impl Classify for SignatureClassifier {
    fn classify(&self, bytecode: &str) -> anyhow::Result<BTreeSet<Standard>> {
        let code = bytecode.strip_prefix("0x").unwrap_or(bytecode);
        hex::decode(code).context("bytecode is not a valid hex string")?;

        let standards = self
            .patterns
            .iter()
            .filter(|(_, set)| set.matches(code).matched_all())
            .map(|(standard, _)| *standard)
            .collect();
        Ok(standards)
    }
}

#[cfg(test)]
pub(crate) fn bytecode_implementing(standards: &[Standard]) -> String {
    let signatures: String = standards
        .iter()
        .flat_map(|standard| standard.signatures().iter().copied())
        .collect();
    format!("0x6080604052{signatures}00")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn classify(bytecode: &str) -> BTreeSet<Standard> {
        SignatureClassifier::new()
            .unwrap()
            .classify(bytecode)
            .expect("classification failed")
    }

    #[test]
    fn single_standard() {
        for standard in Standard::ALL {
            assert_eq!(
                classify(&bytecode_implementing(&[standard])),
                BTreeSet::from([standard]),
                "{standard}"
            );
        }
    }

    #[test]
    fn multiple_standards() {
        let bytecode = bytecode_implementing(&[Standard::Erc20, Standard::Erc721]);
        assert_eq!(
            classify(&bytecode),
            BTreeSet::from([Standard::Erc20, Standard::Erc721])
        );
    }

    #[test]
    fn partial_interface_is_not_enough() {
        let full = bytecode_implementing(&[Standard::Erc20]);
        // drop the `transfer` selector
        let partial = full.replace("a9059cbb", "");
        assert_eq!(classify(&partial), BTreeSet::new());
        assert_eq!(classify("0x6080604052"), BTreeSet::new());
    }

    #[test]
    fn case_and_prefix_are_ignored() {
        let bytecode = bytecode_implementing(&[Standard::Erc1155]).to_uppercase();
        let bytecode = bytecode.trim_start_matches("0X");
        assert_eq!(classify(bytecode), BTreeSet::from([Standard::Erc1155]));
    }

    #[test]
    fn invalid_hex_is_an_error() {
        let classifier = SignatureClassifier::new().unwrap();
        classifier.classify("0xzz").expect_err("non-hex bytecode");
        classifier.classify("0x608").expect_err("odd length bytecode");
    }
}
