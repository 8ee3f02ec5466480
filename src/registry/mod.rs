pub mod merge;

use crate::{
    analyzer::ClassifiedBatch,
    consts::NEXT_POINTER_JSON_FILE_NAME,
    types::{ClassifiedRecord, Standard},
};
use futures::future;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    io,
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("registry io error: {0}")]
    Io(#[from] io::Error),
    #[error("registry file is not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("replacing registry file failed: {0}")]
    Persist(#[from] tempfile::PersistError),
    #[error("registry task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Owner of the per-standard registry files and the cursor file of one network.
#[derive(Debug, Clone)]
pub struct RegistryGenerator {
    dir: PathBuf,
}

impl RegistryGenerator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn registry_path(&self, standard: Standard) -> PathBuf {
        self.dir.join(standard.registry_file_name())
    }

    pub fn cursor_path(&self) -> PathBuf {
        self.dir.join(NEXT_POINTER_JSON_FILE_NAME)
    }

    /// Merges every bucket of the batch into its registry. Standards are
    /// written concurrently since their files are disjoint.
    pub async fn generate_registries(&self, batch: &ClassifiedBatch) -> Result<(), RegistryError> {
        future::try_join_all(
            batch
                .iter()
                .map(|(standard, records)| self.update_registry(standard, records.to_vec())),
        )
        .await?;
        Ok(())
    }

    pub async fn update_registry(
        &self,
        standard: Standard,
        records: Vec<ClassifiedRecord>,
    ) -> Result<(), RegistryError> {
        if records.is_empty() {
            return Ok(());
        }

        let path = self.registry_path(standard);
        let existing = self.read_registry(standard).await?;
        let incoming = records.len();
        let merged = merge::merge(existing, records);
        let total = merged.len();
        write_json(self.dir.clone(), path.clone(), merged).await?;

        log::info!(
            "finished writing {incoming} new {standard} contracts to {}: total={total}",
            path.display()
        );
        Ok(())
    }

    /// Registry of `standard`, empty when the file does not exist yet.
    pub async fn read_registry(&self, standard: Standard) -> Result<Vec<ClassifiedRecord>, RegistryError> {
        let registry = read_json(self.registry_path(standard)).await?;
        Ok(registry.unwrap_or_default())
    }

    /// Persists the next page pointer. An absent or empty pointer leaves the
    /// stored one untouched.
    pub async fn update_cursor(&self, next: Option<&str>) -> Result<(), RegistryError> {
        let next = match next {
            Some(next) if !next.is_empty() => next.to_string(),
            _ => return Ok(()),
        };
        write_json(self.dir.clone(), self.cursor_path(), next.clone()).await?;
        log::info!("next pointer has been updated: {next}");
        Ok(())
    }

    pub async fn retrieve_cursor(&self) -> Result<Option<String>, RegistryError> {
        let cursor: Option<String> = read_json(self.cursor_path()).await?;
        Ok(cursor.filter(|cursor| !cursor.is_empty()))
    }
}

/// `None` when the file is missing or empty.
async fn read_json<T>(path: PathBuf) -> Result<Option<T>, RegistryError>
where
    T: DeserializeOwned + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let content = match std::fs::read(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&content)?))
    })
    .await?
}

/// Replaces `path` with the pretty-printed value through a temporary file
/// in the same directory, so readers never observe a partial write.
async fn write_json<T>(dir: PathBuf, path: PathBuf, value: T) -> Result<(), RegistryError>
where
    T: Serialize + Send + 'static,
{
    tokio::task::spawn_blocking(move || write_json_atomic(&dir, &path, &value)).await?
}

fn write_json_atomic<T: Serialize>(dir: &Path, path: &Path, value: &T) -> Result<(), RegistryError> {
    std::fs::create_dir_all(dir)?;
    let mut file = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut file, value)?;
    file.as_file().sync_all()?;
    file.persist(path)?;
    Ok(())
}
