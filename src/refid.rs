//! Reference-id manager (§4.5)
//!
//! On table open: ensure the directory exists, generate-or-load the 160-bit
//! reference id `R`, and return it. The file is written atomically
//! (write-temp-then-rename) so a crash mid-write never leaves a torn `R`.

use crate::error::{Error, Result};
use crate::key::{ReferenceId, KEY_BYTES};
use rand::RngCore;
use std::path::{Path, PathBuf};

/// Reserved filename for the reference-id file; other components must skip
/// this name when enumerating a table directory.
pub const REFERENCE_ID_FILENAME: &str = "r";

/// Ensure `table_dir` exists and contains a valid reference-id file,
/// creating one from a cryptographically strong random source if absent,
/// or from `override_id` if the caller supplied one (the `referenceId`
/// configuration option).
pub async fn open_or_create(table_dir: &Path, override_id: Option<ReferenceId>) -> Result<ReferenceId> {
    tokio::fs::create_dir_all(table_dir)
        .await
        .map_err(|e| Error::IOError(format!("creating table directory: {e}")))?;

    let path = table_dir.join(REFERENCE_ID_FILENAME);

    if let Some(id) = override_id {
        if !path.exists() {
            write_atomic(&path, id.as_bytes()).await?;
        }
        return load(&path).await;
    }

    if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
        let mut bytes = [0u8; KEY_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        write_atomic(&path, &bytes).await?;
        tracing::info!("generated new reference id at {}", path.display());
    }

    load(&path).await
}

async fn load(path: &Path) -> Result<ReferenceId> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| Error::IOError(format!("reading reference id: {e}")))?;
    if data.len() != KEY_BYTES {
        return Err(Error::Corrupt(format!(
            "reference id file has {} bytes, expected {KEY_BYTES}",
            data.len()
        )));
    }
    let mut bytes = [0u8; KEY_BYTES];
    bytes.copy_from_slice(&data);
    Ok(ReferenceId::from_bytes(bytes))
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp: PathBuf = path.with_extension("tmp");
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| Error::IOError(format!("writing reference id temp file: {e}")))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| Error::IOError(format!("renaming reference id into place: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_and_reloads_reference_id() {
        let dir = tempfile::tempdir().unwrap();
        let table_dir = dir.path().join("t.kfs");

        let first = open_or_create(&table_dir, None).await.unwrap();
        let second = open_or_create(&table_dir, None).await.unwrap();
        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[tokio::test]
    async fn honors_override() {
        let dir = tempfile::tempdir().unwrap();
        let table_dir = dir.path().join("t.kfs");
        let override_id = ReferenceId::parse(&"00".repeat(20)).unwrap();

        let loaded = open_or_create(&table_dir, Some(override_id)).await.unwrap();
        assert_eq!(loaded.as_bytes(), &[0u8; KEY_BYTES]);
    }

    #[tokio::test]
    async fn rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let table_dir = dir.path().join("t.kfs");
        tokio::fs::create_dir_all(&table_dir).await.unwrap();
        tokio::fs::write(table_dir.join(REFERENCE_ID_FILENAME), b"short")
            .await
            .unwrap();

        let result = open_or_create(&table_dir, None).await;
        assert!(matches!(result, Err(Error::Corrupt(_))));
    }
}
