//! `sled`-backed [`KvEngine`] implementation.
//!
//! `sled` is a pure-Rust embedded ordered KV store with native range
//! iteration, needing no system toolchain to build — unlike RocksDB — which
//! keeps this crate buildable anywhere cargo runs (see `DESIGN.md`). Each
//! S-bucket gets its own `sled::Db` rooted at the shard's subdirectory, so
//! sled's own `size_on_disk` is exactly the per-shard footprint §4.6 wants.
//!
//! `sled`'s API is synchronous; every call here is dispatched onto
//! [`tokio::task::spawn_blocking`] so it becomes the suspension point §5
//! requires without blocking the calling task.

use super::{KvEngine, KvEntry};
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

/// A `sled::Db` rooted at one S-bucket's directory.
pub struct SledEngine {
    db: sled::Db,
    path: PathBuf,
}

#[async_trait]
impl KvEngine for SledEngine {
    async fn open(path: &Path) -> Result<Self> {
        let path = path.to_path_buf();
        let opened = path.clone();
        let db = tokio::task::spawn_blocking(move || sled::open(&opened)).await??;
        Ok(Self { db, path })
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        let db = self.db.clone();
        let key = key.to_vec();
        let value = tokio::task::spawn_blocking(move || db.get(key)).await??;
        Ok(value.map(|ivec| Bytes::copy_from_slice(&ivec)))
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let db = self.db.clone();
        let key = key.to_vec();
        let value = value.to_vec();
        tokio::task::spawn_blocking(move || db.insert(key, value)).await??;
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> Result<()> {
        let db = self.db.clone();
        let key = key.to_vec();
        tokio::task::spawn_blocking(move || db.remove(key)).await??;
        Ok(())
    }

    async fn delete_range(&self, lo: &[u8], hi: &[u8]) -> Result<()> {
        let db = self.db.clone();
        let lo = lo.to_vec();
        let hi = hi.to_vec();
        tokio::task::spawn_blocking(move || -> sled::Result<()> {
            let keys: Vec<sled::IVec> = db
                .range(lo..=hi)
                .map(|entry| entry.map(|(k, _v)| k))
                .collect::<sled::Result<_>>()?;
            for key in keys {
                db.remove(key)?;
            }
            Ok(())
        })
        .await??;
        Ok(())
    }

    async fn iter_range(&self, lo: &[u8], hi: &[u8]) -> Result<Vec<KvEntry>> {
        let db = self.db.clone();
        let lo = lo.to_vec();
        let hi = hi.to_vec();
        let entries = tokio::task::spawn_blocking(move || -> sled::Result<Vec<KvEntry>> {
            db.range(lo..=hi)
                .map(|r| r.map(|(k, v)| (k.to_vec(), Bytes::copy_from_slice(&v))))
                .collect()
        })
        .await??;
        Ok(entries)
    }

    async fn iter_all(&self) -> Result<Vec<KvEntry>> {
        let db = self.db.clone();
        let entries = tokio::task::spawn_blocking(move || -> sled::Result<Vec<KvEntry>> {
            db.iter()
                .map(|r| r.map(|(k, v)| (k.to_vec(), Bytes::copy_from_slice(&v))))
                .collect()
        })
        .await??;
        Ok(entries)
    }

    async fn approximate_size(&self) -> Result<u64> {
        let db = self.db.clone();
        let size = tokio::task::spawn_blocking(move || db.size_on_disk()).await??;
        Ok(size)
    }

    async fn repair(&self) -> Result<()> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.flush()).await??;
        tracing::info!("repaired/flushed shard at {}", self.path.display());
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || db.flush()).await??;
        Ok(())
    }
}
