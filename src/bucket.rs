//! S-bucket (§4.2): one KV shard, exposing existence/stat/unlink/list and
//! streaming read/write over the chunked blob layout of §3.

use crate::engine::KvEngine;
use crate::error::Result;
use crate::key::{chunk_key, range_for, FileKey, KEY_BYTES};
use crate::space::ShardStat;
use crate::stream::{ReadStream, WriteStream};
use std::sync::Arc;
use tokio::sync::Mutex;

/// One S-bucket: a single engine handle plus the per-shard byte cap it
/// enforces admission against.
///
/// Per §5 ("per shard: operations are serialized in submission order"), all
/// mutating calls go through `serialize`, a single-slot async mutex held
/// for the duration of the call — this makes unlink-before-write and
/// chunk-sequencing atomic with respect to other KFS-level operations on
/// the same shard, not merely atomic at the level of one engine call.
pub struct SBucket<E: KvEngine> {
    engine: Arc<E>,
    serialize: Mutex<()>,
    chunk_size: usize,
    s_max: u64,
}

impl<E: KvEngine> SBucket<E> {
    pub(crate) fn new(engine: E, chunk_size: usize, s_max: u64) -> Self {
        Self {
            engine: Arc::new(engine),
            serialize: Mutex::new(()),
            chunk_size,
            s_max,
        }
    }

    /// True iff chunk `000000` for `H(K)` is present.
    pub async fn exists(&self, key: &FileKey) -> Result<bool> {
        let _guard = self.serialize.lock().await;
        let hash = key.chunk_hash();
        let first = chunk_key(&hash, 0);
        Ok(self.engine.get(first.as_bytes()).await?.is_some())
    }

    /// Per-shard size and free-byte accounting (§4.6).
    pub async fn stat(&self) -> Result<ShardStat> {
        let size = self.engine.approximate_size().await?;
        Ok(ShardStat::new(size, self.s_max))
    }

    /// Delete all chunks for `K` as a single batched deletion. Succeeds
    /// silently if the blob is absent (idempotent, §7).
    pub async fn unlink(&self, key: &FileKey) -> Result<()> {
        let _guard = self.serialize.lock().await;
        let hash = key.chunk_hash();
        let (lo, hi) = range_for(&hash);
        self.engine.delete_range(lo.as_bytes(), hi.as_bytes()).await
    }

    /// Enumerate every distinct blob in this shard, grouped by `H`-prefix,
    /// ascending by `H`. The approximate size is the sum of that blob's
    /// chunk-value lengths.
    pub async fn list(&self) -> Result<Vec<(String, u64)>> {
        let entries = self.engine.iter_all().await?;
        let mut blobs: Vec<(String, u64)> = Vec::new();
        let mut current_prefix: Option<String> = None;
        let mut current_size: u64 = 0;

        for (key_bytes, value) in entries {
            let key_str = String::from_utf8_lossy(&key_bytes);
            let Some((prefix, _n)) = key_str.split_once(' ') else {
                continue; // not a chunk key (e.g. stray entry); skip defensively
            };
            match &current_prefix {
                Some(p) if p == prefix => {
                    current_size += value.len() as u64;
                }
                _ => {
                    if let Some(p) = current_prefix.take() {
                        blobs.push((p, current_size));
                    }
                    current_prefix = Some(prefix.to_string());
                    current_size = value.len() as u64;
                }
            }
        }
        if let Some(p) = current_prefix.take() {
            blobs.push((p, current_size));
        }
        blobs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(blobs)
    }

    /// Open a lazy chunk producer over `K`'s chunk range. Emits
    /// [`crate::error::Error::NotFound`] before any byte if chunk `000000`
    /// is absent.
    pub fn read_stream(&self, key: &FileKey) -> ReadStream<E> {
        ReadStream::new(self.engine.clone(), key.chunk_hash())
    }

    /// Open a write stream admitted against `budget` bytes. Unlinks any
    /// pre-existing blob at `K` before accepting the first byte.
    pub async fn write_stream(&self, key: &FileKey, budget: u64) -> Result<WriteStream<E>> {
        let _guard = self.serialize.lock().await;
        WriteStream::open(self.engine.clone(), key.chunk_hash(), self.chunk_size, budget).await
    }

    /// Write `bytes` to `key` in one call: open, push, end.
    pub async fn write_file(&self, key: &FileKey, bytes: &[u8]) -> Result<()> {
        let mut stream = self.write_stream(key, bytes.len() as u64).await?;
        stream.push(bytes).await?;
        stream.end().await
    }

    /// Read `key` into one buffer in one call.
    pub async fn read_file(&self, key: &FileKey) -> Result<Vec<u8>> {
        self.read_stream(key).read_to_end().await
    }

    /// Flush and release the underlying engine handle.
    pub async fn close(&self) -> Result<()> {
        self.engine.close().await
    }

    /// Request engine-level repair of this shard.
    pub async fn repair(&self) -> Result<()> {
        self.engine.repair().await
    }

    /// Hash width, re-exported for callers building raw chunk keys.
    pub const HASH_BYTES: usize = KEY_BYTES;
}
