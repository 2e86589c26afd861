//! B-table (§4.3): the façade over all shards. Routes a file key to its
//! shard via the key algebra, opens shards lazily, and performs admission
//! control before handing out a write stream.

use crate::bucket::SBucket;
use crate::engine::KvEngine;
use crate::error::{Error, Result};
use crate::key::{self, FileKey, ReferenceId};
use crate::refid;
use crate::space::ShardStat;
use crate::stream::{ReadStream, WriteStream};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default shard count (`B`)
pub const DEFAULT_B: u16 = 256;
/// Default per-chunk maximum byte length (`C`): 128 KiB
pub const DEFAULT_CHUNK_SIZE: usize = 128 * 1024;
/// Default per-shard maximum byte footprint (`S_max`): 32 GiB
pub const DEFAULT_S_MAX: u64 = 32 * 1024 * 1024 * 1024;

/// Either a raw shard index or a file key to be routed via `shardIndex`,
/// as accepted by the B-table's `stat` and `list` operations (§4.3).
#[derive(Debug, Clone, Copy)]
pub enum ShardSelector {
    /// A raw shard index in `[0, B)`
    Index(u16),
    /// A file key, routed through `shardIndex(K, R)`
    Key(FileKey),
}

/// Append `.kfs` to a bare table name, leaving an already-suffixed path
/// untouched (§6).
pub fn coerce_table_path(name: &str) -> String {
    if name.ends_with(".kfs") {
        name.to_string()
    } else {
        format!("{name}.kfs")
    }
}

/// The top-level store façade managing up to `B` shards.
pub struct BTable<E: KvEngine> {
    table_dir: PathBuf,
    reference_id: ReferenceId,
    b: u16,
    chunk_size: usize,
    s_max: u64,
    shards: DashMap<u16, Arc<SBucket<E>>>,
}

impl<E: KvEngine> BTable<E> {
    /// Open (creating if absent) the table directory at `table_dir`. The
    /// `.kfs` suffix is not applied here; pass the already-coerced path.
    pub async fn open(table_dir: impl AsRef<Path>, override_ref_id: Option<ReferenceId>) -> Result<Self> {
        Self::open_with(table_dir, override_ref_id, DEFAULT_B, DEFAULT_CHUNK_SIZE, DEFAULT_S_MAX).await
    }

    /// Open with explicit shard count / chunk size / per-shard cap, as the
    /// `sBucketOpts` and `maxTableSize` configuration options allow (§6).
    pub async fn open_with(
        table_dir: impl AsRef<Path>,
        override_ref_id: Option<ReferenceId>,
        b: u16,
        chunk_size: usize,
        s_max: u64,
    ) -> Result<Self> {
        let table_dir = table_dir.as_ref().to_path_buf();
        let reference_id = refid::open_or_create(&table_dir, override_ref_id).await?;
        Ok(Self {
            table_dir,
            reference_id,
            b,
            chunk_size,
            s_max,
            shards: DashMap::new(),
        })
    }

    /// This table's persistent reference id.
    pub fn reference_id(&self) -> ReferenceId {
        self.reference_id
    }

    /// `shardIndex(K, R)` for this table.
    pub fn shard_for(&self, key: &FileKey) -> u16 {
        key::shard_index(key, &self.reference_id, self.b)
    }

    fn resolve(&self, selector: ShardSelector) -> u16 {
        match selector {
            ShardSelector::Index(i) => i,
            ShardSelector::Key(k) => self.shard_for(&k),
        }
    }

    /// Get the shard for `i`, opening its engine handle on first use. Once
    /// opened, a shard handle stays in the open-shard map for the table's
    /// lifetime (§5: "no global mutable state beyond the set of open shard
    /// handles, which is append-only for the table's lifetime").
    pub async fn shard(&self, i: u16) -> Result<Arc<SBucket<E>>> {
        if let Some(existing) = self.shards.get(&i) {
            return Ok(existing.clone());
        }
        let dir = self.table_dir.join(key::bucket_dir_name(i));
        let engine = E::open(&dir).await?;
        let bucket = Arc::new(SBucket::new(engine, self.chunk_size, self.s_max));
        // Another task may have opened the same shard concurrently; DashMap's
        // entry API keeps whichever handle wins without leaking the loser's
        // engine handle into the map (it is simply dropped).
        let bucket = self.shards.entry(i).or_insert(bucket).clone();
        Ok(bucket)
    }

    async fn shard_for_key(&self, key: &FileKey) -> Result<Arc<SBucket<E>>> {
        let i = self.shard_for(key);
        self.shard(i).await
    }

    /// `exists(K)`
    pub async fn exists(&self, key: &FileKey) -> Result<bool> {
        self.shard_for_key(key).await?.exists(key).await
    }

    /// `writeFile(K, bytes)`: admit, then write in one call.
    pub async fn write_file(&self, key: &FileKey, bytes: &[u8]) -> Result<()> {
        let bucket = self.shard_for_key(key).await?;
        self.admit(&bucket, bytes.len() as u64).await?;
        bucket.write_file(key, bytes).await
    }

    /// `readFile(K)`
    pub async fn read_file(&self, key: &FileKey) -> Result<Vec<u8>> {
        self.shard_for_key(key).await?.read_file(key).await
    }

    /// `createWriteStream(K)` with a known expected length: the shard must
    /// have at least that much free space before the stream is created.
    pub async fn create_write_stream(&self, key: &FileKey, expected_len: Option<u64>) -> Result<WriteStream<E>> {
        let bucket = self.shard_for_key(key).await?;
        let reserve = expected_len.unwrap_or(self.chunk_size as u64);
        let budget = self.admit(&bucket, reserve).await?;
        bucket.write_stream(key, budget).await
    }

    /// Admission check (§4.3, §8 "Admission"): fails with `NoSpace` before
    /// any chunk is persisted if the shard doesn't have `reserve` bytes
    /// free. Returns the shard's current free-byte budget on success, which
    /// becomes the write stream's overflow ceiling.
    async fn admit(&self, bucket: &SBucket<E>, reserve: u64) -> Result<u64> {
        let stat = bucket.stat().await?;
        if stat.free < reserve {
            tracing::warn!(reserve, free = stat.free, "admission rejected: insufficient shard free space");
            return Err(Error::NoSpace(format!(
                "requested {reserve} bytes but shard has {} free",
                stat.free
            )));
        }
        Ok(stat.free)
    }

    /// `createReadStream(K)`
    pub async fn create_read_stream(&self, key: &FileKey) -> Result<ReadStream<E>> {
        let bucket = self.shard_for_key(key).await?;
        Ok(bucket.read_stream(key))
    }

    /// `unlink(K)`
    pub async fn unlink(&self, key: &FileKey) -> Result<()> {
        self.shard_for_key(key).await?.unlink(key).await
    }

    /// `stat()`: the stat vector for every one of the `B` shards, each
    /// tagged with its index. A shard whose directory does not yet exist on
    /// disk is never opened just to be stat'd (§3 Lifecycle: a shard is
    /// created lazily on first write-or-read that targets it) — it is
    /// reported with a zero size instead. Shards already open, or whose
    /// directory already exists from a prior write, are stat'd for real.
    pub async fn stat_all(&self) -> Result<Vec<ShardStat>> {
        let mut out = Vec::with_capacity(self.b as usize);
        for i in 0..self.b {
            let dir = self.table_dir.join(key::bucket_dir_name(i));
            let stat = if self.shards.contains_key(&i) || dir.exists() {
                self.shard(i).await?.stat().await?
            } else {
                ShardStat::new(0, self.s_max)
            };
            out.push(stat.with_index(i));
        }
        Ok(out)
    }

    /// `stat(K_or_i)`: a single-element vector for one shard.
    pub async fn stat_one(&self, selector: ShardSelector) -> Result<Vec<ShardStat>> {
        let i = self.resolve(selector);
        let bucket = self.shard(i).await?;
        Ok(vec![bucket.stat().await?.with_index(i)])
    }

    /// `list(i)`: enumerate shard `i`, routed via `shardIndex` if `i` was
    /// supplied as a file key.
    pub async fn list(&self, selector: ShardSelector) -> Result<Vec<(String, u64)>> {
        let i = self.resolve(selector);
        self.shard(i).await?.list().await
    }

    /// Request engine-level repair on every shard directory that exists on
    /// disk, skipping shards never opened by this process (the CLI's
    /// `compact` subcommand, §6).
    pub async fn compact_all(&self) -> Result<()> {
        for i in 0..self.b {
            let dir = self.table_dir.join(key::bucket_dir_name(i));
            if !dir.exists() {
                continue;
            }
            self.shard(i).await?.repair().await?;
        }
        Ok(())
    }

    /// Flush and release every open shard handle.
    pub async fn close(&self) -> Result<()> {
        for entry in self.shards.iter() {
            entry.value().close().await?;
        }
        Ok(())
    }
}
