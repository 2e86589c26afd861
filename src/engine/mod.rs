//! The ordered key-value engine capability set (§9 REDESIGN FLAGS: "abstract
//! the engine as a capability set ... and parameterize shard and table over
//! any implementation").
//!
//! `spec.md` treats the engine as an external collaborator; this module is
//! the seam, plus one concrete binding (`sled`, see [`sled_engine`]) so the
//! store is runnable end to end.

mod sled_engine;

pub use sled_engine::SledEngine;

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::path::Path;

/// One entry yielded by an ordered range scan: `(key, value)`. Values are
/// `Bytes` rather than `Vec<u8>` so a read served straight from the engine's
/// page cache doesn't force an extra owned copy on its way back to the
/// caller.
pub type KvEntry = (Vec<u8>, Bytes);

/// Capability set an ordered KV engine must provide for one S-bucket.
///
/// All methods are suspension points (§5): a portable implementation may
/// place engine I/O on a background thread pool, but per-shard ordering
/// must be preserved by the caller (an `SBucket` serializes calls to its
/// engine handle, see [`crate::bucket`]).
#[async_trait]
pub trait KvEngine: Send + Sync + Sized {
    /// Open (creating if absent) the engine-format directory at `path`.
    async fn open(path: &Path) -> Result<Self>;

    /// Point lookup. Returns `None` if the key is absent.
    async fn get(&self, key: &[u8]) -> Result<Option<Bytes>>;

    /// Point write, unconditionally overwriting any prior value.
    async fn put(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Point delete. Succeeds silently if the key is absent.
    async fn delete(&self, key: &[u8]) -> Result<()>;

    /// Delete every key in the inclusive range `[lo, hi]` as a single
    /// logical batch (§4.2, `unlink`).
    async fn delete_range(&self, lo: &[u8], hi: &[u8]) -> Result<()>;

    /// Ordered iteration over every entry in the inclusive range
    /// `[lo, hi]`, ascending by key.
    async fn iter_range(&self, lo: &[u8], hi: &[u8]) -> Result<Vec<KvEntry>>;

    /// Iterate every entry in the engine, ascending by key. Used by
    /// `list()` to group chunks by `H`-prefix.
    async fn iter_all(&self) -> Result<Vec<KvEntry>>;

    /// Approximate total byte footprint of all values stored (§4.6).
    /// Advisory: may lag compaction.
    async fn approximate_size(&self) -> Result<u64>;

    /// Request engine-level repair/compaction of this shard (the CLI's
    /// `compact` subcommand, §6).
    async fn repair(&self) -> Result<()>;

    /// Flush and release underlying engine handles (§4.2, `close`).
    async fn close(&self) -> Result<()>;
}
