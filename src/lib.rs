//! KFS — an embedded file store layered over an ordered key-value engine.
//!
//! Blobs are keyed by a 160-bit file key, sharded across a bounded set of
//! independent KV shards ("S-buckets") via an XOR-distance metric against
//! the table's own reference id, and chunked into fixed-size records within
//! their shard so that multi-gigabyte blobs are read and written as streams
//! rather than materialized in memory.
//!
//! See `SPEC_FULL.md` for the full design; the short version is five
//! layers, leaves first: key algebra ([`key`]), the reference-id manager
//! ([`refid`]), one S-bucket ([`bucket`]) backed by a pluggable ordered KV
//! engine ([`engine`]), streaming adapters ([`stream`]) bridging byte
//! streams to chunk-at-a-time engine calls, and the B-table façade
//! ([`table`]) that routes, lazily opens shards, and admits writes against
//! free space ([`space`]).
#![warn(missing_docs)]

/// Configuration management
pub mod config;
/// Error types and result handling
pub mod error;

/// Key algebra: hex <-> bytes, XOR sharding, chunk-key construction
pub mod key;
/// Reference-id manager
pub mod refid;

/// The ordered key-value engine capability set and its concrete bindings
pub mod engine;
/// One S-bucket: a single KV shard with chunked blob storage
pub mod bucket;
/// Streaming read/write adapters bridging byte streams to chunk-at-a-time calls
pub mod stream;

/// Per-shard size/free accounting and human-readable formatting
pub mod space;
/// The B-table façade: routing, lazy shard open, admission control
pub mod table;

/// The `kfs` CLI surface (§6), implemented as a thin consumer of the
/// library above
pub mod cli;

pub use config::Config;
pub use engine::{KvEngine, SledEngine};
pub use error::{Error, Result};
pub use key::{FileKey, ReferenceId};
pub use table::{BTable, ShardSelector};

/// Crate version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// A table backed by the reference `sled` engine; the type most callers want.
pub type Table = BTable<SledEngine>;

/// Initialize structured logging from the environment, following the
/// convention of the teacher crate this store was transformed from: an
/// `EnvFilter`-driven `tracing_subscriber`, initialized once from `main`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
