//! Configuration management for KFS
//!
//! Mirrors the recognized options of §6: `referenceId`, `maxTableSize`, and
//! `sBucketOpts`, plus the fixed constants of the Glossary (`B`, `C`,
//! `S_max`). Configuration can be loaded from a TOML file and overridden by
//! `KFS_*` environment variables, following the same layering the teacher
//! crate used for its own settings.

use crate::error::{Error, Result};
use crate::key::ReferenceId;
use crate::table::{DEFAULT_B, DEFAULT_CHUNK_SIZE, DEFAULT_S_MAX};
use serde::{Deserialize, Serialize};

/// Options forwarded to the underlying engine per shard (`sBucketOpts`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SBucketOpts {
    /// Per-chunk maximum byte length (`C`)
    pub chunk_size: usize,
    /// Per-shard maximum byte footprint (`S_max`)
    pub s_max: u64,
}

impl Default for SBucketOpts {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            s_max: DEFAULT_S_MAX,
        }
    }
}

/// Top-level table configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 40-hex-char override for `R` (otherwise random on first open)
    pub reference_id: Option<String>,

    /// Shard count (`B`)
    pub shard_count: u16,

    /// `B * S_max` total cap, used only for the `validate` sanity check;
    /// the per-shard cap actually enforced lives in `s_bucket_opts.s_max`
    pub max_table_size: u64,

    /// Options forwarded to the underlying engine per shard
    pub s_bucket_opts: SBucketOpts,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let s_bucket_opts = SBucketOpts::default();
        Self {
            reference_id: None,
            shard_count: DEFAULT_B,
            max_table_size: DEFAULT_B as u64 * DEFAULT_S_MAX,
            s_bucket_opts,
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults, then
    /// apply `KFS_*` environment variable overrides and validate the
    /// result.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::IOError(format!("failed to read config file: {e}")))?;
        toml::from_str(&contents).map_err(|e| Error::IOError(format!("failed to parse config file: {e}")))
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        use std::env;

        if let Ok(reference_id) = env::var("KFS_REFERENCE_ID") {
            self.reference_id = Some(reference_id);
        }
        if let Ok(shards) = env::var("KFS_SHARD_COUNT") {
            self.shard_count = shards
                .parse()
                .map_err(|e| Error::IOError(format!("invalid KFS_SHARD_COUNT: {e}")))?;
        }
        if let Ok(max_size) = env::var("KFS_MAX_TABLE_SIZE") {
            self.max_table_size = max_size
                .parse()
                .map_err(|e| Error::IOError(format!("invalid KFS_MAX_TABLE_SIZE: {e}")))?;
        }
        if let Ok(chunk_size) = env::var("KFS_CHUNK_SIZE") {
            self.s_bucket_opts.chunk_size = chunk_size
                .parse()
                .map_err(|e| Error::IOError(format!("invalid KFS_CHUNK_SIZE: {e}")))?;
        }
        if let Ok(s_max) = env::var("KFS_S_MAX") {
            self.s_bucket_opts.s_max = s_max
                .parse()
                .map_err(|e| Error::IOError(format!("invalid KFS_S_MAX: {e}")))?;
        }
        if let Ok(level) = env::var("KFS_LOG_LEVEL") {
            self.logging.level = level;
        }

        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.shard_count == 0 {
            return Err(Error::IOError("shard_count must be at least 1".to_string()));
        }
        if self.s_bucket_opts.chunk_size == 0 {
            return Err(Error::IOError("chunk_size must be at least 1".to_string()));
        }
        if self.s_bucket_opts.s_max == 0 {
            return Err(Error::IOError("s_max must be at least 1".to_string()));
        }
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return Err(Error::IOError(format!("invalid log level: {other}"))),
        }
        if let Some(ref_id) = &self.reference_id {
            ReferenceId::parse(ref_id)?;
        }
        Ok(())
    }

    /// Parse the configured `reference_id` override, if any.
    pub fn reference_id(&self) -> Result<Option<ReferenceId>> {
        self.reference_id.as_deref().map(ReferenceId::parse).transpose()
    }
}
