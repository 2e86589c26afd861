//! The `kfs` command-line surface (§6).
//!
//! This is an external-collaborator concern per §1 ("the command-line
//! wrapper and its argument parsing" is out of scope for the core), but the
//! surface itself is specified "for completeness," and every teacher crate
//! in this lineage ships a thin `clap` binary alongside its library — so
//! this module is exactly that: argument parsing and dispatch, with zero
//! sharding/chunking logic of its own.

use crate::key::{FileKey, ReferenceId};
use crate::space::to_human_readable_size;
use crate::table::{coerce_table_path, ShardSelector, DEFAULT_CHUNK_SIZE};
use crate::{Error, Table};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Embedded, sharded, chunked file store over an ordered key-value engine
#[derive(Parser, Debug)]
#[command(name = "kfs", version)]
pub struct Cli {
    /// Table directory (the `.kfs` suffix is appended automatically)
    #[arg(short = 'D', long = "table", global = true, default_value = "default")]
    pub table: String,

    /// 40-hex-char override for the table's reference id (only used on
    /// first creation)
    #[arg(long = "reference-id", global = true)]
    pub reference_id: Option<String>,

    /// Path to a TOML configuration file (see `Config`); defaults apply
    /// when omitted
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// One `kfs` subcommand
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a file or stdin to key K
    Write {
        /// 40-hex-char file key
        key: String,
        /// Source file path; reads stdin if omitted
        path: Option<PathBuf>,
    },
    /// Read key K to a file or stdout
    Read {
        /// 40-hex-char file key
        key: String,
        /// Destination file path; writes stdout if omitted
        path: Option<PathBuf>,
    },
    /// Delete the blob at key K
    Unlink {
        /// 40-hex-char file key
        key: String,
    },
    /// Enumerate a shard
    List {
        /// Shard index or file key (routed via shardIndex)
        bucket_or_key: String,
    },
    /// Per-shard size/free, or every shard if omitted
    Stat {
        /// Shard index or file key (routed via shardIndex)
        bucket_or_key: Option<String>,
        /// Print sizes in human-readable units
        #[arg(short = 'H', long = "human-readable")]
        human_readable: bool,
    },
    /// Request engine-level repair on each shard directory
    Compact,
}

fn parse_selector(s: &str) -> Result<ShardSelector, Error> {
    if let Ok(i) = s.parse::<u16>() {
        Ok(ShardSelector::Index(i))
    } else {
        Ok(ShardSelector::Key(FileKey::parse(s)?))
    }
}

/// Run one CLI invocation to completion, writing the single `[error] <msg>`
/// line on failure (§6) and returning the process exit code.
pub async fn run(cli: Cli) -> i32 {
    match dispatch(cli).await {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("[error] {e}");
            1
        }
    }
}

async fn dispatch(cli: Cli) -> Result<(), Error> {
    let table_dir = coerce_table_path(&cli.table);
    let config = crate::config::Config::load(cli.config.as_deref())?;
    let override_ref_id = match cli.reference_id.as_deref() {
        Some(r) => Some(ReferenceId::parse(r)?),
        None => config.reference_id()?,
    };
    let table: Table = Table::open_with(
        &table_dir,
        override_ref_id,
        config.shard_count,
        config.s_bucket_opts.chunk_size,
        config.s_bucket_opts.s_max,
    )
    .await?;

    match cli.command {
        Command::Write { key, path } => {
            // Stream file contents chunk-at-a-time so a multi-gigabyte blob
            // is never materialized whole in memory (§1, §2 "Data flow").
            let key = FileKey::parse(&key)?;
            let expected_len = match &path {
                Some(p) => Some(tokio::fs::metadata(p).await.map_err(Error::from)?.len()),
                None => None,
            };
            let mut stream = table.create_write_stream(&key, expected_len).await?;
            let mut buf = vec![0u8; DEFAULT_CHUNK_SIZE];
            match path {
                Some(p) => {
                    let mut file = tokio::fs::File::open(&p).await.map_err(Error::from)?;
                    loop {
                        let n = file.read(&mut buf).await.map_err(Error::from)?;
                        if n == 0 {
                            break;
                        }
                        stream.push(&buf[..n]).await?;
                    }
                }
                None => {
                    let mut stdin = tokio::io::stdin();
                    loop {
                        let n = stdin.read(&mut buf).await.map_err(Error::from)?;
                        if n == 0 {
                            break;
                        }
                        stream.push(&buf[..n]).await?;
                    }
                }
            }
            stream.end().await?;
        }
        Command::Read { key, path } => {
            let key = FileKey::parse(&key)?;
            let mut stream = table.create_read_stream(&key).await?;
            match path {
                Some(p) => {
                    let mut file = tokio::fs::File::create(&p).await.map_err(Error::from)?;
                    while let Some(chunk) = stream.next_chunk().await? {
                        file.write_all(&chunk).await.map_err(Error::from)?;
                    }
                }
                None => {
                    let mut stdout = tokio::io::stdout();
                    while let Some(chunk) = stream.next_chunk().await? {
                        stdout.write_all(&chunk).await.map_err(Error::from)?;
                    }
                }
            }
        }
        Command::Unlink { key } => {
            let key = FileKey::parse(&key)?;
            table.unlink(&key).await?;
        }
        Command::List { bucket_or_key } => {
            let selector = parse_selector(&bucket_or_key)?;
            for (base_key, size) in table.list(selector).await? {
                println!("{base_key}\t{size}");
            }
        }
        Command::Stat { bucket_or_key, human_readable } => {
            let stats = match bucket_or_key {
                Some(s) => table.stat_one(parse_selector(&s)?).await?,
                None => table.stat_all().await?,
            };
            for stat in stats {
                let index = stat.index.map(|i| i.to_string()).unwrap_or_default();
                if human_readable {
                    println!(
                        "{index}\tsize={}\tfree={}",
                        to_human_readable_size(stat.size),
                        to_human_readable_size(stat.free)
                    );
                } else {
                    println!("{index}\tsize={}\tfree={}", stat.size, stat.free);
                }
            }
        }
        Command::Compact => {
            table.compact_all().await?;
        }
    }

    table.close().await?;
    Ok(())
}
