//! Streaming adapters (§4.4): a pull-based byte source over `readStream`,
//! and a push-based byte sink over `writeStream`, each bridging the
//! caller's byte-at-a-time view to the engine's chunk-at-a-time KV calls.
//!
//! Backpressure is structural rather than buffered: both adapters are
//! driven by a single `&mut self` method that the caller `.await`s, so at
//! most one engine call is ever outstanding per stream, matching §4.4
//! ("the adapter does not accept more bytes while a put is outstanding").

use crate::engine::KvEngine;
use crate::error::{Error, Result};
use crate::key::{chunk_key, KEY_BYTES};
use bytes::Bytes;
use std::sync::Arc;

/// Lazy chunk producer over one blob's chunk range, ascending by index.
///
/// Emits [`Error::NotFound`] from the first call to [`ReadStream::next_chunk`]
/// if chunk `000000` is absent, before any byte is emitted, per §4.2.
pub struct ReadStream<E: KvEngine> {
    engine: Arc<E>,
    hash: [u8; KEY_BYTES],
    next_n: u32,
    started: bool,
    finished: bool,
}

impl<E: KvEngine> ReadStream<E> {
    pub(crate) fn new(engine: Arc<E>, hash: [u8; KEY_BYTES]) -> Self {
        Self {
            engine,
            hash,
            next_n: 0,
            started: false,
            finished: false,
        }
    }

    /// Pull the next chunk, or `None` once the blob is exhausted.
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        if self.finished {
            return Ok(None);
        }
        let key = chunk_key(&self.hash, self.next_n);
        match self.engine.get(key.as_bytes()).await? {
            Some(data) => {
                self.started = true;
                self.next_n += 1;
                Ok(Some(data))
            }
            None => {
                self.finished = true;
                if !self.started {
                    Err(Error::NotFound)
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Drain the whole stream into one buffer. Convenience for `readFile`.
    pub async fn read_to_end(mut self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        while let Some(chunk) = self.next_chunk().await? {
            out.extend_from_slice(&chunk);
        }
        Ok(out)
    }

    /// Abort the stream at the current chunk boundary. Per §5, this drops
    /// the cursor and is reported to the caller as `Cancelled`.
    pub fn cancel(self) -> Error {
        Error::Cancelled
    }
}

/// Buffers caller bytes up to `chunk_size` and writes sequentially numbered
/// chunks. Unlinks any pre-existing blob at the target key before accepting
/// the first byte, so a new write replaces rather than partially overwrites
/// (§4.2).
pub struct WriteStream<E: KvEngine> {
    engine: Arc<E>,
    hash: [u8; KEY_BYTES],
    chunk_size: usize,
    buf: Vec<u8>,
    next_n: u32,
    bytes_written: u64,
    budget: u64,
    finished: bool,
}

impl<E: KvEngine> WriteStream<E> {
    /// Open a write stream. `budget` is the number of bytes this stream may
    /// accept before failing with [`Error::NoSpace`] (the admission check
    /// performed by the B-table before this constructor is called, §4.3).
    /// The prior blob at `hash`, if any, is unlinked first.
    pub(crate) async fn open(engine: Arc<E>, hash: [u8; KEY_BYTES], chunk_size: usize, budget: u64) -> Result<Self> {
        let (lo, hi) = crate::key::range_for(&hash);
        engine.delete_range(lo.as_bytes(), hi.as_bytes()).await?;
        Ok(Self {
            engine,
            hash,
            chunk_size,
            buf: Vec::with_capacity(chunk_size),
            next_n: 0,
            bytes_written: 0,
            budget,
            finished: false,
        })
    }

    /// Push more caller bytes. Flushes a full chunk whenever the internal
    /// buffer reaches `chunk_size`.
    pub async fn push(&mut self, mut data: &[u8]) -> Result<()> {
        debug_assert!(!self.finished, "push after end()");
        self.bytes_written += data.len() as u64;
        if self.bytes_written > self.budget {
            self.abort_on_overflow().await?;
            return Err(Error::NoSpace(format!(
                "write exceeded admitted budget of {} bytes",
                self.budget
            )));
        }

        while !data.is_empty() {
            let take = (self.chunk_size - self.buf.len()).min(data.len());
            self.buf.extend_from_slice(&data[..take]);
            data = &data[take..];
            if self.buf.len() == self.chunk_size {
                self.flush_chunk().await?;
            }
        }
        Ok(())
    }

    /// Finish the stream, flushing a final chunk with whatever bytes
    /// remain. A terminator chunk is always written, even when empty or
    /// when the blob's length is an exact multiple of `chunk_size` (§12.2
    /// of `SPEC_FULL.md`), so the last-chunk-is-short invariant holds
    /// without the reader needing to know the total length up front.
    pub async fn end(mut self) -> Result<()> {
        self.flush_chunk().await?;
        self.finished = true;
        Ok(())
    }

    /// Abort the stream, unlinking whatever chunks were already persisted
    /// so the key is left in a clean, absent state (§5: aborting a write
    /// stream does not roll back automatically, so the caller — here,
    /// ourselves on overflow — issues the unlink).
    pub async fn abort(self) -> Result<()> {
        self.unlink_self().await
    }

    async fn abort_on_overflow(&mut self) -> Result<()> {
        let (lo, hi) = crate::key::range_for(&self.hash);
        self.engine.delete_range(lo.as_bytes(), hi.as_bytes()).await?;
        self.finished = true;
        Ok(())
    }

    async fn unlink_self(&self) -> Result<()> {
        let (lo, hi) = crate::key::range_for(&self.hash);
        self.engine.delete_range(lo.as_bytes(), hi.as_bytes()).await
    }

    async fn flush_chunk(&mut self) -> Result<()> {
        let key = chunk_key(&self.hash, self.next_n);
        let value = std::mem::take(&mut self.buf);
        self.engine.put(key.as_bytes(), &value).await?;
        self.next_n += 1;
        Ok(())
    }
}
