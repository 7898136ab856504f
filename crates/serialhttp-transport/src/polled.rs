use std::collections::VecDeque;
use std::io::{ErrorKind, Read};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::source::{ByteRead, ByteSource, ReadStrategy};

const READ_CHUNK_SIZE: usize = 1024;

/// Most bytes a [`FeedBuffer`] holds; older bytes are dropped first.
pub const FEED_CAPACITY: usize = 64 * 1024;
const POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Debug, Default)]
struct FeedState {
    queue: VecDeque<u8>,
    closed: bool,
}

/// Byte queue shared between an independent producer and a [`PolledSource`].
///
/// Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct FeedBuffer {
    shared: Arc<Mutex<FeedState>>,
}

impl FeedBuffer {
    /// Create an empty, open buffer.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append bytes delivered by the producer. Ignored once closed.
    ///
    /// Past [`FEED_CAPACITY`] the oldest bytes are overwritten, like a
    /// driver's receive ring.
    pub fn push(&self, data: &[u8]) {
        let mut state = self.state();
        if state.closed {
            return;
        }
        let data = &data[data.len().saturating_sub(FEED_CAPACITY)..];
        let overflow = (state.queue.len() + data.len()).saturating_sub(FEED_CAPACITY);
        if overflow > 0 {
            state.queue.drain(..overflow);
            trace!(bytes = overflow, "feed full, oldest bytes dropped");
        }
        state.queue.extend(data.iter().copied());
    }

    /// Mark the producer as finished. Already buffered bytes stay readable.
    pub fn close(&self) {
        self.state().closed = true;
    }

    /// Whether the producer has finished.
    pub fn is_closed(&self) -> bool {
        self.state().closed
    }

    /// Drop all buffered bytes, returning how many were discarded.
    pub fn clear(&self) -> usize {
        let mut state = self.state();
        let dropped = state.queue.len();
        state.queue.clear();
        dropped
    }

    /// Create a polling source over this buffer.
    pub fn source(&self, retries: u32) -> PolledSource {
        PolledSource {
            feed: self.clone(),
            strategy: ReadStrategy::polling(retries),
        }
    }

    /// Spawn a producer thread that copies everything `reader` yields into the buffer.
    ///
    /// The buffer is closed when the reader reaches EOF or fails. Once the
    /// buffer is closed by someone else, the thread exits after its current
    /// read returns.
    pub fn spawn_reader<R>(&self, mut reader: R, name: &str) -> std::io::Result<JoinHandle<()>>
    where
        R: Read + Send + 'static,
    {
        let feed = self.clone();
        std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                let mut chunk = [0u8; READ_CHUNK_SIZE];
                loop {
                    match reader.read(&mut chunk) {
                        Ok(0) => {
                            debug!("feed producer reached end of stream");
                            break;
                        }
                        Ok(_) if feed.is_closed() => {
                            debug!("feed closed, producer stopping");
                            break;
                        }
                        Ok(n) => {
                            trace!(bytes = n, "feed producer received data");
                            feed.push(&chunk[..n]);
                        }
                        Err(_) if feed.is_closed() => break,
                        Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                        Err(err) => {
                            warn!(error = %err, "feed producer read failed");
                            break;
                        }
                    }
                }
                feed.close();
            })
    }
}

/// Byte source that polls a [`FeedBuffer`] instead of blocking on a transport.
#[derive(Debug, Clone)]
pub struct PolledSource {
    feed: FeedBuffer,
    strategy: ReadStrategy,
}

impl ByteSource for PolledSource {
    fn try_read_byte(
        &mut self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> std::io::Result<ByteRead> {
        let deadline = Instant::now() + timeout;
        loop {
            {
                let mut state = self.feed.state();
                if let Some(byte) = state.queue.pop_front() {
                    return Ok(ByteRead::Byte(byte));
                }
                if state.closed {
                    return Ok(ByteRead::Closed);
                }
            }

            let now = Instant::now();
            if cancel.is_cancelled() || now >= deadline {
                return Ok(ByteRead::Timeout);
            }
            std::thread::sleep((deadline - now).min(POLL_INTERVAL));
        }
    }

    fn strategy(&self) -> ReadStrategy {
        self.strategy
    }

    fn discard_pending(&mut self) -> std::io::Result<usize> {
        Ok(self.feed.clear())
    }
}
