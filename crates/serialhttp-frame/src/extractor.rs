use std::time::{Duration, Instant};

use bytes::Bytes;
use serialhttp_transport::{sleep_cancellable, ByteRead, ByteSource, ReadStrategy};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::{FrameConfig, TIMEOUT_FRACTIONS};
use crate::decoder::Decoder;
use crate::error::{FrameError, Result};

/// Outcome of one [`FrameExtractor::read`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadResult {
    /// A complete frame, header through terminator.
    Message(Bytes),
    /// The time budget ran out before a frame completed.
    NoMessage,
}

impl ReadResult {
    /// The frame, if one was read.
    pub fn into_message(self) -> Option<Bytes> {
        match self {
            Self::Message(frame) => Some(frame),
            Self::NoMessage => None,
        }
    }
}

/// Reads one delimited frame from a byte source within a bounded time.
///
/// The extractor keeps no state between reads, so it can be reused for
/// every query on the same source. Callers must not run two reads against
/// one source at the same time.
#[derive(Debug, Clone)]
pub struct FrameExtractor {
    config: FrameConfig,
}

enum Attempt {
    Complete,
    Elapsed,
}

impl FrameExtractor {
    /// Create an extractor for the given frame configuration.
    pub fn new(config: FrameConfig) -> Self {
        Self { config }
    }

    /// Frame configuration in use.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// Read at most one frame.
    ///
    /// The budget is split into [`TIMEOUT_FRACTIONS`] attempt windows of
    /// [`FrameConfig::per_attempt_timeout`]. Sources with a
    /// [`ReadStrategy::Polling`] strategy are polled `retries` times per
    /// window with an idle sleep in between. Decoding progress carries over
    /// from one attempt to the next.
    ///
    /// Returns [`ReadResult::NoMessage`] when every attempt elapses without a
    /// complete frame, [`FrameError::Cancelled`] if `cancel` fires first,
    /// [`FrameError::SourceClosed`] if the source ends mid-read, and
    /// [`FrameError::Io`] for transport faults.
    pub fn read<S>(&self, source: &mut S, cancel: &CancellationToken) -> Result<ReadResult>
    where
        S: ByteSource + ?Sized,
    {
        let mut decoder = Decoder::new(&self.config);
        let window = self.config.per_attempt_timeout();
        let started = Instant::now();

        let completed = match source.strategy() {
            ReadStrategy::Blocking => self.read_blocking(source, &mut decoder, window, cancel)?,
            ReadStrategy::Polling { retries } => {
                self.read_polling(source, &mut decoder, window, retries.max(1), cancel)?
            }
        };

        match completed.then(|| decoder.finish()).flatten() {
            Some(frame) => {
                debug!(
                    len = frame.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "frame complete"
                );
                Ok(ReadResult::Message(frame))
            }
            None => {
                debug!(
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "no complete frame within budget"
                );
                Ok(ReadResult::NoMessage)
            }
        }
    }

    fn read_blocking<S>(
        &self,
        source: &mut S,
        decoder: &mut Decoder<'_>,
        window: Duration,
        cancel: &CancellationToken,
    ) -> Result<bool>
    where
        S: ByteSource + ?Sized,
    {
        for attempt in 0..TIMEOUT_FRACTIONS {
            let deadline = Instant::now() + window;
            if let Attempt::Complete = drain(source, decoder, Some(deadline), cancel)? {
                return Ok(true);
            }
            trace!(attempt, state = ?decoder.state(), "attempt window elapsed");
        }
        Ok(false)
    }

    fn read_polling<S>(
        &self,
        source: &mut S,
        decoder: &mut Decoder<'_>,
        window: Duration,
        retries: u32,
        cancel: &CancellationToken,
    ) -> Result<bool>
    where
        S: ByteSource + ?Sized,
    {
        let idle = window / retries;
        for attempt in 0..TIMEOUT_FRACTIONS.saturating_mul(retries) {
            if let Attempt::Complete = drain(source, decoder, None, cancel)? {
                return Ok(true);
            }
            trace!(attempt, state = ?decoder.state(), "poll found no frame yet");
            if !sleep_cancellable(idle, cancel) {
                return Err(FrameError::Cancelled);
            }
        }
        Ok(false)
    }
}

/// Feed bytes to the decoder until it completes or the source goes quiet.
///
/// With a deadline, each pull waits up to the time left in the window and the
/// attempt also ends once the window passes. Without one, only bytes that are
/// already available are taken.
fn drain<S>(
    source: &mut S,
    decoder: &mut Decoder<'_>,
    deadline: Option<Instant>,
    cancel: &CancellationToken,
) -> Result<Attempt>
where
    S: ByteSource + ?Sized,
{
    loop {
        if cancel.is_cancelled() {
            return Err(FrameError::Cancelled);
        }

        let wait = deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
            .unwrap_or(Duration::ZERO);

        match source.try_read_byte(wait, cancel)? {
            ByteRead::Byte(byte) => {
                if decoder.push(byte).is_complete() {
                    return Ok(Attempt::Complete);
                }
                if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                    return Ok(Attempt::Elapsed);
                }
            }
            ByteRead::Timeout => {
                if cancel.is_cancelled() {
                    return Err(FrameError::Cancelled);
                }
                return Ok(Attempt::Elapsed);
            }
            ByteRead::Closed => return Err(FrameError::SourceClosed),
        }
    }
}
