use std::time::Duration;

use bytes::Bytes;

use crate::error::{FrameError, Result};

/// Number of attempt windows the total timeout is divided into.
pub const TIMEOUT_FRACTIONS: u32 = 10;

/// Lower bound for a single attempt window.
pub const MIN_ATTEMPT_TIMEOUT: Duration = Duration::from_millis(50);

/// Immutable description of a frame and of the time allowed to read one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameConfig {
    header: Bytes,
    terminator: Bytes,
    total_timeout: Duration,
}

impl FrameConfig {
    /// Create a frame configuration from a timeout in milliseconds.
    ///
    /// Negative timeouts are treated as zero. Fails if the header or the
    /// terminator is empty.
    pub fn new(
        header: impl Into<Bytes>,
        terminator: impl Into<Bytes>,
        total_timeout_ms: i64,
    ) -> Result<Self> {
        let millis = u64::try_from(total_timeout_ms).unwrap_or(0);
        Self::with_timeout(header, terminator, Duration::from_millis(millis))
    }

    /// Create a frame configuration with an explicit total timeout.
    pub fn with_timeout(
        header: impl Into<Bytes>,
        terminator: impl Into<Bytes>,
        total_timeout: Duration,
    ) -> Result<Self> {
        let header = header.into();
        let terminator = terminator.into();
        if header.is_empty() {
            return Err(FrameError::EmptyHeader);
        }
        if terminator.is_empty() {
            return Err(FrameError::EmptyTerminator);
        }
        Ok(Self {
            header,
            terminator,
            total_timeout,
        })
    }

    /// Bytes that open a frame.
    pub fn header(&self) -> &[u8] {
        &self.header
    }

    /// Bytes that close a frame.
    pub fn terminator(&self) -> &[u8] {
        &self.terminator
    }

    /// Total time budget for one read.
    pub fn total_timeout(&self) -> Duration {
        self.total_timeout
    }

    /// Length of one attempt window: a tenth of the budget, never below 50 ms.
    pub fn per_attempt_timeout(&self) -> Duration {
        (self.total_timeout / TIMEOUT_FRACTIONS).max(MIN_ATTEMPT_TIMEOUT)
    }
}
