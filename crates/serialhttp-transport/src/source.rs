use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

/// Longest uninterrupted wait a source performs before re-checking cancellation.
pub const CANCEL_CHECK_INTERVAL: Duration = Duration::from_millis(25);

/// Outcome of a single byte pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteRead {
    /// A byte arrived.
    Byte(u8),
    /// No byte arrived within the timeout (or the wait was cut short by cancellation).
    Timeout,
    /// The source is permanently exhausted.
    Closed,
}

/// How a source delivers bytes, which decides how a reader should pace itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStrategy {
    /// The source blocks natively until a byte arrives or the timeout expires.
    Blocking,
    /// The source only reports what a producer already buffered. Readers poll it
    /// `retries` times per attempt window and idle in between.
    Polling { retries: u32 },
}

impl ReadStrategy {
    /// Polling strategy with `retries` clamped to at least one.
    pub fn polling(retries: u32) -> Self {
        Self::Polling {
            retries: retries.max(1),
        }
    }
}

/// A byte-at-a-time source with a bounded wait.
///
/// Implementations must return promptly once `cancel` fires, reporting
/// [`ByteRead::Timeout`]; telling cancellation apart from a quiet line is the
/// caller's job.
pub trait ByteSource {
    /// Pull the next byte, waiting at most `timeout`.
    ///
    /// A zero timeout only reports bytes that are already available.
    fn try_read_byte(
        &mut self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> std::io::Result<ByteRead>;

    /// Pacing strategy for readers of this source.
    fn strategy(&self) -> ReadStrategy {
        ReadStrategy::Blocking
    }

    /// Drop everything that is already waiting to be read, returning how many
    /// bytes were discarded. Never waits for new data.
    fn discard_pending(&mut self) -> std::io::Result<usize> {
        Ok(0)
    }
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn try_read_byte(
        &mut self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> std::io::Result<ByteRead> {
        (**self).try_read_byte(timeout, cancel)
    }

    fn strategy(&self) -> ReadStrategy {
        (**self).strategy()
    }

    fn discard_pending(&mut self) -> std::io::Result<usize> {
        (**self).discard_pending()
    }
}

impl<S: ByteSource + ?Sized> ByteSource for &mut S {
    fn try_read_byte(
        &mut self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> std::io::Result<ByteRead> {
        (**self).try_read_byte(timeout, cancel)
    }

    fn strategy(&self) -> ReadStrategy {
        (**self).strategy()
    }

    fn discard_pending(&mut self) -> std::io::Result<usize> {
        (**self).discard_pending()
    }
}

/// Sleep for `duration` in short slices, returning `false` if `cancel` fired first.
pub fn sleep_cancellable(duration: Duration, cancel: &CancellationToken) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        std::thread::sleep((deadline - now).min(CANCEL_CHECK_INTERVAL));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polling_retries_are_clamped() {
        assert_eq!(
            ReadStrategy::polling(0),
            ReadStrategy::Polling { retries: 1 }
        );
        assert_eq!(
            ReadStrategy::polling(4),
            ReadStrategy::Polling { retries: 4 }
        );
    }

    #[test]
    fn sleep_runs_to_completion() {
        let cancel = CancellationToken::new();
        let start = Instant::now();
        assert!(sleep_cancellable(Duration::from_millis(30), &cancel));
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn sleep_stops_when_cancelled() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            trigger.cancel();
        });

        let start = Instant::now();
        assert!(!sleep_cancellable(Duration::from_secs(5), &cancel));
        assert!(start.elapsed() < Duration::from_secs(1));
        canceller.join().unwrap();
    }

    #[test]
    fn boxed_source_delegates() {
        struct One(Option<u8>);

        impl ByteSource for One {
            fn try_read_byte(
                &mut self,
                _timeout: Duration,
                _cancel: &CancellationToken,
            ) -> std::io::Result<ByteRead> {
                Ok(self.0.take().map_or(ByteRead::Closed, ByteRead::Byte))
            }

            fn strategy(&self) -> ReadStrategy {
                ReadStrategy::polling(2)
            }
        }

        let cancel = CancellationToken::new();
        let mut boxed: Box<dyn ByteSource> = Box::new(One(Some(b'x')));
        assert_eq!(boxed.strategy(), ReadStrategy::Polling { retries: 2 });
        assert_eq!(boxed.discard_pending().unwrap(), 0);
        assert_eq!(
            boxed.try_read_byte(Duration::ZERO, &cancel).unwrap(),
            ByteRead::Byte(b'x')
        );
        assert_eq!(
            boxed.try_read_byte(Duration::ZERO, &cancel).unwrap(),
            ByteRead::Closed
        );
    }
}
