use std::io::{ErrorKind, Read};
use std::time::{Duration, Instant};

use bytes::{Buf, BytesMut};
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::source::{ByteRead, ByteSource, CANCEL_CHECK_INTERVAL};

const READ_CHUNK_SIZE: usize = 256;
const MIN_WAIT_SLICE: Duration = Duration::from_millis(1);

/// A stream whose reads can be bounded by a native timeout.
pub trait TimedRead: Read {
    /// Set the timeout applied to subsequent blocking reads.
    fn set_read_timeout(&self, timeout: Option<Duration>) -> std::io::Result<()>;
}

impl TimedRead for std::net::TcpStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> std::io::Result<()> {
        std::net::TcpStream::set_read_timeout(self, timeout)
    }
}

#[cfg(unix)]
impl TimedRead for std::os::unix::net::UnixStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> std::io::Result<()> {
        std::os::unix::net::UnixStream::set_read_timeout(self, timeout)
    }
}

/// Byte source over a stream that blocks natively with a read timeout.
///
/// The wait is split into short native timeouts so a cancelled token is
/// noticed mid-wait. Bytes are read in chunks and handed out one at a time;
/// anything not yet handed out stays buffered for the next call.
pub struct BlockingSource<S> {
    inner: S,
    pending: BytesMut,
}

impl<S: TimedRead> BlockingSource<S> {
    /// Wrap a stream.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            pending: BytesMut::with_capacity(READ_CHUNK_SIZE),
        }
    }

    /// Number of bytes read from the stream but not yet handed out.
    pub fn buffered(&self) -> usize {
        self.pending.len()
    }

}

impl<S: TimedRead> ByteSource for BlockingSource<S> {
    fn try_read_byte(
        &mut self,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> std::io::Result<ByteRead> {
        if self.pending.has_remaining() {
            return Ok(ByteRead::Byte(self.pending.get_u8()));
        }

        let deadline = Instant::now() + timeout;
        let mut first_pass = true;
        loop {
            if cancel.is_cancelled() {
                return Ok(ByteRead::Timeout);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() && !first_pass {
                return Ok(ByteRead::Timeout);
            }
            first_pass = false;

            let slice = remaining.clamp(MIN_WAIT_SLICE, CANCEL_CHECK_INTERVAL);
            self.inner.set_read_timeout(Some(slice))?;

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            match self.inner.read(&mut chunk) {
                Ok(0) => return Ok(ByteRead::Closed),
                Ok(n) => {
                    trace!(bytes = n, "stream chunk received");
                    self.pending.extend_from_slice(&chunk[..n]);
                    return Ok(ByteRead::Byte(self.pending.get_u8()));
                }
                Err(err)
                    if matches!(
                        err.kind(),
                        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                    ) =>
                {
                    continue
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Drops buffered bytes, then reads without blocking until the stream has
    /// nothing more to give. Gives up after [`CANCEL_CHECK_INTERVAL`] on a line
    /// that never goes quiet.
    fn discard_pending(&mut self) -> std::io::Result<usize> {
        let mut discarded = self.pending.len();
        self.pending.clear();

        let deadline = Instant::now() + CANCEL_CHECK_INTERVAL;
        self.inner.set_read_timeout(Some(MIN_WAIT_SLICE))?;
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        while Instant::now() < deadline {
            match self.inner.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => discarded += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    break
                }
                Err(err) => return Err(err),
            }
        }

        if discarded > 0 {
            trace!(bytes = discarded, "stale input discarded");
        }
        Ok(discarded)
    }
}

impl<S> std::fmt::Debug for BlockingSource<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingSource")
            .field("pending", &self.pending.len())
            .finish()
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::Write;
    use std::os::unix::net::UnixStream;

    use super::*;

    #[test]
    fn hands_out_bytes_in_order() {
        let (mut left, right) = UnixStream::pair().unwrap();
        let mut source = BlockingSource::new(right);
        let cancel = CancellationToken::new();

        left.write_all(b"abc").unwrap();

        let mut got = Vec::new();
        for _ in 0..3 {
            match source
                .try_read_byte(Duration::from_millis(200), &cancel)
                .unwrap()
            {
                ByteRead::Byte(b) => got.push(b),
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(got, b"abc");
        assert_eq!(source.buffered(), 0);
    }

    #[test]
    fn quiet_stream_times_out() {
        let (_left, right) = UnixStream::pair().unwrap();
        let mut source = BlockingSource::new(right);
        let cancel = CancellationToken::new();

        let start = Instant::now();
        let read = source
            .try_read_byte(Duration::from_millis(60), &cancel)
            .unwrap();
        assert_eq!(read, ByteRead::Timeout);
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn zero_timeout_still_polls_once() {
        let (mut left, right) = UnixStream::pair().unwrap();
        let mut source = BlockingSource::new(right);
        let cancel = CancellationToken::new();

        assert_eq!(
            source.try_read_byte(Duration::ZERO, &cancel).unwrap(),
            ByteRead::Timeout
        );

        left.write_all(b"z").unwrap();
        assert_eq!(
            source
                .try_read_byte(Duration::from_millis(200), &cancel)
                .unwrap(),
            ByteRead::Byte(b'z')
        );
    }

    #[test]
    fn peer_hangup_reports_closed() {
        let (left, right) = UnixStream::pair().unwrap();
        let mut source = BlockingSource::new(right);
        let cancel = CancellationToken::new();

        drop(left);
        assert_eq!(
            source
                .try_read_byte(Duration::from_millis(200), &cancel)
                .unwrap(),
            ByteRead::Closed
        );
    }

    #[test]
    fn cancellation_cuts_wait_short() {
        let (_left, right) = UnixStream::pair().unwrap();
        let mut source = BlockingSource::new(right);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(40));
            trigger.cancel();
        });

        let start = Instant::now();
        let read = source
            .try_read_byte(Duration::from_secs(10), &cancel)
            .unwrap();
        assert_eq!(read, ByteRead::Timeout);
        assert!(start.elapsed() < Duration::from_secs(2));
        canceller.join().unwrap();
    }

    #[test]
    fn discard_drops_buffered_and_waiting_bytes() {
        let (mut left, right) = UnixStream::pair().unwrap();
        let mut source = BlockingSource::new(right);
        let cancel = CancellationToken::new();

        left.write_all(b"<<old>>").unwrap();
        assert_eq!(
            source
                .try_read_byte(Duration::from_millis(200), &cancel)
                .unwrap(),
            ByteRead::Byte(b'<')
        );
        assert_eq!(source.buffered(), 6);

        left.write_all(b"<<older>>").unwrap();
        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(source.discard_pending().unwrap(), 15);
        assert_eq!(source.buffered(), 0);

        left.write_all(b"!").unwrap();
        assert_eq!(
            source
                .try_read_byte(Duration::from_millis(200), &cancel)
                .unwrap(),
            ByteRead::Byte(b'!')
        );
    }

    #[test]
    fn discard_on_quiet_stream_returns_promptly() {
        let (_left, right) = UnixStream::pair().unwrap();
        let mut source = BlockingSource::new(right);

        let start = Instant::now();
        assert_eq!(source.discard_pending().unwrap(), 0);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn tcp_loopback_delivers_bytes() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let writer = std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(b"[1]").unwrap();
        });

        let stream = std::net::TcpStream::connect(addr).unwrap();
        let mut source = BlockingSource::new(stream);
        let cancel = CancellationToken::new();

        let mut got = Vec::new();
        loop {
            match source
                .try_read_byte(Duration::from_millis(500), &cancel)
                .unwrap()
            {
                ByteRead::Byte(b) => got.push(b),
                ByteRead::Closed => break,
                ByteRead::Timeout => panic!("loopback should not stall"),
            }
        }
        writer.join().unwrap();
        assert_eq!(got, b"[1]");
    }
}
