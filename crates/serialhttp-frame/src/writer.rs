use std::io::{ErrorKind, Write};

use tracing::trace;

use crate::error::{FrameError, Result};

/// Writes the query that precedes every reply read.
///
/// Wrap a borrowed writer (`QueryWriter::new(&mut port)`) to send on a line
/// that stays owned elsewhere.
pub struct QueryWriter<W> {
    line: W,
}

fn is_retryable(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::Interrupted | ErrorKind::WouldBlock)
}

impl<W: Write> QueryWriter<W> {
    pub fn new(line: W) -> Self {
        Self { line }
    }

    /// Put the whole query on the line and flush it.
    ///
    /// Short writes are continued; a write that accepts nothing means the line
    /// is gone.
    pub fn send(&mut self, query: &[u8]) -> Result<()> {
        let mut rest = query;
        while !rest.is_empty() {
            match self.line.write(rest) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => rest = &rest[n..],
                Err(err) if is_retryable(err.kind()) => {}
                Err(err) => return Err(err.into()),
            }
        }

        loop {
            match self.line.flush() {
                Ok(()) => break,
                Err(err) if is_retryable(err.kind()) => {}
                Err(err) => return Err(err.into()),
            }
        }
        trace!(bytes = query.len(), "query sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records writes and flushes; replays queued errors first.
    #[derive(Default)]
    struct Line {
        data: Vec<u8>,
        flushes: usize,
        write_errors: Vec<ErrorKind>,
        flush_errors: Vec<ErrorKind>,
        max_chunk: Option<usize>,
    }

    impl Write for Line {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if !self.write_errors.is_empty() {
                return Err(self.write_errors.remove(0).into());
            }
            let n = self.max_chunk.map_or(buf.len(), |max| buf.len().min(max));
            self.data.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            if !self.flush_errors.is_empty() {
                return Err(self.flush_errors.remove(0).into());
            }
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn sends_and_flushes_query() {
        let mut line = Line::default();
        QueryWriter::new(&mut line).send(b"READ?\r\n").unwrap();
        assert_eq!(line.data, b"READ?\r\n");
        assert_eq!(line.flushes, 1);
    }

    #[test]
    fn queries_append_on_a_borrowed_line() {
        let mut line = Line::default();
        {
            let mut writer = QueryWriter::new(&mut line);
            writer.send(b"A").unwrap();
            writer.send(b"B").unwrap();
        }
        assert_eq!(line.data, b"AB");
        assert_eq!(line.flushes, 2);
    }

    #[test]
    fn empty_query_still_flushes() {
        let mut line = Line::default();
        QueryWriter::new(&mut line).send(b"").unwrap();
        assert!(line.data.is_empty());
        assert_eq!(line.flushes, 1);
    }

    #[test]
    fn short_writes_are_continued() {
        let mut line = Line {
            max_chunk: Some(1),
            ..Line::default()
        };
        QueryWriter::new(&mut line).send(b"slow query").unwrap();
        assert_eq!(line.data, b"slow query");
    }

    #[test]
    fn retries_interrupted_and_would_block() {
        let mut line = Line {
            write_errors: vec![ErrorKind::Interrupted, ErrorKind::WouldBlock],
            flush_errors: vec![ErrorKind::WouldBlock, ErrorKind::Interrupted],
            ..Line::default()
        };
        QueryWriter::new(&mut line).send(b"retry").unwrap();
        assert_eq!(line.data, b"retry");
        assert_eq!(line.flushes, 1);
    }

    #[test]
    fn zero_length_write_means_closed() {
        let mut line = Line {
            max_chunk: Some(0),
            ..Line::default()
        };
        let err = QueryWriter::new(&mut line).send(b"x").unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn write_failure_is_io_error() {
        let mut line = Line {
            write_errors: vec![ErrorKind::BrokenPipe],
            ..Line::default()
        };
        let err = QueryWriter::new(&mut line).send(b"x").unwrap_err();
        assert!(matches!(err, FrameError::Io(e) if e.kind() == ErrorKind::BrokenPipe));
    }

    #[test]
    fn flush_failure_is_io_error() {
        let mut line = Line {
            flush_errors: vec![ErrorKind::BrokenPipe],
            ..Line::default()
        };
        let err = QueryWriter::new(&mut line).send(b"x").unwrap_err();
        assert!(matches!(err, FrameError::Io(_)));
        assert_eq!(line.data, b"x");
    }
}
