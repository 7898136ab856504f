use bytes::{Buf, BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::config::FrameConfig;

/// Progress of one frame through the decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeState {
    /// Discarding bytes until the first header byte shows up.
    WaitingHeader,
    /// Part of a multi-byte header is buffered; searching for the rest.
    ReadingHeader,
    /// Header complete; collecting payload until the first terminator byte.
    WaitingTerminator,
    /// First terminator byte seen; searching for the full terminator.
    ReadingTerminator,
    /// The accumulator holds a frame, header through terminator.
    Complete,
}

impl DecodeState {
    /// Whether a full frame has been decoded.
    pub fn is_complete(self) -> bool {
        self == Self::Complete
    }
}

/// Apply one byte to `(state, acc)` and return the next state.
///
/// Outside the header states, a byte equal to the first header byte abandons
/// whatever was accumulated and starts a new frame. Payloads that contain the
/// first header byte therefore restart the frame, and a terminator that
/// starts with the first header byte can never complete one.
///
/// While reading a multi-byte header the accumulator is a sliding window: the
/// header is searched anywhere in it, bytes before the match are dropped, and
/// bytes that can no longer begin a match are trimmed.
///
/// A terminator only completes the frame if it starts at or after the end of
/// the header.
pub fn transition(
    config: &FrameConfig,
    state: DecodeState,
    acc: &mut BytesMut,
    byte: u8,
) -> DecodeState {
    let header = config.header();
    let terminator = config.terminator();

    let state = match state {
        DecodeState::Complete => return DecodeState::Complete,
        DecodeState::WaitingTerminator | DecodeState::ReadingTerminator if byte == header[0] => {
            acc.clear();
            DecodeState::WaitingHeader
        }
        other => other,
    };

    match state {
        DecodeState::WaitingHeader => {
            if byte != header[0] {
                return DecodeState::WaitingHeader;
            }
            acc.put_u8(byte);
            if header.len() > 1 {
                DecodeState::ReadingHeader
            } else {
                DecodeState::WaitingTerminator
            }
        }
        DecodeState::ReadingHeader => {
            acc.put_u8(byte);
            if let Some(offset) = find(&acc[..], header) {
                acc.advance(offset);
                return DecodeState::WaitingTerminator;
            }
            let keep = header.len() - 1;
            if acc.len() > keep {
                acc.advance(acc.len() - keep);
            }
            DecodeState::ReadingHeader
        }
        DecodeState::WaitingTerminator => {
            acc.put_u8(byte);
            if byte != terminator[0] {
                DecodeState::WaitingTerminator
            } else if terminator.len() > 1 {
                DecodeState::ReadingTerminator
            } else {
                DecodeState::Complete
            }
        }
        DecodeState::ReadingTerminator => {
            acc.put_u8(byte);
            match rfind(&acc[..], terminator) {
                Some(offset) if offset >= header.len() => DecodeState::Complete,
                _ => DecodeState::ReadingTerminator,
            }
        }
        DecodeState::Complete => DecodeState::Complete,
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .rposition(|window| window == needle)
}

/// Decoding state and accumulator for a single read.
#[derive(Debug)]
pub struct Decoder<'a> {
    config: &'a FrameConfig,
    state: DecodeState,
    buf: BytesMut,
}

impl<'a> Decoder<'a> {
    /// Start a fresh decode.
    pub fn new(config: &'a FrameConfig) -> Self {
        Self {
            config,
            state: DecodeState::WaitingHeader,
            buf: BytesMut::new(),
        }
    }

    /// Feed one byte and return the resulting state.
    pub fn push(&mut self, byte: u8) -> DecodeState {
        let previous = self.state;
        self.state = transition(self.config, previous, &mut self.buf, byte);

        if matches!(
            previous,
            DecodeState::WaitingTerminator | DecodeState::ReadingTerminator
        ) && byte == self.config.header()[0]
        {
            debug!(
                from = ?previous,
                "header byte inside frame, resynchronizing"
            );
        } else if previous != self.state {
            debug!(from = ?previous, to = ?self.state, "decode state changed");
        }
        self.state
    }

    /// Current state.
    pub fn state(&self) -> DecodeState {
        self.state
    }

    /// Whether a full frame has been decoded.
    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// Bytes accumulated for the frame in progress.
    pub fn buffered(&self) -> &[u8] {
        &self.buf
    }

    /// The decoded frame, if complete.
    pub fn finish(self) -> Option<Bytes> {
        self.is_complete().then(|| self.buf.freeze())
    }
}
