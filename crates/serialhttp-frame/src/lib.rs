//! Header/terminator delimited frame extraction.
//!
//! This is the core of serialhttp. A reply on the serial line is a run of
//! bytes that starts with a configurable header and ends with a configurable
//! terminator, possibly surrounded by noise. [`FrameExtractor::read`] pulls
//! bytes from a [`ByteSource`](serialhttp_transport::ByteSource) and returns
//! at most one complete frame within the configured time budget.
//!
//! - [`FrameConfig`] holds the immutable header, terminator and total timeout
//! - [`transition`] is the pure decoding step, [`Decoder`] wraps it for one read
//! - [`QueryWriter`] writes the query that precedes each read

pub mod config;
pub mod decoder;
pub mod error;
pub mod extractor;
pub mod writer;

pub use config::{FrameConfig, MIN_ATTEMPT_TIMEOUT, TIMEOUT_FRACTIONS};
pub use decoder::{transition, DecodeState, Decoder};
pub use error::{FrameError, Result};
pub use extractor::{FrameExtractor, ReadResult};
pub use writer::QueryWriter;
