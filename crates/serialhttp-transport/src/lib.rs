//! Byte sources over serial-style transports.
//!
//! Everything above this crate consumes bytes through one capability,
//! [`ByteSource::try_read_byte`]. Two strategies implement it:
//! - [`BlockingSource`] for streams that block natively with a read timeout
//!   (TCP, Unix domain sockets)
//! - [`PolledSource`] over a [`FeedBuffer`] filled by an independent producer
//!   (a reader thread on a character device)
//!
//! [`Link`] opens an [`Endpoint`] and hands back the matching source plus a
//! writer for the query side.

pub mod blocking;
pub mod error;
pub mod link;
pub mod polled;
pub mod source;

pub use blocking::{BlockingSource, TimedRead};
pub use error::{Result, TransportError};
pub use link::{Endpoint, Link, LinkOptions};
pub use polled::{FeedBuffer, PolledSource, FEED_CAPACITY};
pub use source::{sleep_cancellable, ByteRead, ByteSource, ReadStrategy, CANCEL_CHECK_INTERVAL};
