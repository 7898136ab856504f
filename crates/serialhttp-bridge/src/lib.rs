//! Query-then-read bridge between a request/response endpoint and a serial line.
//!
//! Each request writes the configured query to the line, waits for one
//! delimited reply frame and turns the outcome into an [`Outcome`]: a body,
//! a "no data" answer, or an error with diagnostic text. Exchanges on one
//! [`Bridge`] are serialized so replies never interleave.

pub mod bridge;
pub mod encoding;
pub mod error;
pub mod filter;
#[cfg(feature = "http")]
pub mod http;
pub mod outcome;

pub use bridge::{Bridge, BridgeConfig, Reply};
pub use encoding::{decode_hex, decode_value};
pub use error::{BridgeError, Result};
pub use filter::ResponseFilter;
pub use outcome::Outcome;
