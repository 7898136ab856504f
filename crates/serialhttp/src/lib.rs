//! Serve replies from a serial line over HTTP.
//!
//! Every request writes a configured query to the line and answers with the
//! next reply frame, delimited by a header and a terminator.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte sources over TCP, Unix sockets and character devices
//! - [`frame`]: header/terminator frame extraction with bounded waits
//! - [`bridge`]: serialized query-then-read exchanges and the HTTP endpoint (`http` feature)

/// Re-export transport types.
pub mod transport {
    pub use serialhttp_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use serialhttp_frame::*;
}

/// Re-export bridge types.
pub mod bridge {
    pub use serialhttp_bridge::*;
}
