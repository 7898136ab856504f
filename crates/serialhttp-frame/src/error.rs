/// Errors that can occur while configuring, reading or writing frames.
///
/// Running out of time is not an error; it is reported as
/// [`ReadResult::NoMessage`](crate::ReadResult::NoMessage).
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The configured header is empty.
    #[error("frame header must not be empty")]
    EmptyHeader,

    /// The configured terminator is empty.
    #[error("frame terminator must not be empty")]
    EmptyTerminator,

    /// The read was cancelled before a complete frame arrived.
    #[error("read cancelled before a complete frame arrived")]
    Cancelled,

    /// The source closed before a complete frame arrived.
    #[error("source closed before a complete frame arrived")]
    SourceClosed,

    /// The transport accepted no bytes while writing a query.
    #[error("connection closed while writing query")]
    ConnectionClosed,

    /// An I/O error occurred on the transport.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// Whether this error comes from invalid configuration rather than a read.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::EmptyHeader | Self::EmptyTerminator)
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
