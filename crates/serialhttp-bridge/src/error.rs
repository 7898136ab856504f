use serialhttp_frame::FrameError;
use serialhttp_transport::TransportError;

/// Errors that can occur while configuring or running a bridge exchange.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Frame-level error (configuration, cancellation, line fault).
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// A hex-encoded configuration value could not be decoded.
    #[error("invalid hex value {value:?}: {source}")]
    InvalidHex {
        value: String,
        source: hex::FromHexError,
    },

    /// The response pattern does not compile.
    #[error("invalid response pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A frame arrived but did not match the response pattern.
    #[error("response does not match pattern {pattern}")]
    ResponseRejected { pattern: String },
}

impl BridgeError {
    /// Whether the exchange stopped because it was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Frame(FrameError::Cancelled))
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
