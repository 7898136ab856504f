use std::path::PathBuf;

/// Errors that can occur while opening or driving a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The endpoint string could not be understood.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Failed to connect to a network or socket endpoint.
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        source: std::io::Error,
    },

    /// Failed to open a character device.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on an open transport.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
