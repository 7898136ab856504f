use bytes::Bytes;
use serialhttp_frame::FrameError;

use crate::bridge::Reply;
use crate::error::{BridgeError, Result};

pub const OK: u16 = 200;
pub const NO_DATA: u16 = 404;
pub const INTERNAL_ERROR: u16 = 500;
pub const BAD_GATEWAY: u16 = 502;
pub const UNAVAILABLE: u16 = 503;

const NO_DATA_BODY: &str = "no data";

/// Status and body returned to the requesting side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub status: u16,
    pub body: Bytes,
}

impl Outcome {
    /// Map an exchange result.
    ///
    /// | result | status |
    /// |---|---|
    /// | reply body | 200 |
    /// | no frame in time | 404, `no data` |
    /// | frame rejected by the response filter | 502 |
    /// | cancelled (shutting down) | 503 |
    /// | anything else | 500 |
    pub fn from_result(result: &Result<Reply>) -> Self {
        match result {
            Ok(Reply::Body(body)) => Self {
                status: OK,
                body: body.clone(),
            },
            Ok(Reply::NoData) => Self {
                status: NO_DATA,
                body: Bytes::from_static(NO_DATA_BODY.as_bytes()),
            },
            Err(err) => Self::error(status_for(err), err.to_string()),
        }
    }

    /// An error outcome with diagnostic text.
    pub fn error(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status,
            body: Bytes::from(detail.into()),
        }
    }
}

fn status_for(err: &BridgeError) -> u16 {
    match err {
        BridgeError::ResponseRejected { .. } => BAD_GATEWAY,
        BridgeError::Frame(FrameError::Cancelled) => UNAVAILABLE,
        _ => INTERNAL_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_maps_to_ok() {
        let outcome = Outcome::from_result(&Ok(Reply::Body(Bytes::from_static(b"[42]"))));
        assert_eq!(outcome.status, OK);
        assert_eq!(outcome.body.as_ref(), b"[42]");
    }

    #[test]
    fn no_data_is_not_a_server_error() {
        let outcome = Outcome::from_result(&Ok(Reply::NoData));
        assert_eq!(outcome.status, NO_DATA);
        assert!(outcome.status < 500);
        assert_eq!(outcome.body.as_ref(), b"no data");
    }

    #[test]
    fn rejected_response_is_bad_gateway() {
        let err = BridgeError::ResponseRejected {
            pattern: "^ok$".to_string(),
        };
        let outcome = Outcome::from_result(&Err(err));
        assert_eq!(outcome.status, BAD_GATEWAY);
        assert!(String::from_utf8_lossy(&outcome.body).contains("^ok$"));
    }

    #[test]
    fn cancellation_is_distinct_from_faults() {
        let cancelled = Outcome::from_result(&Err(FrameError::Cancelled.into()));
        let closed = Outcome::from_result(&Err(FrameError::SourceClosed.into()));
        assert_eq!(cancelled.status, UNAVAILABLE);
        assert_eq!(closed.status, INTERNAL_ERROR);
        assert!(String::from_utf8_lossy(&closed.body).contains("source closed"));
    }

    #[test]
    fn io_faults_carry_diagnostics() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "line dropped");
        let outcome = Outcome::from_result(&Err(FrameError::Io(io).into()));
        assert_eq!(outcome.status, INTERNAL_ERROR);
        assert!(String::from_utf8_lossy(&outcome.body).contains("line dropped"));
    }
}
