use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use serialhttp_frame::{FrameConfig, FrameExtractor, QueryWriter, ReadResult};
use serialhttp_transport::{Link, TransportError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::Result;
use crate::filter::ResponseFilter;

/// What a bridge exchange sends and expects back.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Bytes written to the line before every read.
    pub query: Bytes,
    /// Reply frame delimiters and read budget.
    pub frame: FrameConfig,
    /// Optional validation/rewrite of reply frames.
    pub filter: Option<ResponseFilter>,
}

/// Result of a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The reply frame (after filtering).
    Body(Bytes),
    /// No complete frame arrived within the budget.
    NoData,
}

/// Serializes query-then-read cycles on one serial link.
pub struct Bridge {
    link: Mutex<Link>,
    query: Bytes,
    extractor: FrameExtractor,
    filter: Option<ResponseFilter>,
}

impl Bridge {
    /// Create a bridge owning `link`.
    pub fn new(link: Link, config: BridgeConfig) -> Self {
        Self {
            link: Mutex::new(link),
            query: config.query,
            extractor: FrameExtractor::new(config.frame),
            filter: config.filter,
        }
    }

    /// Write the query and read one reply frame.
    ///
    /// Input that arrived before the query (unsolicited output, a reply that
    /// came too late for the previous exchange) is discarded first, so the
    /// frame returned always follows this query.
    ///
    /// Concurrent callers wait for the link; each exchange runs to completion
    /// before the next query is written.
    pub fn exchange(&self, cancel: &CancellationToken) -> Result<Reply> {
        let mut link = self.link.lock().unwrap_or_else(PoisonError::into_inner);
        let (source, writer) = link.split();

        let stale = source.discard_pending().map_err(TransportError::from)?;
        if stale > 0 {
            debug!(bytes = stale, "discarded input received before the query");
        }

        QueryWriter::new(writer).send(&self.query)?;
        debug!(bytes = self.query.len(), "query sent");

        let frame = match self.extractor.read(source, cancel) {
            Ok(ReadResult::Message(frame)) => frame,
            Ok(ReadResult::NoMessage) => return Ok(Reply::NoData),
            Err(err) => {
                warn!(error = %err, "reply read failed");
                return Err(err.into());
            }
        };

        match &self.filter {
            Some(filter) => filter.apply(&frame).map(Reply::Body).inspect_err(|err| {
                warn!(error = %err, len = frame.len(), "reply rejected");
            }),
            None => Ok(Reply::Body(frame)),
        }
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("query", &self.query)
            .field("frame", self.extractor.config())
            .field("filter", &self.filter)
            .finish()
    }
}
