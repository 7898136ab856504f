use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use std::thread::JoinHandle;

use tracing::info;

use crate::blocking::BlockingSource;
use crate::error::{Result, TransportError};
use crate::polled::FeedBuffer;
use crate::source::ByteSource;

/// Where the serial line is reached.
///
/// - `tcp://host:port`: a serial server exposing the line over TCP
/// - `unix:/path` or `unix:///path`: a Unix domain socket (e.g. a socat relay)
/// - anything else: a character device path, read by a producer thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Tcp(String),
    Unix(PathBuf),
    Device(PathBuf),
}

impl FromStr for Endpoint {
    type Err = TransportError;

    fn from_str(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(TransportError::InvalidEndpoint(
                "endpoint must not be empty".to_string(),
            ));
        }

        if let Some(addr) = input.strip_prefix("tcp://") {
            let addr = addr.trim_end_matches('/');
            if addr.is_empty() || !addr.contains(':') {
                return Err(TransportError::InvalidEndpoint(format!(
                    "tcp endpoint needs host:port, got {input}"
                )));
            }
            return Ok(Self::Tcp(addr.to_string()));
        }

        if let Some(path) = input.strip_prefix("unix:") {
            let path = path.strip_prefix("//").unwrap_or(path);
            if path.is_empty() {
                return Err(TransportError::InvalidEndpoint(format!(
                    "unix endpoint needs a socket path, got {input}"
                )));
            }
            return Ok(Self::Unix(PathBuf::from(path)));
        }

        Ok(Self::Device(PathBuf::from(input)))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp(addr) => write!(f, "tcp://{addr}"),
            Self::Unix(path) => write!(f, "unix:{}", path.display()),
            Self::Device(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Options applied when opening a [`Link`].
#[derive(Debug, Clone)]
pub struct LinkOptions {
    /// Polls per attempt window for sources fed by a producer thread.
    pub poll_retries: u32,
}

impl Default for LinkOptions {
    fn default() -> Self {
        Self { poll_retries: 5 }
    }
}

/// Producer thread filling a device link's [`FeedBuffer`].
///
/// Dropping it closes the feed. The thread cannot be interrupted while it is
/// blocked reading the device, so it exits after that read returns (or at
/// EOF) and releases its handle on the device then.
struct Feeder {
    feed: FeedBuffer,
    handle: Option<JoinHandle<()>>,
}

impl Feeder {
    fn spawn<R>(reader: R, feed: FeedBuffer) -> Result<Self>
    where
        R: std::io::Read + Send + 'static,
    {
        let handle = feed.spawn_reader(reader, "serialhttp-feed")?;
        Ok(Self {
            feed,
            handle: Some(handle),
        })
    }
}

impl Drop for Feeder {
    fn drop(&mut self) {
        self.feed.close();
        if let Some(handle) = self.handle.take() {
            if handle.is_finished() {
                let _ = handle.join();
            }
        }
    }
}

/// An open serial line: a byte source for replies and a writer for queries.
pub struct Link {
    endpoint: Option<Endpoint>,
    source: Box<dyn ByteSource + Send>,
    writer: Box<dyn Write + Send>,
    feeder: Option<Feeder>,
}

impl Link {
    /// Open an endpoint.
    pub fn open(endpoint: &Endpoint, options: &LinkOptions) -> Result<Self> {
        let link = match endpoint {
            Endpoint::Tcp(addr) => {
                let stream = std::net::TcpStream::connect(addr.as_str()).map_err(|e| {
                    TransportError::Connect {
                        endpoint: endpoint.to_string(),
                        source: e,
                    }
                })?;
                stream.set_nodelay(true)?;
                let reader = stream.try_clone()?;
                Self::from_parts(BlockingSource::new(reader), stream)
            }
            #[cfg(unix)]
            Endpoint::Unix(path) => {
                let stream = std::os::unix::net::UnixStream::connect(path).map_err(|e| {
                    TransportError::Connect {
                        endpoint: endpoint.to_string(),
                        source: e,
                    }
                })?;
                let reader = stream.try_clone()?;
                Self::from_parts(BlockingSource::new(reader), stream)
            }
            #[cfg(not(unix))]
            Endpoint::Unix(_) => {
                return Err(TransportError::InvalidEndpoint(format!(
                    "unix sockets are not available on this platform: {endpoint}"
                )));
            }
            Endpoint::Device(path) => {
                let device = std::fs::OpenOptions::new()
                    .read(true)
                    .write(true)
                    .open(path)
                    .map_err(|e| TransportError::Open {
                        path: path.clone(),
                        source: e,
                    })?;
                let reader = device.try_clone()?;
                let feed = FeedBuffer::new();
                let source = feed.source(options.poll_retries);
                let feeder = Feeder::spawn(reader, feed)?;
                Self {
                    feeder: Some(feeder),
                    ..Self::from_parts(source, device)
                }
            }
        };

        info!(%endpoint, "serial link open");
        Ok(Self {
            endpoint: Some(endpoint.clone()),
            ..link
        })
    }

    /// Assemble a link from an existing source and writer.
    pub fn from_parts<S, W>(source: S, writer: W) -> Self
    where
        S: ByteSource + Send + 'static,
        W: Write + Send + 'static,
    {
        Self {
            endpoint: None,
            source: Box::new(source),
            writer: Box::new(writer),
            feeder: None,
        }
    }

    /// The endpoint this link was opened from, if any.
    pub fn endpoint(&self) -> Option<&Endpoint> {
        self.endpoint.as_ref()
    }

    /// Borrow the reply source and the query writer together.
    pub fn split(&mut self) -> (&mut (dyn ByteSource + Send), &mut (dyn Write + Send)) {
        (self.source.as_mut(), self.writer.as_mut())
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("endpoint", &self.endpoint)
            .field("strategy", &self.source.strategy())
            .field("feeder", &self.feeder.is_some())
            .finish()
    }
}
