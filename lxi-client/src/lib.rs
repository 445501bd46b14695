//! # LXI Client
//!
//! A Rust client library for sending SCPI commands to LXI instruments over the raw
//! socket protocol and retrieving their responses.
//!
//! ## Overview
//!
//! This crate performs the exchange with an instrument: it sends a command, collects the
//! response within a deadline, and decodes it into text or, for binary block responses,
//! into the raw payload. Binary responses are used for screenshots, waveform data and
//! similar bulk transfers.
//!
//! For details on the framing, see the [`lxi_protocol`](https://docs.rs/lxi-protocol/) crate.
//!
//! ## Basic Usage
//!
//! ### Querying an Instrument
//!
//! ```ignore
//! use lxi_client::{Config, LxiClient};
//!
//! let mut client = LxiClient::connect("192.168.1.20", Config::default())?;
//! let idn = client.query(&"*IDN?".into())?;
//! println!("{}", String::from_utf8_lossy(idn.payload()));
//! ```
//!
//! ### Capturing a Screenshot
//!
//! ```ignore
//! use lxi_client::Builder;
//! use std::time::Duration;
//!
//! let client = Builder::new()
//!     .timeout(Duration::from_secs(5))
//!     .connect("192.168.1.20")?;
//! let written = client.save_screenshot("screen.bmp")?;
//! ```
//!
//! ## Exchange Model
//!
//! Every exchange is synchronous: the command is sent, then the response is received.
//! Commands without a `?` are not queries and are only sent, since instruments do not answer
//! them. A failure at any point aborts the exchange, there are no retries.
//! The connection is closed when the [`LxiClient`] is dropped.
//!
//! ## Logging
//!
//! This crate uses the `log` crate for diagnostics. Enable logging to see connections,
//! commands and response sizes. Raw received data is logged at trace level.
pub mod error;
pub mod output;
pub mod transport;

use std::{
    path::Path,
    time::{Duration, Instant},
};

use lxi_protocol::{BlockHeader, DEFAULT_PORT, MAX_MESSAGE_LEN, Response, ScpiCommand, tmc};
use lxi_protocol::error::FrameError;

pub use error::ExchangeError;
pub use output::Routing;
pub use transport::{TcpTransport, Transport};

const RECEIVE_CHUNK_LEN: usize = 64 * 1024;

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Config {
    pub port: u16,
    pub timeout: Duration,
    pub max_message_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout: Duration::from_secs(1),
            max_message_size: MAX_MESSAGE_LEN,
        }
    }
}

/// Builder to create a [LxiClient] instance and modify configuration options
///
/// # Example
///
/// ```ignore
/// use lxi_client::Builder;
/// use std::time::Duration;
///
/// let client = Builder::new()
///     .port(5555)
///     .timeout(Duration::from_secs(3))
///     .connect("192.168.1.20")?;
/// ```
#[derive(Default)]
pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Set the TCP port of the instrument
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the deadline for connecting, sending and receiving a response
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the largest response that will be accepted.
    pub fn max_message_size(mut self, size: usize) -> Self {
        self.config.max_message_size = size;
        self
    }

    pub fn config(self) -> Config {
        self.config
    }

    /// Connect to the instrument at `host`
    pub fn connect(self, host: &str) -> Result<LxiClient, ExchangeError> {
        LxiClient::connect(host, self.config)
    }

    /// Build a client communicating through `transport`
    pub fn build<T: Transport>(self, transport: T) -> LxiClient<T> {
        LxiClient::new(transport, self.config)
    }
}

/// Client for a single LXI instrument.
///
/// Owns the connection for its whole lifetime.
#[derive(Debug)]
pub struct LxiClient<T: Transport = TcpTransport> {
    transport: T,
    config: Config,
    /// Start of a response that did not complete before its deadline.
    /// The rest of it may still arrive and must not be taken for the next response.
    abandoned: Option<Vec<u8>>,
}

impl LxiClient<TcpTransport> {
    /// Connect to `host` on the configured port.
    /// `host` may be an IP address or a host name.
    pub fn connect(host: &str, config: Config) -> Result<LxiClient, ExchangeError> {
        log::info!("Connecting to {}:{}", host, config.port);
        let transport = TcpTransport::connect((host, config.port), config.timeout)
            .map_err(ExchangeError::Connection)?;
        if let Ok(addr) = transport.peer_addr() {
            log::info!("Connected to {}", addr);
        }
        Ok(LxiClient::new(transport, config))
    }
}

impl<T: Transport> LxiClient<T> {
    pub fn new(transport: T, config: Config) -> LxiClient<T> {
        LxiClient {
            transport,
            config,
            abandoned: None,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a command without waiting for a response.
    pub fn send(&mut self, command: &ScpiCommand) -> Result<(), ExchangeError> {
        log::debug!("Sending command {:?}", command.as_str());
        self.transport
            .send(&command.to_bytes(), self.config.timeout)
            .map_err(|e| {
                if transport::is_timeout(&e) {
                    ExchangeError::Timeout
                } else {
                    ExchangeError::Connection(e)
                }
            })
    }

    /// Receive and decode one response.
    pub fn receive(&mut self) -> Result<Response, ExchangeError> {
        let frame = self.receive_frame()?;
        let response = Response::from_frame(&frame)?;
        log::debug!(
            "Received {} response with {} payload bytes",
            if response.is_binary() { "binary" } else { "text" },
            response.payload().len()
        );
        Ok(response)
    }

    /// Send a command and receive its response.
    pub fn query(&mut self, command: &ScpiCommand) -> Result<Response, ExchangeError> {
        self.send(command)?;
        self.receive()
    }

    /// Send a command and, if it is a query, receive its response.
    pub fn execute(&mut self, command: &ScpiCommand) -> Result<Option<Response>, ExchangeError> {
        if command.is_query() {
            self.query(command).map(Some)
        } else {
            self.send(command).map(|_| None)
        }
    }

    /// Request the current screen contents.
    /// The instrument must answer with a binary block, the image format depends on the instrument.
    pub fn screenshot(&mut self) -> Result<Box<[u8]>, ExchangeError> {
        match self.query(&ScpiCommand::new(ScpiCommand::DISPLAY_DATA))? {
            Response::Binary(image) => Ok(image),
            Response::Text(_) => Err(ExchangeError::Frame(FrameError::NotABlock)),
        }
    }

    /// Capture a screenshot and save it to `path`.
    ///
    /// The connection is closed before the file is written.
    /// Nothing is written if the exchange fails.
    ///
    /// # Returns
    ///
    /// The size of the image in bytes
    pub fn save_screenshot(mut self, path: impl AsRef<Path>) -> Result<usize, ExchangeError> {
        let image = self.screenshot()?;
        drop(self);
        output::file_dump(&image, path)?;
        Ok(image.len())
    }

    /// Collect bytes until a complete response is buffered or the deadline passes.
    ///
    /// The late rest of an abandoned response is read and discarded first.
    fn receive_frame(&mut self) -> Result<Vec<u8>, ExchangeError> {
        let deadline = Instant::now() + self.config.timeout;
        let max_len = self.config.max_message_size;
        let mut discarding = self.abandoned.is_some();
        let mut buf = self.abandoned.take().unwrap_or_default();
        let mut chunk = vec![0_u8; RECEIVE_CHUNK_LEN];

        loop {
            if let Some(len) = tmc::response_len(&buf, max_len)? {
                if discarding {
                    log::warn!("Discarding {} bytes of an abandoned response", len);
                    buf.drain(..len);
                    discarding = false;
                    continue;
                }
                if buf.len() > len {
                    log::warn!("Discarding {} unexpected bytes after response", buf.len() - len);
                    buf.truncate(len);
                }
                return Ok(buf);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(self.abandon(buf, discarding));
            }

            match self.transport.receive(&mut chunk, remaining) {
                Ok(0) => {
                    if buf.is_empty() || discarding {
                        return Err(ExchangeError::Connection(std::io::Error::new(
                            std::io::ErrorKind::UnexpectedEof,
                            "connection closed by instrument",
                        )));
                    }
                    if let Some(error) = truncated(&buf) {
                        return Err(error);
                    }
                    log::debug!("Connection closed after unterminated text response");
                    return Ok(buf);
                }
                Ok(n) => {
                    log::trace!("Received {} bytes: {:02x?}", n, &chunk[..n.min(64)]);
                    buf.extend_from_slice(&chunk[..n]);
                }
                Err(e) if transport::is_timeout(&e) => return Err(self.abandon(buf, discarding)),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ExchangeError::Connection(e)),
            }
        }
    }

    /// Gives up on the buffered response when the deadline passes.
    /// Anything already received is kept so that the rest of the response is skipped later.
    fn abandon(&mut self, buf: Vec<u8>, discarding: bool) -> ExchangeError {
        let error = if discarding {
            ExchangeError::Timeout
        } else {
            truncated(&buf).unwrap_or(ExchangeError::Timeout)
        };
        if !buf.is_empty() {
            log::debug!("Abandoning {} bytes of an incomplete response", buf.len());
            self.abandoned = Some(buf);
        }
        error
    }
}

/// The error for an incomplete buffer, if it holds the start of a block.
fn truncated(buf: &[u8]) -> Option<ExchangeError> {
    if !tmc::is_block_start(buf) {
        return None;
    }
    let expected = match BlockHeader::parse(buf) {
        Ok(header) => header.block_len(),
        Err(FrameError::Incomplete { needed, .. }) => needed,
        Err(other) => return Some(other.into()),
    };
    Some(ExchangeError::TruncatedResponse {
        expected,
        received: buf.len(),
    })
}

/// Capture the screen of the instrument at `host` and save it to `filename`.
///
/// # Returns
///
/// The number of bytes written
pub fn run_screenshot_capture(
    host: &str,
    filename: impl AsRef<Path>,
    config: Config,
) -> Result<usize, ExchangeError> {
    LxiClient::connect(host, config)?.save_screenshot(filename)
}

/// Send a single command to the instrument at `host`.
///
/// # Returns
///
/// The response if the command is a query, `None` otherwise
pub fn run_scpi_command(
    host: &str,
    command: &ScpiCommand,
    config: Config,
) -> Result<Option<Response>, ExchangeError> {
    LxiClient::connect(host, config)?.execute(command)
}
