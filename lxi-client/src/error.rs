use std::{error::Error, fmt::Display, io};

use lxi_protocol::error::FrameError;

/// Errors that abort an exchange with an instrument.
#[derive(Debug)]
pub enum ExchangeError {
    /// The connection could not be established or broke down.
    Connection(io::Error),
    /// No complete response arrived before the deadline.
    Timeout,
    /// A block ended before its declared length.
    TruncatedResponse { expected: usize, received: usize },
    /// The response is not framed correctly.
    Frame(FrameError),
    /// The response exceeds the maximum message size.
    MessageTooLarge { max: usize, got: usize },
    /// Writing the result to a local file or the terminal failed.
    Io(io::Error),
}

impl From<FrameError> for ExchangeError {
    fn from(value: FrameError) -> Self {
        match value {
            FrameError::TooLarge { max, got } => ExchangeError::MessageTooLarge { max, got },
            FrameError::IoError(error) => ExchangeError::Io(error),
            other => ExchangeError::Frame(other),
        }
    }
}

impl Display for ExchangeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExchangeError::Connection(error) => write!(f, "Connection error: {}", error),
            ExchangeError::Timeout => write!(f, "Timeout waiting for response"),
            ExchangeError::TruncatedResponse { expected, received } => write!(
                f,
                "Truncated response: expected {} bytes, received {}",
                expected, received
            ),
            ExchangeError::Frame(error) => write!(f, "{}", error),
            ExchangeError::MessageTooLarge { max, got } => {
                write!(f, "Message too large! Maximum is {}, but got {}", max, got)
            }
            ExchangeError::Io(error) => write!(f, "{}", error),
        }
    }
}

impl Error for ExchangeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ExchangeError::Connection(error) | ExchangeError::Io(error) => Some(error),
            ExchangeError::Frame(error) => Some(error),
            _ => None,
        }
    }
}
