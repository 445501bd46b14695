use std::{error::Error, fmt::Display, io};

/// Errors that may occur when framing or deframing a response.
#[derive(Debug)]
pub enum FrameError {
    IoError(io::Error),
    /// The buffer does not start with the `#` block prefix.
    NotABlock,
    /// The header contains bytes that are not valid for its position.
    InvalidHeader(String),
    /// The count of length digits is outside of `1..=9`.
    /// `0` is the indefinite length form, which is not supported.
    UnsupportedLengthDigits(u8),
    /// The buffer ends before the header and terminator are complete.
    Incomplete { needed: usize, got: usize },
    /// The payload does not have the length the header declares.
    LengthMismatch { declared: usize, actual: usize },
    /// A payload that cannot be expressed with the given count of length digits.
    PayloadTooLarge { len: usize, digits: u8 },
    /// A response that exceeds the maximum message size.
    TooLarge { max: usize, got: usize },
}

impl From<io::Error> for FrameError {
    fn from(value: io::Error) -> Self {
        FrameError::IoError(value)
    }
}

impl Display for FrameError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameError::IoError(error) => write!(f, "{}", error),
            FrameError::NotABlock => write!(f, "Response is not a binary block"),
            FrameError::InvalidHeader(reason) => write!(f, "Invalid block header: {}", reason),
            FrameError::UnsupportedLengthDigits(digits) => {
                write!(f, "Unsupported count of block length digits {}", digits)
            }
            FrameError::Incomplete { needed, got } => {
                write!(f, "Incomplete block: need {} bytes, got {}", needed, got)
            }
            FrameError::LengthMismatch { declared, actual } => write!(
                f,
                "Block declares {} payload bytes, but contains {}",
                declared, actual
            ),
            FrameError::PayloadTooLarge { len, digits } => write!(
                f,
                "Payload of {} bytes does not fit into {} length digits",
                len, digits
            ),
            FrameError::TooLarge { max, got } => {
                write!(f, "Message too large! Maximum is {}, but got {}", max, got)
            }
        }
    }
}

impl Error for FrameError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            FrameError::IoError(error) => Some(error),
            _ => None,
        }
    }
}
