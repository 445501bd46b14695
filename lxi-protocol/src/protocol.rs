use std::fmt::Display;

/// A SCPI command as it is sent to the instrument.
///
/// Commands are passed through as-is, there is no syntax validation.
/// The line terminator is added when the command is written.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ScpiCommand(String);

impl ScpiCommand {
    /// The command that makes oscilloscopes send the current screen as a binary block.
    pub const DISPLAY_DATA: &'static str = "display:data?";

    pub fn new(command: impl Into<String>) -> ScpiCommand {
        ScpiCommand(command.into())
    }

    /// The command text, without terminator
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the instrument is expected to answer this command.
    /// SCPI queries carry a `?`, e.g. `*IDN?` or `MEAS:VOLT? CH1`.
    pub fn is_query(&self) -> bool {
        self.0.contains('?')
    }
}

impl From<&str> for ScpiCommand {
    fn from(value: &str) -> Self {
        ScpiCommand::new(value)
    }
}

impl From<String> for ScpiCommand {
    fn from(value: String) -> Self {
        ScpiCommand(value)
    }
}

impl Display for ScpiCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[test]
fn query_detection() {
    assert!(ScpiCommand::new("*IDN?").is_query());
    assert!(ScpiCommand::new(ScpiCommand::DISPLAY_DATA).is_query());
    assert!(ScpiCommand::new(":MEAS:VOLT? CH1").is_query());
    assert!(!ScpiCommand::new("*RST").is_query());
    assert!(!ScpiCommand::new(":RUN").is_query());
}

/// A complete response received from the instrument.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Response {
    /// A plain text response with the line terminator removed.
    Text(Box<[u8]>),
    /// The payload of a binary block with header and terminator removed.
    Binary(Box<[u8]>),
}

impl Response {
    /// The decoded payload, regardless of the kind of response.
    pub fn payload(&self) -> &[u8] {
        match self {
            Response::Text(text) => text,
            Response::Binary(data) => data,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Response::Binary(_))
    }

    /// Consumes the response, returning the payload.
    pub fn into_payload(self) -> Box<[u8]> {
        match self {
            Response::Text(text) => text,
            Response::Binary(data) => data,
        }
    }
}

/// The header of a definite length block: `#`, a digit `N` and `N` decimal
/// digits giving the length of the payload.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct BlockHeader {
    digits: u8,
    declared_len: usize,
}

impl BlockHeader {
    pub(crate) fn new(digits: u8, declared_len: usize) -> BlockHeader {
        BlockHeader {
            digits,
            declared_len,
        }
    }

    /// The count of decimal digits of the length field
    pub fn digits(&self) -> u8 {
        self.digits
    }

    /// The payload length that the header announces
    pub fn declared_len(&self) -> usize {
        self.declared_len
    }

    /// The size of the header itself, i.e. the offset of the payload.
    pub fn header_len(&self) -> usize {
        self.digits as usize + 2
    }

    /// The size of the full block: header, payload and terminator.
    pub fn block_len(&self) -> usize {
        self.header_len() + self.declared_len + 1
    }
}
