/// Read and write implementations for commands and responses
use std::io::{self, Write};

use crate::{
    error::FrameError,
    protocol::{Response, ScpiCommand},
    tmc::{self, TERMINATOR},
};

impl ScpiCommand {
    /// Writes the command, terminated by a newline.
    /// Commands that already carry the terminator are written unchanged.
    pub fn write_to(&self, writer: &mut impl Write) -> io::Result<()> {
        let bytes = self.as_str().as_bytes();
        writer.write_all(bytes)?;
        if bytes.last() != Some(&TERMINATOR) {
            writer.write_all(&[TERMINATOR])?;
        }
        Ok(())
    }

    /// The command as raw bytes, as they appear on the wire
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.as_str().len() + 1);
        out.extend_from_slice(self.as_str().as_bytes());
        if out.last() != Some(&TERMINATOR) {
            out.push(TERMINATOR);
        }
        out
    }
}

/// Strips a single trailing line terminator (`\n` or `\r\n`).
pub fn trim_terminator(text: &[u8]) -> &[u8] {
    let text = text.strip_suffix(&[TERMINATOR]).unwrap_or(text);
    text.strip_suffix(b"\r").unwrap_or(text)
}

impl Response {
    /// Classifies a complete response.
    ///
    /// Responses starting with `#` and a digit are blocks and are decoded,
    /// everything else is text. Blocks must carry exactly the number of payload
    /// bytes that their header declares.
    pub fn from_frame(frame: &[u8]) -> Result<Response, FrameError> {
        if tmc::is_block_start(frame) {
            let payload = tmc::decode_checked(frame)?;
            Ok(Response::Binary(frame[payload].into()))
        } else {
            Ok(Response::Text(trim_terminator(frame).into()))
        }
    }
}

#[cfg(feature = "tokio")]
pub use tokio_codec::LxiCodec;

#[cfg(feature = "tokio")]
mod tokio_codec {
    use bytes::{BufMut, BytesMut};
    use tokio_util::codec::{Decoder, Encoder};

    use crate::{
        MAX_MESSAGE_LEN,
        error::FrameError,
        protocol::{BlockHeader, Response, ScpiCommand},
        tmc,
    };

    /// Client side codec: encodes [`ScpiCommand`]s and decodes [`Response`]s.
    #[derive(Debug, Clone)]
    pub struct LxiCodec {
        max_message_len: usize,
    }

    impl LxiCodec {
        pub fn new(max_message_len: usize) -> LxiCodec {
            LxiCodec { max_message_len }
        }
    }

    impl Default for LxiCodec {
        fn default() -> Self {
            LxiCodec::new(MAX_MESSAGE_LEN)
        }
    }

    impl Encoder<ScpiCommand> for LxiCodec {
        type Error = FrameError;

        fn encode(&mut self, item: ScpiCommand, dst: &mut BytesMut) -> Result<(), Self::Error> {
            item.write_to(&mut dst.writer())?;
            Ok(())
        }
    }

    impl Decoder for LxiCodec {
        type Item = Response;
        type Error = FrameError;

        fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
            match tmc::response_len(src, self.max_message_len)? {
                Some(len) => {
                    let frame = src.split_to(len);
                    Response::from_frame(&frame).map(Some)
                }
                None => {
                    // Avoid repeated reallocations while a large block arrives
                    if tmc::is_block_start(src)
                        && let Ok(header) = BlockHeader::parse(src)
                    {
                        src.reserve(header.block_len().saturating_sub(src.len()));
                    }
                    Ok(None)
                }
            }
        }

        fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
            if let Some(response) = self.decode(src)? {
                return Ok(Some(response));
            }
            if src.is_empty() {
                return Ok(None);
            }
            if tmc::is_block_start(src) {
                let header = BlockHeader::parse(src)?;
                return Err(FrameError::Incomplete {
                    needed: header.block_len(),
                    got: src.len(),
                });
            }
            // The last text response may lack its terminator
            let frame = src.split();
            Response::from_frame(&frame).map(Some)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn write_command() {
        let mut out = Vec::new();
        ScpiCommand::new("*IDN?").write_to(&mut out).unwrap();
        assert_eq!(out, b"*IDN?\n");
    }

    #[test]
    fn write_terminated_command() {
        assert_eq!(ScpiCommand::new(":RUN\n").to_bytes(), b":RUN\n");
    }

    #[test]
    fn bytes_match_written_command() {
        for command in ["*IDN?", ":RUN\n", "", ":DISP:DATA? ON,OFF,BMP"] {
            let command = ScpiCommand::new(command);
            let mut written = Vec::new();
            command.write_to(&mut written).unwrap();
            assert_eq!(command.to_bytes(), written);
        }
    }

    #[test]
    fn trim() {
        assert_eq!(trim_terminator(b"1.25E-3\n"), b"1.25E-3");
        assert_eq!(trim_terminator(b"1.25E-3\r\n"), b"1.25E-3");
        assert_eq!(trim_terminator(b"1.25E-3"), b"1.25E-3");
        assert_eq!(trim_terminator(b"two\n\n"), b"two\n");
        assert_eq!(trim_terminator(b""), b"");
    }

    #[test]
    fn classify_text() {
        let response = Response::from_frame(b"RIGOL TECHNOLOGIES,DS1104Z,DS1ZA0000,00.04.04\n").unwrap();
        assert_eq!(
            response,
            Response::Text((*b"RIGOL TECHNOLOGIES,DS1104Z,DS1ZA0000,00.04.04").into())
        );
        assert!(!response.is_binary());
    }

    #[test]
    fn classify_text_with_hash() {
        let response = Response::from_frame(b"#not a block\n").unwrap();
        assert_eq!(response, Response::Text((*b"#not a block").into()));
    }

    #[test]
    fn classify_block() {
        let response = Response::from_frame(b"#212\x00\x01\x02\x03\x04\x05\x06\x07\x08\x09\n\x0b\n").unwrap();
        assert!(response.is_binary());
        assert_eq!(response.payload(), b"\x00\x01\x02\x03\x04\x05\x06\x07\x08\x09\n\x0b");
    }

    #[test]
    fn classify_broken_block() {
        assert!(matches!(
            Response::from_frame(b"#0\n"),
            Err(FrameError::UnsupportedLengthDigits(0))
        ));
        assert!(matches!(
            Response::from_frame(b"#15abc\n"),
            Err(FrameError::LengthMismatch {
                declared: 5,
                actual: 3
            })
        ));
    }
}
