//! Definite length arbitrary blocks (IEEE 488.2), also known as TMC blocks.
//!
//! A block is laid out as `#N<length><payload><terminator>`, where `N` is a
//! single ASCII digit giving the count of decimal digits in `<length>`.
use std::{io::Write, ops::Range};

use crate::{error::FrameError, protocol::BlockHeader};

/// First byte of every block
pub const BLOCK_PREFIX: u8 = b'#';
/// The byte that terminates responses and commands
pub const TERMINATOR: u8 = b'\n';
/// Only a single digit is available to encode the width of the length field
pub const MAX_LENGTH_DIGITS: u8 = 9;

/// Whether `buf` starts like a block, i.e. with `#` followed by a digit.
pub fn is_block_start(buf: &[u8]) -> bool {
    matches!(buf, [BLOCK_PREFIX, digit, ..] if digit.is_ascii_digit())
}

impl BlockHeader {
    /// Parses the header at the start of `buf`.
    ///
    /// Returns [`FrameError::Incomplete`] if `buf` ends inside the header.
    pub fn parse(buf: &[u8]) -> Result<BlockHeader, FrameError> {
        match buf.first() {
            Some(&BLOCK_PREFIX) => {}
            Some(_) => return Err(FrameError::NotABlock),
            None => return Err(FrameError::Incomplete { needed: 2, got: 0 }),
        }
        let digits = match buf.get(1) {
            Some(c @ b'1'..=b'9') => c - b'0',
            Some(b'0') => return Err(FrameError::UnsupportedLengthDigits(0)),
            Some(c) => {
                return Err(FrameError::InvalidHeader(format!(
                    "expected count of length digits, got {:?}",
                    *c as char
                )));
            }
            None => return Err(FrameError::Incomplete { needed: 2, got: 1 }),
        };

        let header_len = digits as usize + 2;
        let length_field = buf.get(2..header_len).ok_or(FrameError::Incomplete {
            needed: header_len,
            got: buf.len(),
        })?;
        if !length_field.iter().all(u8::is_ascii_digit) {
            return Err(FrameError::InvalidHeader(format!(
                "length field {:?} is not decimal",
                String::from_utf8_lossy(length_field)
            )));
        }
        let declared_len = length_field
            .iter()
            .fold(0_usize, |len, digit| len * 10 + (digit - b'0') as usize);

        Ok(BlockHeader::new(digits, declared_len))
    }
}

fn payload_range(buf: &[u8], header: &BlockHeader) -> Result<Range<usize>, FrameError> {
    let start = header.header_len();
    // At least the terminator must follow the header
    if buf.len() < start + 1 {
        return Err(FrameError::Incomplete {
            needed: start + 1,
            got: buf.len(),
        });
    }
    Ok(start..buf.len() - 1)
}

/// Locates the payload of the block in `buf`.
///
/// The header only determines where the payload starts. The payload extends
/// up to, but excluding, the last byte of `buf`, which is the terminator.
/// Use [`decode_checked`] to also verify the declared length.
pub fn decode(buf: &[u8]) -> Result<Range<usize>, FrameError> {
    let header = BlockHeader::parse(buf)?;
    payload_range(buf, &header)
}

/// Like [`decode`], but fails if the payload length differs from the length
/// declared in the header.
pub fn decode_checked(buf: &[u8]) -> Result<Range<usize>, FrameError> {
    let header = BlockHeader::parse(buf)?;
    let payload = payload_range(buf, &header)?;
    if payload.len() != header.declared_len() {
        return Err(FrameError::LengthMismatch {
            declared: header.declared_len(),
            actual: payload.len(),
        });
    }
    Ok(payload)
}

/// Writes `payload` as a block using as few length digits as possible.
pub fn encode(payload: &[u8], writer: &mut impl Write) -> Result<(), FrameError> {
    let digits = payload.len().to_string().len();
    if digits > MAX_LENGTH_DIGITS as usize {
        return Err(FrameError::PayloadTooLarge {
            len: payload.len(),
            digits: MAX_LENGTH_DIGITS,
        });
    }
    encode_with_digits(payload, digits as u8, writer)
}

/// Writes `payload` as a block whose length field is zero-padded to `digits` digits.
pub fn encode_with_digits(
    payload: &[u8],
    digits: u8,
    writer: &mut impl Write,
) -> Result<(), FrameError> {
    if !(1..=MAX_LENGTH_DIGITS).contains(&digits) {
        return Err(FrameError::UnsupportedLengthDigits(digits));
    }
    let length_field = format!("{:0width$}", payload.len(), width = digits as usize);
    if length_field.len() > digits as usize {
        return Err(FrameError::PayloadTooLarge {
            len: payload.len(),
            digits,
        });
    }
    writer.write_all(&[BLOCK_PREFIX, b'0' + digits])?;
    writer.write_all(length_field.as_bytes())?;
    writer.write_all(payload)?;
    writer.write_all(&[TERMINATOR])?;
    Ok(())
}

/// Determines whether `buf` starts with a complete response.
///
/// Blocks are complete once the declared payload and the terminator have
/// arrived; text responses once a line terminator has arrived. Returns the
/// size of the response, or `None` if more bytes are needed.
/// Responses larger than `max_len` are rejected as early as possible,
/// for blocks already when the header has been received.
pub fn response_len(buf: &[u8], max_len: usize) -> Result<Option<usize>, FrameError> {
    if matches!(buf, [] | [BLOCK_PREFIX]) {
        return Ok(None);
    }
    if is_block_start(buf) {
        let header = match BlockHeader::parse(buf) {
            Ok(header) => header,
            Err(FrameError::Incomplete { .. }) => return Ok(None),
            Err(other) => return Err(other),
        };
        let block_len = header.block_len();
        if block_len > max_len {
            return Err(FrameError::TooLarge {
                max: max_len,
                got: block_len,
            });
        }
        return Ok((buf.len() >= block_len).then_some(block_len));
    }
    match buf.iter().position(|b| *b == TERMINATOR) {
        Some(pos) if pos < max_len => Ok(Some(pos + 1)),
        Some(pos) => Err(FrameError::TooLarge {
            max: max_len,
            got: pos + 1,
        }),
        None if buf.len() >= max_len => Err(FrameError::TooLarge {
            max: max_len,
            got: buf.len() + 1,
        }),
        None => Ok(None),
    }
}
