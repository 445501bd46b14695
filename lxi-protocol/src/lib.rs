//! # LXI Protocol Library
//!
//! This crate implements the message layer of the LXI raw socket protocol: SCPI commands
//! sent as text lines over TCP, and responses that are either text lines or binary data
//! framed as IEEE 488.2 definite length arbitrary blocks (commonly called TMC blocks).
//!
//! ## Overview
//!
//! Instruments such as oscilloscopes, power supplies or multimeters that implement LXI
//! listen on a raw TCP socket (port 5025 by default). This library allows you to:
//!
//! - Serialize SCPI commands
//! - Detect when a complete response has been received
//! - Decode binary blocks, e.g. screenshots or waveform data
//! - Encode payloads as binary blocks
//!
//! ## Block Format
//!
//! ```text
//! #N<length><payload><terminator>
//! ```
//!
//! - `#` starts the block
//! - `N` is a single ASCII digit (1-9) giving the number of digits in `<length>`
//! - `<length>` is the decimal length of `<payload>`
//! - `<terminator>` is a single byte following the payload, usually `\n`
//!
//! ## Basic Usage
//!
//! ### Decoding a Block
//!
//! ```
//! use lxi_protocol::tmc;
//!
//! let response = b"#15hello\n";
//! let payload = tmc::decode(response).expect("Block should decode");
//! assert_eq!(&response[payload], b"hello");
//! ```
//!
//! ### Classifying Responses
//!
//! ```
//! use lxi_protocol::Response;
//!
//! let text = Response::from_frame(b"RIGOL TECHNOLOGIES,DS1104Z,DS1ZA0000,00.04.04\n").unwrap();
//! assert_eq!(text.payload(), b"RIGOL TECHNOLOGIES,DS1104Z,DS1ZA0000,00.04.04");
//!
//! let block = Response::from_frame(b"#14\x01\x02\x03\x04\n").unwrap();
//! assert!(block.is_binary());
//! assert_eq!(block.payload(), b"\x01\x02\x03\x04");
//! ```
//!
//! ### Writing Commands
//!
//! ```
//! use lxi_protocol::ScpiCommand;
//!
//! let mut buffer = Vec::new();
//! ScpiCommand::new("*IDN?").write_to(&mut buffer).expect("Writing to vector shouldn't fail");
//! assert_eq!(buffer, b"*IDN?\n");
//! ```
//!
//! ### Receiving Responses
//!
//! [`tmc::response_len`] tells whether a receive buffer holds a complete response.
//! Text responses end with a newline. Blocks end after the declared payload and the terminator,
//! so newlines inside binary data do not end them.
//!
//! ```
//! use lxi_protocol::{MAX_MESSAGE_LEN, tmc};
//!
//! assert_eq!(tmc::response_len(b"#14a\nb", MAX_MESSAGE_LEN).unwrap(), None);
//! assert_eq!(tmc::response_len(b"#14a\nbc\n", MAX_MESSAGE_LEN).unwrap(), Some(8));
//! ```
//!
//! ## Error Handling
//!
//! This library uses the [`error::FrameError`] type for framing errors.
//!
//! ## Async Support
//!
//! With the `tokio` feature enabled, [`codec::LxiCodec`] implements the `tokio-util`
//! `Encoder` and `Decoder` traits for use with framed streams.

pub mod protocol;
pub use protocol::*;
pub mod codec;
pub mod error;
pub mod tmc;

/// The raw socket port that LXI instruments listen on.
pub const DEFAULT_PORT: u16 = 5025;

/// The default upper bound for a single response, including framing.
pub const MAX_MESSAGE_LEN: usize = 10 * 1024 * 1024;
