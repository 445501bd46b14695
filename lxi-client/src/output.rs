//! Destinations for received responses: files, hex dumps and the terminal.
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use lxi_protocol::Response;

use crate::error::ExchangeError;

const HEX_DUMP_WIDTH: usize = 16;

/// Where to deliver a response. Hex dump and file dump may both be active.
/// If neither is, the response is echoed.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Routing {
    pub dump_hex: bool,
    pub dump_file: Option<PathBuf>,
}

/// Writes `data` verbatim to `path`, replacing any previous content.
pub fn file_dump(data: &[u8], path: impl AsRef<Path>) -> Result<(), ExchangeError> {
    let path = path.as_ref();
    fs::write(path, data).map_err(ExchangeError::Io)?;
    log::debug!("Wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}

/// Prints `data` in the canonical hex + ASCII layout, 16 bytes per line.
pub fn hex_dump(data: &[u8], out: &mut impl Write) -> io::Result<()> {
    for (index, line) in data.chunks(HEX_DUMP_WIDTH).enumerate() {
        write!(out, "{:08x}", index * HEX_DUMP_WIDTH)?;
        for column in 0..HEX_DUMP_WIDTH {
            if column % 8 == 0 {
                write!(out, " ")?;
            }
            match line.get(column) {
                Some(byte) => write!(out, " {:02x}", byte)?,
                None => write!(out, "   ")?,
            }
        }
        let ascii: String = line
            .iter()
            .map(|&b| {
                if b.is_ascii_graphic() || b == b' ' {
                    b as char
                } else {
                    '.'
                }
            })
            .collect();
        writeln!(out, "  |{}|", ascii)?;
    }
    Ok(())
}

/// Writes the response unchanged. Text is followed by a newline, binary data is not.
pub fn echo(response: &Response, out: &mut impl Write) -> io::Result<()> {
    match response {
        Response::Text(text) => {
            out.write_all(text)?;
            out.write_all(b"\n")
        }
        Response::Binary(data) => out.write_all(data),
    }
}

/// Delivers the payload of `response` to every destination selected in `routing`.
pub fn route(
    response: &Response,
    routing: &Routing,
    out: &mut impl Write,
) -> Result<(), ExchangeError> {
    if let Some(path) = &routing.dump_file {
        file_dump(response.payload(), path)?;
    }
    if routing.dump_hex {
        hex_dump(response.payload(), out).map_err(ExchangeError::Io)?;
    } else if routing.dump_file.is_none() {
        echo(response, out).map_err(ExchangeError::Io)?;
    }
    out.flush().map_err(ExchangeError::Io)
}

#[cfg(test)]
mod test {
    use super::*;

    fn text(s: &str) -> Response {
        Response::Text(s.as_bytes().into())
    }

    #[test]
    fn hex_dump_layout() {
        let mut out = Vec::new();
        hex_dump(b"RIGOL TECHNOLOGIES,DS1104Z\n", &mut out).unwrap();
        let expected = "\
00000000  52 49 47 4f 4c 20 54 45  43 48 4e 4f 4c 4f 47 49  |RIGOL TECHNOLOGI|
00000010  45 53 2c 44 53 31 31 30  34 5a 0a                 |ES,DS1104Z.|
";
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn hex_dump_empty() {
        let mut out = Vec::new();
        hex_dump(&[], &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn echo_text_and_binary() {
        let mut out = Vec::new();
        route(&text("1.000000E+00"), &Routing::default(), &mut out).unwrap();
        assert_eq!(out, b"1.000000E+00\n");

        let mut out = Vec::new();
        let binary = Response::Binary((*b"\x00\x01\n").into());
        route(&binary, &Routing::default(), &mut out).unwrap();
        assert_eq!(out, b"\x00\x01\n");
    }

    #[test]
    fn hex_and_file_dump_together() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("response.bin");
        let routing = Routing {
            dump_hex: true,
            dump_file: Some(path.clone()),
        };
        let response = Response::Binary((*b"BM\x36\x94").into());

        let mut out = Vec::new();
        route(&response, &routing, &mut out).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"BM\x36\x94");
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "00000000  42 4d 36 94                                       |BM6.|\n"
        );
    }

    #[test]
    fn file_dump_only_prints_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("idn.txt");
        fs::write(&path, b"previous content that is longer").unwrap();
        let routing = Routing {
            dump_hex: false,
            dump_file: Some(path.clone()),
        };

        let mut out = Vec::new();
        route(&text("RIGOL"), &routing, &mut out).unwrap();

        assert!(out.is_empty());
        assert_eq!(fs::read(&path).unwrap(), b"RIGOL");
    }

    #[test]
    fn file_dump_to_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.bin");
        assert!(matches!(
            file_dump(b"data", &path),
            Err(ExchangeError::Io(_))
        ));
    }
}
