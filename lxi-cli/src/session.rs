//! Interactive and script sessions. A session keeps one connection open for all of its commands.
use std::io::{self, BufRead, Write};

use lxi_client::{ExchangeError, LxiClient, Routing, Transport, output};
use lxi_protocol::{ScpiCommand, error::FrameError};

const PROMPT: &str = "lxi> ";

/// Number of commands executed by a session, and how many of them failed
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq)]
pub struct Summary {
    pub executed: usize,
    pub failed: usize,
}

pub struct Session<T: Transport> {
    client: LxiClient<T>,
    routing: Routing,
    summary: Summary,
}

/// Errors after which the connection cannot be used anymore.
/// Responses that are too large or malformed leave an unknown number of bytes on the connection.
fn is_fatal(error: &ExchangeError) -> bool {
    match error {
        ExchangeError::Connection(_) | ExchangeError::MessageTooLarge { .. } => true,
        ExchangeError::Frame(e) => !matches!(e, FrameError::NotABlock),
        _ => false,
    }
}

impl<T: Transport> Session<T> {
    pub fn new(client: LxiClient<T>, routing: Routing) -> Session<T> {
        Session {
            client,
            routing,
            summary: Summary::default(),
        }
    }

    /// Execute a single command and deliver its response, if any.
    pub fn execute(&mut self, command: &str, out: &mut impl Write) -> Result<(), ExchangeError> {
        if let Some(response) = self.client.execute(&ScpiCommand::new(command))? {
            output::route(&response, &self.routing, out)?;
        }
        Ok(())
    }

    /// Execute a command, reporting a failure instead of returning it.
    /// Returns `false` if the session cannot continue.
    fn execute_reported(&mut self, command: &str, out: &mut impl Write) -> bool {
        self.summary.executed += 1;
        match self.execute(command, out) {
            Ok(()) => true,
            Err(e) => {
                self.summary.failed += 1;
                log::error!("{}: {}", command, e);
                !is_fatal(&e)
            }
        }
    }

    /// Run every line of `script` as a command.
    /// Blank lines and lines starting with `#` are skipped.
    pub fn run_script(&mut self, script: impl BufRead, out: &mut impl Write) -> io::Result<Summary> {
        for (number, line) in script.lines().enumerate() {
            let line = line?;
            let command = line.trim();
            if command.is_empty() || command.starts_with('#') {
                continue;
            }
            log::debug!("Script line {}: {}", number + 1, command);
            if !self.execute_reported(command, out) {
                log::error!("Aborting script at line {}", number + 1);
                break;
            }
        }
        Ok(self.summary)
    }

    /// Prompt for commands on `out` and run them until `exit`, `quit` or end of input.
    pub fn interactive(&mut self, mut input: impl BufRead, out: &mut impl Write) -> io::Result<Summary> {
        let mut line = String::new();
        loop {
            out.write_all(PROMPT.as_bytes())?;
            out.flush()?;
            line.clear();
            if input.read_line(&mut line)? == 0 {
                writeln!(out)?;
                break;
            }
            let command = line.trim();
            match command {
                "" => continue,
                "exit" | "quit" => break,
                _ => {
                    if !self.execute_reported(command, out) {
                        break;
                    }
                }
            }
        }
        Ok(self.summary)
    }
}
