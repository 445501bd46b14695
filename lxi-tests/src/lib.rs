//! A scripted instrument that answers SCPI commands over TCP, for exercising the client
//! against a real socket.
use std::{collections::HashMap, io, net::SocketAddr, time::Duration};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpListener,
    task::JoinHandle,
};

/// What the instrument does after receiving a command
#[derive(Clone, Debug)]
pub enum Reply {
    /// Send the bytes
    Respond(Vec<u8>),
    /// Send the first part, pause, then send the second part
    Split(Vec<u8>, Duration, Vec<u8>),
    /// Send the bytes and close the connection
    RespondAndClose(Vec<u8>),
    /// Send nothing
    Silent,
}

#[derive(Default)]
pub struct MockInstrument {
    replies: HashMap<String, Reply>,
}

impl MockInstrument {
    pub fn new() -> MockInstrument {
        MockInstrument::default()
    }

    /// Answer `command` with `reply`. Unknown commands are not answered.
    pub fn reply(mut self, command: &str, reply: Reply) -> Self {
        self.replies.insert(command.to_string(), reply);
        self
    }

    /// Listen on a free localhost port and serve a single connection.
    ///
    /// The handle resolves to the received commands once the client disconnects.
    pub async fn serve(self) -> io::Result<(SocketAddr, JoinHandle<io::Result<Vec<String>>>)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await?;
            let (read, mut write) = stream.into_split();
            let mut lines = BufReader::new(read).lines();
            let mut received = Vec::new();

            while let Some(line) = lines.next_line().await? {
                let reply = self.replies.get(&line).cloned();
                received.push(line);
                match reply {
                    Some(Reply::Respond(bytes)) => write.write_all(&bytes).await?,
                    Some(Reply::Split(first, pause, second)) => {
                        write.write_all(&first).await?;
                        write.flush().await?;
                        tokio::time::sleep(pause).await;
                        write.write_all(&second).await?;
                    }
                    Some(Reply::RespondAndClose(bytes)) => {
                        write.write_all(&bytes).await?;
                        write.shutdown().await?;
                        break;
                    }
                    Some(Reply::Silent) | None => {}
                }
            }
            Ok(received)
        });
        Ok((addr, handle))
    }
}

/// Frames `payload` as a definite length block
pub fn block(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 12);
    lxi_protocol::tmc::encode(payload, &mut out).expect("Encoding into a vector shouldn't fail");
    out
}

/// A payload resembling a bitmap screenshot, containing newlines and `#`
pub fn bitmap(len: usize) -> Vec<u8> {
    let mut data: Vec<u8> = (0..len).map(|i| (i * 7 % 256) as u8).collect();
    data[..2].copy_from_slice(b"BM");
    data
}
