use std::{
    io::{self, ErrorKind, Read, Write},
    net::{SocketAddr, TcpStream, ToSocketAddrs},
    time::Duration,
};

/// A blocking, connected byte stream to an instrument.
///
/// Every operation is bounded by the given timeout. A timeout is reported as an error of kind
/// [`ErrorKind::TimedOut`] or [`ErrorKind::WouldBlock`], a connection closed by the peer
/// as a receive of zero bytes.
/// The connection is released when the transport is dropped.
pub trait Transport {
    /// Send all of `data`.
    fn send(&mut self, data: &[u8], timeout: Duration) -> io::Result<()>;

    /// Receive at most `buf.len()` bytes, returning the number of bytes received.
    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;
}

/// Whether an error returned by a [`Transport`] means that the timeout elapsed
pub fn is_timeout(error: &io::Error) -> bool {
    matches!(error.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock)
}

/// The raw TCP socket transport
#[derive(Debug)]
pub struct TcpTransport {
    tcp: TcpStream,
}

impl TcpTransport {
    /// Connects to the first reachable address that `addr` resolves to.
    pub fn connect(addr: impl ToSocketAddrs, timeout: Duration) -> io::Result<TcpTransport> {
        let mut last_error = None;
        for addr in addr.to_socket_addrs()? {
            log::debug!("Trying {}", addr);
            match TcpStream::connect_timeout(&addr, timeout) {
                Ok(tcp) => {
                    // Commands are small and answered one by one
                    tcp.set_nodelay(true)?;
                    return Ok(TcpTransport { tcp });
                }
                Err(e) => {
                    log::debug!("Connecting to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            io::Error::new(ErrorKind::InvalidInput, "address did not resolve")
        }))
    }

    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        self.tcp.peer_addr()
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, data: &[u8], timeout: Duration) -> io::Result<()> {
        self.tcp.set_write_timeout(Some(timeout))?;
        self.tcp.write_all(data)?;
        self.tcp.flush()
    }

    fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        self.tcp.set_read_timeout(Some(timeout))?;
        self.tcp.read(buf)
    }
}
