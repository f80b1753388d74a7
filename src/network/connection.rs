//! TCP Transport
//!
//! Blocking TCP connection to a projector.

use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::Transport;
use crate::config::Config;
use crate::error::{ProjectorError, Result};
use crate::protocol::END;

/// An open stream, split for buffered reads and writes
struct Stream {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    peer_addr: SocketAddr,
}

/// Transport over `std::net::TcpStream`
pub struct TcpTransport {
    host: String,
    port: u16,
    timeout: Duration,
    stream: Option<Stream>,
}

impl TcpTransport {
    /// Create an unconnected transport for `host:port`
    pub fn new(host: impl Into<String>, port: u16, timeout: Duration) -> Self {
        Self {
            host: host.into(),
            port,
            timeout,
            stream: None,
        }
    }

    /// Create an unconnected transport from a device config
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.host.clone(), config.port, config.timeout())
    }

    fn open(&self) -> Result<Stream> {
        let addrs = (self.host.as_str(), self.port).to_socket_addrs().map_err(|e| {
            ProjectorError::ConnectFailure(format!("cannot resolve {}: {}", self.host, e))
        })?;

        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.timeout) {
                Ok(stream) => return self.configure(stream, addr),
                Err(e) => {
                    tracing::debug!("Connect to {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }

        Err(match last_err {
            Some(e) if e.kind() == ErrorKind::ConnectionRefused => ProjectorError::ConnectionRefused,
            Some(e) if is_timeout(&e) => {
                ProjectorError::ConnectFailure(format!("connect to {} timed out", self.host))
            }
            Some(e) => ProjectorError::ConnectFailure(e.to_string()),
            None => ProjectorError::ConnectFailure(format!("no address for {}", self.host)),
        })
    }

    fn configure(&self, stream: TcpStream, peer_addr: SocketAddr) -> Result<Stream> {
        // Commands are tiny; don't let Nagle hold them back
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(self.timeout))?;
        stream.set_write_timeout(Some(self.timeout))?;

        let read_stream = stream.try_clone()?;
        Ok(Stream {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            peer_addr,
        })
    }

    fn stream(&mut self) -> Result<&mut Stream> {
        self.stream.as_mut().ok_or(ProjectorError::ConnectionClosed)
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self) -> Result<()> {
        self.disconnect();
        let stream = self.open()?;
        tracing::debug!("Connected to {}", stream.peer_addr);
        self.stream = Some(stream);
        Ok(())
    }

    fn read(&mut self, n: usize) -> Result<Vec<u8>> {
        let stream = self.stream()?;
        let mut buf = vec![0u8; n];
        stream.reader.read_exact(&mut buf).map_err(map_io_error)?;
        Ok(buf)
    }

    fn read_line(&mut self) -> Result<Vec<u8>> {
        let stream = self.stream()?;
        let mut line = Vec::new();
        let read = stream.reader.read_until(END, &mut line).map_err(map_io_error)?;

        // EOF before (or in the middle of) a line
        if read == 0 || line.last() != Some(&END) {
            return Err(ProjectorError::ConnectionClosed);
        }
        Ok(line)
    }

    fn write(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream()?;
        stream.writer.write_all(data).map_err(map_io_error)?;
        stream.writer.flush().map_err(map_io_error)?;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        let Some(stream) = &self.stream else {
            return false;
        };
        if !stream.reader.buffer().is_empty() {
            return true;
        }

        // A zero-length peek means the device closed its side
        let socket = stream.reader.get_ref();
        if socket.set_nonblocking(true).is_err() {
            return false;
        }
        let mut probe = [0u8; 1];
        let alive = match socket.peek(&mut probe) {
            Ok(0) => false,
            Ok(_) => true,
            Err(e) => e.kind() == ErrorKind::WouldBlock,
        };
        let _ = socket.set_nonblocking(false);
        alive
    }

    fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            let _ = stream.writer.flush();
            let _ = stream.writer.get_ref().shutdown(Shutdown::Both);
            tracing::debug!("Closed connection to {}", stream.peer_addr);
        }
    }

    fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().map(|s| s.peer_addr)
    }
}

impl Drop for TcpTransport {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn is_timeout(e: &std::io::Error) -> bool {
    // Unix reports WouldBlock for socket timeouts, Windows reports TimedOut
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

fn map_io_error(e: std::io::Error) -> ProjectorError {
    match e.kind() {
        _ if is_timeout(&e) => ProjectorError::Timeout,
        ErrorKind::UnexpectedEof
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::BrokenPipe => ProjectorError::ConnectionClosed,
        _ => ProjectorError::Io(e),
    }
}
