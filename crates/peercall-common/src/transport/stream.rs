//! Synchronous framed client transport.
//!
//! Owns one connected stream and speaks the length-prefixed frame format
//! over it. Receiving is deadline-aware: a read that runs out of time
//! returns cleanly, and any partially received frame is retained in the
//! resume buffer so the next receive continues where this one stopped
//! instead of misparsing the stream.

use std::io::{ErrorKind, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::os::unix::net::UnixStream;
use std::time::{Duration, Instant};

use crate::protocol::error::{PeercallError, Result};
use crate::transport::endpoint::Endpoint;

/// Maximum frame size (1 MiB)
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// A connected, exclusively owned transport stream.
///
/// The stream is released unconditionally when the transport is dropped;
/// [`shutdown`](Self::shutdown) additionally closes it eagerly in both
/// directions.
pub struct SyncTransport {
    stream: StreamKind,
    recv: FrameBuffer,
}

enum StreamKind {
    Unix(UnixStream),
    Tcp(TcpStream),
}

impl SyncTransport {
    /// Connects to a resolved endpoint.
    ///
    /// `timeout` bounds TCP connection establishment and is installed as
    /// the stream's write timeout; read timeouts are managed per receive.
    pub fn connect(endpoint: &Endpoint, timeout: Duration) -> Result<Self> {
        let stream = match endpoint {
            Endpoint::Unix(path) => {
                let stream = UnixStream::connect(path).map_err(|e| {
                    PeercallError::Connection(format!(
                        "failed to connect to {}: {e}",
                        path.display()
                    ))
                })?;
                stream
                    .set_write_timeout(Some(timeout))
                    .map_err(|e| PeercallError::Connection(format!("failed to set write timeout: {e}")))?;
                StreamKind::Unix(stream)
            }
            Endpoint::Tcp(addr) => {
                let socket_addrs = addr.to_socket_addrs().map_err(|e| {
                    PeercallError::Connection(format!("invalid address '{addr}': {e}"))
                })?;

                // Try each resolved address until one succeeds
                let mut last_err = None;
                let mut connected = None;
                for socket_addr in socket_addrs {
                    match TcpStream::connect_timeout(&socket_addr, timeout) {
                        Ok(stream) => {
                            connected = Some(stream);
                            break;
                        }
                        Err(e) => last_err = Some(e),
                    }
                }
                let stream = connected.ok_or_else(|| {
                    PeercallError::Connection(format!(
                        "failed to connect to {addr}: {}",
                        last_err
                            .map(|e| e.to_string())
                            .unwrap_or_else(|| "no addresses resolved".to_string())
                    ))
                })?;
                stream
                    .set_write_timeout(Some(timeout))
                    .map_err(|e| PeercallError::Connection(format!("failed to set write timeout: {e}")))?;
                StreamKind::Tcp(stream)
            }
        };

        Ok(SyncTransport {
            stream,
            recv: FrameBuffer::default(),
        })
    }

    #[cfg(test)]
    pub(crate) fn from_unix(stream: UnixStream) -> Self {
        SyncTransport {
            stream: StreamKind::Unix(stream),
            recv: FrameBuffer::default(),
        }
    }

    /// Sends one frame: `[4-byte length as u32 big-endian] + [data]`.
    pub fn send_frame(&mut self, data: &[u8]) -> Result<()> {
        if data.len() > MAX_FRAME_SIZE {
            return Err(PeercallError::Connection(format!(
                "outgoing frame of {} bytes exceeds the {MAX_FRAME_SIZE} byte limit",
                data.len()
            )));
        }
        let len = data.len() as u32;
        self.write_all(&len.to_be_bytes())
            .map_err(|e| map_io_error(e, "writing frame length"))?;
        self.write_all(data)
            .map_err(|e| map_io_error(e, "writing frame body"))?;
        self.flush().map_err(|e| map_io_error(e, "flushing stream"))?;
        Ok(())
    }

    /// Receives one frame, blocking no later than `deadline`.
    ///
    /// Returns `Ok(None)` when the deadline elapses with no complete
    /// frame; bytes received so far stay in the resume buffer. A peer
    /// close is a `Connection` error.
    pub fn recv_frame(&mut self, deadline: Instant) -> Result<Option<Vec<u8>>> {
        let mut chunk = [0u8; 4096];
        loop {
            if let Some(frame) = self.recv.take_frame()? {
                return Ok(Some(frame));
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            self.set_read_timeout(deadline - now)?;

            match self.read(&mut chunk) {
                Ok(0) => {
                    return Err(PeercallError::Connection(
                        "connection closed by peer".to_string(),
                    ))
                }
                Ok(n) => self.recv.push(&chunk[..n]),
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Ok(None)
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(map_io_error(e, "reading frame")),
            }
        }
    }

    /// Closes the stream in both directions. Errors are ignored: the
    /// stream is unusable afterwards either way.
    pub fn shutdown(&self) {
        let _ = match &self.stream {
            StreamKind::Unix(s) => s.shutdown(Shutdown::Both),
            StreamKind::Tcp(s) => s.shutdown(Shutdown::Both),
        };
    }

    fn set_read_timeout(&self, timeout: Duration) -> Result<()> {
        let timeout = Some(timeout.max(Duration::from_millis(1)));
        match &self.stream {
            StreamKind::Unix(s) => s.set_read_timeout(timeout),
            StreamKind::Tcp(s) => s.set_read_timeout(timeout),
        }
        .map_err(|e| PeercallError::Connection(format!("failed to set read timeout: {e}")))
    }

    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.stream {
            StreamKind::Unix(s) => s.read(buf),
            StreamKind::Tcp(s) => s.read(buf),
        }
    }

    fn write_all(&mut self, buf: &[u8]) -> std::io::Result<()> {
        match &mut self.stream {
            StreamKind::Unix(s) => s.write_all(buf),
            StreamKind::Tcp(s) => s.write_all(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.stream {
            StreamKind::Unix(s) => s.flush(),
            StreamKind::Tcp(s) => s.flush(),
        }
    }
}

/// Resume buffer for partially received frames.
///
/// Accumulates raw bytes and yields complete frames; whatever is left
/// over (a torn header, half a body) survives across receive deadlines.
#[derive(Default)]
struct FrameBuffer {
    buf: Vec<u8>,
}

impl FrameBuffer {
    fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn take_frame(&mut self) -> Result<Option<Vec<u8>>> {
        if self.buf.len() < 4 {
            return Ok(None);
        }
        let len = u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]) as usize;
        if len > MAX_FRAME_SIZE {
            return Err(PeercallError::MalformedResponse(format!(
                "frame length {len} exceeds the {MAX_FRAME_SIZE} byte limit"
            )));
        }
        if self.buf.len() < 4 + len {
            return Ok(None);
        }
        let frame = self.buf[4..4 + len].to_vec();
        self.buf.drain(..4 + len);
        Ok(Some(frame))
    }
}

/// Map IO errors to transport error variants
fn map_io_error(err: std::io::Error, context: &str) -> PeercallError {
    match err.kind() {
        ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::BrokenPipe
        | ErrorKind::NotConnected => {
            PeercallError::Connection(format!("{context}: connection lost"))
        }
        _ => PeercallError::Io(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_buffer_yields_nothing_on_partial_header() {
        let mut fb = FrameBuffer::default();
        fb.push(&[0, 0]);
        assert!(fb.take_frame().unwrap().is_none());
    }

    #[test]
    fn test_frame_buffer_yields_nothing_on_partial_body() {
        let mut fb = FrameBuffer::default();
        fb.push(&[0, 0, 0, 4, 1, 2]);
        assert!(fb.take_frame().unwrap().is_none());
        fb.push(&[3, 4]);
        assert_eq!(fb.take_frame().unwrap(), Some(vec![1, 2, 3, 4]));
    }

    #[test]
    fn test_frame_buffer_splits_back_to_back_frames() {
        let mut fb = FrameBuffer::default();
        fb.push(&[0, 0, 0, 1, 0xaa, 0, 0, 0, 2, 0xbb, 0xcc]);
        assert_eq!(fb.take_frame().unwrap(), Some(vec![0xaa]));
        assert_eq!(fb.take_frame().unwrap(), Some(vec![0xbb, 0xcc]));
        assert!(fb.take_frame().unwrap().is_none());
    }

    #[test]
    fn test_frame_buffer_rejects_oversized_length() {
        let mut fb = FrameBuffer::default();
        fb.push(&[0xff, 0xff, 0xff, 0xff]);
        assert!(fb.take_frame().is_err());
    }

    #[test]
    fn test_empty_frame_is_valid() {
        let mut fb = FrameBuffer::default();
        fb.push(&[0, 0, 0, 0]);
        assert_eq!(fb.take_frame().unwrap(), Some(Vec::new()));
    }
}
