//! Async framed server listener.
//!
//! Accepts connections on a resolved endpoint and runs one task per
//! connection, so a slow or hung client on one connection never delays
//! responses on another. Each connection processes requests sequentially
//! (the protocol allows one call in flight per channel) until the peer
//! closes.

use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, UnixListener};

use crate::protocol::error::{PeercallError, Result};
use crate::protocol::{FaultCode, Request, Response};
use crate::transport::codec::BinaryCodec;
use crate::transport::endpoint::Endpoint;
use crate::transport::stream::MAX_FRAME_SIZE;

/// A connection accepted by a [`Listener`], independent of socket family.
pub trait AsyncSocket: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> AsyncSocket for T {}

/// Listening endpoint for one server instance.
pub enum Listener {
    Unix(UnixListener),
    Tcp(TcpListener),
}

impl Listener {
    /// Binds the endpoint. A stale socket file left behind by a dead
    /// server is removed before binding.
    pub async fn bind(endpoint: &Endpoint) -> Result<Self> {
        match endpoint {
            Endpoint::Unix(path) => {
                if path.exists() {
                    std::fs::remove_file(path).map_err(|e| {
                        PeercallError::Connection(format!(
                            "failed to remove stale socket {}: {e}",
                            path.display()
                        ))
                    })?;
                }
                let listener = UnixListener::bind(path).map_err(|e| {
                    PeercallError::Connection(format!(
                        "failed to bind {}: {e}",
                        path.display()
                    ))
                })?;
                Ok(Listener::Unix(listener))
            }
            Endpoint::Tcp(addr) => {
                let listener = TcpListener::bind(addr).await.map_err(|e| {
                    PeercallError::Connection(format!("failed to bind {addr}: {e}"))
                })?;
                Ok(Listener::Tcp(listener))
            }
        }
    }

    pub async fn accept(&self) -> Result<Box<dyn AsyncSocket>> {
        match self {
            Listener::Unix(listener) => {
                let (socket, _) = listener.accept().await.map_err(|e| {
                    PeercallError::Connection(format!("failed to accept connection: {e}"))
                })?;
                Ok(Box::new(socket))
            }
            Listener::Tcp(listener) => {
                let (socket, _) = listener.accept().await.map_err(|e| {
                    PeercallError::Connection(format!("failed to accept connection: {e}"))
                })?;
                Ok(Box::new(socket))
            }
        }
    }
}

/// Framed accept loop driving a request handler.
pub struct FrameServer {
    listener: Listener,
}

impl FrameServer {
    /// Binds the endpoint (see [`Listener::bind`]).
    pub async fn bind(endpoint: &Endpoint) -> Result<Self> {
        let listener = Listener::bind(endpoint).await?;
        Ok(Self { listener })
    }

    /// Runs the server with the given request handler.
    ///
    /// Accepts connections in a loop and spawns a task for each. Each
    /// connection processes requests until the peer closes it. A handler
    /// error is answered with a `HandlerFailure` fault on the same
    /// sequence number; it never terminates the connection.
    pub async fn run_with_handler<F, Fut>(&self, handler: F) -> Result<()>
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response>> + Send + 'static,
    {
        let handler = Arc::new(handler);

        loop {
            let socket = self.listener.accept().await?;
            tracing::debug!("connection established");

            let handler = handler.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(socket, handler).await {
                    tracing::warn!(error = %e, "connection error");
                }
            });
        }
    }
}

/// Handle a single connection.
///
/// Processes requests until the peer closes. Undecodable envelopes are
/// answered with a `BadArguments` fault on sequence 0; the framing is
/// intact, so the connection stays usable.
async fn handle_connection<F, Fut>(
    mut socket: Box<dyn AsyncSocket>,
    handler: Arc<F>,
) -> Result<()>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    loop {
        let frame = match read_frame(&mut socket).await? {
            Some(frame) => frame,
            None => {
                tracing::debug!("connection closed by peer");
                return Ok(());
            }
        };

        let request = match BinaryCodec::decode_request(&frame) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "failed to decode request envelope");
                let fault = Response::fault(0, FaultCode::BadArguments);
                write_frame(&mut socket, &BinaryCodec::encode_response(&fault)?).await?;
                continue;
            }
        };

        let seq = request.seq;
        let response = match handler(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, seq, "handler error");
                Response::fault(seq, FaultCode::HandlerFailure)
            }
        };

        write_frame(&mut socket, &BinaryCodec::encode_response(&response)?).await?;
    }
}

/// Reads one frame. Returns `Ok(None)` on a clean close at a frame
/// boundary; a close mid-frame is a `Connection` error.
pub async fn read_frame<S: AsyncRead + Unpin>(stream: &mut S) -> Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 4];
    match stream.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => {
            return Err(PeercallError::Connection(format!(
                "failed to read frame length: {e}"
            )))
        }
    }

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(PeercallError::Connection(format!(
            "frame length {len} exceeds the {MAX_FRAME_SIZE} byte limit"
        )));
    }

    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await.map_err(|e| {
        PeercallError::Connection(format!("failed to read frame body: {e}"))
    })?;

    Ok(Some(buf))
}

/// Writes one frame with its length prefix.
pub async fn write_frame<S: AsyncWrite + Unpin>(stream: &mut S, data: &[u8]) -> Result<()> {
    if data.len() > MAX_FRAME_SIZE {
        return Err(PeercallError::Connection(format!(
            "outgoing frame of {} bytes exceeds the {MAX_FRAME_SIZE} byte limit",
            data.len()
        )));
    }
    let len = data.len() as u32;
    stream.write_all(&len.to_be_bytes()).await.map_err(|e| {
        PeercallError::Connection(format!("failed to write frame length: {e}"))
    })?;
    stream
        .write_all(data)
        .await
        .map_err(|e| PeercallError::Connection(format!("failed to write frame body: {e}")))?;
    stream
        .flush()
        .await
        .map_err(|e| PeercallError::Connection(format!("failed to flush stream: {e}")))?;
    Ok(())
}
