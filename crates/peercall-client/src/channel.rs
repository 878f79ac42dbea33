//! A client's live connection to one named server instance, and the
//! synchronous call engine running over it.

use std::time::{Duration, Instant};

use peercall_common::protocol::error::{PeercallError, Result};
use peercall_common::protocol::{Request, Status, FIRST_SEQUENCE};
use peercall_common::transport::{BinaryCodec, Resolver, SocketDirResolver, SyncTransport};
use peercall_common::wire::{self, ProcedureDesc, Value};

/// Options applied when establishing a channel.
#[derive(Debug, Clone)]
pub struct ChannelOptions {
    /// Bounds connection establishment and outbound writes.
    pub connect_timeout: Duration,
}

impl Default for ChannelOptions {
    fn default() -> Self {
        ChannelOptions {
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// A connection to one named server instance.
///
/// A channel owns its transport stream exclusively and carries at most
/// one call at a time: `call` takes `&mut self`, so two concurrent calls
/// on one channel do not compile. Callers needing concurrency open
/// independent channels (or use a [`crate::ChannelPool`]).
///
/// Dropping a channel releases the stream unconditionally, on every exit
/// path; [`close`](Self::close) does so eagerly and is idempotent.
pub struct Channel {
    name: String,
    transport: Option<SyncTransport>,
    next_seq: u64,
}

impl Channel {
    /// Connects to the server registered under `name`, using the default
    /// environment-derived resolver.
    pub fn connect(name: &str) -> Result<Self> {
        Self::connect_with(name, &SocketDirResolver::from_env(), ChannelOptions::default())
    }

    /// Connects through an explicit resolver.
    ///
    /// Fails with `EndpointNotFound` when no server is registered under
    /// `name`.
    pub fn connect_with(
        name: &str,
        resolver: &dyn Resolver,
        options: ChannelOptions,
    ) -> Result<Self> {
        let endpoint = resolver.resolve(name)?;
        let transport = SyncTransport::connect(&endpoint, options.connect_timeout)?;
        tracing::debug!(name, endpoint = %endpoint, "channel connected");
        Ok(Channel {
            name: name.to_string(),
            transport: Some(transport),
            next_seq: FIRST_SEQUENCE,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_some()
    }

    /// Performs one synchronous call, blocking for at most `timeout`.
    ///
    /// Arguments are validated against the descriptor before anything
    /// touches the transport. On timeout the channel remains usable: the
    /// next call discards whatever late response eventually arrives for
    /// this sequence number. A response carrying any other sequence
    /// number is discarded without ending the wait.
    ///
    /// Returns the decoded result (`None` for a void procedure).
    pub fn call(
        &mut self,
        timeout: Duration,
        desc: &ProcedureDesc,
        args: &[Value],
    ) -> Result<Option<Value>> {
        let transport = self.transport.as_mut().ok_or(PeercallError::ChannelClosed)?;

        // validation happens before any transport I/O
        let payload = wire::encode_args(desc, args)?;
        let seq = self.next_seq;
        self.next_seq += 1;

        let request = Request::new(seq, desc.name, payload);
        transport.send_frame(&BinaryCodec::encode_request(&request)?)?;

        let deadline = Instant::now() + timeout;
        loop {
            let frame = match transport.recv_frame(deadline)? {
                Some(frame) => frame,
                None => {
                    tracing::debug!(seq, procedure = desc.name, "call timed out");
                    return Err(PeercallError::Timeout(timeout.as_millis() as u64));
                }
            };

            let response = BinaryCodec::decode_response(&frame)
                .map_err(|e| PeercallError::MalformedResponse(e.to_string()))?;

            if response.seq != seq {
                tracing::debug!(
                    got = response.seq,
                    expected = seq,
                    "discarding stale response"
                );
                continue;
            }

            return match response.status {
                Status::Error(code) => Err(PeercallError::Remote(code)),
                Status::Ok => wire::decode_result(desc, &response.payload),
            };
        }
    }

    /// Closes the channel, releasing the transport stream. Idempotent;
    /// calling it on an already-closed channel is a no-op.
    pub fn close(&mut self) {
        if let Some(transport) = self.transport.take() {
            transport.shutdown();
            tracing::debug!(name = %self.name, "channel closed");
        }
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        self.close();
    }
}
