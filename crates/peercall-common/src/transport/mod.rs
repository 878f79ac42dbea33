//! Peercall Transport Layer
//!
//! This module provides endpoint resolution and framed transports for
//! sending/receiving RPC envelopes.
//!
//! # Architecture
//!
//! - **[`Codec`]** / **[`BinaryCodec`]**: encode/decode envelopes with
//!   postcard
//! - **[`Resolver`]** / **[`SocketDirResolver`]**: logical server name →
//!   transport endpoint
//! - **[`SyncTransport`]**: synchronous framed client transport with
//!   deadline-aware reads (used by the call engine)
//! - **[`FrameServer`]**: async framed server listener (one task per
//!   connection)
//!
//! # Wire Format
//!
//! Every frame is `[4-byte length as u32 big-endian] + [frame bytes]`,
//! capped at [`MAX_FRAME_SIZE`] to prevent memory exhaustion.

pub mod codec;
pub mod endpoint;
pub mod listener;
pub mod stream;

pub use codec::{BinaryCodec, Codec};
pub use endpoint::{Endpoint, Resolver, SocketDirResolver};
pub use listener::{FrameServer, Listener};
pub use stream::{SyncTransport, MAX_FRAME_SIZE};
