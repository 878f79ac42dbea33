//! Peercall Common Types, Wire Codec and Transport
//!
//! This crate provides the core protocol definitions, the typed wire codec
//! and the transport layer for the peercall RPC system.
//!
//! # Overview
//!
//! Peercall is a small synchronous RPC system for calling typed procedures
//! in a named peer process. This crate contains the infrastructure shared
//! by both ends of a connection:
//!
//! - **Protocol Layer**: Request/Response envelopes, error handling, and
//!   the remote fault taxonomy
//! - **Wire Layer**: type descriptors, runtime values, and the
//!   deterministic big-endian marshalling of argument lists and results
//! - **Procedure Registry**: the shared descriptors for the standard
//!   procedures, identical byte-for-byte on client and server
//! - **Transport Layer**: logical-name endpoint resolution, a framed
//!   synchronous client transport, and a framed async server listener
//!
//! # Architecture
//!
//! The system uses a simple wire protocol:
//! - **Framing**: `[4-byte length prefix as u32 big-endian] + [frame]`
//! - **Envelope**: postcard-serialized `Request` / `Response`
//! - **Payload**: descriptor-driven fixed-layout encoding (see [`wire`])
//! - **Max Frame Size**: 1 MiB (prevents memory exhaustion)
//!
//! # Example
//!
//! ```
//! use peercall_common::{procs, wire, Request};
//!
//! let args = [wire::Value::Str("foo".into()), wire::Value::Str("bar".into())];
//! let payload = wire::encode_args(&procs::STRCAT, &args).unwrap();
//! let request = Request::new(1, procs::STRCAT.name, payload);
//! assert_eq!(request.procedure, "strcat");
//! ```

pub mod procs;
pub mod protocol;
pub mod transport;
pub mod wire;

pub use protocol::*;
