//! Peercall Server
//!
//! This crate provides the server half of the peercall RPC system: a
//! dispatch table mapping procedure names to native handlers, and the
//! accept loop that serves them on a named endpoint.

pub mod dispatch;
pub mod server;

pub use dispatch::DispatchTable;
pub use server::Server;
