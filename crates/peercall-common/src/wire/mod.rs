//! Peercall Wire Layer
//!
//! Type descriptors, runtime values and the deterministic marshalling of
//! argument lists and results.
//!
//! # Architecture
//!
//! Every remote procedure is described once by a [`ProcedureDesc`] shared
//! verbatim by client and server. The marshaller validates a value list
//! against the descriptor (arity, per-position type, size bounds) before
//! anything touches a transport, then encodes it into a fixed-layout
//! big-endian byte run:
//!
//! - fixed-width integers: 4 or 8 bytes, big-endian, two's complement
//! - bounded strings: `u16` big-endian byte-length prefix + UTF-8 bytes,
//!   never exceeding the descriptor's `max`
//! - opaque structs: exactly `size` raw bytes
//!
//! Encoding is side-effect-free and deterministic: the same descriptor and
//! the same values always produce the same bytes.

pub mod marshal;
pub mod types;

pub use marshal::{decode_args, decode_result, encode_args, encode_result};
pub use types::{ProcedureDesc, Value, WireType};
