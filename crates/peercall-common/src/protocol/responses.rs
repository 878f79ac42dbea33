//! Peercall Response Types
//!
//! This module defines the RPC response envelope and the remote fault
//! taxonomy.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::SequenceNumber;

/// A fault reported by the server for one call.
///
/// A fault fails the call that triggered it and nothing else: the channel
/// that carried the request stays usable, and the server keeps the
/// connection open.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FaultCode {
    /// The request named a procedure absent from the dispatch table.
    UnknownProcedure,
    /// The request's argument payload did not decode against the
    /// procedure's descriptor.
    BadArguments,
    /// The handler returned an error, panicked, or produced a result
    /// violating the descriptor.
    HandlerFailure,
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultCode::UnknownProcedure => write!(f, "unknown procedure"),
            FaultCode::BadArguments => write!(f, "bad arguments"),
            FaultCode::HandlerFailure => write!(f, "handler failure"),
        }
    }
}

/// Outcome of one call as reported on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Status {
    Ok,
    Error(FaultCode),
}

/// An RPC response returned from a server to the client.
///
/// # Response Flow
///
/// 1. Server receives and dispatches a `Request`
/// 2. Server creates a `Response` (success or fault) carrying the same
///    sequence number
/// 3. Response is serialized and sent back over the same connection
/// 4. The client's call engine matches it to the outstanding request by
///    sequence number and decodes the payload
///
/// # Fields
///
/// - `seq`: the request's sequence number (for matching and for rejecting
///   stale responses)
/// - `status`: `Ok` or `Error(code)`
/// - `payload`: the descriptor-encoded result; empty for void returns and
///   for faults
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Response {
    pub seq: SequenceNumber,
    pub status: Status,
    pub payload: Vec<u8>,
}

impl Response {
    /// Creates a successful response.
    ///
    /// # Example
    ///
    /// ```
    /// use peercall_common::protocol::responses::Response;
    ///
    /// let response = Response::success(123, vec![0, 0, 0, 3]);
    /// assert!(response.is_ok());
    /// ```
    pub fn success(seq: SequenceNumber, payload: Vec<u8>) -> Self {
        Response {
            seq,
            status: Status::Ok,
            payload,
        }
    }

    /// Creates a fault response. Faults never carry a payload.
    pub fn fault(seq: SequenceNumber, code: FaultCode) -> Self {
        Response {
            seq,
            status: Status::Error(code),
            payload: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self.status, Status::Ok)
    }
}
