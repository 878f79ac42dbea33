//! Procedure name → handler dispatch.
//!
//! The table is built once at startup and then shared read-only by every
//! connection task. Dispatch is total: every request produces a response
//! on the request's own sequence number, and no outcome (unknown
//! procedure, undecodable arguments, a handler error, even a handler
//! panic) ever terminates the connection or the process.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use peercall_common::protocol::{FaultCode, Request, Response};
use peercall_common::wire::{self, ProcedureDesc, Value};

/// A handler's own failure report; mapped to `HandlerFailure` on the wire.
pub type HandlerResult = std::result::Result<Option<Value>, String>;

type Handler = Box<dyn Fn(&[Value]) -> HandlerResult + Send + Sync>;

struct Entry {
    desc: &'static ProcedureDesc,
    handler: Handler,
}

/// Maps an incoming request's procedure identity to a handler.
///
/// # Example
///
/// ```
/// use peercall_common::{procs, wire::Value};
/// use peercall_server::DispatchTable;
///
/// let mut table = DispatchTable::new();
/// table.register(&procs::STRLEN, |args| {
///     let Some(s) = args[0].as_str() else {
///         return Err("expected a string".into());
///     };
///     Ok(Some(Value::I32(s.len() as i32)))
/// });
/// assert_eq!(table.len(), 1);
/// ```
#[derive(Default)]
pub struct DispatchTable {
    entries: HashMap<&'static str, Entry>,
}

impl DispatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `handler` to `desc`. Registering a second handler under the
    /// same name replaces the first.
    pub fn register<F>(&mut self, desc: &'static ProcedureDesc, handler: F)
    where
        F: Fn(&[Value]) -> HandlerResult + Send + Sync + 'static,
    {
        self.entries.insert(
            desc.name,
            Entry {
                desc,
                handler: Box::new(handler),
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Handles one request: look up, decode, invoke, encode.
    ///
    /// Always returns a response carrying `request.seq`.
    pub fn dispatch(&self, request: &Request) -> Response {
        let Some(entry) = self.entries.get(request.procedure.as_str()) else {
            tracing::debug!(procedure = %request.procedure, "unknown procedure");
            return Response::fault(request.seq, FaultCode::UnknownProcedure);
        };

        let args = match wire::decode_args(entry.desc, &request.args) {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!(procedure = %request.procedure, error = %e,
                    "argument payload did not decode");
                return Response::fault(request.seq, FaultCode::BadArguments);
            }
        };

        let outcome = catch_unwind(AssertUnwindSafe(|| (entry.handler)(&args)));
        let value = match outcome {
            Err(_) => {
                tracing::error!(procedure = %request.procedure, "handler panicked");
                return Response::fault(request.seq, FaultCode::HandlerFailure);
            }
            Ok(Err(msg)) => {
                tracing::warn!(procedure = %request.procedure, error = %msg, "handler error");
                return Response::fault(request.seq, FaultCode::HandlerFailure);
            }
            Ok(Ok(value)) => value,
        };

        match wire::encode_result(entry.desc, value.as_ref()) {
            Ok(payload) => Response::success(request.seq, payload),
            Err(e) => {
                // the handler produced a value outside the contract, e.g.
                // an over-long string; report it, never truncate it
                tracing::warn!(procedure = %request.procedure, error = %e,
                    "handler result violates the descriptor");
                Response::fault(request.seq, FaultCode::HandlerFailure)
            }
        }
    }
}
