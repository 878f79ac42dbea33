use serde::{Deserialize, Serialize};

pub type SequenceNumber = u64;
pub type ProcedureName = String;

/// The first sequence number a freshly connected channel assigns.
pub const FIRST_SEQUENCE: SequenceNumber = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Request {
    pub seq: SequenceNumber,
    pub procedure: ProcedureName,
    /// Argument list, already encoded against the procedure's descriptor.
    pub args: Vec<u8>,
}

impl Request {
    pub fn new(seq: SequenceNumber, procedure: impl Into<String>, args: Vec<u8>) -> Self {
        Request {
            seq,
            procedure: procedure.into(),
            args,
        }
    }
}
