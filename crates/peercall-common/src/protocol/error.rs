use thiserror::Error;

use crate::protocol::responses::FaultCode;

#[derive(Error, Debug)]
pub enum PeercallError {
    #[error("no server registered under name '{0}'")]
    EndpointNotFound(String),

    #[error("channel is closed")]
    ChannelClosed,

    #[error("wrong number of arguments for '{procedure}': expected {expected}, got {got}")]
    ArityMismatch {
        procedure: String,
        expected: usize,
        got: usize,
    },

    #[error("type mismatch at position {index}: expected {expected}, got {got}")]
    TypeMismatch {
        index: usize,
        expected: String,
        got: String,
    },

    #[error("argument of {len} bytes exceeds the descriptor bound of {max}")]
    ArgumentTooLarge { len: usize, max: usize },

    #[error("call timed out after {0}ms")]
    Timeout(u64),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("remote error: {0}")]
    Remote(FaultCode),

    #[error("envelope serialization error: {0}")]
    Envelope(#[from] postcard::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("connection error: {0}")]
    Connection(String),
}

pub type Result<T> = std::result::Result<T, PeercallError>;
