pub mod error;
pub mod requests;
pub mod responses;


pub use error::{PeercallError, Result};
pub use requests::{ProcedureName, Request, SequenceNumber, FIRST_SEQUENCE};
pub use responses::{FaultCode, Response, Status};
