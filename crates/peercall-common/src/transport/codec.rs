use crate::protocol::error::Result;
use crate::protocol::{Request, Response};

/// Codec for encoding/decoding RPC envelopes
///
/// Currently only the postcard binary format is supported, but the enum
/// allows for future extensibility.
///
/// # Example
///
/// ```
/// use peercall_common::transport::Codec;
/// use peercall_common::protocol::Request;
///
/// let codec = Codec::new();
/// let request = Request::new(1, "strlen", vec![0, 3, b'f', b'o', b'o']);
///
/// let encoded = codec.encode_request(&request).unwrap();
/// let decoded = codec.decode_request(&encoded).unwrap();
/// assert_eq!(request, decoded);
/// ```
pub enum Codec {
    /// Postcard binary codec (currently the only supported format)
    Binary(BinaryCodec),
}

impl Codec {
    pub fn new() -> Self {
        Codec::Binary(BinaryCodec)
    }

    pub fn encode_request(&self, request: &Request) -> Result<Vec<u8>> {
        match self {
            Codec::Binary(_) => BinaryCodec::encode_request(request),
        }
    }

    pub fn decode_request(&self, data: &[u8]) -> Result<Request> {
        match self {
            Codec::Binary(_) => BinaryCodec::decode_request(data),
        }
    }

    pub fn encode_response(&self, response: &Response) -> Result<Vec<u8>> {
        match self {
            Codec::Binary(_) => BinaryCodec::encode_response(response),
        }
    }

    pub fn decode_response(&self, data: &[u8]) -> Result<Response> {
        match self {
            Codec::Binary(_) => BinaryCodec::decode_response(data),
        }
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new()
    }
}

/// Postcard codec for encoding/decoding RPC envelopes
///
/// Postcard's encoding is deterministic, so the same envelope always
/// produces the same bytes, the property the protocol tests rely on.
pub struct BinaryCodec;

impl BinaryCodec {
    pub fn encode_request(request: &Request) -> Result<Vec<u8>> {
        Ok(postcard::to_allocvec(request)?)
    }

    pub fn decode_request(data: &[u8]) -> Result<Request> {
        Ok(postcard::from_bytes(data)?)
    }

    pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
        Ok(postcard::to_allocvec(response)?)
    }

    pub fn decode_response(data: &[u8]) -> Result<Response> {
        Ok(postcard::from_bytes(data)?)
    }
}
