//! Descriptor-driven encode/decode of argument lists and results.
//!
//! All validation happens here, before any transport I/O: a value list
//! that does not match its descriptor never reaches the wire. Decoding
//! never panics on foreign bytes; every malformed input is a `Result`.

use crate::protocol::error::{PeercallError, Result};
use crate::wire::types::{ProcedureDesc, Value, WireType};

/// Encodes an argument list against `desc.args`.
///
/// Fails with `ArityMismatch` on a count mismatch, `TypeMismatch` on a
/// per-position type mismatch, and `ArgumentTooLarge` on a bound
/// violation. Side-effect-free and deterministic.
pub fn encode_args(desc: &ProcedureDesc, values: &[Value]) -> Result<Vec<u8>> {
    if values.len() != desc.args.len() {
        return Err(PeercallError::ArityMismatch {
            procedure: desc.name.to_string(),
            expected: desc.args.len(),
            got: values.len(),
        });
    }

    let mut out = Vec::new();
    for (index, (ty, value)) in desc.args.iter().zip(values).enumerate() {
        encode_value(ty, value, index, &mut out)?;
    }
    Ok(out)
}

/// Decodes an argument payload against `desc.args`.
///
/// The server-side inverse of [`encode_args`]. Trailing bytes after the
/// last argument are an error.
pub fn decode_args(desc: &ProcedureDesc, bytes: &[u8]) -> Result<Vec<Value>> {
    let mut cursor = Cursor::new(bytes);
    let mut values = Vec::with_capacity(desc.args.len());
    for ty in desc.args {
        values.push(decode_value(ty, &mut cursor)?);
    }
    cursor.finish()?;
    Ok(values)
}

/// Encodes a handler's return value against `desc.ret`.
///
/// A void procedure takes `None` and produces an empty payload. A value
/// violating the descriptor (wrong type, over-long string) is an error:
/// the bound is part of the contract on both ends.
pub fn encode_result(desc: &ProcedureDesc, value: Option<&Value>) -> Result<Vec<u8>> {
    match (&desc.ret, value) {
        (None, None) => Ok(Vec::new()),
        (Some(ty), Some(value)) => {
            let mut out = Vec::new();
            encode_value(ty, value, 0, &mut out)?;
            Ok(out)
        }
        (None, Some(value)) => Err(PeercallError::TypeMismatch {
            index: 0,
            expected: "void".into(),
            got: value.tag(),
        }),
        (Some(ty), None) => Err(PeercallError::TypeMismatch {
            index: 0,
            expected: ty.tag(),
            got: "void".into(),
        }),
    }
}

/// Decodes a result payload against `desc.ret`.
///
/// Fails with `MalformedResponse` when the byte length does not match the
/// expected encoding, including a non-empty payload for a void return.
pub fn decode_result(desc: &ProcedureDesc, bytes: &[u8]) -> Result<Option<Value>> {
    match &desc.ret {
        None => {
            if bytes.is_empty() {
                Ok(None)
            } else {
                Err(PeercallError::MalformedResponse(format!(
                    "{} payload bytes for a void return",
                    bytes.len()
                )))
            }
        }
        Some(ty) => {
            let mut cursor = Cursor::new(bytes);
            let value = decode_value(ty, &mut cursor)?;
            cursor.finish()?;
            Ok(Some(value))
        }
    }
}

fn encode_value(ty: &WireType, value: &Value, index: usize, out: &mut Vec<u8>) -> Result<()> {
    match (ty, value) {
        (WireType::I32, Value::I32(v)) => out.extend_from_slice(&v.to_be_bytes()),
        (WireType::U32, Value::U32(v)) => out.extend_from_slice(&v.to_be_bytes()),
        (WireType::I64, Value::I64(v)) => out.extend_from_slice(&v.to_be_bytes()),
        (WireType::U64, Value::U64(v)) => out.extend_from_slice(&v.to_be_bytes()),
        (WireType::Str { max }, Value::Str(s)) => {
            if s.len() > *max as usize {
                return Err(PeercallError::ArgumentTooLarge {
                    len: s.len(),
                    max: *max as usize,
                });
            }
            out.extend_from_slice(&(s.len() as u16).to_be_bytes());
            out.extend_from_slice(s.as_bytes());
        }
        (WireType::Blob { size }, Value::Blob(b)) => {
            if b.len() != *size as usize {
                return Err(PeercallError::TypeMismatch {
                    index,
                    expected: ty.tag(),
                    got: value.tag(),
                });
            }
            out.extend_from_slice(b);
        }
        (ty, value) => {
            return Err(PeercallError::TypeMismatch {
                index,
                expected: ty.tag(),
                got: value.tag(),
            });
        }
    }
    Ok(())
}

fn decode_value(ty: &WireType, cursor: &mut Cursor<'_>) -> Result<Value> {
    match ty {
        WireType::I32 => Ok(Value::I32(i32::from_be_bytes(cursor.take_array()?))),
        WireType::U32 => Ok(Value::U32(u32::from_be_bytes(cursor.take_array()?))),
        WireType::I64 => Ok(Value::I64(i64::from_be_bytes(cursor.take_array()?))),
        WireType::U64 => Ok(Value::U64(u64::from_be_bytes(cursor.take_array()?))),
        WireType::Str { max } => {
            let len = u16::from_be_bytes(cursor.take_array()?) as usize;
            if len > *max as usize {
                return Err(PeercallError::MalformedResponse(format!(
                    "string of {len} bytes exceeds the descriptor bound of {max}"
                )));
            }
            let bytes = cursor.take(len)?;
            let s = std::str::from_utf8(bytes).map_err(|e| {
                PeercallError::MalformedResponse(format!("invalid UTF-8 in string: {e}"))
            })?;
            Ok(Value::Str(s.to_string()))
        }
        WireType::Blob { size } => Ok(Value::Blob(cursor.take(*size as usize)?.to_vec())),
    }
}

/// Bounds-checked reader over a payload.
struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Cursor { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let remaining = self.buf.len() - self.pos;
        if n > remaining {
            return Err(PeercallError::MalformedResponse(format!(
                "payload truncated: needed {n} bytes, {remaining} left"
            )));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    /// Succeeds only when every payload byte has been consumed.
    fn finish(&self) -> Result<()> {
        let remaining = self.buf.len() - self.pos;
        if remaining > 0 {
            return Err(PeercallError::MalformedResponse(format!(
                "{remaining} trailing bytes after the last value"
            )));
        }
        Ok(())
    }
}
