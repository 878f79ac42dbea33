//! Standard procedure descriptors
//!
//! This module defines the shared contracts for all standard procedures
//! exported by a peercall server. These descriptors are the single source
//! of truth for the wire format of each procedure: both ends embed them
//! verbatim, and changing one is a breaking protocol change.
//!
//! The tables are process-wide read-only statics, initialized at compile
//! time and never mutated, so they are safe to share across threads
//! without locking.

use crate::protocol::error::{PeercallError, Result};
use crate::wire::{ProcedureDesc, WireType};

/// Byte bound shared by every string position in the standard procedures.
pub const STR_MAX: u16 = 255;

const STR: WireType = WireType::Str { max: STR_MAX };

// ============================================================================
// Descriptors
// ============================================================================

/// `count() -> IoCounts`: the peer's feed-session byte counters.
pub static COUNT: ProcedureDesc = ProcedureDesc::new(
    "count",
    &[],
    Some(WireType::Blob {
        size: IoCounts::WIRE_SIZE,
    }),
);

/// `getenv(name) -> value`: a variable from the peer's environment.
/// An unset name yields the empty string, per the remote's convention.
pub static GETENV: ProcedureDesc = ProcedureDesc::new("getenv", &[STR], Some(STR));

/// `setenv(name, value) -> i32`: sets a variable in the peer's environment.
pub static SETENV: ProcedureDesc = ProcedureDesc::new("setenv", &[STR, STR], Some(WireType::I32));

/// `feed(text) -> i32`: feeds text to the peer's session, returning the
/// number of bytes accepted.
pub static FEED: ProcedureDesc = ProcedureDesc::new("feed", &[STR], Some(WireType::I32));

/// `strlen(s) -> i32`: byte length, computed remotely.
pub static STRLEN: ProcedureDesc = ProcedureDesc::new("strlen", &[STR], Some(WireType::I32));

/// `strcat(a, b) -> s`: concatenation, computed remotely. The result
/// shares the arguments' byte bound; a concatenation exceeding it is a
/// handler failure, never a truncation.
pub static STRCAT: ProcedureDesc = ProcedureDesc::new("strcat", &[STR, STR], Some(STR));

/// `stat(path) -> StatInfo`: filesystem metadata from the peer's view.
pub static STAT: ProcedureDesc = ProcedureDesc::new(
    "stat",
    &[STR],
    Some(WireType::Blob {
        size: StatInfo::WIRE_SIZE,
    }),
);

/// Every standard procedure, in a stable order.
pub static ALL: &[&ProcedureDesc] = &[
    &COUNT, &GETENV, &SETENV, &FEED, &STRLEN, &STRCAT, &STAT,
];

// ============================================================================
// Fixed-layout structs
// ============================================================================

/// Feed-session byte counters returned by `count`.
///
/// Wire layout (big-endian): input i32, output i32.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IoCounts {
    /// Bytes fed into the session.
    pub input: i32,
    /// Bytes the session emitted back.
    pub output: i32,
}

impl IoCounts {
    pub const WIRE_SIZE: u16 = 8;

    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::WIRE_SIZE as usize);
        out.extend_from_slice(&self.input.to_be_bytes());
        out.extend_from_slice(&self.output.to_be_bytes());
        out
    }

    pub fn from_wire(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::WIRE_SIZE as usize {
            return Err(PeercallError::MalformedResponse(format!(
                "IoCounts payload of {} bytes, expected {}",
                bytes.len(),
                Self::WIRE_SIZE
            )));
        }
        Ok(IoCounts {
            input: i32::from_be_bytes(bytes[0..4].try_into().expect("length checked")),
            output: i32::from_be_bytes(bytes[4..8].try_into().expect("length checked")),
        })
    }
}

/// Filesystem metadata returned by `stat`.
///
/// Wire layout (big-endian, field order as declared): dev u64, ino u64,
/// mode u32, rdev u64, size i64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatInfo {
    pub dev: u64,
    pub ino: u64,
    pub mode: u32,
    pub rdev: u64,
    pub size: i64,
}

impl StatInfo {
    pub const WIRE_SIZE: u16 = 36;

    pub fn to_wire(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::WIRE_SIZE as usize);
        out.extend_from_slice(&self.dev.to_be_bytes());
        out.extend_from_slice(&self.ino.to_be_bytes());
        out.extend_from_slice(&self.mode.to_be_bytes());
        out.extend_from_slice(&self.rdev.to_be_bytes());
        out.extend_from_slice(&self.size.to_be_bytes());
        out
    }

    pub fn from_wire(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != Self::WIRE_SIZE as usize {
            return Err(PeercallError::MalformedResponse(format!(
                "StatInfo payload of {} bytes, expected {}",
                bytes.len(),
                Self::WIRE_SIZE
            )));
        }
        Ok(StatInfo {
            dev: u64::from_be_bytes(bytes[0..8].try_into().expect("length checked")),
            ino: u64::from_be_bytes(bytes[8..16].try_into().expect("length checked")),
            mode: u32::from_be_bytes(bytes[16..20].try_into().expect("length checked")),
            rdev: u64::from_be_bytes(bytes[20..28].try_into().expect("length checked")),
            size: i64::from_be_bytes(bytes[28..36].try_into().expect("length checked")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_names_are_unique() {
        let mut names: Vec<_> = ALL.iter().map(|d| d.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL.len());
    }

    #[test]
    fn test_blob_descriptors_match_struct_sizes() {
        assert_eq!(
            COUNT.ret,
            Some(WireType::Blob {
                size: IoCounts::WIRE_SIZE
            })
        );
        assert_eq!(
            STAT.ret,
            Some(WireType::Blob {
                size: StatInfo::WIRE_SIZE
            })
        );
    }

    #[test]
    fn test_io_counts_roundtrip() {
        let counts = IoCounts {
            input: -1,
            output: i32::MAX,
        };
        let wire = counts.to_wire();
        assert_eq!(wire.len(), IoCounts::WIRE_SIZE as usize);
        assert_eq!(IoCounts::from_wire(&wire).unwrap(), counts);
    }

    #[test]
    fn test_stat_info_roundtrip() {
        let info = StatInfo {
            dev: 0x0801,
            ino: 131_203,
            mode: 0o100644,
            rdev: 0,
            size: -1,
        };
        let wire = info.to_wire();
        assert_eq!(wire.len(), StatInfo::WIRE_SIZE as usize);
        assert_eq!(StatInfo::from_wire(&wire).unwrap(), info);
    }

    #[test]
    fn test_struct_decode_rejects_wrong_length() {
        assert!(IoCounts::from_wire(&[0; 7]).is_err());
        assert!(StatInfo::from_wire(&[0; 37]).is_err());
    }
}
