//! GUID values as Windows stores them
//!
//! The partition table queries hand back GUIDs in the Windows in-memory layout
//! (`Data1`..`Data3` little-endian). Text is always the canonical 8-4-4-4-12 form.

use crate::error::{FindfsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Length of the canonical hyphenated text form
const GUID_TEXT_LEN: usize = 36;

/// Byte positions of the hyphens in the canonical text form
const HYPHENS: [usize; 4] = [8, 13, 18, 23];

/// A 16-byte GUID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(Uuid);

impl Guid {
    /// The all-zero GUID
    pub const NIL: Guid = Guid(Uuid::nil());

    /// Build a GUID from its Windows in-memory representation
    pub fn from_le_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes_le(bytes))
    }

    /// Windows in-memory representation of this GUID
    pub fn to_le_bytes(&self) -> [u8; 16] {
        self.0.to_bytes_le()
    }

    /// Build a GUID from its numeric value (as written in the text form)
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Numeric value of this GUID
    pub fn as_u128(&self) -> u128 {
        self.0.as_u128()
    }

    /// Parse the canonical hyphenated form, rejecting every other shape
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || FindfsError::InvalidGuid(text.to_string());

        if text.len() != GUID_TEXT_LEN {
            return Err(invalid());
        }

        let shape_ok = text.bytes().enumerate().all(|(i, b)| {
            if HYPHENS.contains(&i) {
                b == b'-'
            } else {
                b.is_ascii_hexdigit()
            }
        });
        if !shape_ok {
            return Err(invalid());
        }

        Uuid::try_parse(text).map(Self).map_err(|_| invalid())
    }
}

impl FromStr for Guid {
    type Err = FindfsError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical() {
        let guid = Guid::parse("0fc63daf-8483-4772-8e79-3d69d8477de4").unwrap();
        assert_eq!(guid.as_u128(), 0x0fc63daf_8483_4772_8e79_3d69d8477de4);
        assert_eq!(guid.to_string(), "0fc63daf-8483-4772-8e79-3d69d8477de4");
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        let lower = Guid::parse("c12a7328-f81f-11d2-ba4b-00a0c93ec93b").unwrap();
        let upper = Guid::parse("C12A7328-F81F-11D2-BA4B-00A0C93EC93B").unwrap();
        assert_eq!(lower, upper);
        assert_eq!(upper.to_string(), "c12a7328-f81f-11d2-ba4b-00a0c93ec93b");
    }

    #[test]
    fn test_windows_byte_layout() {
        // Data1..Data3 little-endian, Data4 as-is
        let bytes = [
            0xaf, 0x3d, 0xc6, 0x0f, 0x83, 0x84, 0x72, 0x47, 0x8e, 0x79, 0x3d, 0x69, 0xd8, 0x47,
            0x7d, 0xe4,
        ];
        let guid = Guid::from_le_bytes(bytes);
        assert_eq!(guid.to_string(), "0fc63daf-8483-4772-8e79-3d69d8477de4");
        assert_eq!(guid.to_le_bytes(), bytes);
    }

    #[test]
    fn test_text_round_trip_extremes() {
        for bytes in [[0x00u8; 16], [0xffu8; 16]] {
            let guid = Guid::from_le_bytes(bytes);
            let parsed = Guid::parse(&guid.to_string()).unwrap();
            assert_eq!(parsed.to_le_bytes(), bytes);
        }
        assert_eq!(Guid::NIL.to_string(), "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn test_text_round_trip_mixed_bytes() {
        let bytes: [u8; 16] = std::array::from_fn(|i| (i as u8).wrapping_mul(37).wrapping_add(11));
        let guid = Guid::from_le_bytes(bytes);
        assert_eq!(Guid::parse(&guid.to_string()).unwrap(), guid);
    }

    #[test]
    fn test_rejects_malformed_text() {
        let malformed = [
            "",
            "0fc63daf-8483-4772-8e79-3d69d8477de",   // too short
            "0fc63daf-8483-4772-8e79-3d69d8477de44", // too long
            "0fc63daf84834772-8e79-3d69d8477de4a",   // missing hyphen
            "0fc63daf-8483-4772-8e793d69d8477de4-",  // hyphen in the wrong place
            "0fc63daf-8483-4772-8e79-3d69d8477dg4",  // non-hex
            "{0fc63daf-8483-4772-8e79-3d69d8477de4}",
            "0fc63daf848347728e793d69d8477de4",      // simple form
            "urn:uuid:0fc63daf-8483-4772-8e79-3d69d8477de4",
            " 0fc63daf-8483-4772-8e79-3d69d8477de",
            "0fc63daf-8483-4772-8e79-3d69d8477dé",
        ];
        for text in malformed {
            assert!(
                matches!(Guid::parse(text), Err(FindfsError::InvalidGuid(_))),
                "accepted {:?}",
                text
            );
        }
    }
}
