//! findfs-style tags
//!
//! Only the tags stored in the GPT partition table can be seen from Windows;
//! filesystem-level `LABEL=` or `UUID=` live inside the filesystem.

use crate::error::{FindfsError, Result};
use crate::guid::Guid;
use std::fmt;
use std::str::FromStr;

const PTUUID: &str = "PTUUID=";
const PARTUUID: &str = "PARTUUID=";

/// A parsed `PTUUID=` or `PARTUUID=` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// Partition table (whole disk) GUID
    PtUuid(Guid),
    /// Partition GUID
    PartUuid(Guid),
}

impl Tag {
    /// The GUID being looked for
    pub fn guid(&self) -> Guid {
        match self {
            Self::PtUuid(guid) | Self::PartUuid(guid) => *guid,
        }
    }
}

impl FromStr for Tag {
    type Err = FindfsError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |_: FindfsError| FindfsError::InvalidGuid(s.to_string());

        if let Some(text) = s.strip_prefix(PARTUUID) {
            Guid::parse(text).map(Self::PartUuid).map_err(invalid)
        } else if let Some(text) = s.strip_prefix(PTUUID) {
            Guid::parse(text).map(Self::PtUuid).map_err(invalid)
        } else {
            Err(FindfsError::UnsupportedTag(s.to_string()))
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PtUuid(guid) => write!(f, "{}{}", PTUUID, guid),
            Self::PartUuid(guid) => write!(f, "{}{}", PARTUUID, guid),
        }
    }
}
