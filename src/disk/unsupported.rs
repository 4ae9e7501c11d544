//! Device enumeration off Windows
//!
//! There is no setup API to walk, so every enumeration fails up front.

use crate::config::DeviceClass;
use crate::disk::enumerate::{DeviceEnumerator, Devices};
use crate::error::{FindfsError, Result};

/// Enumerator for platforms without the Windows setup API
#[derive(Debug, Default)]
pub struct UnsupportedEnumerator;

impl UnsupportedEnumerator {
    /// Create the enumerator
    pub fn new() -> Self {
        Self
    }
}

impl DeviceEnumerator for UnsupportedEnumerator {
    fn enumerate(&self, class: DeviceClass) -> Result<Devices<'_>> {
        Err(FindfsError::EnumerationUnavailable(format!(
            "listing {} interfaces requires Windows",
            class
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enumeration_is_unavailable() {
        let enumerator = UnsupportedEnumerator::new();
        let result = enumerator.enumerate(DeviceClass::Disk);
        assert!(matches!(result, Err(FindfsError::EnumerationUnavailable(_))));
    }
}
