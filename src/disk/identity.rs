//! Physical device identity
//!
//! Every interface of a disk (the disk itself, or one of its volumes) maps to
//! the same `\\.\PhysicalDrive<n>` name, which is what `wsl --mount` takes.

use crate::disk::device::Device;
use crate::error::Result;
use serde::Serialize;
use std::fmt;

/// `FILE_DEVICE_DISK`
pub const FILE_DEVICE_DISK: u32 = 0x0000_0007;

/// Stable name of a physical disk
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DeviceIdentifier(String);

impl DeviceIdentifier {
    /// Identifier of the physical drive with the given index
    pub fn physical_drive(number: u32) -> Self {
        Self(format!(r"\\.\PhysicalDrive{}", number))
    }

    /// The identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Map an open device to its physical drive
///
/// Returns `Ok(None)` when the device is not disk-class and so has no
/// physical drive name.
pub fn resolve_identity<D: Device + ?Sized>(device: &D) -> Result<Option<DeviceIdentifier>> {
    let number = device.device_number()?;

    if number.device_type != FILE_DEVICE_DISK {
        log::warn!(
            r"{} is not FILE_DEVICE_DISK (type {:#x}), cannot map to \\.\PhysicalDrive<n>",
            device.path(),
            number.device_type
        );
        return Ok(None);
    }

    Ok(Some(DeviceIdentifier::physical_drive(number.device_number)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::device::{DeviceNumber, MockDevice};
    use crate::error::FindfsError;

    fn device_with(number: DeviceNumber) -> MockDevice {
        let mut device = MockDevice::new();
        device
            .expect_path()
            .return_const(r"\\?\mock#volume".to_string());
        device
            .expect_device_number()
            .times(1)
            .returning(move || Ok(number));
        device
    }

    #[test]
    fn test_disk_maps_to_physical_drive() {
        let device = device_with(DeviceNumber {
            device_type: FILE_DEVICE_DISK,
            device_number: 3,
            partition_number: 2,
        });
        let id = resolve_identity(&device).unwrap().unwrap();
        assert_eq!(id.as_str(), r"\\.\PhysicalDrive3");
    }

    #[test]
    fn test_non_disk_is_unmappable() {
        // FILE_DEVICE_CD_ROM
        let device = device_with(DeviceNumber {
            device_type: 0x02,
            device_number: 0,
            partition_number: 0,
        });
        assert_eq!(resolve_identity(&device).unwrap(), None);
    }

    #[test]
    fn test_query_failure_is_an_error() {
        let mut device = MockDevice::new();
        device
            .expect_device_number()
            .returning(|| {
                Err(FindfsError::os(
                    "IOCTL_STORAGE_GET_DEVICE_NUMBER",
                    "Access is denied.",
                ))
            });
        assert!(resolve_identity(&device).is_err());
    }

    #[test]
    fn test_identifier_display() {
        assert_eq!(
            DeviceIdentifier::physical_drive(0).to_string(),
            r"\\.\PhysicalDrive0"
        );
    }
}
