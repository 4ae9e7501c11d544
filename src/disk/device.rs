//! Open block devices
//!
//! A [`Device`] is one open, read-only handle to a device interface. Whoever
//! holds the value owns the handle; dropping it releases the handle.

use crate::error::Result;

/// Outcome of an OS query that writes into a caller-provided buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoctlOutcome {
    /// The query succeeded and wrote this many bytes
    Complete(usize),
    /// The buffer was too small; the OS may say how large it must be
    InsufficientBuffer(Option<usize>),
}

/// Reply to a storage device-number query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceNumber {
    /// `FILE_DEVICE_*` type of the device
    pub device_type: u32,
    /// Index of the device within its type
    pub device_number: u32,
    /// Partition the opened interface refers to, or 0 for the whole device
    pub partition_number: u32,
}

/// An open block device
#[cfg_attr(test, mockall::automock)]
pub trait Device {
    /// OS-native interface path this device was opened through
    fn path(&self) -> &str;

    /// Issue the drive layout query into `buffer`
    fn drive_layout(&self, buffer: &mut [u8]) -> Result<IoctlOutcome>;

    /// Issue the storage device-number query
    fn device_number(&self) -> Result<DeviceNumber>;
}

impl<D: Device + ?Sized> Device for Box<D> {
    fn path(&self) -> &str {
        (**self).path()
    }

    fn drive_layout(&self, buffer: &mut [u8]) -> Result<IoctlOutcome> {
        (**self).drive_layout(buffer)
    }

    fn device_number(&self) -> Result<DeviceNumber> {
        (**self).device_number()
    }
}
