//! Device enumeration
//!
//! An enumerator lists the present interfaces of one device class and opens
//! each of them. Devices that fail to open are reported and skipped; the
//! sequence itself only fails when the OS cannot enumerate at all.

use crate::config::DeviceClass;
use crate::disk::device::Device;
use crate::error::Result;

/// Lazy sequence of open devices
pub type Devices<'a> = Box<dyn Iterator<Item = Box<dyn Device>> + 'a>;

/// Source of open block devices
pub trait DeviceEnumerator {
    /// Enumerate the present interfaces of `class`
    ///
    /// Each call queries the OS afresh. Each yielded device owns its handle,
    /// so dropping it before advancing keeps one handle open at a time.
    fn enumerate(&self, class: DeviceClass) -> Result<Devices<'_>>;
}

impl<E: DeviceEnumerator + ?Sized> DeviceEnumerator for &E {
    fn enumerate(&self, class: DeviceClass) -> Result<Devices<'_>> {
        (**self).enumerate(class)
    }
}

#[cfg(windows)]
pub use crate::disk::setupapi::SetupApiEnumerator as SystemEnumerator;

#[cfg(not(windows))]
pub use crate::disk::unsupported::UnsupportedEnumerator as SystemEnumerator;
