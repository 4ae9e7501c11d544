//! Disk discovery
//!
//! Enumerates block devices, reads their partition tables, and maps them to
//! physical drive names.

pub mod device;
pub mod enumerate;
pub mod identity;
pub mod layout;
pub mod query;

#[cfg(windows)]
mod setupapi;
#[cfg(not(windows))]
mod unsupported;

pub use device::{Device, DeviceNumber, IoctlOutcome};
pub use enumerate::{DeviceEnumerator, Devices, SystemEnumerator};
pub use identity::{resolve_identity, DeviceIdentifier};
pub use layout::{query_layout, GptEntry, MbrEntry, PartitionLayout};
pub use query::{query_with_growth, GrowthPolicy, QueryOutput};
