//! Tag resolution and device listing
//!
//! Walks the enumerated devices one at a time: layout query, GUID match, and
//! only for a match the physical drive lookup. The first match ends the walk.

use crate::config::Config;
use crate::disk::layout::layout_growth_policy;
use crate::disk::{
    query_layout, resolve_identity, Device, DeviceEnumerator, DeviceIdentifier, GrowthPolicy,
    PartitionLayout,
};
use crate::error::Result;
use crate::matcher::{match_layout, MatchResult};
use crate::tag::Tag;
use serde::Serialize;
use std::fmt;

/// A resolved device, ready to hand to `wsl --mount`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Physical drive holding the disk or partition
    pub device_identifier: DeviceIdentifier,
    /// Partition number, for partition matches
    pub partition_index: Option<u32>,
}

impl ResolvedTarget {
    /// Drop the partition, addressing the whole physical drive instead
    pub fn into_bare(self) -> Self {
        Self {
            partition_index: None,
            ..self
        }
    }

    /// Command-line tokens: `<drive>` or `<drive> --partition <n>`
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![self.device_identifier.to_string()];
        if let Some(index) = self.partition_index {
            args.push("--partition".to_string());
            args.push(index.to_string());
        }
        args
    }
}

impl fmt::Display for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_args().join(" "))
    }
}

/// Outcome of a resolution walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A device holds the GUID
    Matched(ResolvedTarget),
    /// Every device was visited without a match
    Exhausted,
}

/// One device as seen by `--list`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceListing {
    /// Interface path the device was opened through
    pub device_path: String,
    /// Physical drive, if the device is disk-class
    pub device_identifier: Option<DeviceIdentifier>,
    /// Partition table, if one could be read
    pub layout: Option<PartitionLayout>,
}

impl DeviceListing {
    /// findfs-style lines for this device
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("DevicePath = {}", self.device_path)];

        let (Some(drive), Some(layout)) = (&self.device_identifier, &self.layout) else {
            return lines;
        };

        match layout {
            PartitionLayout::Mbr { entries, .. } => {
                for entry in entries {
                    lines.push(format!(
                        "{} --partition {} PARTUUID={}",
                        drive, entry.partition_number, entry.partition_id
                    ));
                }
            }
            PartitionLayout::Gpt { disk_id, entries } => {
                lines.push(format!("{} PTUUID={}", drive, disk_id));
                for entry in entries {
                    lines.push(format!(
                        "{} --partition {} PARTUUID={}",
                        drive, entry.partition_number, entry.partition_id
                    ));
                }
            }
        }

        lines
    }
}

/// Resolves tags against the devices an enumerator provides
pub struct Resolver<E> {
    enumerator: E,
    config: Config,
}

impl<E: DeviceEnumerator> Resolver<E> {
    /// Create a resolver
    pub fn new(enumerator: E, config: Config) -> Self {
        Self { enumerator, config }
    }

    fn policy(&self) -> GrowthPolicy {
        layout_growth_policy(self.config.max_partition_entries)
    }

    /// Find the device holding `tag`'s GUID
    ///
    /// Devices that cannot be queried are reported and skipped. With `bare`
    /// configured, partition matches resolve to the whole drive.
    pub fn resolve(&self, tag: &Tag) -> Result<Resolution> {
        let policy = self.policy();
        log::debug!("Resolving {}", tag);

        for device in self.enumerator.enumerate(self.config.device_class)? {
            let Some(target) = self.match_device(device.as_ref(), tag, &policy) else {
                continue;
            };

            let target = if self.config.bare {
                target.into_bare()
            } else {
                target
            };
            log::info!("{} resolved to {}", tag, target);
            return Ok(Resolution::Matched(target));
        }

        log::debug!("No device holds {}", tag);
        Ok(Resolution::Exhausted)
    }

    fn match_device(
        &self,
        device: &dyn Device,
        tag: &Tag,
        policy: &GrowthPolicy,
    ) -> Option<ResolvedTarget> {
        let layout = match query_layout(device, policy) {
            Ok(Some(layout)) => layout,
            Ok(None) => {
                log::debug!("{}: no partition table", device.path());
                return None;
            }
            Err(e) => {
                log::warn!("{}: {}", device.path(), e);
                return None;
            }
        };

        log::debug!(
            "{}: {} layout with {} partition(s)",
            device.path(),
            layout.scheme(),
            layout.partition_count()
        );

        let partition_index = match match_layout(&layout, tag) {
            MatchResult::NoMatch => return None,
            MatchResult::WholeDisk => None,
            MatchResult::Partition(index) => {
                if let PartitionLayout::Mbr { .. } = layout {
                    log::warn!(
                        "{} is an MBR pseudo-GUID made up by Windows; \
                         non-Windows tools will not report it for this partition",
                        tag.guid()
                    );
                }
                Some(index)
            }
        };

        match resolve_identity(device) {
            Ok(Some(device_identifier)) => Some(ResolvedTarget {
                device_identifier,
                partition_index,
            }),
            Ok(None) => None,
            Err(e) => {
                log::warn!("{}: {}", device.path(), e);
                None
            }
        }
    }

    /// Describe every enumerated device and its partition GUIDs
    pub fn list(&self) -> Result<Vec<DeviceListing>> {
        let policy = self.policy();
        let mut listings = Vec::new();

        for device in self.enumerator.enumerate(self.config.device_class)? {
            let device_identifier = resolve_identity(device.as_ref()).unwrap_or_else(|e| {
                log::warn!("{}: {}", device.path(), e);
                None
            });

            let layout = query_layout(device.as_ref(), &policy).unwrap_or_else(|e| {
                log::warn!("{}: {}", device.path(), e);
                None
            });

            let mbr_in_use = matches!(
                layout,
                Some(PartitionLayout::Mbr { ref entries, .. }) if !entries.is_empty()
            );
            if mbr_in_use {
                log::warn!(
                    "{}: MBR PARTUUIDs are made up by Windows \
                     and differ from what other tools report",
                    device.path()
                );
            }

            listings.push(DeviceListing {
                device_path: device.path().to_string(),
                device_identifier,
                layout,
            });
        }

        Ok(listings)
    }
}
