//! Partition table layout
//!
//! Decodes the `DRIVE_LAYOUT_INFORMATION_EX` reply of
//! `IOCTL_DISK_GET_DRIVE_LAYOUT_EX` into a [`PartitionLayout`].
//!
//! Reply layout (little-endian, 8-byte aligned):
//!
//! ```text
//! header (48 bytes)
//!   0  PartitionStyle  u32     0 = MBR, 1 = GPT, 2 = RAW
//!   4  PartitionCount  u32
//!   8  Mbr.Signature   u32     | Gpt.DiskId GUID
//! entry (144 bytes each, starting at 48)
//!   24 PartitionNumber u32
//!   32 Mbr.PartitionType u8, 33 BootIndicator u8, 40 Mbr.PartitionId GUID
//!   32 Gpt.PartitionType GUID, 48 Gpt.PartitionId GUID, 72 Gpt.Name [u16; 36]
//! ```

use crate::disk::device::Device;
use crate::disk::query::{query_with_growth, GrowthPolicy};
use crate::error::{FindfsError, Result};
use crate::guid::Guid;
use serde::Serialize;

/// Size of the layout header, up to the first partition entry
pub const LAYOUT_HEADER_SIZE: usize = 48;

/// Size of one `PARTITION_INFORMATION_EX`
pub const PARTITION_ENTRY_SIZE: usize = 144;

/// MBR partition type of an empty slot
pub const PARTITION_ENTRY_UNUSED: u8 = 0x00;

const PARTITION_STYLE_MBR: u32 = 0;
const PARTITION_STYLE_GPT: u32 = 1;
const PARTITION_STYLE_RAW: u32 = 2;

const GPT_NAME_CHARS: usize = 36;

const OPERATION: &str = "IOCTL_DISK_GET_DRIVE_LAYOUT_EX";

/// A used MBR partition slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MbrEntry {
    /// Partition number Windows assigned to the slot
    pub partition_number: u32,
    /// MBR partition type byte
    pub partition_type: u8,
    /// Active flag
    pub boot_indicator: bool,
    /// GUID Windows synthesizes for the slot; not stored on disk
    pub partition_id: Guid,
    /// Byte offset of the partition
    pub starting_offset: u64,
    /// Length in bytes
    pub length: u64,
}

impl MbrEntry {
    /// Whether the slot holds a partition
    pub fn is_used(&self) -> bool {
        self.partition_type != PARTITION_ENTRY_UNUSED
    }
}

/// A GPT partition entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GptEntry {
    /// Partition number, starting at 1 and not necessarily contiguous
    pub partition_number: u32,
    /// Partition type GUID
    pub partition_type: Guid,
    /// Unique partition GUID (PARTUUID)
    pub partition_id: Guid,
    /// Partition name
    pub name: String,
    /// Byte offset of the partition
    pub starting_offset: u64,
    /// Length in bytes
    pub length: u64,
}

/// Partition table of one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scheme", rename_all = "lowercase")]
pub enum PartitionLayout {
    /// Master Boot Record
    Mbr {
        /// Disk signature
        signature: u32,
        /// Used partition slots
        entries: Vec<MbrEntry>,
    },
    /// GUID Partition Table
    Gpt {
        /// Disk GUID (PTUUID)
        disk_id: Guid,
        /// Partition entries
        entries: Vec<GptEntry>,
    },
}

impl PartitionLayout {
    /// Number of partitions in the layout
    pub fn partition_count(&self) -> usize {
        match self {
            Self::Mbr { entries, .. } => entries.len(),
            Self::Gpt { entries, .. } => entries.len(),
        }
    }

    /// Scheme name
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Mbr { .. } => "MBR",
            Self::Gpt { .. } => "GPT",
        }
    }
}

/// Buffer policy for layout queries: header plus zero entries, one entry per retry
pub fn layout_growth_policy(max_partition_entries: usize) -> GrowthPolicy {
    GrowthPolicy::new(
        LAYOUT_HEADER_SIZE,
        PARTITION_ENTRY_SIZE,
        PARTITION_ENTRY_SIZE
            .saturating_mul(max_partition_entries)
            .saturating_add(LAYOUT_HEADER_SIZE),
    )
}

/// Query the partition layout of `device`
///
/// Returns `Ok(None)` for a device without an initialized partition table.
pub fn query_layout<D: Device + ?Sized>(
    device: &D,
    policy: &GrowthPolicy,
) -> Result<Option<PartitionLayout>> {
    let output = query_with_growth(policy, OPERATION, |buffer| device.drive_layout(buffer))?;
    log::trace!(
        "{}: layout query done after {} attempt(s)",
        device.path(),
        output.attempts
    );
    decode_layout(&output.bytes)
}

/// Decode a `DRIVE_LAYOUT_INFORMATION_EX` reply
pub fn decode_layout(raw: &[u8]) -> Result<Option<PartitionLayout>> {
    let style = read_u32(raw, 0)?;
    let count = read_u32(raw, 4)? as usize;

    let expected = count
        .checked_mul(PARTITION_ENTRY_SIZE)
        .and_then(|n| n.checked_add(LAYOUT_HEADER_SIZE))
        .ok_or_else(|| FindfsError::MalformedLayout(format!("partition count {}", count)))?;
    if raw.len() < expected {
        return Err(FindfsError::TruncatedLayout {
            expected,
            returned: raw.len(),
        });
    }

    let entry = |index: usize| {
        let start = LAYOUT_HEADER_SIZE + index * PARTITION_ENTRY_SIZE;
        &raw[start..start + PARTITION_ENTRY_SIZE]
    };

    match style {
        PARTITION_STYLE_MBR => {
            let signature = read_u32(raw, 8)?;
            let mut entries = Vec::new();
            for index in 0..count {
                let mbr = decode_mbr_entry(entry(index))?;
                if mbr.is_used() {
                    entries.push(mbr);
                }
            }
            Ok(Some(PartitionLayout::Mbr { signature, entries }))
        }
        PARTITION_STYLE_GPT => {
            let disk_id = read_guid(raw, 8)?;
            let entries = (0..count)
                .map(|index| decode_gpt_entry(entry(index)))
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(PartitionLayout::Gpt { disk_id, entries }))
        }
        PARTITION_STYLE_RAW => Ok(None),
        other => Err(FindfsError::MalformedLayout(format!(
            "unknown partition style {}",
            other
        ))),
    }
}

fn decode_mbr_entry(raw: &[u8]) -> Result<MbrEntry> {
    Ok(MbrEntry {
        partition_number: read_u32(raw, 24)?,
        partition_type: read_u8(raw, 32)?,
        boot_indicator: read_u8(raw, 33)? != 0,
        partition_id: read_guid(raw, 40)?,
        starting_offset: read_u64(raw, 8)?,
        length: read_u64(raw, 16)?,
    })
}

fn decode_gpt_entry(raw: &[u8]) -> Result<GptEntry> {
    let name_units = (0..GPT_NAME_CHARS)
        .map(|i| read_u16(raw, 72 + i * 2))
        .collect::<Result<Vec<_>>>()?;
    let end = name_units.iter().position(|&c| c == 0).unwrap_or(name_units.len());

    Ok(GptEntry {
        partition_number: read_u32(raw, 24)?,
        partition_type: read_guid(raw, 32)?,
        partition_id: read_guid(raw, 48)?,
        name: String::from_utf16_lossy(&name_units[..end]),
        starting_offset: read_u64(raw, 8)?,
        length: read_u64(raw, 16)?,
    })
}

fn field<const N: usize>(raw: &[u8], offset: usize) -> Result<[u8; N]> {
    raw.get(offset..offset + N)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or_else(|| {
            FindfsError::MalformedLayout(format!(
                "{} byte field at offset {} is past the end ({} bytes)",
                N,
                offset,
                raw.len()
            ))
        })
}

fn read_u8(raw: &[u8], offset: usize) -> Result<u8> {
    field::<1>(raw, offset).map(|[b]| b)
}

fn read_u16(raw: &[u8], offset: usize) -> Result<u16> {
    field(raw, offset).map(u16::from_le_bytes)
}

fn read_u32(raw: &[u8], offset: usize) -> Result<u32> {
    field(raw, offset).map(u32::from_le_bytes)
}

fn read_u64(raw: &[u8], offset: usize) -> Result<u64> {
    field(raw, offset).map(u64::from_le_bytes)
}

fn read_guid(raw: &[u8], offset: usize) -> Result<Guid> {
    field(raw, offset).map(Guid::from_le_bytes)
}

/// Builders for raw layout replies, used to simulate devices
#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    fn put(raw: &mut [u8], offset: usize, bytes: &[u8]) {
        raw[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    fn header(style: u32, count: usize) -> Vec<u8> {
        let mut raw = vec![0u8; LAYOUT_HEADER_SIZE + count * PARTITION_ENTRY_SIZE];
        put(&mut raw, 0, &style.to_le_bytes());
        put(&mut raw, 4, &(count as u32).to_le_bytes());
        raw
    }

    fn entry_mut(raw: &mut [u8], index: usize) -> &mut [u8] {
        let start = LAYOUT_HEADER_SIZE + index * PARTITION_ENTRY_SIZE;
        &mut raw[start..start + PARTITION_ENTRY_SIZE]
    }

    /// GPT reply; partitions are `(partition_number, partition_id, name)`
    pub fn gpt(disk_id: Guid, partitions: &[(u32, Guid, &str)]) -> Vec<u8> {
        let mut raw = header(PARTITION_STYLE_GPT, partitions.len());
        put(&mut raw, 8, &disk_id.to_le_bytes());
        for (index, (number, id, name)) in partitions.iter().enumerate() {
            let entry = entry_mut(&mut raw, index);
            put(entry, 0, &PARTITION_STYLE_GPT.to_le_bytes());
            put(entry, 8, &(*number as u64 * 1_048_576).to_le_bytes());
            put(entry, 16, &1_048_576u64.to_le_bytes());
            put(entry, 24, &number.to_le_bytes());
            put(entry, 32, &Guid::from_u128(0x0fc63daf_8483_4772_8e79_3d69d8477de4).to_le_bytes());
            put(entry, 48, &id.to_le_bytes());
            for (i, unit) in name.encode_utf16().take(GPT_NAME_CHARS).enumerate() {
                put(entry, 72 + i * 2, &unit.to_le_bytes());
            }
        }
        raw
    }

    /// MBR reply; slots are `(partition_number, partition_type, partition_id)`
    pub fn mbr(signature: u32, slots: &[(u32, u8, Guid)]) -> Vec<u8> {
        let mut raw = header(PARTITION_STYLE_MBR, slots.len());
        put(&mut raw, 8, &signature.to_le_bytes());
        for (index, (number, kind, id)) in slots.iter().enumerate() {
            let entry = entry_mut(&mut raw, index);
            put(entry, 24, &number.to_le_bytes());
            put(entry, 32, &[*kind]);
            put(entry, 40, &id.to_le_bytes());
        }
        raw
    }

    /// Reply for a disk without a partition table
    pub fn raw_disk() -> Vec<u8> {
        header(PARTITION_STYLE_RAW, 0)
    }
}
