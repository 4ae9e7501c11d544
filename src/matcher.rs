//! GUID matching against a partition layout

use crate::disk::PartitionLayout;
use crate::tag::Tag;

/// Where a tag's GUID was found in a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    /// The GPT disk GUID
    WholeDisk,
    /// The partition with this number
    Partition(u32),
    /// Nowhere
    NoMatch,
}

/// Look for `tag` in `layout`
///
/// `PTUUID=` only ever matches a GPT disk GUID; MBR disks have none. `PARTUUID=`
/// matches GPT partition GUIDs and the pseudo-GUIDs Windows makes up for MBR
/// slots. The first matching entry wins.
pub fn match_layout(layout: &PartitionLayout, tag: &Tag) -> MatchResult {
    match (tag, layout) {
        (Tag::PtUuid(guid), PartitionLayout::Gpt { disk_id, .. }) if disk_id == guid => {
            MatchResult::WholeDisk
        }
        (Tag::PtUuid(_), _) => MatchResult::NoMatch,
        (Tag::PartUuid(guid), PartitionLayout::Gpt { entries, .. }) => entries
            .iter()
            .find(|entry| entry.partition_id == *guid)
            .map_or(MatchResult::NoMatch, |entry| {
                MatchResult::Partition(entry.partition_number)
            }),
        (Tag::PartUuid(guid), PartitionLayout::Mbr { entries, .. }) => entries
            .iter()
            .find(|entry| entry.partition_id == *guid)
            .map_or(MatchResult::NoMatch, |entry| {
                MatchResult::Partition(entry.partition_number)
            }),
    }
}
