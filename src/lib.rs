//! wsl-mount-findfs Library
//!
//! Resolves findfs-style tags to the device arguments of `wsl --mount`:
//! - `PTUUID=<guid>` selects the physical drive whose GPT disk GUID matches
//! - `PARTUUID=<guid>` selects a drive and adds `--partition <n>`
//!
//! Filesystem-level `LABEL=` or `UUID=` tags cannot be used, since Windows
//! cannot see inside Linux filesystems.
//!
//! # Architecture
//!
//! - `disk`: device enumeration, partition layout queries, physical drive lookup
//! - `matcher`: GUID matching against a partition layout
//! - `resolver`: the resolution walk and `--list` output
//! - `guid` / `tag`: GUID text and tag parsing
//! - `config`: configuration types and validation
//! - `error`: error types and handling
//!
//! # Example
//!
//! ```rust,no_run
//! use wsl_mount_findfs::*;
//!
//! # fn main() -> Result<()> {
//! let tag: Tag = "PARTUUID=0fc63daf-8483-4772-8e79-3d69d8477de4".parse()?;
//!
//! let resolver = Resolver::new(SystemEnumerator::new(), Config::default());
//! match resolver.resolve(&tag)? {
//!     Resolution::Matched(target) => println!("{}", target),
//!     Resolution::Exhausted => eprintln!("no device holds {}", tag),
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod disk;
pub mod error;
pub mod guid;
pub mod matcher;
pub mod resolver;
pub mod tag;

// Re-export commonly used types
pub use config::{Config, DeviceClass, ListFormat};
pub use disk::{DeviceEnumerator, DeviceIdentifier, PartitionLayout, SystemEnumerator};
pub use error::{FindfsError, Result};
pub use guid::Guid;
pub use matcher::{match_layout, MatchResult};
pub use resolver::{DeviceListing, Resolution, ResolvedTarget, Resolver};
pub use tag::Tag;
