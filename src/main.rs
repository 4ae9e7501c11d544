//! wsl-mount-findfs - Main Entry Point
//!
//! Prints the `wsl --mount` device arguments for a PTUUID=/PARTUUID= tag.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process;
use wsl_mount_findfs::*;

/// Resolved or listed
const EXIT_OK: i32 = 0;
/// Enumeration finished without a match
const EXIT_NOT_FOUND: i32 = 1;
/// Bad tag, GUID, or configuration
const EXIT_INVALID_INPUT: i32 = 2;
/// The system could not be queried
const EXIT_SYSTEM_ERROR: i32 = 3;

/// Resolve PTUUID=/PARTUUID= tags to wsl --mount device arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
EXAMPLES:
    # Whole disk by its GPT disk GUID
    wsl-mount-findfs PTUUID=6a8b8c3e-2f6d-4e1b-9d3a-1c2b3d4e5f60

    # One partition; prints <drive> --partition <n>
    wsl-mount-findfs PARTUUID=0fc63daf-8483-4772-8e79-3d69d8477de4

    # Only the drive holding that partition (what wsl --unmount takes)
    wsl-mount-findfs --bare PARTUUID=0fc63daf-8483-4772-8e79-3d69d8477de4

    # Every disk and partition GUID Windows can see
    wsl-mount-findfs --list
")]
struct Args {
    /// Tag to resolve: PTUUID=<guid> or PARTUUID=<guid>
    #[arg(required_unless_present = "list", conflicts_with = "list")]
    tag: Option<String>,

    /// List every device with its PTUUID/PARTUUID tags
    #[arg(short, long)]
    list: bool,

    /// Print only the physical drive, even for a PARTUUID match
    #[arg(short, long)]
    bare: bool,

    /// Emit the listing as JSON (with --list)
    #[arg(long)]
    json: bool,

    /// Device interface class to scan
    #[arg(long, value_enum)]
    class: Option<DeviceClassArg>,

    /// Largest partition table a layout query may grow to
    #[arg(long)]
    max_partition_entries: Option<usize>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DeviceClassArg {
    Disk,
    Volume,
}

impl From<DeviceClassArg> for DeviceClass {
    fn from(class: DeviceClassArg) -> Self {
        match class {
            DeviceClassArg::Disk => DeviceClass::Disk,
            DeviceClassArg::Volume => DeviceClass::Volume,
        }
    }
}

fn main() {
    // Parse arguments
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let code = match run(args) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            exit_code(&e)
        }
    };

    process::exit(code);
}

fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<FindfsError>() {
        Some(e) if e.is_input_error() => EXIT_INVALID_INPUT,
        _ => EXIT_SYSTEM_ERROR,
    }
}

fn build_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path).map_err(|e| match e {
            FindfsError::Io(io) => FindfsError::config(format!("{}: {}", path.display(), io)),
            other => other,
        })?,
        None => Config::new(),
    };

    if args.bare {
        config.bare = true;
    }
    if let Some(class) = args.class {
        config.device_class = class.into();
    }
    if let Some(entries) = args.max_partition_entries {
        config.max_partition_entries = entries;
    }
    if args.json {
        if !args.list {
            return Err(FindfsError::config("--json requires --list"));
        }
        config.list_format = ListFormat::Json;
    }

    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> anyhow::Result<i32> {
    let config = build_config(&args)?;
    log::debug!("Configuration: {:?}", config);

    if args.list {
        let format = config.list_format;
        let resolver = Resolver::new(SystemEnumerator::new(), config);
        return print_listing(&resolver, format);
    }

    // Parse before touching any device
    let tag: Tag = args.tag.as_deref().unwrap_or_default().parse()?;

    let resolver = Resolver::new(SystemEnumerator::new(), config);
    match resolver.resolve(&tag)? {
        Resolution::Matched(target) => {
            println!("{}", target);
            Ok(EXIT_OK)
        }
        Resolution::Exhausted => {
            log::error!("No device found for {}", tag);
            Ok(EXIT_NOT_FOUND)
        }
    }
}

fn print_listing<E: DeviceEnumerator>(
    resolver: &Resolver<E>,
    format: ListFormat,
) -> anyhow::Result<i32> {
    let listings = resolver.list()?;

    match format {
        ListFormat::Text => {
            for line in listings.iter().flat_map(DeviceListing::lines) {
                println!("{}", line);
            }
        }
        ListFormat::Json => {
            let json =
                serde_json::to_string_pretty(&listings).context("serializing device list")?;
            println!("{}", json);
        }
    }

    Ok(EXIT_OK)
}
