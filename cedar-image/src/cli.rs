//! CLI argument parsing for the Cedar image tools.
//!
//! Each tool is its own binary; with no arguments the rootfs tools act on `/mnt/part2`.

use crate::config::{DEFAULT_HOSTNAME, DEFAULT_ROOTFS, DEFAULT_SETTLE_DELAY};
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "cedar-install-ap-setup")]
#[command(about = "Install the Cedar Wi-Fi access point setup script and services into a mounted rootfs")]
pub struct InstallApSetupCli {
    /// Mount point of the image's root partition
    #[arg(long, default_value = DEFAULT_ROOTFS)]
    pub root: PathBuf,

    /// Directory holding cedar-ap-setup.py and its .service files
    #[arg(long, default_value = ".")]
    pub source_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Parser)]
#[command(name = "cedar-resize-fs")]
#[command(about = "Grow the root filesystem of a Raspberry Pi disk image to fill its partition")]
pub struct ResizeFsCli {
    /// Raw disk image file
    pub image: PathBuf,

    /// Pause after mapping partitions, in milliseconds
    #[arg(long, default_value_t = DEFAULT_SETTLE_DELAY.as_millis() as u64)]
    pub settle_ms: u64,

    /// Skip the root and PATH checks
    #[arg(long)]
    pub skip_preflight: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Parser)]
#[command(name = "cedar-set-hostname")]
#[command(about = "Set the hostname of a mounted Raspberry Pi rootfs and enable mDNS")]
pub struct SetHostnameCli {
    /// Mount point of the image's root partition
    #[arg(long, default_value = DEFAULT_ROOTFS)]
    pub root: PathBuf,

    /// Hostname to configure (reachable as <hostname>.local)
    #[arg(long, default_value = DEFAULT_HOSTNAME)]
    pub hostname: String,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definitions_are_valid() {
        InstallApSetupCli::command().debug_assert();
        ResizeFsCli::command().debug_assert();
        SetHostnameCli::command().debug_assert();
    }

    #[test]
    fn rootfs_tools_default_to_mounted_partition() {
        let cli = InstallApSetupCli::parse_from(["cedar-install-ap-setup"]);
        assert_eq!(cli.root, PathBuf::from("/mnt/part2"));
        assert_eq!(cli.source_dir, PathBuf::from("."));

        let cli = SetHostnameCli::parse_from(["cedar-set-hostname"]);
        assert_eq!(cli.root, PathBuf::from("/mnt/part2"));
        assert_eq!(cli.hostname, "cedar");
    }

    #[test]
    fn resize_requires_exactly_one_image() {
        assert!(ResizeFsCli::try_parse_from(["cedar-resize-fs"]).is_err());
        assert!(ResizeFsCli::try_parse_from(["cedar-resize-fs", "a.img", "b.img"]).is_err());

        let cli = ResizeFsCli::try_parse_from(["cedar-resize-fs", "cedar.img"]).unwrap();
        assert_eq!(cli.image, PathBuf::from("cedar.img"));
        assert_eq!(cli.settle_ms, 1000);
    }
}
