//! Fixed image layout and defaults.
//!
//! Every tool works against the root partition of a stock Raspberry Pi OS image. Paths
//! below are relative to wherever that partition is mounted.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the image's root partition is mounted during provisioning.
pub const DEFAULT_ROOTFS: &str = "/mnt/part2";

/// Hostname advertised over mDNS as `<hostname>.local`.
pub const DEFAULT_HOSTNAME: &str = "cedar";

/// Pause between mapping the image and opening the mapper device.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(1);

/// Access point setup script installed into `usr/local/sbin`.
pub const AP_SETUP_SCRIPT: &str = "cedar-ap-setup.py";

/// Units installed into `etc/systemd/system` and enabled for multi-user boot.
pub const AP_SETUP_UNITS: [&str; 2] = ["cedar-ap-setup.service", "cedar-ap-power.service"];

pub const AVAHI_UNIT: &str = "avahi-daemon.service";

pub const MULTI_USER_WANTS: &str = "multi-user.target.wants";

/// Paths inside a mounted root filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootfsLayout {
    root: PathBuf,
}

impl RootfsLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn sbin_dir(&self) -> PathBuf {
        self.root.join("usr/local/sbin")
    }

    /// Admin unit directory (`etc/systemd/system`).
    pub fn unit_dir(&self) -> PathBuf {
        self.root.join("etc/systemd/system")
    }

    /// Vendor unit directory (`lib/systemd/system`).
    pub fn vendor_unit_dir(&self) -> PathBuf {
        self.root.join("lib/systemd/system")
    }

    pub fn wants_dir(&self) -> PathBuf {
        self.unit_dir().join(MULTI_USER_WANTS)
    }

    pub fn hostname_file(&self) -> PathBuf {
        self.root.join("etc/hostname")
    }

    pub fn hosts_file(&self) -> PathBuf {
        self.root.join("etc/hosts")
    }
}

impl Default for RootfsLayout {
    fn default() -> Self {
        Self::new(DEFAULT_ROOTFS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_targets_mounted_root_partition() {
        let layout = RootfsLayout::default();
        assert_eq!(layout.root(), Path::new("/mnt/part2"));
        assert_eq!(
            layout.wants_dir(),
            PathBuf::from("/mnt/part2/etc/systemd/system/multi-user.target.wants")
        );
        assert_eq!(layout.hosts_file(), PathBuf::from("/mnt/part2/etc/hosts"));
    }
}
