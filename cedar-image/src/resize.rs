//! Grow the root filesystem of a Raspberry Pi disk image to fill its partition.
//!
//! Flow: map the image's partitions with kpartx, pick the second mapping as the root
//! filesystem, wait for device-mapper to settle, force an fsck, run resize2fs, and remove
//! the mappings again. Removal is owned by a [`KpartxGuard`] armed before the mappings are
//! added, so it happens exactly once whichever step fails.

use crate::config::DEFAULT_SETTLE_DELAY;
use crate::errors::CedarError;
use anyhow::{Context, Result};
use cedar_hal::{kpartx, ImageHal, KpartxGuard, KpartxOps};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Index of the root filesystem partition in a stock Raspberry Pi image (boot is first).
pub const ROOT_PARTITION_INDEX: usize = 1;

/// Device-mapper names produced by attaching an image, in kpartx order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopDeviceSet {
    devices: Vec<String>,
}

impl LoopDeviceSet {
    pub fn new(devices: Vec<String>) -> Self {
        Self { devices }
    }

    pub fn from_kpartx_output(stdout: &str) -> Self {
        Self::new(kpartx::parse_add_maps(stdout))
    }

    pub fn devices(&self) -> &[String] {
        &self.devices
    }

    /// Mapper path of the root partition: always entry 1.
    pub fn root_partition(&self) -> Result<PathBuf, CedarError> {
        self.devices
            .get(ROOT_PARTITION_INDEX)
            .map(|name| mapper_path(name))
            .ok_or(CedarError::TooFewPartitions {
                found: self.devices.len(),
            })
    }
}

/// `/dev/mapper/<name>`
pub fn mapper_path(name: &str) -> PathBuf {
    Path::new("/dev/mapper").join(name)
}

/// Add the partition mappings for `image` and collect their names.
///
/// Fails when kpartx exits non-zero or fewer than two partitions were mapped. The mappings
/// are not removed here; callers arm a [`KpartxGuard`] first.
pub fn attach<H: KpartxOps + ?Sized>(hal: &H, image: &Path) -> Result<LoopDeviceSet> {
    let stdout = hal
        .kpartx_add(image)
        .map_err(CedarError::from)
        .with_context(|| format!("Error running kpartx on {}", image.display()))?;

    let set = LoopDeviceSet::from_kpartx_output(&stdout);
    let found = set.devices().len();
    if found <= ROOT_PARTITION_INDEX {
        return Err(CedarError::TooFewPartitions { found }.into());
    }
    log::info!("Created loop devices: {}", set.devices().join(", "));
    Ok(set)
}

#[derive(Debug, Clone)]
pub struct ResizeOptions {
    pub settle_delay: Duration,
}

impl Default for ResizeOptions {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// What happened during a successful resize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizeReport {
    pub devices: LoopDeviceSet,
    pub root_device: PathBuf,
    /// e2fsck exit code; non-zero values are informational.
    pub fsck_code: Option<i32>,
    pub resize_stdout: String,
    pub resize_stderr: String,
}

/// Check and grow the root filesystem inside `image`.
pub fn resize_filesystem<H: ImageHal + ?Sized>(
    hal: &H,
    image: &Path,
    opts: &ResizeOptions,
) -> Result<ResizeReport> {
    let _mappings = KpartxGuard::new(hal, image);

    let devices = attach(hal, image)?;
    let root_device = devices.root_partition()?;
    log::info!("Root partition device: {}", root_device.display());

    hal.settle(opts.settle_delay);

    log::info!("Running filesystem check...");
    let fsck_code = hal
        .e2fsck_force(&root_device)
        .map_err(CedarError::from)
        .with_context(|| format!("Failed to run e2fsck on {}", root_device.display()))?;
    if fsck_code != Some(0) {
        // 1 = errors corrected, 2 = corrected but reboot advised, 4+ = left uncorrected.
        log::warn!("e2fsck returned: {:?}", fsck_code);
    }

    log::info!("Resizing filesystem...");
    let output = hal
        .resize2fs(&root_device)
        .map_err(CedarError::from)
        .with_context(|| format!("Failed to resize {}", root_device.display()))?;
    for line in output.stdout.lines().chain(output.stderr.lines()) {
        log::info!("resize2fs: {}", line);
    }

    log::info!("Filesystem operations completed successfully");
    Ok(ResizeReport {
        devices,
        root_device,
        fsck_code,
        resize_stdout: output.stdout,
        resize_stderr: output.stderr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_partition_is_second_mapping() {
        let set = LoopDeviceSet::new(vec![
            "loop7p1".to_string(),
            "loop7p2".to_string(),
            "loop7p3".to_string(),
        ]);
        assert_eq!(
            set.root_partition().unwrap(),
            PathBuf::from("/dev/mapper/loop7p2")
        );
    }

    #[test]
    fn root_partition_requires_two_mappings() {
        let set = LoopDeviceSet::new(vec!["loop7p1".to_string()]);
        assert!(matches!(
            set.root_partition(),
            Err(CedarError::TooFewPartitions { found: 1 })
        ));
        assert!(LoopDeviceSet::new(Vec::new()).root_partition().is_err());
    }

    #[test]
    fn mapper_path_joins_name() {
        assert_eq!(mapper_path("loop0p2"), PathBuf::from("/dev/mapper/loop0p2"));
    }
}
