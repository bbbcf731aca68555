//! Offline systemd unit enablement.
//!
//! The image is not booted, so `systemctl enable` is unavailable; enabling a unit means
//! creating the same symlink systemd would: `<target>.wants/<unit> -> <unit file>`.

use anyhow::{Context, Result};
use std::fs;
use std::os::unix::fs::symlink;
use std::path::{Path, PathBuf};

/// Create `wants_dir/<unit>` pointing at `target` (relative targets are kept verbatim).
///
/// An existing entry at the link path is an error ("File exists"); nothing is replaced.
pub fn link_unit(wants_dir: &Path, unit: &str, target: impl AsRef<Path>) -> Result<PathBuf> {
    let link = wants_dir.join(unit);
    let target = target.as_ref();
    symlink(target, &link).with_context(|| {
        format!(
            "Failed to enable {}: symlink {} -> {}",
            unit,
            link.display(),
            target.display()
        )
    })?;
    log::debug!("symlink {} -> {}", link.display(), target.display());
    Ok(link)
}

/// True if anything, including a dangling symlink, occupies `path`.
pub fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Relative target for a unit living next to the wants directory (`../<unit>`).
pub fn sibling_target(unit: &str) -> PathBuf {
    Path::new("..").join(unit)
}
