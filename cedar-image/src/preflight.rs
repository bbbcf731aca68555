//! Host checks run before touching an image.

use crate::errors::CedarError;
use anyhow::Result;
use cedar_hal::procfs::mountinfo;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Tools the resize flow shells out to.
pub const RESIZE_BINARIES: [&str; 3] = ["kpartx", "e2fsck", "resize2fs"];

#[derive(Debug, Clone)]
pub struct PreflightConfig {
    pub required_binaries: Vec<String>,
    pub path_env: String,
    pub require_root: bool,
}

impl PreflightConfig {
    pub fn for_resize() -> Self {
        Self {
            required_binaries: RESIZE_BINARIES.iter().map(|b| b.to_string()).collect(),
            path_env: std::env::var("PATH").unwrap_or_default(),
            require_root: true,
        }
    }
}

pub fn run_with(cfg: &PreflightConfig) -> Result<()> {
    log::debug!("Preflight checks");

    if cfg.require_root && !nix::unistd::Uid::effective().is_root() {
        return Err(CedarError::Preflight(
            "must run as root (kpartx needs device-mapper access)".to_string(),
        )
        .into());
    }
    check_binaries(cfg)?;

    log::debug!("Preflight complete");
    Ok(())
}

fn check_binaries(cfg: &PreflightConfig) -> Result<()> {
    let missing: Vec<&str> = cfg
        .required_binaries
        .iter()
        .filter(|bin| find_executable_in_path(bin, &cfg.path_env).is_none())
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        return Err(CedarError::Preflight(format!(
            "Missing required binaries on PATH: {}",
            missing.join(", ")
        ))
        .into());
    }
    Ok(())
}

pub fn find_executable_in_path(name: &str, path_env: &str) -> Option<PathBuf> {
    path_env
        .split(':')
        .filter(|dir| !dir.is_empty())
        .map(|dir| Path::new(dir).join(name))
        .find(|candidate| is_executable(candidate))
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// Warn when `root` is a plain directory rather than a mounted partition: writes would land
/// on the host instead of in the image.
pub fn warn_if_not_mounted(root: &Path) {
    let Ok(content) = fs::read_to_string("/proc/self/mountinfo") else {
        return;
    };
    let entries = mountinfo::parse_mountinfo(&content);
    match mountinfo::find_mount(root, &entries) {
        Some(mount) => log::debug!(
            "{} is mounted from {} ({})",
            root.display(),
            mount.source,
            mount.fstype
        ),
        None => log::warn!(
            "{} is not a mount point; is the image's root partition mounted?",
            root.display()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fake_tool(dir: &Path, name: &str, mode: u32) {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[test]
    fn finds_executables_on_path() {
        let dir = tempdir().unwrap();
        fake_tool(dir.path(), "kpartx", 0o755);
        let path_env = format!("/nonexistent:{}", dir.path().display());

        assert_eq!(
            find_executable_in_path("kpartx", &path_env),
            Some(dir.path().join("kpartx"))
        );
    }

    #[test]
    fn skips_non_executable_files() {
        let dir = tempdir().unwrap();
        fake_tool(dir.path(), "e2fsck", 0o644);

        assert!(find_executable_in_path("e2fsck", &dir.path().display().to_string()).is_none());
    }

    #[test]
    fn reports_every_missing_binary() {
        let dir = tempdir().unwrap();
        fake_tool(dir.path(), "kpartx", 0o755);
        let cfg = PreflightConfig {
            required_binaries: RESIZE_BINARIES.iter().map(|b| b.to_string()).collect(),
            path_env: dir.path().display().to_string(),
            require_root: false,
        };

        let err = run_with(&cfg).unwrap_err().to_string();
        assert!(err.contains("e2fsck, resize2fs"), "{err}");
    }

    #[test]
    fn passes_when_all_binaries_present() {
        let dir = tempdir().unwrap();
        for bin in RESIZE_BINARIES {
            fake_tool(dir.path(), bin, 0o755);
        }
        let cfg = PreflightConfig {
            required_binaries: RESIZE_BINARIES.iter().map(|b| b.to_string()).collect(),
            path_env: dir.path().display().to_string(),
            require_root: false,
        };

        run_with(&cfg).unwrap();
    }
}
