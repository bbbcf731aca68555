//! Install the Wi-Fi access point setup payload into a mounted root filesystem.

use crate::config::{RootfsLayout, AP_SETUP_SCRIPT, AP_SETUP_UNITS};
use crate::errors::CedarError;
use crate::systemd;
use anyhow::{Context, Result};
use std::fs::{self, File, FileTimes};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Files written and links created by a successful install.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    pub copied: Vec<PathBuf>,
    pub links: Vec<PathBuf>,
}

/// Copy the AP setup script and units from `source_dir` into `layout` and enable both units.
///
/// Not atomic: a failure part way through leaves earlier copies in place. Enable links are
/// never replaced, so rerunning against an already provisioned root fails on the first link.
pub fn install_ap_setup(layout: &RootfsLayout, source_dir: &Path) -> Result<InstallReport> {
    if !layout.root().is_dir() {
        return Err(CedarError::InvalidRoot(layout.root().to_path_buf()).into());
    }

    let script_src = source_dir.join(AP_SETUP_SCRIPT);
    let unit_srcs: Vec<PathBuf> = AP_SETUP_UNITS.iter().map(|u| source_dir.join(u)).collect();
    for src in std::iter::once(&script_src).chain(unit_srcs.iter()) {
        if !src.is_file() {
            return Err(CedarError::MissingSource(src.clone()).into());
        }
    }

    let sbin_dir = layout.sbin_dir();
    let unit_dir = layout.unit_dir();
    fs::create_dir_all(&sbin_dir)
        .with_context(|| format!("Failed to create {}", sbin_dir.display()))?;
    fs::create_dir_all(&unit_dir)
        .with_context(|| format!("Failed to create {}", unit_dir.display()))?;

    let mut report = InstallReport::default();

    let script_dst = sbin_dir.join(AP_SETUP_SCRIPT);
    copy_file(&script_src, &script_dst)?;
    report.copied.push(script_dst.clone());
    for (src, unit) in unit_srcs.iter().zip(AP_SETUP_UNITS) {
        let dst = unit_dir.join(unit);
        copy_file(src, &dst)?;
        report.copied.push(dst);
    }

    fs::set_permissions(&script_dst, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("Failed to chmod 755 {}", script_dst.display()))?;

    let wants_dir = layout.wants_dir();
    fs::create_dir_all(&wants_dir)
        .with_context(|| format!("Failed to create {}", wants_dir.display()))?;
    for unit in AP_SETUP_UNITS {
        let link = systemd::link_unit(&wants_dir, unit, systemd::sibling_target(unit))?;
        log::info!("Enabled {}", unit);
        report.links.push(link);
    }

    Ok(report)
}

/// Copy `src` to `dst` keeping its permission bits and modification time.
fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    let copy = || -> io::Result<()> {
        let mut reader = File::open(src)?;
        let meta = reader.metadata()?;
        let mut writer = File::create(dst)?;
        io::copy(&mut reader, &mut writer)?;
        writer.set_times(FileTimes::new().set_modified(meta.modified()?))?;
        writer.set_permissions(meta.permissions())
    };
    copy().with_context(|| format!("Failed to copy {} -> {}", src.display(), dst.display()))?;
    log::info!("Installed {}", dst.display());
    Ok(())
}
