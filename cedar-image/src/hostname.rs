//! Hostname and mDNS configuration for a mounted root filesystem.
//!
//! After first boot the Pi answers as `<hostname>.local` through avahi.

use crate::config::{RootfsLayout, AVAHI_UNIT};
use crate::errors::CedarError;
use crate::systemd;
use anyhow::{Context, Result};
use regex::{NoExpand, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

fn debian_host_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"127\.0\.1\.1[ \t]+\S+").expect("valid hosts regex"))
}

/// How `/etc/hosts` was changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostsChange {
    /// File did not exist and was written from scratch.
    Created,
    /// Existing `127.0.1.1` entries now point at the new name.
    Replaced,
    /// No `127.0.1.1` entry existed; one was appended.
    Appended,
}

/// Outcome of the avahi enable step. Only a failure to create the wants directory is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MdnsStatus {
    Enabled,
    AlreadyEnabled,
    /// avahi is not installed in the image.
    ServiceMissing,
    LinkFailed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostnameReport {
    pub hostname: String,
    pub hosts: HostsChange,
    pub mdns: MdnsStatus,
}

/// Check `name` is a single RFC 1123 label, since it ends up in `/etc/hosts` and mDNS.
pub fn validate_hostname(name: &str) -> Result<(), CedarError> {
    let invalid = |why| CedarError::InvalidHostname(name.to_string(), why);
    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.len() > 63 {
        return Err(invalid("must be at most 63 characters"));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(invalid("only ASCII letters, digits and '-' are allowed"));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(invalid("must not start or end with '-'"));
    }
    Ok(())
}

/// Contents for a hosts file that did not exist yet.
pub fn fresh_hosts(hostname: &str) -> String {
    format!("127.0.0.1\tlocalhost\n127.0.1.1\t{hostname}\n")
}

/// Point every `127.0.1.1 <name>` entry at `hostname`, or append one if there is none.
/// All other text is left untouched.
pub fn update_hosts(content: &str, hostname: &str) -> (String, HostsChange) {
    let re = debian_host_line_re();
    let entry = format!("127.0.1.1\t{hostname}");
    if re.is_match(content) {
        let updated = re.replace_all(content, NoExpand(entry.as_str())).into_owned();
        (updated, HostsChange::Replaced)
    } else {
        (format!("{content}\n{entry}\n"), HostsChange::Appended)
    }
}

/// Write `etc/hostname`, update `etc/hosts` and enable avahi in the root mounted at `root`.
pub fn set_hostname(root: &Path, hostname: &str) -> Result<HostnameReport> {
    if !root.is_dir() {
        return Err(CedarError::InvalidRoot(root.to_path_buf()).into());
    }
    validate_hostname(hostname)?;
    let layout = RootfsLayout::new(root);

    let hostname_path = layout.hostname_file();
    fs::write(&hostname_path, format!("{hostname}\n"))
        .with_context(|| format!("Failed to write hostname to {}", hostname_path.display()))?;
    log::info!("Successfully set hostname to '{}'", hostname);

    let hosts = write_hosts(&layout.hosts_file(), hostname)?;
    let mdns = enable_mdns(&layout)?;

    Ok(HostnameReport {
        hostname: hostname.to_string(),
        hosts,
        mdns,
    })
}

fn write_hosts(hosts_path: &Path, hostname: &str) -> Result<HostsChange> {
    if !hosts_path.exists() {
        fs::write(hosts_path, fresh_hosts(hostname))
            .with_context(|| format!("Failed to create {}", hosts_path.display()))?;
        log::info!("Created new hosts file");
        return Ok(HostsChange::Created);
    }

    let content = fs::read_to_string(hosts_path)
        .with_context(|| format!("Failed to read {}", hosts_path.display()))?;
    let (updated, change) = update_hosts(&content, hostname);
    fs::write(hosts_path, updated)
        .with_context(|| format!("Failed to update {}", hosts_path.display()))?;
    log::info!("Successfully updated hosts file");
    Ok(change)
}

/// Relative link target from `etc/systemd/system/multi-user.target.wants` to the vendor
/// avahi unit: four levels up reaches the image root.
fn avahi_link_target() -> PathBuf {
    Path::new("../../../../lib/systemd/system").join(AVAHI_UNIT)
}

fn enable_mdns(layout: &RootfsLayout) -> Result<MdnsStatus> {
    let wants_dir = layout.wants_dir();
    fs::create_dir_all(&wants_dir)
        .with_context(|| format!("Failed to enable Avahi: cannot create {}", wants_dir.display()))?;

    let service = layout.vendor_unit_dir().join(AVAHI_UNIT);
    if !service.exists() {
        log::warn!(
            "Avahi daemon service file not found. Ensure avahi-daemon is installed in the image."
        );
        return Ok(MdnsStatus::ServiceMissing);
    }

    if systemd::entry_exists(&wants_dir.join(AVAHI_UNIT)) {
        log::info!("Avahi daemon already enabled");
        return Ok(MdnsStatus::AlreadyEnabled);
    }

    match systemd::link_unit(&wants_dir, AVAHI_UNIT, avahi_link_target()) {
        Ok(_) => {
            log::info!("Enabled Avahi daemon service");
            Ok(MdnsStatus::Enabled)
        }
        Err(err) => {
            log::warn!("Failed to create symlink: {:#}", err);
            Ok(MdnsStatus::LinkFailed(format!("{:#}", err)))
        }
    }
}
