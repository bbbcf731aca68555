//! Cedar Raspberry Pi image provisioning.
//!
//! Three independent steps run against an image before it is shipped:
//! - [`ap_setup`]: install the access point setup script and enable its services,
//! - [`resize`]: grow the root filesystem inside the image file,
//! - [`hostname`]: set the hostname and enable avahi so the Pi answers as `cedar.local`.

pub mod ap_setup;
pub mod cli;
pub mod config;
pub mod errors;
pub mod hostname;
pub mod logging;
pub mod preflight;
pub mod resize;
pub mod systemd;
