//! HAL trait definitions and implementations.
//!
//! This module defines the traits for the external tools the provisioning flows drive and
//! provides both real (LinuxHal) and fake (FakeHal) implementations.

pub mod ext_fs_ops;
pub mod fake_hal;
pub mod guards;
pub mod kpartx_ops;
pub mod linux_hal;
pub mod process_ops;
pub mod system_ops;

pub use ext_fs_ops::ExtFsOps;
pub use fake_hal::{FakeHal, Operation, TWO_PARTITION_KPARTX_OUTPUT};
pub use guards::KpartxGuard;
pub use kpartx_ops::KpartxOps;
pub use linux_hal::LinuxHal;
pub use process_ops::{CommandOutput, ProcessOps};
pub use system_ops::SystemOps;

/// Everything the image resize flow needs from the host.
pub trait ImageHal: KpartxOps + ExtFsOps + SystemOps {}

/// Automatically implement ImageHal for any type implementing all required traits.
impl<T> ImageHal for T where T: KpartxOps + ExtFsOps + SystemOps {}
