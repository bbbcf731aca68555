//! Cedar hardware abstraction layer (HAL).
//!
//! Wraps the host tools used to provision a Cedar Raspberry Pi image (kpartx, e2fsck,
//! resize2fs) behind traits so the workflows in `cedar-image` can run against a recording
//! fake in tests.

pub mod error;
pub mod hal;
pub mod kpartx;
pub mod procfs;

pub use error::{HalError, HalResult};
pub use hal::*;
