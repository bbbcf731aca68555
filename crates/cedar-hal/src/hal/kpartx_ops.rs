//! Partition mapping operations (kpartx).

use crate::HalResult;
use std::path::Path;

pub trait KpartxOps {
    /// Map every partition of `image` to its own device-mapper node (`kpartx -v -a`),
    /// returning kpartx's verbose stdout.
    ///
    /// A non-zero exit is reported as [`crate::HalError::CommandFailed`] carrying stderr.
    fn kpartx_add(&self, image: &Path) -> HalResult<String>;

    /// Remove the partition mappings of `image` (`kpartx -d`).
    fn kpartx_delete(&self, image: &Path) -> HalResult<()>;
}
