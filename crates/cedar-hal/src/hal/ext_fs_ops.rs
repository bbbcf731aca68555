//! ext2/3/4 maintenance operations (e2fsprogs).

use crate::{CommandOutput, HalResult};
use std::path::Path;

/// Trait for checking and growing ext filesystems.
pub trait ExtFsOps {
    /// Force a consistency check (`e2fsck -f`), returning the exit code.
    ///
    /// e2fsck uses non-zero codes for "errors corrected" and similar states, so the code is
    /// handed back to the caller instead of being turned into an error. The terminal is
    /// inherited so interactive repair prompts still reach the operator.
    fn e2fsck_force(&self, device: &Path) -> HalResult<Option<i32>>;

    /// Grow the filesystem to fill its partition (`resize2fs` without a size argument).
    ///
    /// stdout/stderr are captured; a non-zero exit is reported as
    /// [`crate::HalError::CommandFailed`].
    fn resize2fs(&self, device: &Path) -> HalResult<CommandOutput>;
}
