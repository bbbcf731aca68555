//! Fake HAL implementation for testing.
//!
//! This implementation records all operations without executing them, allowing the
//! resize flow to be tested without root privileges, loop devices or disk images.

use super::{ExtFsOps, KpartxOps, SystemOps};
use crate::{CommandOutput, HalError, HalResult};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// kpartx output for a stock two-partition Raspberry Pi image.
pub const TWO_PARTITION_KPARTX_OUTPUT: &str = "\
add map loop0p1 (253:0): 0 524288 linear 7:0 8192
add map loop0p2 (253:1): 0 3686400 linear 7:0 532480
";

/// Operation records for testing and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    KpartxAdd { image: PathBuf },
    KpartxDelete { image: PathBuf },
    Settle { delay: Duration },
    E2fsck { device: PathBuf },
    Resize2fs { device: PathBuf },
}

#[derive(Debug, Clone)]
struct FakeHalState {
    operations: Vec<Operation>,
    kpartx_output: String,
    fsck_exit_code: Option<i32>,
    /// Programs whose invocations fail.
    failing: HashSet<String>,
}

impl Default for FakeHalState {
    fn default() -> Self {
        Self {
            operations: Vec::new(),
            kpartx_output: TWO_PARTITION_KPARTX_OUTPUT.to_string(),
            fsck_exit_code: Some(0),
            failing: HashSet::new(),
        }
    }
}

/// Fake HAL implementation that records operations without executing them.
#[derive(Debug, Clone, Default)]
pub struct FakeHal {
    state: Arc<Mutex<FakeHalState>>,
}

impl FakeHal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the stdout returned by `kpartx -v -a`.
    pub fn with_kpartx_output(self, output: impl Into<String>) -> Self {
        self.state.lock().unwrap().kpartx_output = output.into();
        self
    }

    /// Script the exit code returned by `e2fsck -f`.
    pub fn with_fsck_exit_code(self, code: Option<i32>) -> Self {
        self.state.lock().unwrap().fsck_exit_code = code;
        self
    }

    /// Make every invocation of `program` ("kpartx", "e2fsck", "resize2fs") fail.
    ///
    /// kpartx and resize2fs fail as a non-zero exit. e2fsck reports non-zero exits as
    /// `Ok(code)` (see [`FakeHal::with_fsck_exit_code`]), so for it this simulates the tool
    /// not being runnable at all.
    pub fn failing(self, program: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing
            .insert(program.to_string());
        self
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.state.lock().unwrap().operations.clone()
    }

    /// Count recorded operations matching `check`.
    pub fn count(&self, check: impl Fn(&Operation) -> bool) -> usize {
        self.state
            .lock()
            .unwrap()
            .operations
            .iter()
            .filter(|op| check(op))
            .count()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.count(check) > 0
    }

    fn record_operation(&self, op: Operation) {
        self.state.lock().unwrap().operations.push(op);
    }

    fn is_failing(&self, program: &str) -> bool {
        self.state.lock().unwrap().failing.contains(program)
    }

    fn injected_failure(&self, program: &str) -> HalResult<()> {
        if self.is_failing(program) {
            return Err(HalError::CommandFailed {
                program: program.to_string(),
                code: Some(1),
                stderr: format!("{program}: injected failure"),
            });
        }
        Ok(())
    }
}

impl KpartxOps for FakeHal {
    fn kpartx_add(&self, image: &Path) -> HalResult<String> {
        log::info!("FAKE HAL: kpartx -v -a {}", image.display());
        self.record_operation(Operation::KpartxAdd {
            image: image.to_path_buf(),
        });
        self.injected_failure("kpartx")?;
        Ok(self.state.lock().unwrap().kpartx_output.clone())
    }

    fn kpartx_delete(&self, image: &Path) -> HalResult<()> {
        log::info!("FAKE HAL: kpartx -d {}", image.display());
        self.record_operation(Operation::KpartxDelete {
            image: image.to_path_buf(),
        });
        self.injected_failure("kpartx")
    }
}

impl ExtFsOps for FakeHal {
    fn e2fsck_force(&self, device: &Path) -> HalResult<Option<i32>> {
        self.record_operation(Operation::E2fsck {
            device: device.to_path_buf(),
        });
        if self.is_failing("e2fsck") {
            return Err(HalError::CommandNotFound("e2fsck".to_string()));
        }
        Ok(self.state.lock().unwrap().fsck_exit_code)
    }

    fn resize2fs(&self, device: &Path) -> HalResult<CommandOutput> {
        self.record_operation(Operation::Resize2fs {
            device: device.to_path_buf(),
        });
        self.injected_failure("resize2fs")?;
        Ok(CommandOutput {
            code: Some(0),
            stdout: format!(
                "The filesystem on {} is now 460800 (4k) blocks long.\n",
                device.display()
            ),
            stderr: "resize2fs 1.47.0 (5-Feb-2023)\n".to_string(),
        })
    }
}

impl SystemOps for FakeHal {
    fn settle(&self, delay: Duration) {
        self.record_operation(Operation::Settle { delay });
    }
}
