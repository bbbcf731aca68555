//! Process execution helpers.
//!
//! External commands are "world-touching" and go through the HAL so the provisioning
//! flows can be tested without spawning real processes.

use crate::HalResult;
use std::process::Output;
use std::time::Duration;

/// Captured result of a command that ran to completion (whatever its exit code).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

/// Process execution trait (external command runner).
pub trait ProcessOps {
    /// Run a command with captured stdout/stderr. A non-zero exit is not an error here;
    /// only spawn failures and timeouts are.
    fn command_output(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> HalResult<CommandOutput>;

    /// Run a command and fail with [`crate::HalError::CommandFailed`] on non-zero exit.
    fn command_status(&self, program: &str, args: &[&str], timeout: Duration) -> HalResult<()> {
        let output = self.command_output(program, args, timeout)?;
        if !output.success() {
            return Err(crate::HalError::CommandFailed {
                program: program.to_string(),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(())
    }
}
