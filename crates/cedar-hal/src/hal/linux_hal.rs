//! Linux HAL implementation backed by the real kpartx and e2fsprogs binaries.

use super::{ExtFsOps, KpartxOps, ProcessOps, SystemOps};
use crate::{CommandOutput, HalError, HalResult};
use std::io::Read;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// Real HAL implementation for Linux systems.
#[derive(Debug, Clone, Default)]
pub struct LinuxHal;

impl LinuxHal {
    pub fn new() -> Self {
        Self
    }
}

const KPARTX_TIMEOUT: Duration = Duration::from_secs(30);
const FSCK_TIMEOUT: Duration = Duration::from_secs(30 * 60);
const RESIZE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

fn map_command_err(program: &str, err: std::io::Error) -> HalError {
    if err.kind() == std::io::ErrorKind::NotFound {
        return HalError::CommandNotFound(program.to_string());
    }
    HalError::Io(err)
}

fn output_failed(program: &str, output: &CommandOutput) -> HalError {
    HalError::CommandFailed {
        program: program.to_string(),
        code: output.code,
        stderr: output.stderr.trim().to_string(),
    }
}

fn output_with_timeout(program: &str, cmd: &mut Command, timeout: Duration) -> HalResult<Output> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    let mut child = cmd.spawn().map_err(|e| map_command_err(program, e))?;

    let mut stdout = child.stdout.take();
    let mut stderr = child.stderr.take();

    // Drain pipes concurrently to avoid deadlocks on large output.
    let stdout_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout.take() {
            let _ = out.read_to_end(&mut buf);
        }
        buf
    });
    let stderr_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr.take() {
            let _ = err.read_to_end(&mut buf);
        }
        buf
    });

    let status = match child.wait_timeout(timeout).map_err(HalError::Io)? {
        Some(status) => status,
        None => {
            let _ = child.kill();
            let _ = child.wait();
            let _ = stdout_handle.join();
            let _ = stderr_handle.join();
            return Err(HalError::CommandTimeout {
                program: program.to_string(),
                timeout_secs: timeout.as_secs(),
            });
        }
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let stderr = stderr_handle.join().unwrap_or_default();
    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

/// Run with the caller's stdio attached, returning the exit code.
fn inherited_status_with_timeout(
    program: &str,
    cmd: &mut Command,
    timeout: Duration,
) -> HalResult<Option<i32>> {
    let mut child = cmd.spawn().map_err(|e| map_command_err(program, e))?;
    match child.wait_timeout(timeout).map_err(HalError::Io)? {
        Some(status) => Ok(status.code()),
        None => {
            let _ = child.kill();
            let _ = child.wait();
            Err(HalError::CommandTimeout {
                program: program.to_string(),
                timeout_secs: timeout.as_secs(),
            })
        }
    }
}

impl ProcessOps for LinuxHal {
    fn command_output(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> HalResult<CommandOutput> {
        log::debug!("exec: {} {}", program, args.join(" "));
        let mut cmd = Command::new(program);
        cmd.args(args);
        output_with_timeout(program, &mut cmd, timeout).map(CommandOutput::from)
    }
}

impl KpartxOps for LinuxHal {
    fn kpartx_add(&self, image: &Path) -> HalResult<String> {
        let image = image.display().to_string();
        let output = self.command_output("kpartx", &["-v", "-a", &image], KPARTX_TIMEOUT)?;
        if !output.success() {
            return Err(output_failed("kpartx", &output));
        }
        Ok(output.stdout)
    }

    fn kpartx_delete(&self, image: &Path) -> HalResult<()> {
        let image = image.display().to_string();
        self.command_status("kpartx", &["-d", &image], KPARTX_TIMEOUT)
    }
}

impl ExtFsOps for LinuxHal {
    fn e2fsck_force(&self, device: &Path) -> HalResult<Option<i32>> {
        log::debug!("exec: e2fsck -f {}", device.display());
        let mut cmd = Command::new("e2fsck");
        cmd.arg("-f").arg(device);
        inherited_status_with_timeout("e2fsck", &mut cmd, FSCK_TIMEOUT)
    }

    fn resize2fs(&self, device: &Path) -> HalResult<CommandOutput> {
        let device = device.display().to_string();
        let output = self.command_output("resize2fs", &[&device], RESIZE_TIMEOUT)?;
        if !output.success() {
            return Err(output_failed("resize2fs", &output));
        }
        Ok(output)
    }
}

impl SystemOps for LinuxHal {
    fn settle(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHORT: Duration = Duration::from_secs(10);

    #[test]
    fn missing_program_is_command_not_found() {
        let hal = LinuxHal::new();
        let err = hal
            .command_output("cedar-definitely-not-installed", &[], SHORT)
            .unwrap_err();
        assert!(matches!(err, HalError::CommandNotFound(ref p) if p == "cedar-definitely-not-installed"));
    }

    #[test]
    fn command_output_captures_both_streams() {
        let hal = LinuxHal::new();
        let out = hal
            .command_output("sh", &["-c", "echo out; echo err >&2; exit 3"], SHORT)
            .unwrap();
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout.trim(), "out");
        assert_eq!(out.stderr.trim(), "err");
        assert!(!out.success());
    }

    #[test]
    fn command_status_reports_stderr_on_failure() {
        let hal = LinuxHal::new();
        let err = hal
            .command_status("sh", &["-c", "echo boom >&2; exit 1"], SHORT)
            .unwrap_err();
        match err {
            HalError::CommandFailed {
                program,
                code,
                stderr,
            } => {
                assert_eq!(program, "sh");
                assert_eq!(code, Some(1));
                assert_eq!(stderr, "boom");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn command_output_times_out() {
        let hal = LinuxHal::new();
        let err = hal
            .command_output("sleep", &["5"], Duration::from_millis(100))
            .unwrap_err();
        assert!(matches!(err, HalError::CommandTimeout { .. }));
    }
}
