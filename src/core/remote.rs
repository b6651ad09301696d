//! Remote execution over ssh.
//!
//! Everything the bootstrap does to the target machine goes through the
//! [`Remote`] trait, so the orchestrator and step plan are testable against
//! an in-memory fake without a live server.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::error::{OutpostError, Result};

/// Quote a string for safe embedding in a remote shell command.
///
/// Standard POSIX single-quote escaping: close the quote, emit an escaped
/// literal quote, reopen.
pub fn sh_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// Captured result of one remote command.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// An authenticated command channel to one machine.
pub trait Remote {
    /// Run a shell command, capturing output.
    fn exec(&mut self, cmd: &str) -> Result<ExecOutput>;

    /// Write a file with the given octal mode.
    fn upload(&mut self, path: &str, content: &str, mode: u32) -> Result<()>;

    /// Run a command with the controlling terminal attached, returning its
    /// exit code. Used only for the onboarding handoff.
    fn exec_interactive(&mut self, cmd: &str) -> Result<i32>;
}

/// [`Remote`] implementation that shells out to the system `ssh`.
pub struct SshRemote {
    ssh_bin: PathBuf,
    address: String,
    user: String,
    port: u16,
    key_path: PathBuf,
    connect_timeout_secs: u32,
}

impl SshRemote {
    pub fn new(address: &str, user: &str, port: u16, key_path: &Path) -> Result<Self> {
        let ssh_bin = which::which("ssh")
            .map_err(|_| OutpostError::Other("ssh not found in PATH".to_string()))?;
        Ok(Self {
            ssh_bin,
            address: address.to_string(),
            user: user.to_string(),
            port,
            key_path: key_path.to_path_buf(),
            connect_timeout_secs: 10,
        })
    }

    /// Per-attempt connect timeout, independent of any outer poll budget.
    pub fn with_connect_timeout(mut self, secs: u32) -> Self {
        self.connect_timeout_secs = secs;
        self
    }

    fn base_command(&self, tty: bool) -> Command {
        let mut cmd = Command::new(&self.ssh_bin);
        if tty {
            cmd.arg("-t");
        }
        cmd.arg("-i")
            .arg(&self.key_path)
            .arg("-p")
            .arg(self.port.to_string())
            .args(["-o", "BatchMode=yes"])
            .args(["-o", "StrictHostKeyChecking=accept-new"])
            .arg("-o")
            .arg(format!("ConnectTimeout={}", self.connect_timeout_secs))
            .arg(format!("{}@{}", self.user, self.address));
        cmd
    }
}

impl Remote for SshRemote {
    fn exec(&mut self, cmd: &str) -> Result<ExecOutput> {
        debug!("ssh {}@{}: {}", self.user, self.address, cmd);
        let output = self.base_command(false).arg(cmd).output()?;
        Ok(ExecOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn upload(&mut self, path: &str, content: &str, mode: u32) -> Result<()> {
        debug!("upload {} ({} bytes, mode {:o})", path, content.len(), mode);
        // Write via a temp file so a dropped connection never leaves a
        // half-written target.
        let script = format!(
            "cat > '{path}.tmp' && chmod {mode:o} '{path}.tmp' && mv '{path}.tmp' '{path}'",
            path = path,
            mode = mode
        );
        let mut child = self
            .base_command(false)
            .arg(script)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;
        child
            .stdin
            .take()
            .ok_or_else(|| OutpostError::Other("failed to open ssh stdin".to_string()))?
            .write_all(content.as_bytes())?;
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(OutpostError::Remote(format!(
                "upload of {} failed: {}",
                path,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    fn exec_interactive(&mut self, cmd: &str) -> Result<i32> {
        debug!("ssh -t {}@{}: {}", self.user, self.address, cmd);
        let status = self
            .base_command(true)
            .arg(cmd)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;
        Ok(status.code().unwrap_or(1))
    }
}
