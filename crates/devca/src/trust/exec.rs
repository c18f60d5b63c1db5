//! Thin wrapper around external command execution.
//!
//! Every trust store mutation goes through an OS tool (`security`,
//! `certutil`, `update-ca-certificates`). Failed commands are reported
//! once, never retried; a persistent environment problem should stay
//! visible.

use tokio::process::Command;
use tracing::debug;

use devca_core::{CaError, Result};

/// Captured result of one command invocation.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// True when the process exited with status 0
    pub success: bool,
    /// Captured stdout, lossily decoded
    pub stdout: String,
    /// Captured stderr, lossily decoded
    pub stderr: String,
}

impl CommandOutput {
    /// First non-empty line of stderr, falling back to stdout, for
    /// diagnostic reasons in trust reports
    #[must_use]
    pub fn diagnostic(&self) -> String {
        self.stderr
            .lines()
            .chain(self.stdout.lines())
            .map(str::trim)
            .find(|l| !l.is_empty())
            .unwrap_or("command produced no output")
            .to_string()
    }
}

/// Run a command and capture its output.
///
/// # Errors
///
/// Returns [`CaError::Command`] only when the process could not be
/// spawned (tool missing, permission denied). A non-zero exit is a normal
/// `CommandOutput` with `success == false`.
pub async fn run_command(program: &str, args: &[&str]) -> Result<CommandOutput> {
    debug!(program, ?args, "running command");
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| CaError::Command(format!("{program}: {e}")))?;

    let result = CommandOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    if !result.success {
        debug!(program, diagnostic = %result.diagnostic(), "command failed");
    }
    Ok(result)
}

/// True when the tool can be spawned at all.
pub async fn binary_available(program: &str, probe_arg: &str) -> bool {
    Command::new(program)
        .arg(probe_arg)
        .output()
        .await
        .is_ok()
}
