//! Shell command execution with safe quoting.
//!
//! All datapath primitives go through this module so that interface and
//! namespace names coming from desired state can never break out of the
//! command they are interpolated into.

use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{FabricError, FabricResult};

/// Path to the `ip` command for link, address, route and netns management.
pub const IP_CMD: &str = "/sbin/ip";

/// Path to the `iptables` command for filter and NAT rules.
pub const IPTABLES_CMD: &str = "/sbin/iptables";

/// Path to the `nft` command for the atomic rule-set backend.
pub const NFT_CMD: &str = "/usr/sbin/nft";

/// Path to the `vtysh` shell for pushing FRR configuration lines.
pub const VTYSH_CMD: &str = "/usr/bin/vtysh";

/// Characters that need escaping inside shell double-quotes:
/// $, `, ", \, and newline.
static SHELL_ESCAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([$`"\\\n])"#).expect("Invalid regex pattern"));

/// Quotes a string for safe interpolation into a shell command.
///
/// Wraps the string in double quotes and escapes the characters that
/// keep meaning inside them.
///
/// # Example
///
/// ```
/// use fabric_common::shell::shellquote;
///
/// assert_eq!(shellquote("vxlan1003"), "\"vxlan1003\"");
/// assert_eq!(shellquote("a$b"), "\"a\\$b\"");
/// ```
pub fn shellquote(s: &str) -> String {
    let escaped = SHELL_ESCAPE_RE.replace_all(s, r"\$1");
    format!("\"{}\"", escaped)
}

/// Result of a shell command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// The exit code of the command (0 = success).
    pub exit_code: i32,
    /// Trimmed stdout.
    pub stdout: String,
    /// Trimmed stderr.
    pub stderr: String,
}

impl ExecResult {
    /// Returns true if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns stdout and stderr joined for error reporting.
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Executes a shell command asynchronously through `/bin/sh -c`.
///
/// Pipes and command chaining are supported; the exit code is reported
/// in the result rather than turned into an error.
pub async fn exec(cmd: &str) -> FabricResult<ExecResult> {
    tracing::debug!(command = %cmd, "Executing shell command");

    let output = Command::new("/bin/sh")
        .arg("-c")
        .arg(cmd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| FabricError::ShellExec {
            command: cmd.to_string(),
            source: e,
        })?;

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    let result = ExecResult {
        exit_code,
        stdout,
        stderr,
    };

    if !result.success() {
        tracing::warn!(
            command = %cmd,
            exit_code = exit_code,
            stderr = %result.stderr,
            "Command failed"
        );
    }

    Ok(result)
}

/// Executes a shell command and returns an error on non-zero exit.
pub async fn exec_or_throw(cmd: &str) -> FabricResult<String> {
    let result = exec(cmd).await?;
    if result.success() {
        Ok(result.stdout)
    } else {
        Err(FabricError::CommandFailed {
            command: cmd.to_string(),
            exit_code: result.exit_code,
            output: result.combined_output(),
        })
    }
}
