//! A thin external-process wrapper. Present as operator tooling; never
//! invoked by `csp-core`'s workflow engine, which only talks to tools
//! through `ToolClient`.

use std::process::Command;

use tracing::debug;

use crate::error::{OperatorToolError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs `command args...` to completion and captures its output. Does not
/// stream; callers needing live output should shell out themselves.
pub fn run(command: &str, args: &[&str]) -> Result<ShellOutput> {
    debug!(command, ?args, "running shell command");
    let output = Command::new(command)
        .args(args)
        .output()
        .map_err(|e| OperatorToolError::ShellLaunch(format!("{command}: {e}")))?;

    Ok(ShellOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_captures_stdout() {
        let out = run("echo", &["hello"]).unwrap();
        assert!(out.success());
        assert_eq!(out.stdout.trim(), "hello");
    }

    #[test]
    fn nonexistent_binary_is_a_launch_error() {
        let err = run("definitely-not-a-real-binary-xyz", &[]).unwrap_err();
        assert!(matches!(err, OperatorToolError::ShellLaunch(_)));
    }

    #[test]
    fn nonzero_exit_is_reported_not_erred() {
        let out = run("sh", &["-c", "exit 3"]).unwrap();
        assert!(!out.success());
        assert_eq!(out.exit_code, 3);
    }
}
