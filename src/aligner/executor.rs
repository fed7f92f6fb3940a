//! Testable command execution.

use crate::error::{PhonetrackError, Result};
use std::process::Command;

/// Trait for executing system commands.
///
/// Object-safe, Send + Sync for use in concurrent contexts.
/// Enables testability by allowing mock implementations.
pub trait CommandExecutor: Send + Sync {
    /// Execute a command with arguments.
    ///
    /// Returns the stdout of the command on success.
    /// Returns an error if the command fails or is not found.
    fn execute(&self, command: &str, args: &[&str]) -> Result<String>;
}

impl<E: CommandExecutor + ?Sized> CommandExecutor for &E {
    fn execute(&self, command: &str, args: &[&str]) -> Result<String> {
        (**self).execute(command, args)
    }
}

/// Production command executor using std::process::Command.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandExecutor;

impl SystemCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn execute(&self, command: &str, args: &[&str]) -> Result<String> {
        tracing::debug!(command, ?args, "Running external command");

        let output = Command::new(command).args(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PhonetrackError::ToolNotFound {
                    tool: command.to_string(),
                }
            } else {
                PhonetrackError::ToolFailed {
                    tool: command.to_string(),
                    message: format!("failed to execute: {}", e),
                }
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PhonetrackError::ToolFailed {
                tool: command.to_string(),
                message: format!("exited with {}: {}", output.status, stderr.trim()),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

/// Whether `program` resolves on `PATH` (or is an existing path).
pub fn tool_available(program: &str) -> bool {
    which::which(program).is_ok()
}
