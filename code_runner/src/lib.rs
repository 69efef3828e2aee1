//! Runs the grading-command sequence for one student's workspace.
//!
//! Commands run directly, never through a shell. Output is captured
//! with standard error merged after standard output and decoded
//! lossily, so binary garbage from a broken program cannot abort the
//! batch. The first failing command stops the sequence; compiling
//! failed, so running the program it would have produced is pointless.

pub mod commands;
pub mod workspace;

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use commands::CommandSpec;

/// Why a command sequence stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    NonZeroExit(i32),
    Timeout,
    NotFound,
}

#[derive(Debug, Clone)]
pub struct CommandFailure {
    pub command: String,
    pub kind: FailureKind,
}

impl CommandFailure {
    /// One-line description written into the student's output artifact.
    pub fn describe(&self) -> String {
        match self.kind {
            FailureKind::NonZeroExit(code) => {
                format!("Command failed with exit code {code}: {}", self.command)
            }
            FailureKind::Timeout => format!("Command timed out: {}", self.command),
            FailureKind::NotFound => format!("File not found: {}", self.command),
        }
    }
}

/// Everything one student's run produced.
#[derive(Debug, Default)]
pub struct RunReport {
    pub output: String,
    pub failure: Option<CommandFailure>,
}

impl RunReport {
    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }
}

/// Executes the command sequence with `workspace_dir` as the working
/// directory, stopping at the first failure.
///
/// # Errors
///
/// Command failures are data, not errors; only unexpected I/O while
/// driving a child process surfaces as `Err`.
pub async fn run_commands(
    specs: &[CommandSpec],
    workspace_dir: &Path,
    command_timeout: Duration,
) -> Result<RunReport, String> {
    let mut report = RunReport::default();

    for spec in specs {
        let argv = commands::resolve_argv(spec, workspace_dir);
        // Not named `display`: the tracing macros import
        // `field::display` into their expansion and would shadow it.
        let command_line = spec.display();

        tracing::debug!(command = %command_line, "running grading command");

        let spawned = Command::new(&argv[0])
            .args(&argv[1..])
            .current_dir(workspace_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match spawned {
            Ok(child) => child,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                report.failure = Some(CommandFailure {
                    command: command_line,
                    kind: FailureKind::NotFound,
                });
                break;
            }
            Err(e) => return Err(format!("Failed to spawn {command_line}: {e}")),
        };

        // Dropping the timed-out future drops the child handle, and
        // kill_on_drop takes the process down with it.
        let output = match timeout(command_timeout, child.wait_with_output()).await {
            Ok(result) => {
                result.map_err(|e| format!("Failed to wait for {command_line}: {e}"))?
            }
            Err(_) => {
                report.failure = Some(CommandFailure {
                    command: command_line,
                    kind: FailureKind::Timeout,
                });
                break;
            }
        };

        report.output.push_str(&String::from_utf8_lossy(&output.stdout));
        report.output.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            report.failure = Some(CommandFailure {
                command: command_line,
                kind: FailureKind::NonZeroExit(output.status.code().unwrap_or(-1)),
            });
            break;
        }
    }

    Ok(report)
}
