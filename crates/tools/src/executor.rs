//! Bash executor: runs one command against a session environment.
//!
//! Each command runs as `<shell> -c <command>` in a fresh subprocess whose
//! environment is exactly the session snapshot. stdout and stderr are
//! captured separately and trimmed. Every outcome, success or failure, is
//! recorded to the session log before it is returned.

use bashpilot_core::error::ToolError;
use bashpilot_core::session::Environment;
use bashpilot_core::tool::{BashInput, ToolOutcome};
use bashpilot_telemetry::SessionLog;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::BASH_LOG_PREFIX;

/// Leading marker of every dry-run result.
pub const DRY_RUN_MARKER: &str = "🔍 Dry Run:";

const NO_COMMAND: &str = "No command provided to execute.";
const GENERIC_FAILURE: &str = "Command execution failed.";
const RESTARTED: &str = "Bash session restarted.";

/// Runs bash invocations, or describes them in dry-run mode.
#[derive(Debug, Clone)]
pub struct BashExecutor {
    shell: PathBuf,
    timeout: Duration,
}

struct CommandOutput {
    stdout: String,
    stderr: String,
    success: bool,
    code: Option<i32>,
}

impl BashExecutor {
    pub fn new(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Kill commands that run longer than this.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Execute one bash invocation.
    ///
    /// `restart` wins over everything else: the environment is replaced with
    /// a fresh process snapshot and `command` is ignored. With `dry_run` set
    /// nothing is spawned and the environment is left alone. Never fails;
    /// every problem comes back as [`ToolOutcome::Error`].
    pub async fn execute(
        &self,
        input: &BashInput,
        env: &mut Environment,
        log: &SessionLog,
        dry_run: bool,
    ) -> ToolOutcome {
        let log = log.scoped(BASH_LOG_PREFIX);

        if input.restart {
            env.reset();
            log.info(RESTARTED);
            return ToolOutcome::Content(RESTARTED.into());
        }

        let Some(command) = input.command.as_deref().filter(|c| !c.is_empty()) else {
            log.error(NO_COMMAND);
            return ToolOutcome::Error(NO_COMMAND.into());
        };

        if dry_run {
            log.info(format!("Mock executing bash command: {command}"));
            return ToolOutcome::Content(format!(
                "{DRY_RUN_MARKER} Would execute command: {command}"
            ));
        }

        log.info(format!("Executing bash command: {command}"));

        let output = match self.run(command, env).await {
            Ok(output) => output,
            Err(e) => {
                log.error(format!("Error running bash command: {e}"));
                return ToolOutcome::Error(e.to_string());
            }
        };

        if !output.stdout.is_empty() {
            let preview: String = command.chars().take(20).collect();
            log.info(format!(
                "Command output:\n\n```output for '{preview}...'\n{}\n```",
                output.stdout
            ));
        }
        if !output.stderr.is_empty() {
            log.error(format!(
                "Command error output:\n\n```error for '{command}'\n{}\n```",
                output.stderr
            ));
        }

        if output.success {
            ToolOutcome::Content(output.stdout)
        } else {
            warn!(command = %command, exit_code = ?output.code, "Command failed");
            if output.stderr.is_empty() {
                ToolOutcome::Error(GENERIC_FAILURE.into())
            } else {
                ToolOutcome::Error(output.stderr)
            }
        }
    }

    async fn run(&self, command: &str, env: &Environment) -> Result<CommandOutput, ToolError> {
        debug!(shell = %self.shell.display(), command = %command, "Spawning shell");

        let child = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .env_clear()
            .envs(env.iter())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolError::Spawn {
                shell: self.shell.display().to_string(),
                reason: e.to_string(),
            })?;

        // Dropping the wait future on timeout drops the child, which kills it.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| ToolError::Timeout {
                timeout_secs: self.timeout.as_secs(),
            })?
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "bash".into(),
                reason: e.to_string(),
            })?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}
