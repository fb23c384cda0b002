//! Interpreter collaborator: executes driver scripts on the external VM.
//!
//! The [`Interpreter`] trait decouples run orchestration from the actual VM
//! binary. Tests use scripted interpreters that return predetermined outputs
//! without spawning processes.

use std::path::Path;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{debug, instrument};

use crate::io::process::run_command;

/// One contract's subprocess result: exit code and captured stdout.
///
/// Non-zero exit codes are data, not errors; the orchestrator aggregates them
/// into the final process status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub exit_code: i32,
    pub stdout: String,
}

/// Abstraction over VM interpreter backends.
pub trait Interpreter {
    /// Run the driver script at `script` with `workdir` as the working
    /// directory. Fails only when the process cannot be started, times out,
    /// or dies without an exit code.
    fn run_script(&self, workdir: &Path, script: &Path) -> Result<ExecutionOutcome>;
}

/// Interpreter that spawns the configured external VM command with the script
/// path appended.
pub struct CommandInterpreter {
    command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl CommandInterpreter {
    pub fn new(command: Vec<String>, timeout: Duration, output_limit_bytes: usize) -> Self {
        Self {
            command,
            timeout,
            output_limit_bytes,
        }
    }
}

impl Interpreter for CommandInterpreter {
    #[instrument(skip_all, fields(script = %script.display()))]
    fn run_script(&self, workdir: &Path, script: &Path) -> Result<ExecutionOutcome> {
        let mut cmd = std::process::Command::new(&self.command[0]);
        cmd.args(&self.command[1..])
            .arg(script)
            .current_dir(workdir);

        let output = run_command(cmd, self.timeout, self.output_limit_bytes)?;
        if output.timed_out {
            return Err(anyhow!("interpreter timed out after {:?}", self.timeout));
        }
        let exit_code = output
            .status
            .code()
            .ok_or_else(|| anyhow!("interpreter terminated by signal"))?;

        debug!(exit_code, "interpreter finished");
        Ok(ExecutionOutcome {
            exit_code,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}
