//! Build collaborator: compiles selected contracts via an external toolchain.
//!
//! The [`ContractBuilder`] trait decouples run orchestration from the actual
//! compiler. Tests use recording builders that fabricate artifacts without
//! spawning processes.

use std::path::Path;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{debug, info, instrument};

use crate::io::manifest::ContractConfig;
use crate::io::process::run_command;

/// Abstraction over contract compilation backends.
pub trait ContractBuilder {
    /// Compile `contracts` inside `workdir`. With `tests_with_contract`, test
    /// sources are compiled into the same pass as contract code; otherwise the
    /// test bundle is built in a separate legacy phase.
    ///
    /// Post-condition: every contract's artifact exists at its declared path.
    fn build(
        &self,
        workdir: &Path,
        contracts: &[ContractConfig],
        tests_with_contract: bool,
    ) -> Result<()>;
}

/// Builder that spawns the configured external compiler command.
pub struct CommandBuilder {
    command: Vec<String>,
    timeout: Duration,
    output_limit_bytes: usize,
}

impl CommandBuilder {
    pub fn new(command: Vec<String>, timeout: Duration, output_limit_bytes: usize) -> Self {
        Self {
            command,
            timeout,
            output_limit_bytes,
        }
    }
}

impl ContractBuilder for CommandBuilder {
    #[instrument(skip_all, fields(contracts = contracts.len(), tests_with_contract))]
    fn build(
        &self,
        workdir: &Path,
        contracts: &[ContractConfig],
        tests_with_contract: bool,
    ) -> Result<()> {
        info!(command = self.command[0], "starting build");

        let mut cmd = std::process::Command::new(&self.command[0]);
        cmd.args(&self.command[1..]).current_dir(workdir);
        if tests_with_contract {
            cmd.arg("--with-tests");
        }
        for contract in contracts {
            cmd.arg(&contract.name);
        }

        let output = run_command(cmd, self.timeout, self.output_limit_bytes)?;
        if output.timed_out {
            return Err(anyhow!("build timed out after {:?}", self.timeout));
        }
        if !output.status.success() {
            return Err(anyhow!(
                "build failed with status {:?}: {}",
                output.status.code(),
                output.stderr_text().trim()
            ));
        }

        for contract in contracts {
            let artifact = contract.artifact_path(workdir);
            if !artifact.exists() {
                return Err(anyhow!(
                    "build produced no artifact for {} at {}",
                    contract.name,
                    artifact.display()
                ));
            }
        }

        debug!("build finished");
        Ok(())
    }
}
