//! Runner configuration stored at `runner.toml` in the project root.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Config file name, resolved relative to the project root.
pub const CONFIG_FILE: &str = "runner.toml";

/// Runner configuration (TOML).
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to a stock toolchain layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunnerConfig {
    /// Wall-clock limit for one interpreter invocation in seconds.
    pub interpreter_timeout_secs: u64,

    /// Truncate captured subprocess stdout/stderr beyond this many bytes.
    pub output_limit_bytes: usize,

    pub interpreter: CommandConfig,
    pub builder: CommandConfig,
}

/// An external command prefix; the runner appends its own arguments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CommandConfig {
    pub command: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            interpreter_timeout_secs: 15 * 60,
            output_limit_bytes: 10_000_000,
            interpreter: CommandConfig {
                command: vec!["fift".to_string(), "-s".to_string()],
            },
            builder: CommandConfig {
                command: vec!["func-build".to_string()],
            },
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.interpreter_timeout_secs == 0 {
            return Err(anyhow!("interpreter_timeout_secs must be > 0"));
        }
        if self.output_limit_bytes == 0 {
            return Err(anyhow!("output_limit_bytes must be > 0"));
        }
        validate_command("interpreter", &self.interpreter)?;
        validate_command("builder", &self.builder)?;
        Ok(())
    }
}

fn validate_command(label: &str, config: &CommandConfig) -> Result<()> {
    if config.command.is_empty() || config.command[0].trim().is_empty() {
        return Err(anyhow!("{label}.command must be a non-empty array"));
    }
    Ok(())
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `RunnerConfig::default()`.
pub fn load_config(path: &Path) -> Result<RunnerConfig> {
    if !path.exists() {
        let cfg = RunnerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: RunnerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
