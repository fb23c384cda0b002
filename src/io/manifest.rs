//! Project manifest (`project.toml`) listing contracts and their file
//! locations.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Manifest file name, resolved relative to the project root.
pub const MANIFEST_FILE: &str = "project.toml";

/// Directory (relative to the project root) where build artifacts land.
pub const BUILD_DIR: &str = "build";

/// The project's declarative contract list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectManifest {
    #[serde(default, rename = "contract")]
    pub contracts: Vec<ContractConfig>,
}

/// One contract entry: where its sources live, where artifacts go, and
/// arbitrary metadata forwarded to driver-script templates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractConfig {
    pub name: String,
    /// Contract source files, relative to the project root.
    pub sources: Vec<PathBuf>,
    /// Compiled artifact destination. Defaults to `build/<name>.boc`.
    #[serde(default)]
    pub artifact: Option<PathBuf>,
    /// Test source files, relative to the project root.
    #[serde(default)]
    pub test_sources: Vec<PathBuf>,
    /// Compiled test-bundle destination. Defaults to `build/<name>-tests.boc`.
    #[serde(default)]
    pub test_artifact: Option<PathBuf>,
    /// Free-form metadata exposed to templates as `contract_data`.
    #[serde(default)]
    pub data: BTreeMap<String, toml::Value>,
}

impl ContractConfig {
    /// Compiled-artifact path, resolved against the project root.
    pub fn artifact_path(&self, root: &Path) -> PathBuf {
        match &self.artifact {
            Some(path) => root.join(path),
            None => root.join(BUILD_DIR).join(format!("{}.boc", self.name)),
        }
    }

    /// Compiled test-bundle path, resolved against the project root.
    pub fn test_artifact_path(&self, root: &Path) -> PathBuf {
        match &self.test_artifact {
            Some(path) => root.join(path),
            None => root.join(BUILD_DIR).join(format!("{}-tests.boc", self.name)),
        }
    }
}

/// Load and validate the manifest from `root/project.toml`.
pub fn load_manifest(root: &Path) -> Result<ProjectManifest> {
    let path = root.join(MANIFEST_FILE);
    let contents = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
    let manifest: ProjectManifest =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    validate(&manifest)?;
    Ok(manifest)
}

fn validate(manifest: &ProjectManifest) -> Result<()> {
    for contract in &manifest.contracts {
        if contract.name.trim().is_empty() {
            return Err(anyhow!("manifest contract with empty name"));
        }
        if contract.sources.is_empty() {
            return Err(anyhow!(
                "manifest contract {} declares no sources",
                contract.name
            ));
        }
    }
    Ok(())
}
