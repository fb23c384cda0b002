//! Test-only helpers for constructing project fixtures.

use std::fs;
use std::path::{Path, PathBuf};

use crate::io::manifest::{ContractConfig, MANIFEST_FILE};

/// A temporary project directory with manifest and stub-script helpers.
pub struct TestProject {
    dir: tempfile::TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write `project.toml` with the given contents.
    pub fn write_manifest(&self, contents: &str) {
        fs::write(self.root().join(MANIFEST_FILE), contents).expect("write manifest");
    }

    /// Write a file relative to the project root, creating parent directories.
    pub fn write_file(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent dirs");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    /// Write an executable shell stub standing in for an external tool.
    pub fn write_stub(&self, name: &str, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.root().join(name);
        fs::write(&path, body).expect("write stub");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod stub");
        path
    }

    /// Create empty artifact files for a contract, as a build would.
    pub fn fabricate_artifacts(&self, contract: &ContractConfig) {
        for path in [
            contract.artifact_path(self.root()),
            contract.test_artifact_path(self.root()),
        ] {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create artifact dir");
            }
            fs::write(&path, b"").expect("write artifact");
        }
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a deterministic contract entry with conventional paths.
pub fn contract(name: &str, with_tests: bool) -> ContractConfig {
    ContractConfig {
        name: name.to_string(),
        sources: vec![PathBuf::from(format!("contracts/{name}.fc"))],
        artifact: None,
        test_sources: if with_tests {
            vec![PathBuf::from(format!("tests/{name}.fc"))]
        } else {
            Vec::new()
        },
        test_artifact: None,
        data: Default::default(),
    }
}
