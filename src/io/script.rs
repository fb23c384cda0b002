//! Driver-script generation from embedded templates.
//!
//! Each selected contract gets its own rendered script on disk, handed to the
//! interpreter by path. Scripts are single-use temp files removed when their
//! [`DriverScript`] guard drops, so an aborted run leaves nothing behind.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use tracing::debug;

const STANDARD_TEMPLATE: &str = include_str!("templates/standard.fif.template");
const LEGACY_TEMPLATE: &str = include_str!("templates/legacy.fif.template");

/// Which driver template to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// Tests compiled together with the contract.
    Standard,
    /// Two-phase compile: contract and test suite built separately.
    Legacy,
}

impl ScriptKind {
    fn template_name(self) -> &'static str {
        match self {
            ScriptKind::Standard => "standard",
            ScriptKind::Legacy => "legacy",
        }
    }
}

/// Variables for one driver-script rendering.
#[derive(Debug, Clone)]
pub struct ScriptParams<'a> {
    /// Compiled contract artifact.
    pub code_path: &'a Path,
    /// Compiled test bundle.
    pub test_path: &'a Path,
    /// Make the interpreter append structured results to `output_path`.
    pub output_results: bool,
    /// Shared results-stream file.
    pub output_path: &'a Path,
    pub verbose: u8,
    /// Ask the interpreter to suppress its own test chatter.
    pub silent: bool,
    /// Contract metadata from the manifest.
    pub data: &'a BTreeMap<String, toml::Value>,
    /// Resolved test subset; `None` runs every declared test.
    pub tests: Option<&'a [String]>,
}

/// Template engine wrapper around minijinja.
pub struct ScriptEngine {
    env: Environment<'static>,
}

impl ScriptEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("standard", STANDARD_TEMPLATE)
            .expect("standard template should be valid");
        env.add_template("legacy", LEGACY_TEMPLATE)
            .expect("legacy template should be valid");
        Self { env }
    }

    /// Render one driver script to a string.
    pub fn render(&self, kind: ScriptKind, params: &ScriptParams<'_>) -> Result<String> {
        let template = self
            .env
            .get_template(kind.template_name())
            .with_context(|| format!("load {} template", kind.template_name()))?;
        let rendered = template
            .render(context! {
                code_path => params.code_path.display().to_string(),
                test_path => params.test_path.display().to_string(),
                output_results => params.output_results as u8,
                output_path => params.output_path.display().to_string(),
                verbose => params.verbose,
                silent => params.silent as u8,
                contract_data => params.data,
                tests => params.tests,
            })
            .with_context(|| format!("render {} template", kind.template_name()))?;
        Ok(rendered)
    }

    /// Render one driver script and write it to a fresh temp file.
    pub fn write_script(&self, kind: ScriptKind, params: &ScriptParams<'_>) -> Result<DriverScript> {
        let rendered = self.render(kind, params)?;
        let mut file = tempfile::Builder::new()
            .prefix("run-test-")
            .suffix(".fif")
            .tempfile()
            .context("create driver script file")?;
        file.write_all(rendered.as_bytes())
            .context("write driver script")?;
        file.flush().context("flush driver script")?;
        debug!(script = %file.path().display(), "driver script written");
        Ok(DriverScript { file })
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// A rendered driver script on disk. The file is removed on drop.
#[derive(Debug)]
pub struct DriverScript {
    file: tempfile::NamedTempFile,
}

impl DriverScript {
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_data() -> BTreeMap<String, toml::Value> {
        let mut data = BTreeMap::new();
        data.insert("workchain".to_string(), toml::Value::Integer(0));
        data
    }

    fn sample_params<'a>(
        data: &'a BTreeMap<String, toml::Value>,
        tests: Option<&'a [String]>,
    ) -> ScriptParams<'a> {
        ScriptParams {
            code_path: Path::new("/proj/build/wallet.boc"),
            test_path: Path::new("/proj/build/wallet-tests.boc"),
            output_results: true,
            output_path: Path::new("/proj/tests_output.json"),
            verbose: 2,
            silent: false,
            data,
            tests,
        }
    }

    /// Pull a `"value" constant name` binding back out of a rendered script.
    fn quoted_constant(rendered: &str, name: &str) -> String {
        let re = regex::Regex::new(&format!("\"([^\"]*)\" constant {name}")).unwrap();
        re.captures(rendered).unwrap_or_else(|| panic!("constant {name}"))[1].to_string()
    }

    fn bare_constant(rendered: &str, name: &str) -> String {
        let re = regex::Regex::new(&format!(r"(?m)^(\S+) constant {name}$")).unwrap();
        re.captures(rendered).unwrap_or_else(|| panic!("constant {name}"))[1].to_string()
    }

    #[test]
    fn standard_render_round_trips_variables() {
        let data = sample_data();
        let tests = vec!["__test_send".to_string(), "__test_recv".to_string()];
        let params = sample_params(&data, Some(&tests));

        let rendered = ScriptEngine::new()
            .render(ScriptKind::Standard, &params)
            .expect("render");

        assert_eq!(quoted_constant(&rendered, "code-path"), "/proj/build/wallet.boc");
        assert_eq!(
            quoted_constant(&rendered, "test-path"),
            "/proj/build/wallet-tests.boc"
        );
        assert_eq!(
            quoted_constant(&rendered, "output-path"),
            "/proj/tests_output.json"
        );
        assert_eq!(bare_constant(&rendered, "output-results"), "1");
        assert_eq!(bare_constant(&rendered, "verbose"), "2");
        assert_eq!(bare_constant(&rendered, "silent"), "0");
        assert!(rendered.contains("\"__test_send\" \"__test_recv\""));
        assert!(rendered.contains("// data workchain=0"));
    }

    #[test]
    fn omitted_test_subset_renders_full_suite_driver() {
        let data = sample_data();
        let params = sample_params(&data, None);

        let rendered = ScriptEngine::new()
            .render(ScriptKind::Standard, &params)
            .expect("render");

        assert!(!rendered.contains("selected-tests"));
        assert!(rendered.contains("run-all-tests"));
    }

    #[test]
    fn legacy_template_uses_suite_words() {
        let data = BTreeMap::new();
        let params = sample_params(&data, None);

        let rendered = ScriptEngine::new()
            .render(ScriptKind::Legacy, &params)
            .expect("render");

        assert!(rendered.contains("run-suite"));
        assert!(!rendered.contains("run-all-tests"));
    }

    #[test]
    fn write_script_creates_file_removed_on_drop() {
        let data = BTreeMap::new();
        let params = sample_params(&data, None);
        let engine = ScriptEngine::new();

        let script = engine
            .write_script(ScriptKind::Standard, &params)
            .expect("write");
        let path: PathBuf = script.path().to_path_buf();
        assert!(path.exists());
        let contents = std::fs::read_to_string(&path).expect("read script");
        assert!(contents.contains("constant code-path"));

        drop(script);
        assert!(!path.exists());
    }
}
