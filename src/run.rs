//! Test-run orchestration: select, build, render, execute, reconcile.
//!
//! The pipeline is strictly sequential and feeds forward only: the selector
//! produces the working set, the builder compiles it, each contract gets a
//! rendered driver script and one interpreter subprocess, and — in
//! result-recording mode — the reconciler runs once after every contract has
//! exited, pairing the interpreter's structured results with the gas traces
//! scraped from stdout.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info, instrument};

use crate::core::gas_trace::{GasRecord, scrape_gas_records};
use crate::core::reconcile::{reconcile, render_report};
use crate::core::results_stream::parse_results_stream;
use crate::core::selector::{EmptySelection, SelectionPolicy, select_contracts};
use crate::io::builder::ContractBuilder;
use crate::io::interpreter::Interpreter;
use crate::io::manifest::{BUILD_DIR, ContractConfig, load_manifest};
use crate::io::script::{ScriptEngine, ScriptKind, ScriptParams};
use crate::io::test_source::{discover_declared_tests, resolve_requested};

/// Shared results file, relative to the project root. The interpreter appends
/// its structured stream here; the reconciler overwrites it with the final
/// report.
pub const RESULTS_FILE: &str = "tests_output.json";

/// Per-invocation run parameters.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Requested contract names; empty means "all" per `policy`.
    pub contracts: Vec<String>,
    /// Requested test names; empty runs every declared test.
    pub tests: Vec<String>,
    pub verbosity: u8,
    /// Persist reconciled results to [`RESULTS_FILE`].
    pub record_results: bool,
    /// Legacy two-phase compile and driver template.
    pub legacy: bool,
    /// Ask the interpreter to suppress its own test chatter.
    pub silent: bool,
    pub policy: SelectionPolicy,
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Maximum exit code across executed contracts; 0 when none ran.
    pub exit_code: i32,
    /// Contracts whose driver script was executed.
    pub executed: usize,
    /// Contracts skipped because no requested test matched.
    pub skipped: usize,
    /// Written report, when result recording was on.
    pub report_path: Option<PathBuf>,
}

/// Run tests for the selected contracts.
///
/// Selection misses inside a contract (requested tests not declared) skip that
/// contract and continue; everything else — build failure, templating failure,
/// interpreter spawn failure, reconciliation mismatch — aborts the run.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn run_tests<B: ContractBuilder, I: Interpreter>(
    root: &Path,
    request: &RunRequest,
    builder: &B,
    interpreter: &I,
) -> Result<RunSummary> {
    info!("starting test run");
    let manifest = load_manifest(root)?;
    let selected: Vec<ContractConfig> =
        select_contracts(&manifest.contracts, &request.contracts, request.policy)
            .into_iter()
            .cloned()
            .collect();
    if selected.is_empty() {
        return Err(EmptySelection {
            requested: request.contracts.clone(),
        }
        .into());
    }

    builder
        .build(root, &selected, !request.legacy)
        .context("build contracts")?;
    info!(build_dir = %root.join(BUILD_DIR).display(), "build succeeded");

    let output_path = root.join(RESULTS_FILE);
    if request.record_results && output_path.exists() {
        fs::remove_file(&output_path)
            .with_context(|| format!("remove stale {}", output_path.display()))?;
    }

    let engine = ScriptEngine::new();
    let kind = if request.legacy {
        ScriptKind::Legacy
    } else {
        ScriptKind::Standard
    };

    let mut exit_codes = Vec::new();
    let mut scraped: Vec<GasRecord> = Vec::new();
    let mut skipped = 0usize;

    for contract in &selected {
        let resolved_tests = match resolve_test_subset(root, contract, &request.tests)? {
            TestSubset::All => None,
            TestSubset::Some(tests) => Some(tests),
            TestSubset::NoneMatched => {
                error!(contract = contract.name, "no requested tests found, skipping");
                skipped += 1;
                continue;
            }
        };

        let code_path = contract.artifact_path(root);
        let test_path = contract.test_artifact_path(root);
        let params = ScriptParams {
            code_path: &code_path,
            test_path: &test_path,
            output_results: request.record_results,
            output_path: &output_path,
            verbose: request.verbosity,
            silent: request.silent,
            data: &contract.data,
            tests: resolved_tests.as_deref(),
        };
        let script = engine.write_script(kind, &params)?;

        info!(contract = contract.name, "running tests");
        let outcome = interpreter
            .run_script(root, script.path())
            .with_context(|| format!("run interpreter for {}", contract.name))?;

        // Echo the interpreter output verbatim; the structured copy (if any)
        // went to the results file.
        print!("{}", outcome.stdout);
        exit_codes.push(outcome.exit_code);

        if request.record_results {
            scraped.extend(scrape_gas_records(&outcome.stdout)?);
        }
        // `script` drops here, removing the temp file before the next contract.
    }

    let report_path = if request.record_results && !exit_codes.is_empty() {
        let contents = fs::read_to_string(&output_path)
            .with_context(|| format!("read results stream {}", output_path.display()))?;
        let stream = parse_results_stream(&contents)?;
        let records = reconcile(&stream, &scraped)?;
        fs::write(&output_path, render_report(&records)?)
            .with_context(|| format!("write report {}", output_path.display()))?;
        info!(report = %output_path.display(), tests = records.len(), "report written");
        Some(output_path)
    } else {
        None
    };

    let exit_code = exit_codes.iter().copied().max().unwrap_or(0);
    Ok(RunSummary {
        exit_code,
        executed: exit_codes.len(),
        skipped,
        report_path,
    })
}

enum TestSubset {
    /// No subset requested; run every declared test.
    All,
    /// Requested names that exist in this contract's test sources.
    Some(Vec<String>),
    /// A subset was requested but none of it exists here.
    NoneMatched,
}

fn resolve_test_subset(
    root: &Path,
    contract: &ContractConfig,
    requested: &[String],
) -> Result<TestSubset> {
    if requested.is_empty() {
        return Ok(TestSubset::All);
    }
    let sources: Vec<PathBuf> = contract
        .test_sources
        .iter()
        .map(|path| root.join(path))
        .collect();
    let declared = discover_declared_tests(&sources)
        .with_context(|| format!("discover tests for {}", contract.name))?;
    let resolved = resolve_requested(&declared, requested);
    if resolved.is_empty() {
        return Ok(TestSubset::NoneMatched);
    }
    Ok(TestSubset::Some(resolved))
}
