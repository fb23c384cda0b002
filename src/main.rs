//! Smart-contract test harness CLI.
//!
//! Builds contract artifacts through the configured external compiler, renders
//! a driver script per contract, runs the external VM interpreter on it, and
//! aggregates per-test results. With `--record-results`, the interpreter's
//! structured output is reconciled against scraped gas traces into
//! `tests_output.json`.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};

use contract_runner::core::selector::{EmptySelection, SelectionPolicy};
use contract_runner::exit_codes;
use contract_runner::io::builder::CommandBuilder;
use contract_runner::io::config::{CONFIG_FILE, load_config};
use contract_runner::io::interpreter::CommandInterpreter;
use contract_runner::io::manifest::load_manifest;
use contract_runner::logging;
use contract_runner::run::{RunRequest, run_tests};

#[derive(Parser)]
#[command(
    name = "contract-runner",
    version,
    about = "Build smart contracts and run their tests on an external VM interpreter"
)]
struct Cli {
    /// Project root containing project.toml.
    #[arg(long, default_value = ".")]
    project: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build selected contracts and run their tests.
    Run {
        /// Contract names to run; defaults to every contract declaring tests.
        #[arg(short, long = "contract")]
        contracts: Vec<String>,

        /// Test names to run within the selected contracts.
        #[arg(short, long = "test")]
        tests: Vec<String>,

        /// Interpreter verbosity; repeat to increase.
        #[arg(short, long, action = ArgAction::Count)]
        verbose: u8,

        /// Reconcile and persist per-test results to tests_output.json.
        #[arg(long)]
        record_results: bool,

        /// Use the legacy two-phase compile and driver script.
        #[arg(long)]
        legacy: bool,

        /// Ask the interpreter to suppress its own test chatter.
        #[arg(long)]
        silent: bool,

        /// Select every manifest contract, not just those with test files.
        #[arg(long)]
        all_contracts: bool,
    },
    /// List contracts declared in the project manifest.
    List,
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{err:#}");
            let code = if err.downcast_ref::<EmptySelection>().is_some() {
                exit_codes::NO_CONTRACTS
            } else {
                exit_codes::FAILURE
            };
            std::process::exit(code);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let root = fs::canonicalize(&cli.project)
        .with_context(|| format!("resolve project root {}", cli.project.display()))?;

    match cli.command {
        Command::Run {
            contracts,
            tests,
            verbose,
            record_results,
            legacy,
            silent,
            all_contracts,
        } => {
            let cfg = load_config(&root.join(CONFIG_FILE))?;
            let timeout = Duration::from_secs(cfg.interpreter_timeout_secs);
            let builder =
                CommandBuilder::new(cfg.builder.command.clone(), timeout, cfg.output_limit_bytes);
            let interpreter = CommandInterpreter::new(
                cfg.interpreter.command.clone(),
                timeout,
                cfg.output_limit_bytes,
            );
            let request = RunRequest {
                contracts,
                tests,
                verbosity: verbose,
                record_results,
                legacy,
                silent,
                policy: if all_contracts {
                    SelectionPolicy::All
                } else {
                    SelectionPolicy::WithTests
                },
            };
            let summary = run_tests(&root, &request, &builder, &interpreter)?;
            Ok(summary.exit_code)
        }
        Command::List => {
            let manifest = load_manifest(&root)?;
            for contract in &manifest.contracts {
                println!("{}", contract.name);
            }
            Ok(exit_codes::OK)
        }
    }
}
