//! Parser for the structured results stream appended by the interpreter.
//!
//! When result recording is on, the driver script makes the interpreter append
//! one line per executed test to the shared output file: a header line first,
//! then whitespace-delimited records of quoted test name, exit code, and gas
//! used.

use anyhow::{Context, Result, bail};

/// One test result as reported by the interpreter itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamRecord {
    pub name: String,
    pub exit_code: i32,
    pub gas_used: u64,
}

/// Parse the raw results stream into records.
///
/// The first line is a header and is skipped; blank lines (including a
/// trailing newline) are ignored so they cannot skew the record count the
/// reconciler checks against.
pub fn parse_results_stream(contents: &str) -> Result<Vec<StreamRecord>> {
    contents
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(index, line)| {
            parse_record(line).with_context(|| format!("results stream record {index}: {line:?}"))
        })
        .collect()
}

fn parse_record(line: &str) -> Result<StreamRecord> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [name, exit_code, gas_used, ..] = fields[..] else {
        bail!("expected at least 3 fields, got {}", fields.len());
    };
    Ok(StreamRecord {
        name: name.trim_matches('"').to_string(),
        exit_code: exit_code.parse().context("parse exit code")?,
        gas_used: gas_used.parse().context("parse gas used")?,
    })
}
