//! Parser for gas-usage trace lines scraped from interpreter stdout.
//!
//! The VM emits three related trace lines per test step, each tagged with the
//! same source marker; only one in three carries the step summary we want, so
//! the scraper samples indices 0, 3, 6, … of the matching subsequence. The
//! marker and the `max=`/`limit=`/`used=` field labels are a versioned,
//! fragile contract with the interpreter build — keep all knowledge of the
//! format inside this module.

use anyhow::{Context, Result, bail};

/// Source tag the interpreter stamps on gas trace lines.
pub const GAS_TRACE_MARKER: &str = "[vm.cpp:558]";

/// Gas counters reported by one sampled trace line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasRecord {
    pub max: u64,
    pub limit: u64,
    pub used: u64,
}

/// Scrape gas records from captured interpreter stdout.
///
/// Filters lines containing [`GAS_TRACE_MARKER`], samples every third match
/// starting at the first, and parses the gas fields of each sampled line.
/// A sampled line missing any field is a hard error.
pub fn scrape_gas_records(stdout: &str) -> Result<Vec<GasRecord>> {
    stdout
        .lines()
        .filter(|line| line.contains(GAS_TRACE_MARKER))
        .step_by(3)
        .map(|line| parse_trace_line(line).with_context(|| format!("gas trace line {line:?}")))
        .collect()
}

/// Parse the `max=`/`limit=`/`used=` fields out of one trace line.
///
/// Fields are whitespace-delimited tokens of the form `label=value`, with an
/// optional trailing comma on the value.
pub fn parse_trace_line(line: &str) -> Result<GasRecord> {
    let mut max = None;
    let mut limit = None;
    let mut used = None;

    for token in line.split_whitespace() {
        let Some((label, value)) = token.split_once('=') else {
            continue;
        };
        let value = value.trim_end_matches(',');
        if label.contains("max") {
            max = Some(parse_gas_value("max", value)?);
        } else if label.contains("limit") {
            limit = Some(parse_gas_value("limit", value)?);
        } else if label.contains("used") {
            used = Some(parse_gas_value("used", value)?);
        }
    }

    match (max, limit, used) {
        (Some(max), Some(limit), Some(used)) => Ok(GasRecord { max, limit, used }),
        (None, _, _) => bail!("missing `max=` field"),
        (_, None, _) => bail!("missing `limit=` field"),
        (_, _, None) => bail!("missing `used=` field"),
    }
}

fn parse_gas_value(label: &str, value: &str) -> Result<u64> {
    value
        .parse::<u64>()
        .with_context(|| format!("parse `{label}=` value {value:?}"))
}
