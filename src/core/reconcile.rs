//! Reconciliation of the interpreter's structured results with scraped gas
//! traces.
//!
//! The two signals are produced independently: the interpreter appends the
//! results stream itself, while gas traces are scraped from its stdout. They
//! must agree record-for-record before a report is written; any divergence
//! means the run is internally inconsistent and must abort rather than emit a
//! report that silently disagrees with the VM.

use anyhow::{Context, Result, bail};
use serde::Serialize;

use crate::core::gas_trace::GasRecord;
use crate::core::results_stream::StreamRecord;

/// Final persisted per-test result.
///
/// Field order is alphabetical so serialization yields the sorted-key report
/// shape directly.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TestResultRecord {
    pub exit_code: i32,
    pub gas_limit_vm: u64,
    pub gas_max_vm: u64,
    pub gas_used: u64,
    pub name: String,
}

#[derive(Debug, Serialize)]
struct TestReport<'a> {
    tests: &'a [TestResultRecord],
}

/// Pair the two signal sequences positionally and verify they agree.
///
/// Same index means same test, in emission order. Sequence-length and
/// gas-used mismatches are hard errors naming the divergence.
pub fn reconcile(stream: &[StreamRecord], traces: &[GasRecord]) -> Result<Vec<TestResultRecord>> {
    if stream.len() != traces.len() {
        bail!(
            "results stream has {} records but {} gas traces were scraped",
            stream.len(),
            traces.len()
        );
    }

    let mut records = Vec::with_capacity(stream.len());
    for (index, (result, trace)) in stream.iter().zip(traces).enumerate() {
        if result.gas_used != trace.used {
            bail!(
                "gas used mismatch for record {index} ({}): results stream says {}, vm trace says {}",
                result.name,
                result.gas_used,
                trace.used
            );
        }
        records.push(TestResultRecord {
            exit_code: result.exit_code,
            gas_limit_vm: trace.limit,
            gas_max_vm: trace.max,
            gas_used: result.gas_used,
            name: result.name.clone(),
        });
    }
    Ok(records)
}

/// Render the final report document: `{"tests": [...]}`, 4-space indented.
pub fn render_report(records: &[TestResultRecord]) -> Result<String> {
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    TestReport { tests: records }
        .serialize(&mut serializer)
        .context("serialize test report")?;
    let mut rendered = String::from_utf8(buf).context("report is not utf-8")?;
    rendered.push('\n');
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(name: &str, exit_code: i32, gas_used: u64) -> StreamRecord {
        StreamRecord {
            name: name.to_string(),
            exit_code,
            gas_used,
        }
    }

    fn trace(used: u64) -> GasRecord {
        GasRecord {
            max: 1_000_000,
            limit: 10_000,
            used,
        }
    }

    #[test]
    fn agreeing_signals_produce_records() {
        let records = reconcile(
            &[stream("t1", 0, 100), stream("t2", 9, 200)],
            &[trace(100), trace(200)],
        )
        .expect("reconcile");

        assert_eq!(
            records,
            vec![
                TestResultRecord {
                    exit_code: 0,
                    gas_limit_vm: 10_000,
                    gas_max_vm: 1_000_000,
                    gas_used: 100,
                    name: "t1".to_string(),
                },
                TestResultRecord {
                    exit_code: 9,
                    gas_limit_vm: 10_000,
                    gas_max_vm: 1_000_000,
                    gas_used: 200,
                    name: "t2".to_string(),
                },
            ]
        );
    }

    #[test]
    fn length_mismatch_aborts_with_counts() {
        let err = reconcile(&[stream("t1", 0, 100)], &[]).unwrap_err();
        assert!(err.to_string().contains("1 records"));
        assert!(err.to_string().contains("0 gas traces"));
    }

    #[test]
    fn gas_mismatch_aborts_naming_record_and_values() {
        let err = reconcile(
            &[stream("t1", 0, 100), stream("t2", 0, 200)],
            &[trace(100), trace(201)],
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("record 1"));
        assert!(message.contains("t2"));
        assert!(message.contains("200"));
        assert!(message.contains("201"));
    }

    #[test]
    fn report_keys_are_sorted_and_indented() {
        let rendered = render_report(&[TestResultRecord {
            exit_code: 0,
            gas_limit_vm: 2,
            gas_max_vm: 3,
            gas_used: 1,
            name: "t1".to_string(),
        }])
        .expect("render");

        let exit_pos = rendered.find("\"exit_code\"").expect("exit_code");
        let limit_pos = rendered.find("\"gas_limit_vm\"").expect("gas_limit_vm");
        let max_pos = rendered.find("\"gas_max_vm\"").expect("gas_max_vm");
        let used_pos = rendered.find("\"gas_used\"").expect("gas_used");
        let name_pos = rendered.find("\"name\"").expect("name");
        assert!(exit_pos < limit_pos && limit_pos < max_pos && max_pos < used_pos);
        assert!(used_pos < name_pos);
        assert!(rendered.contains("    \"tests\""));
        assert!(rendered.ends_with('\n'));
    }

    #[test]
    fn empty_reconciliation_renders_empty_report() {
        let records = reconcile(&[], &[]).expect("reconcile");
        let rendered = render_report(&records).expect("render");
        assert!(rendered.contains("\"tests\": []"));
    }
}
