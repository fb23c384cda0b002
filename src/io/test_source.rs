//! Discovery of declared test names in contract test sources.
//!
//! Test functions follow the `__test_*` naming convention; a requested test
//! subset is matched against the names actually declared in the contract's
//! test files.

use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;

static TEST_DECL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(__test_[A-Za-z0-9_]+)\s*\(").expect("test name regex"));

/// Scan test sources for declared `__test_*` identifiers.
///
/// Names are returned in first-occurrence order, deduplicated across files.
pub fn discover_declared_tests(paths: &[PathBuf]) -> Result<Vec<String>> {
    let mut declared = Vec::new();
    for path in paths {
        let contents =
            fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        for captures in TEST_DECL_RE.captures_iter(&contents) {
            let name = captures[1].to_string();
            if !declared.contains(&name) {
                declared.push(name);
            }
        }
    }
    Ok(declared)
}

/// Intersect a requested subset with the declared names, preserving request
/// order. Unknown requested names are dropped.
pub fn resolve_requested(declared: &[String], requested: &[String]) -> Vec<String> {
    requested
        .iter()
        .filter(|name| declared.contains(name))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SOURCE: &str = r#"
int add(int a, int b) { return a + b; }

int __test_send() {
    return add(1, 2);
}

int __test_recv() { return 0; }
"#;

    fn write_source(dir: &std::path::Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, contents).expect("write source");
        path
    }

    #[test]
    fn discovers_declared_names_in_order() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = write_source(temp.path(), "wallet-tests.fc", TEST_SOURCE);

        let declared = discover_declared_tests(&[path]).expect("discover");
        assert_eq!(declared, vec!["__test_send", "__test_recv"]);
    }

    #[test]
    fn duplicate_names_across_files_are_deduplicated() {
        let temp = tempfile::tempdir().expect("tempdir");
        let a = write_source(temp.path(), "a.fc", "int __test_x() { return 0; }");
        let b = write_source(temp.path(), "b.fc", "int __test_x() { return 1; }");

        let declared = discover_declared_tests(&[a, b]).expect("discover");
        assert_eq!(declared, vec!["__test_x"]);
    }

    #[test]
    fn missing_source_is_an_error() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = discover_declared_tests(&[temp.path().join("nope.fc")]).unwrap_err();
        assert!(format!("{err:#}").contains("nope.fc"));
    }

    #[test]
    fn resolve_preserves_request_order_and_drops_unknowns() {
        let declared = vec!["__test_a".to_string(), "__test_b".to_string()];
        let requested = vec![
            "__test_b".to_string(),
            "__test_ghost".to_string(),
            "__test_a".to_string(),
        ];

        let resolved = resolve_requested(&declared, &requested);
        assert_eq!(resolved, vec!["__test_b", "__test_a"]);
    }

    #[test]
    fn resolve_with_no_matches_is_empty() {
        let declared = vec!["__test_a".to_string()];
        let requested = vec!["__test_ghost".to_string()];
        assert!(resolve_requested(&declared, &requested).is_empty());
    }
}
