//! Working-set selection from the project manifest.

use std::fmt;

use crate::io::manifest::ContractConfig;

/// Default breadth when no contract names are requested.
///
/// The two call sites of manifest selection differ: plain builds run every
/// contract, test runs only those that can actually be tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Every manifest contract.
    All,
    /// Only contracts that declare at least one test-source file.
    WithTests,
}

/// Resolve the working set for a run.
///
/// With a non-empty `requested` list, returns the manifest entries matching
/// each requested name, in request order; names with no manifest entry are
/// silently dropped. With an empty list, falls back to `policy`.
pub fn select_contracts<'a>(
    manifest: &'a [ContractConfig],
    requested: &[String],
    policy: SelectionPolicy,
) -> Vec<&'a ContractConfig> {
    if !requested.is_empty() {
        let mut selected = Vec::new();
        for name in requested {
            for contract in manifest {
                if contract.name == *name {
                    selected.push(contract);
                }
            }
        }
        return selected;
    }

    match policy {
        SelectionPolicy::All => manifest.iter().collect(),
        SelectionPolicy::WithTests => manifest
            .iter()
            .filter(|contract| !contract.test_sources.is_empty())
            .collect(),
    }
}

/// Selection resolved to an empty working set.
///
/// Typed so the CLI can map it to its own exit code instead of the generic
/// failure status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmptySelection {
    /// Names the caller asked for (empty when the manifest itself had nothing
    /// matching the policy).
    pub requested: Vec<String>,
}

impl fmt::Display for EmptySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.requested.is_empty() {
            write!(f, "no contracts in the project manifest match the selection")
        } else {
            write!(
                f,
                "no contracts [{}] found in the project manifest",
                self.requested.join(", ")
            )
        }
    }
}

impl std::error::Error for EmptySelection {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::contract;

    fn names(selected: &[&ContractConfig]) -> Vec<String> {
        selected.iter().map(|c| c.name.clone()).collect()
    }

    #[test]
    fn requested_names_resolve_in_request_order() {
        let manifest = vec![contract("a", true), contract("b", false), contract("c", true)];
        let requested = vec!["c".to_string(), "a".to_string()];

        let selected = select_contracts(&manifest, &requested, SelectionPolicy::WithTests);
        assert_eq!(names(&selected), vec!["c", "a"]);
    }

    #[test]
    fn unknown_requested_names_are_dropped() {
        let manifest = vec![contract("a", true)];
        let requested = vec!["ghost".to_string(), "a".to_string()];

        let selected = select_contracts(&manifest, &requested, SelectionPolicy::All);
        assert_eq!(names(&selected), vec!["a"]);
    }

    #[test]
    fn unknown_names_alone_resolve_to_empty_set() {
        let manifest = vec![contract("a", true)];
        let requested = vec!["ghost".to_string()];

        let selected = select_contracts(&manifest, &requested, SelectionPolicy::All);
        assert!(selected.is_empty());
    }

    #[test]
    fn empty_request_with_all_policy_selects_whole_manifest() {
        let manifest = vec![contract("a", false), contract("b", true)];

        let selected = select_contracts(&manifest, &[], SelectionPolicy::All);
        assert_eq!(names(&selected), vec!["a", "b"]);
    }

    #[test]
    fn empty_request_with_tests_policy_selects_tested_contracts_only() {
        let manifest = vec![contract("a", false), contract("b", true), contract("c", true)];

        let selected = select_contracts(&manifest, &[], SelectionPolicy::WithTests);
        assert_eq!(names(&selected), vec!["b", "c"]);
    }

    #[test]
    fn empty_selection_names_the_requested_set() {
        let err = EmptySelection {
            requested: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "no contracts [a, b] found in the project manifest"
        );
    }
}
