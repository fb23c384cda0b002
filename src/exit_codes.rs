//! Stable exit codes for runner CLI commands.
//!
//! A successful `run` exits with the maximum exit code observed across the
//! executed contracts, so anything a contract test can return is also a valid
//! process status. The codes below cover the orchestrator's own outcomes.

/// Command succeeded and every executed contract exited zero.
pub const OK: i32 = 0;
/// Build, templating, interpreter, or reconciliation failure.
pub const FAILURE: i32 = 1;
/// Selection resolved to an empty working set.
pub const NO_CONTRACTS: i32 = 2;
