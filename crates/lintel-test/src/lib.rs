//! Lintel Test Framework
//!
//! Replays the example corpus of a rule description against the rule:
//! - Non-triggering examples report nothing
//! - Triggering examples report exactly the offsets marked with `↓`
//! - Results are identical with and without subtree pruning
//! - A disable command in front of a triggering example silences it
//! - Correction examples produce the expected text, and correcting that
//!   text again changes nothing

pub mod verifier;

pub use verifier::{RuleVerifier, verify_rule};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
