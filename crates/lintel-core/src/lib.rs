//! Lintel Core
//!
//! Rule-execution engine for Swift source trees.
//! This crate provides the lossless syntax tree, the pruning traversal,
//! violation collection, the correction engine and the orchestrator that
//! runs configured rules over parsed files.

pub mod commands;
pub mod config;
pub mod correction;
pub mod cst; // Concrete Syntax Tree (lossless, Rowan-based)
pub mod error;
pub mod linter;
pub mod result;
pub mod rule;
pub mod source;
pub mod violation;
pub mod visitor;

// Re-export commonly used types
pub use commands::{Command, DisabledRegions};
pub use config::{LinterConfiguration, NoOptions, RuleConfig, RuleSeverity, parse_options};
pub use correction::{
    AdjacentTrivia, Correction, CorrectionEngine, CorrectionResult, Edit, OffsetMap, TextEdit,
};
pub use error::{ErrorKind, LintelError};
pub use linter::{
    ActiveRule, AppliedCorrection, EngineDiagnostic, FixOutcome, LintOutcome, Linter, RuleFailure,
};
pub use result::{Result, ResultExt};
pub use rule::{
    ConfigurableRule, CorrectionExample, Example, Rewriter, Rule, RuleDescription, RuleFactory,
    RuleKind, ViolationsVisitor,
};
pub use source::{LineCol, LineIndex, NodeId, ParentMap, SourceFile};
pub use violation::{ReasonedViolation, Severity, Violation, ViolationCollector};
pub use visitor::{KindSet, SyntaxVisitor, VisitControl, WalkOptions, walk};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lintel=info"));

    // A second call keeps the subscriber installed first
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
