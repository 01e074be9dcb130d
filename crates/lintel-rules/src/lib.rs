//! Lintel Rules
//!
//! Built-in rules for Swift sources and the registry that builds them from
//! configuration.

pub mod builtin;
pub mod registry;

pub use registry::{BUILTIN_RULES, build, descriptors, factory, linter};
