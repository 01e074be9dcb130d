//! Built-in rules
//!
//! One module per rule. Each module exposes its `IDENTIFIER`, the static
//! `DESCRIPTION` with its example corpus, and the rule type.

pub mod discouraged_direct_init;
pub mod discouraged_void_return;
pub mod duplicate_enum_cases;
pub mod redundant_optional_initialization;
pub mod strong_iboutlet;
pub mod trailing_semicolon;
pub mod unowned_variable_capture;

pub use discouraged_direct_init::DiscouragedDirectInit;
pub use discouraged_void_return::DiscouragedVoidReturn;
pub use duplicate_enum_cases::DuplicateEnumCases;
pub use private_unit_test::PrivateUnitTest;
pub use redundant_optional_initialization::RedundantOptionalInitialization;
pub use strong_iboutlet::StrongIBOutlet;
pub use trailing_semicolon::TrailingSemicolon;
pub use unowned_variable_capture::UnownedVariableCapture;
