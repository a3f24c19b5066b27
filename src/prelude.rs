//! Prelude module for convenient imports
//!
//! Re-exports the types most hosts need to validate and compile strategies.
//!
//! # Example
//!
//! ```rust,no_run
//! use sail::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let document: serde_json::Value =
//!     serde_json::from_str(&std::fs::read_to_string("path/to/strategy.json")?)?;
//!
//! let report = validate_document(&document);
//! for issue in &report.schema_errors {
//!     println!("{}", issue);
//! }
//! for issue in report.graph_errors.iter().chain(&report.warnings) {
//!     println!("{}", issue);
//! }
//! # Ok(())
//! # }
//! ```

// Compilation
pub use crate::compiler::{CompileState, CompilerBuilder, CompilerOptions, TransactionBuilder};

// Validation and ordering
pub use crate::topology::TopologicalSort;
pub use crate::validation::{
    GraphIssue, GraphRule, GraphValidator, SchemaIssue, SchemaRule, SchemaValidator, Severity,
    ValidationReport, validate_document,
};

// Data model
pub use crate::strategy::{
    Argument, CallDescriptor, CompiledTransaction, Edge, Handle, Node, NodeRef, NodeType,
    PureValue, Resource, ResourceKind, Strategy,
};

// Adapters and their collaborators
pub use crate::adapters::{
    EstimateMode, EstimateQuality, FeeRate, Network, PoolState, Slippage, StaticAddressBook,
    StaticPoolReader, SwapEstimate,
};

// Error types
pub use crate::error::{AdapterError, ArtifactError, CompileError, CycleError, LookupError};

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
