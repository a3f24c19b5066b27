pub mod graph;
pub mod issue;
pub mod schema;

pub use graph::GraphValidator;
pub use issue::{GraphIssue, GraphRule, Issue, SchemaIssue, SchemaRule, Severity, ValidationReport};
pub use schema::SchemaValidator;

use serde_json::Value;

/// Runs the schema validator and, if the document is structurally sound, the graph
/// validator. This is what a `/validate` endpoint relays.
pub fn validate_document(document: &Value) -> ValidationReport {
    match SchemaValidator::validate_and_parse(document) {
        Ok(strategy) => GraphValidator::inspect(&strategy),
        Err(schema_errors) => ValidationReport {
            schema_errors,
            ..ValidationReport::default()
        },
    }
}
