use crate::validation::{GraphIssue, SchemaIssue};
use itertools::Itertools;
use thiserror::Error;

/// The pipeline stage a compilation failed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Schema,
    Graph,
    Ordering,
    Compiling { node_id: String },
}

/// Raised when the node graph cannot be linearized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Cycle detected: {} node(s) could not be ordered: {}", .remainder.len(), .remainder.join(", "))]
pub struct CycleError {
    /// Ids of the nodes left unsorted, in document order.
    pub remainder: Vec<String>,
}

/// Errors raised by the external lookups adapters depend on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("'{0}' was not found")]
    NotFound(String),

    #[error("'{key}' is temporarily unavailable: {reason}")]
    Unavailable { key: String, reason: String },
}

/// Errors raised by a protocol adapter while compiling a single node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("Pool '{pool_id}' is unavailable: {reason}")]
    PoolUnavailable { pool_id: String, reason: String },

    #[error("Estimation failed: {reason}")]
    Estimation { reason: String },

    #[error("Lookup for '{key}' returned nothing")]
    NotFound { key: String },

    #[error("Invalid param '{field}': {reason}")]
    InvalidParams { field: String, reason: String },

    #[error("Arithmetic overflow or underflow in {operation}")]
    Arithmetic { operation: String },

    #[error("Transaction exceeds the limit of {limit} calls")]
    CallLimit { limit: usize },
}

impl AdapterError {
    pub fn arithmetic(operation: &str) -> Self {
        AdapterError::Arithmetic {
            operation: operation.to_string(),
        }
    }

    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        AdapterError::InvalidParams {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    pub fn estimation(reason: impl Into<String>) -> Self {
        AdapterError::Estimation {
            reason: reason.into(),
        }
    }
}

impl From<LookupError> for AdapterError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::NotFound(key) => AdapterError::NotFound { key },
            LookupError::Unavailable { key, reason } => AdapterError::PoolUnavailable {
                pool_id: key,
                reason,
            },
        }
    }
}

/// Errors that can occur while compiling a strategy document.
#[derive(Error, Debug, Clone)]
pub enum CompileError {
    #[error("Schema validation failed with {} issue(s): {}", .0.len(), summarize(.0))]
    Schema(Vec<SchemaIssue>),

    #[error("Graph validation failed with {} issue(s): {}", .0.len(), summarize(.0))]
    Graph(Vec<GraphIssue>),

    #[error(transparent)]
    Cycle(#[from] CycleError),

    #[error("Node '{node_id}' uses protocol '{protocol}', which has no registered {family} adapter")]
    UnsupportedProtocol {
        node_id: String,
        protocol: String,
        family: &'static str,
    },

    #[error("Adapter failed on node '{node_id}': {source}")]
    Adapter {
        node_id: String,
        #[source]
        source: AdapterError,
    },

    #[error("Internal compiler error{}: {message}", at_node(.node_id))]
    Internal {
        node_id: Option<String>,
        message: String,
    },
}

impl CompileError {
    pub fn internal(node_id: &str, message: impl Into<String>) -> Self {
        CompileError::Internal {
            node_id: Some(node_id.to_string()),
            message: message.into(),
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            CompileError::Schema(_) => Stage::Schema,
            CompileError::Graph(_) => Stage::Graph,
            CompileError::Cycle(_) => Stage::Ordering,
            CompileError::UnsupportedProtocol { node_id, .. }
            | CompileError::Adapter { node_id, .. }
            | CompileError::Internal {
                node_id: Some(node_id),
                ..
            } => Stage::Compiling {
                node_id: node_id.clone(),
            },
            CompileError::Internal { node_id: None, .. } => Stage::Ordering,
        }
    }

    /// `true` for errors the strategy author can fix by editing the document.
    pub fn is_user_correctable(&self) -> bool {
        matches!(
            self,
            CompileError::Schema(_)
                | CompileError::Graph(_)
                | CompileError::Cycle(_)
                | CompileError::UnsupportedProtocol { .. }
                | CompileError::Adapter {
                    source: AdapterError::InvalidParams { .. },
                    ..
                }
        )
    }
}

fn summarize<I: std::fmt::Display>(issues: &[I]) -> String {
    issues.iter().join("; ")
}

fn at_node(node_id: &Option<String>) -> String {
    node_id
        .as_ref()
        .map(|n| format!(" at node '{}'", n))
        .unwrap_or_default()
}

/// Errors that can occur when persisting or loading a compiled transaction.
#[derive(Error, Debug, Clone)]
pub enum ArtifactError {
    #[error("{0}")]
    Encode(String),

    #[error("{0}")]
    Decode(String),

    #[error("{0}")]
    Io(String),
}
