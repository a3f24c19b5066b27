use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

/// A validation finding, tagged with a stable rule identifier and the dotted path
/// of the offending field (e.g. `nodes.2.params.asset`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue<R> {
    pub rule: R,
    pub severity: Severity,
    pub path: String,
    pub message: String,
}

impl<R> Issue<R> {
    pub fn error(rule: R, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule,
            severity: Severity::Error,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn warning(rule: R, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            rule,
            severity: Severity::Warning,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl<R: fmt::Display> fmt::Display for Issue<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} at '{}': {}", self.severity, self.rule, self.path, self.message)
    }
}

/// Defines a rule enum whose variants serialize as their stable identifiers.
macro_rules! define_rules {
    ( $(#[$meta:meta])* $name:ident { $( $variant:ident => $id:literal ),* $(,)? } ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $variant, )*
        }

        impl $name {
            pub fn id(&self) -> &'static str {
                match self {
                    $( $name::$variant => $id, )*
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.id())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.id())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let id = String::deserialize(deserializer)?;
                match id.as_str() {
                    $( $id => Ok($name::$variant), )*
                    other => Err(D::Error::unknown_variant(other, &[$( $id ),*])),
                }
            }
        }
    };
}

define_rules! {
    /// Field-level document rules checked by the schema validator.
    SchemaRule {
        InvalidDocument => "SCHEMA_INVALID_DOCUMENT",
        MissingField => "SCHEMA_MISSING_FIELD",
        WrongType => "SCHEMA_WRONG_TYPE",
        EmptyValue => "SCHEMA_EMPTY_VALUE",
        InvalidEnumValue => "SCHEMA_INVALID_ENUM_VALUE",
        InvalidAddress => "SCHEMA_INVALID_ADDRESS",
        InvalidCoinType => "SCHEMA_INVALID_COIN_TYPE",
        InvalidCallTarget => "SCHEMA_INVALID_CALL_TARGET",
        InvalidNodeReference => "SCHEMA_INVALID_NODE_REFERENCE",
        InvalidAmount => "SCHEMA_INVALID_AMOUNT",
        InvalidSlippage => "SCHEMA_INVALID_SLIPPAGE",
        InvalidNumber => "SCHEMA_INVALID_NUMBER",
    }
}

define_rules! {
    /// Semantic rules checked by the graph validator.
    GraphRule {
        DuplicateNode => "GRAPH_DUPLICATE_NODE",
        DuplicateEdge => "GRAPH_DUPLICATE_EDGE",
        UnknownNode => "GRAPH_UNKNOWN_NODE",
        UnknownPort => "GRAPH_UNKNOWN_PORT",
        KindMismatch => "GRAPH_KIND_MISMATCH",
        EdgeInputMismatch => "GRAPH_EDGE_INPUT_MISMATCH",
        DanglingReference => "GRAPH_DANGLING_REFERENCE",
        MissingEdge => "GRAPH_MISSING_EDGE",
        DuplicateInputEdge => "GRAPH_DUPLICATE_INPUT_EDGE",
        ReceiptNotConsumed => "GRAPH_RECEIPT_NOT_CONSUMED",
        ReceiptDuplicated => "GRAPH_RECEIPT_DUPLICATED",
        CoinDuplicated => "GRAPH_COIN_DUPLICATED",
        CoinUnconsumed => "GRAPH_COIN_UNCONSUMED",
        InvalidFinalOutput => "GRAPH_INVALID_FINAL_OUTPUT",
        Cycle => "GRAPH_CYCLE",
        UnbalancedReceipt => "GRAPH_UNBALANCED_RECEIPT",
        NodeShape => "GRAPH_NODE_SHAPE",
        IsolatedNode => "GRAPH_ISOLATED_NODE",
        CoinTypeMismatch => "GRAPH_COIN_TYPE_MISMATCH",
    }
}

pub type SchemaIssue = Issue<SchemaRule>;
pub type GraphIssue = Issue<GraphRule>;

/// What a `/validate`-style endpoint relays back to the author.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationReport {
    pub schema_errors: Vec<SchemaIssue>,
    pub graph_errors: Vec<GraphIssue>,
    pub warnings: Vec<GraphIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.schema_errors.is_empty() && self.graph_errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.schema_errors.len() + self.graph_errors.len()
    }
}
