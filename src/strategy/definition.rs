use super::reference::NodeRef;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// A complete strategy document, as submitted by an author.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Strategy {
    pub id: String,
    pub version: String,
    pub meta: StrategyMeta,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// COIN outputs the author intends to leave unconsumed (e.g. profit routed back to the sender).
    #[serde(default)]
    pub outputs: Vec<NodeRef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyMeta {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_at: Option<u64>,
    #[serde(default)]
    pub updated_at: Option<u64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub price_sui: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    FlashBorrow,
    DexSwap,
    FlashRepay,
    Custom,
}

impl NodeType {
    pub const ALL: [&'static str; 4] = ["FLASH_BORROW", "DEX_SWAP", "FLASH_REPAY", "CUSTOM"];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::FlashBorrow => "FLASH_BORROW",
            NodeType::DexSwap => "DEX_SWAP",
            NodeType::FlashRepay => "FLASH_REPAY",
            NodeType::Custom => "CUSTOM",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of on-chain resource flows through a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResourceKind {
    Coin,
    Receipt,
    Other,
}

impl ResourceKind {
    pub const ALL: [&'static str; 3] = ["COIN", "RECEIPT", "OTHER"];
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Coin => write!(f, "COIN"),
            ResourceKind::Receipt => write!(f, "RECEIPT"),
            ResourceKind::Other => write!(f, "OTHER"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EdgeType {
    Coin,
    Receipt,
}

impl EdgeType {
    pub const ALL: [&'static str; 2] = ["COIN", "RECEIPT"];

    /// The output kind an edge of this type is allowed to carry.
    pub fn resource_kind(self) -> ResourceKind {
        match self {
            EdgeType::Coin => ResourceKind::Coin,
            EdgeType::Receipt => ResourceKind::Receipt,
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.resource_kind().fmt(f)
    }
}

/// A named output slot on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputPort {
    pub id: String,
    /// Free-form label used by the editor ("Coin", "Receipt", ...).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "output_type", alias = "kind")]
    pub kind: ResourceKind,
}

/// The value bound to an input port: either another node's output or a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum InputValue {
    Reference(NodeRef),
    Literal(Value),
}

impl InputValue {
    pub fn as_reference(&self) -> Option<&NodeRef> {
        match self {
            InputValue::Reference(r) => Some(r),
            InputValue::Literal(_) => None,
        }
    }
}

impl TryFrom<Value> for InputValue {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(s) if s.contains('.') => s
                .parse::<NodeRef>()
                .map(InputValue::Reference)
                .map_err(|e| e.to_string()),
            other => Ok(InputValue::Literal(other)),
        }
    }
}

impl From<InputValue> for Value {
    fn from(input: InputValue) -> Self {
        match input {
            InputValue::Reference(r) => Value::String(r.to_string()),
            InputValue::Literal(v) => v,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub protocol: String,
    #[serde(default)]
    pub params: Map<String, Value>,
    #[serde(default)]
    pub inputs: BTreeMap<String, InputValue>,
    #[serde(default)]
    pub outputs: Vec<OutputPort>,
}

impl Node {
    pub fn output(&self, output_id: &str) -> Option<&OutputPort> {
        self.outputs.iter().find(|o| o.id == output_id)
    }

    /// First declared output of the given kind.
    pub fn output_of_kind(&self, kind: ResourceKind) -> Option<&OutputPort> {
        self.outputs.iter().find(|o| o.kind == kind)
    }

    pub fn outputs_of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &OutputPort> {
        self.outputs.iter().filter(move |o| o.kind == kind)
    }

    /// Inputs bound to another node's output, in port-name order.
    pub fn reference_inputs(&self) -> impl Iterator<Item = (&str, &NodeRef)> {
        self.inputs
            .iter()
            .filter_map(|(name, value)| value.as_reference().map(|r| (name.as_str(), r)))
    }

    pub fn param_str(&self, key: &str) -> Option<&str> {
        self.params.get(key).and_then(Value::as_str)
    }

    /// Deserializes the protocol params into a typed struct.
    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(Value::Object(self.params.clone()))
    }

    pub fn output_ref(&self, output_id: &str) -> NodeRef {
        NodeRef::new(&self.id, output_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub source_output: String,
    pub target: String,
    pub target_input: String,
    pub edge_type: EdgeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coin_type: Option<String>,
}

impl Edge {
    pub fn source_ref(&self) -> NodeRef {
        NodeRef::new(&self.source, &self.source_output)
    }
}

impl Strategy {
    /// Parses a strategy from a JSON value without schema checks.
    ///
    /// Prefer [`crate::validation::SchemaValidator::validate_and_parse`], which reports
    /// every problem in the document instead of the first serde error.
    pub fn from_value(document: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(document)
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    pub fn position(&self, node_id: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.id == node_id)
    }

    pub fn outgoing<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    pub fn incoming<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    pub fn is_final_output(&self, reference: &NodeRef) -> bool {
        self.outputs.iter().any(|o| o == reference)
    }
}
