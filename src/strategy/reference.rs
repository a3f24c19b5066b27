use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A reference to a node output in `"nodeId.outputId"` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeRef {
    pub node_id: String,
    pub output_id: String,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{0}' is not a node reference, expected exactly one '.' between a node id and an output id")]
pub struct NodeRefParseError(pub String);

impl NodeRef {
    pub fn new(node_id: &str, output_id: &str) -> Self {
        Self {
            node_id: node_id.to_string(),
            output_id: output_id.to_string(),
        }
    }

    pub fn is_well_formed(reference: &str) -> bool {
        let mut parts = reference.split('.');
        matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(node), Some(output), None) if !node.is_empty() && !output.is_empty()
        )
    }
}

impl FromStr for NodeRef {
    type Err = NodeRefParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !Self::is_well_formed(s) {
            return Err(NodeRefParseError(s.to_string()));
        }
        let (node_id, output_id) = s
            .split_once('.')
            .ok_or_else(|| NodeRefParseError(s.to_string()))?;
        Ok(Self::new(node_id, output_id))
    }
}

impl TryFrom<String> for NodeRef {
    type Error = NodeRefParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<NodeRef> for String {
    fn from(r: NodeRef) -> Self {
        r.to_string()
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node_id, self.output_id)
    }
}
