use crate::adapters::dex::SwapEstimate;
use crate::error::ArtifactError;
use crate::strategy::ResourceKind;
use crate::validation::GraphIssue;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{Read, Write};

/// A forward reference to a value the chain produces while executing the transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handle {
    /// The single return value of call `n`.
    Result(u16),
    /// Return value `index` of call `n` when it returns a tuple.
    NestedResult(u16, u16),
    /// A transaction input supplied by the assembler under this name.
    Input(String),
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Handle::Result(call) => write!(f, "Result({})", call),
            Handle::NestedResult(call, index) => write!(f, "NestedResult({},{})", call, index),
            Handle::Input(name) => write!(f, "Input({})", name),
        }
    }
}

/// A BCS-encodable literal argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PureValue {
    Bool(bool),
    U64(u64),
    U128(u128),
    Address(String),
    String(String),
}

impl PureValue {
    /// Maps a literal from a strategy document onto the closest pure type.
    pub fn from_literal(value: &Value) -> Self {
        match value {
            Value::Bool(b) => PureValue::Bool(*b),
            Value::Number(n) => match n.as_u64() {
                Some(v) => PureValue::U64(v),
                None => PureValue::String(n.to_string()),
            },
            Value::String(s) if crate::validation::SchemaValidator::is_valid_address(s) => {
                PureValue::Address(s.clone())
            }
            Value::String(s) => PureValue::String(s.clone()),
            other => PureValue::String(other.to_string()),
        }
    }
}

impl fmt::Display for PureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PureValue::Bool(b) => write!(f, "{}", b),
            PureValue::U64(v) => write!(f, "{}u64", v),
            PureValue::U128(v) => write!(f, "{}u128", v),
            PureValue::Address(a) => write!(f, "@{}", a),
            PureValue::String(s) => write!(f, "{:?}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Argument {
    Pure(PureValue),
    /// A shared or owned object, by id.
    Object(String),
    Handle(Handle),
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Argument::Pure(v) => write!(f, "{}", v),
            Argument::Object(id) => write!(f, "obj:{}", id),
            Argument::Handle(h) => write!(f, "{}", h),
        }
    }
}

/// One move call in the compiled transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallDescriptor {
    /// The strategy node that emitted this call.
    pub node_id: String,
    /// `package::module::function`.
    pub target: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Argument>,
}

impl fmt::Display for CallDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.node_id, self.target)?;
        if !self.type_arguments.is_empty() {
            write!(f, "<{}>", self.type_arguments.join(", "))?;
        }
        let args: Vec<String> = self.arguments.iter().map(|a| a.to_string()).collect();
        write!(f, "({})", args.join(", "))
    }
}

/// A value produced by one node and consumed by another.
///
/// Resources are deliberately not `Clone`: the builder moves each one out of the
/// result cache into exactly one consuming adapter call.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub handle: Handle,
    pub kind: ResourceKind,
    pub coin_type: Option<String>,
    /// Known lower bound of the coin value, or the principal owed for a receipt.
    pub amount: Option<u64>,
    /// Protocol that issued a receipt.
    pub issuer: Option<String>,
}

impl Resource {
    pub fn coin(handle: Handle, coin_type: Option<String>, amount: Option<u64>) -> Self {
        Self {
            handle,
            kind: ResourceKind::Coin,
            coin_type,
            amount,
            issuer: None,
        }
    }

    pub fn receipt(handle: Handle, issuer: &str, coin_type: &str, principal: u64) -> Self {
        Self {
            handle,
            kind: ResourceKind::Receipt,
            coin_type: Some(coin_type.to_string()),
            amount: Some(principal),
            issuer: Some(issuer.to_string()),
        }
    }

    /// A resource of the given kind with nothing known about its contents.
    pub fn of_kind(handle: Handle, kind: ResourceKind) -> Self {
        Self {
            handle,
            kind,
            coin_type: None,
            amount: None,
            issuer: None,
        }
    }

    pub fn argument(&self) -> Argument {
        Argument::Handle(self.handle.clone())
    }
}

/// The output of a successful compilation: an ordered, all-or-nothing call list.
#[derive(Debug, Serialize, Deserialize)]
pub struct CompiledTransaction {
    pub strategy_id: String,
    pub calls: Vec<CallDescriptor>,
    /// Resources left unconsumed once every node ran, keyed by `"nodeId.outputId"`.
    pub results: BTreeMap<String, Resource>,
    /// The outputs the strategy declared as final.
    pub final_outputs: Vec<String>,
    /// Swap estimates by node id.
    pub estimates: BTreeMap<String, SwapEstimate>,
    /// Nodes whose limits come from a best-effort estimate rather than live pool state.
    pub best_effort_nodes: Vec<String>,
    pub warnings: Vec<GraphIssue>,
}

impl CompiledTransaction {
    /// `false` when any limit was derived from a best-effort estimate.
    pub fn is_production_ready(&self) -> bool {
        self.best_effort_nodes.is_empty()
    }

    pub fn result(&self, reference: &str) -> Option<&Resource> {
        self.results.get(reference)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        encode_to_vec(self, standard())
            .map_err(|e| ArtifactError::Encode(format!("Serialization failed: {}", e)))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        decode_from_slice(bytes, standard())
            .map(|(compiled, _)| compiled)
            .map_err(|e| ArtifactError::Decode(format!("Deserialization failed: {}", e)))
    }

    /// Saves the compiled transaction using the bincode format.
    pub fn save(&self, path: &str) -> Result<(), ArtifactError> {
        let bytes = self.to_bytes()?;
        let mut file = fs::File::create(path)
            .map_err(|e| ArtifactError::Io(format!("Could not create file '{}': {}", path, e)))?;
        file.write_all(&bytes)
            .map_err(|e| ArtifactError::Io(format!("Could not write to file '{}': {}", path, e)))
    }

    pub fn from_file(path: &str) -> Result<Self, ArtifactError> {
        let mut file = fs::File::open(path)
            .map_err(|e| ArtifactError::Io(format!("Could not open file '{}': {}", path, e)))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(|e| {
            ArtifactError::Io(format!("Could not read from file '{}': {}", path, e))
        })?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for CompiledTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "strategy '{}': {} call(s){}",
            self.strategy_id,
            self.calls.len(),
            if self.is_production_ready() {
                ""
            } else {
                " [BEST-EFFORT ESTIMATES]"
            }
        )?;
        for (index, call) in self.calls.iter().enumerate() {
            writeln!(f, "  #{:<3} {}", index, call)?;
        }
        for (key, resource) in &self.results {
            writeln!(
                f,
                "  -> {} = {} ({}{})",
                key,
                resource.handle,
                resource.kind,
                resource
                    .amount
                    .map(|a| format!(", >= {}", a))
                    .unwrap_or_default()
            )?;
        }
        Ok(())
    }
}
