//! Adapters for CUSTOM nodes, which call an arbitrary Move function.

use crate::compiler::CallPlan;
use crate::error::AdapterError;
use crate::strategy::{Argument, CustomCallParams, Handle, Node, PureValue, Resource, ResourceKind};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};

/// A node input after the builder has looked it up.
#[derive(Debug)]
pub enum ResolvedInput {
    /// A resource moved out of the result cache.
    Resource(Resource),
    /// A literal from the document.
    Literal(Value),
}

impl ResolvedInput {
    pub fn argument(&self) -> Argument {
        match self {
            ResolvedInput::Resource(resource) => resource.argument(),
            ResolvedInput::Literal(value) => Argument::Pure(PureValue::from_literal(value)),
        }
    }
}

#[async_trait]
pub trait CustomCallAdapter: Send + Sync {
    fn protocol(&self) -> &str;

    /// Emits the node's calls and returns one resource per declared output, in
    /// declaration order.
    async fn call(
        &self,
        node: &Node,
        inputs: BTreeMap<String, ResolvedInput>,
        plan: &mut CallPlan,
    ) -> Result<Vec<Resource>, AdapterError>;
}

/// Emits a single call to `params.target`.
///
/// An `arguments` entry of the form `"$name"` is replaced by input `name`; any
/// input not placed that way is appended afterwards in name order. Other entries
/// are passed as pure values.
///
/// Receipts passed through keep their issuer, asset and principal: the n-th
/// RECEIPT output (in declaration order) carries the n-th RECEIPT input (in name
/// order), so a repay further down can still settle it.
pub struct MoveCallAdapter {
    protocol: String,
}

impl MoveCallAdapter {
    pub const PROTOCOL: &'static str = "CUSTOM";

    pub fn new() -> Self {
        Self::named(Self::PROTOCOL)
    }

    /// Registers the same behaviour under another protocol key.
    pub fn named(protocol: &str) -> Self {
        Self {
            protocol: protocol.to_string(),
        }
    }
}

impl Default for MoveCallAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CustomCallAdapter for MoveCallAdapter {
    fn protocol(&self) -> &str {
        &self.protocol
    }

    async fn call(
        &self,
        node: &Node,
        mut inputs: BTreeMap<String, ResolvedInput>,
        plan: &mut CallPlan,
    ) -> Result<Vec<Resource>, AdapterError> {
        let params = node
            .params_as::<CustomCallParams>()
            .map_err(|e| AdapterError::invalid("params", e.to_string()))?;

        let mut receipts_in: VecDeque<ReceiptOrigin> = inputs
            .values()
            .filter_map(|input| match input {
                ResolvedInput::Resource(r) if r.kind == ResourceKind::Receipt => Some(ReceiptOrigin {
                    issuer: r.issuer.clone(),
                    coin_type: r.coin_type.clone(),
                    principal: r.amount,
                }),
                _ => None,
            })
            .collect();

        let mut arguments = Vec::with_capacity(params.arguments.len() + inputs.len());
        for raw in &params.arguments {
            match raw.as_str().and_then(|s| s.strip_prefix('$')) {
                Some(name) => {
                    let input = inputs.remove(name).ok_or_else(|| {
                        AdapterError::invalid(
                            "arguments",
                            format!("'${}' names no input of node '{}'", name, node.id),
                        )
                    })?;
                    arguments.push(input.argument());
                }
                None => arguments.push(Argument::Pure(PureValue::from_literal(raw))),
            }
        }
        arguments.extend(inputs.values().map(ResolvedInput::argument));

        let call = plan.move_call(params.target, params.type_arguments, arguments)?;
        let single = node.outputs.len() == 1;
        let outputs = node
            .outputs
            .iter()
            .enumerate()
            .map(|(i, port)| {
                let index = u16::try_from(i).map_err(|_| AdapterError::arithmetic("output index"))?;
                let handle = if single { call.single() } else { call.nested(index) };
                let origin = match port.kind {
                    ResourceKind::Receipt => receipts_in.pop_front(),
                    _ => None,
                };
                Ok(match origin {
                    Some(origin) => origin.into_receipt(handle),
                    None => Resource::of_kind(handle, port.kind),
                })
            })
            .collect::<Result<Vec<_>, AdapterError>>()?;
        Ok(outputs)
    }
}

/// The settlement details of a receipt that goes into a custom call.
struct ReceiptOrigin {
    issuer: Option<String>,
    coin_type: Option<String>,
    principal: Option<u64>,
}

impl ReceiptOrigin {
    fn into_receipt(self, handle: Handle) -> Resource {
        Resource {
            handle,
            kind: ResourceKind::Receipt,
            coin_type: self.coin_type,
            amount: self.principal,
            issuer: self.issuer,
        }
    }
}
