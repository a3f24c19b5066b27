use crate::adapters::{
    AdapterRegistry, AddressRegistry, CustomCallAdapter, DexAdapter, EstimateMode,
    FlashLoanAdapter, Network, PoolStateReader, ResolvedInput, SwapEstimate,
};
use crate::error::{AdapterError, CompileError};
use crate::strategy::{
    CompiledTransaction, Handle, InputValue, Node, NodeType, Resource, ResourceKind, Strategy,
};
use crate::topology::TopologicalSort;
use crate::validation::{
    GraphIssue, GraphValidator, SchemaValidator, ValidationReport, validate_document,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

mod cache;
mod plan;
mod stage;

pub use cache::ResultCache;
pub use plan::{CallPlan, CallResult, DEFAULT_CALL_LIMIT};
pub use stage::CompileState;

use stage::StageTracker;

/// Knobs that change how a strategy is compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    /// Whether swaps may be compiled from best-effort estimates when a pool can't be read.
    pub estimate_mode: EstimateMode,
    /// Among nodes that are ready at the same time, emit flash borrows first.
    pub borrow_priority: bool,
    /// Which address table hosts should load.
    pub network: Network,
    pub call_limit: usize,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            estimate_mode: EstimateMode::Production,
            borrow_priority: false,
            network: Network::Testnet,
            call_limit: DEFAULT_CALL_LIMIT,
        }
    }
}

/// Assembles a [`TransactionBuilder`] from adapters and options.
#[derive(Default)]
pub struct CompilerBuilder {
    registry: AdapterRegistry,
    options: CompilerOptions,
}

impl CompilerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the built-in adapters on top of the given collaborators. The
    /// adapters read `options.estimate_mode` here, once.
    pub fn with_defaults(
        pools: Arc<dyn PoolStateReader>,
        addresses: Arc<dyn AddressRegistry>,
        options: CompilerOptions,
    ) -> Self {
        Self {
            registry: AdapterRegistry::with_defaults(pools, addresses, options.estimate_mode),
            options,
        }
    }

    pub fn with_flash_loan_adapter(mut self, adapter: Box<dyn FlashLoanAdapter>) -> Self {
        self.registry.register_flash_loan(adapter);
        self
    }

    pub fn with_dex_adapter(mut self, adapter: Box<dyn DexAdapter>) -> Self {
        self.registry.register_dex(adapter);
        self
    }

    pub fn with_custom_adapter(mut self, adapter: Box<dyn CustomCallAdapter>) -> Self {
        self.registry.register_custom(adapter);
        self
    }

    pub fn with_options(mut self, options: CompilerOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> TransactionBuilder {
        TransactionBuilder {
            registry: self.registry,
            options: self.options,
        }
    }
}

/// Compiles strategy documents into ordered, all-or-nothing call lists.
///
/// The builder holds no per-compilation state, so one instance can serve any number of
/// concurrent compilations. Dropping a `compile` future abandons that compilation and
/// everything it built.
pub struct TransactionBuilder {
    registry: AdapterRegistry,
    options: CompilerOptions,
}

impl TransactionBuilder {
    pub fn builder() -> CompilerBuilder {
        CompilerBuilder::new()
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Schema and graph checks only, for a `/validate`-style endpoint.
    pub fn validate(&self, document: &Value) -> ValidationReport {
        validate_document(document)
    }

    pub async fn compile(&self, document: &Value) -> Result<CompiledTransaction, CompileError> {
        self.compile_traced(document).await.0
    }

    /// Like [`TransactionBuilder::compile`], also returning every state the
    /// compilation passed through.
    pub async fn compile_traced(
        &self,
        document: &Value,
    ) -> (Result<CompiledTransaction, CompileError>, Vec<CompileState>) {
        let id = document.get("id").and_then(Value::as_str).unwrap_or("<unknown>");
        let mut tracker = StageTracker::new(id);
        let result = match SchemaValidator::validate_and_parse(document) {
            Ok(strategy) => {
                tracker.advance(CompileState::SchemaValidated);
                self.run(&strategy, &mut tracker).await
            }
            Err(issues) => Err(tracker.fail(CompileError::Schema(issues))),
        };
        (result, tracker.into_history())
    }

    /// Compiles an already-parsed strategy. Schema checks are skipped; everything
    /// from graph validation on runs as usual.
    pub async fn compile_strategy(
        &self,
        strategy: &Strategy,
    ) -> Result<CompiledTransaction, CompileError> {
        let mut tracker = StageTracker::new(&strategy.id);
        tracker.advance(CompileState::SchemaValidated);
        self.run(strategy, &mut tracker).await
    }

    async fn run(
        &self,
        strategy: &Strategy,
        tracker: &mut StageTracker,
    ) -> Result<CompiledTransaction, CompileError> {
        tracker.set_strategy_id(&strategy.id);

        let report = GraphValidator::inspect(strategy);
        for warning in &report.warnings {
            warn!(strategy = %strategy.id, "{}", warning);
        }
        if !report.graph_errors.is_empty() {
            return Err(tracker.fail(CompileError::Graph(report.graph_errors)));
        }
        tracker.advance(CompileState::GraphValidated);

        let ordered = if self.options.borrow_priority {
            TopologicalSort::order_with_priority(strategy)
        } else {
            TopologicalSort::order(strategy)
        }
        .map_err(|e| tracker.fail(e.into()))?;
        tracker.advance(CompileState::Ordered {
            node_count: ordered.len(),
        });

        let mut session = Session::new(self.options.call_limit);
        let total = ordered.len();
        for (index, node) in ordered.into_iter().enumerate() {
            tracker.advance(CompileState::Compiling {
                index,
                total,
                node_id: node.id.clone(),
            });
            self.compile_node(node, &mut session)
                .await
                .map_err(|e| tracker.fail(e))?;
        }

        let compiled = session.finish(strategy, report.warnings);
        tracker.advance(CompileState::Compiled {
            call_count: compiled.calls.len(),
        });
        info!(
            strategy = %strategy.id,
            nodes = strategy.nodes.len(),
            calls = compiled.calls.len(),
            best_effort = compiled.best_effort_nodes.len(),
            "strategy compiled"
        );
        Ok(compiled)
    }

    async fn compile_node(&self, node: &Node, session: &mut Session) -> Result<(), CompileError> {
        debug!(node = %node.id, node_type = %node.node_type, protocol = %node.protocol, "dispatching node");
        session.plan.begin_node(&node.id);
        let adapter_failed = |source: AdapterError| CompileError::Adapter {
            node_id: node.id.clone(),
            source,
        };

        match node.node_type {
            NodeType::FlashBorrow => {
                let adapter = self.registry.flash_loan(&node.id, &node.protocol)?;
                let out = adapter
                    .borrow(node, &mut session.plan)
                    .await
                    .map_err(adapter_failed)?;
                session.store(node, ResourceKind::Coin, out.coin)?;
                session.store(node, ResourceKind::Receipt, out.receipt)?;
            }
            NodeType::DexSwap => {
                let adapter = self.registry.dex(&node.id, &node.protocol)?;
                let mut inputs = session.resolve_inputs(node)?;
                let coin_in = match inputs.pop_first() {
                    Some((name, input)) if inputs.is_empty() => into_resource(node, &name, input),
                    _ => {
                        return Err(CompileError::internal(
                            &node.id,
                            "a swap must have exactly one input",
                        ));
                    }
                };
                let estimate = adapter
                    .estimate(node, coin_in.amount)
                    .await
                    .map_err(adapter_failed)?;
                if estimate.is_best_effort() {
                    warn!(node = %node.id, "swap limits come from a best-effort estimate");
                    session.best_effort_nodes.push(node.id.clone());
                }
                let out = adapter
                    .swap(node, coin_in, &estimate, &mut session.plan)
                    .await
                    .map_err(adapter_failed)?;
                session.estimates.insert(node.id.clone(), estimate);
                session.store(node, ResourceKind::Coin, out.coin_out)?;
                if let Some(remainder) = out.remainder {
                    session.store_remainder(node, remainder)?;
                }
            }
            NodeType::FlashRepay => {
                let adapter = self.registry.flash_loan(&node.id, &node.protocol)?;
                let mut coin = None;
                let mut receipt = None;
                for (name, input) in session.resolve_inputs(node)? {
                    let resource = into_resource(node, &name, input);
                    match resource.kind {
                        ResourceKind::Receipt => receipt = Some(resource),
                        _ => coin = Some(resource),
                    }
                }
                let (Some(coin), Some(receipt)) = (coin, receipt) else {
                    return Err(CompileError::internal(
                        &node.id,
                        "a repay needs one coin and one receipt",
                    ));
                };
                let leftover = adapter
                    .repay(node, coin, receipt, &mut session.plan)
                    .await
                    .map_err(adapter_failed)?;
                if node.output_of_kind(ResourceKind::Coin).is_some() {
                    session.store(node, ResourceKind::Coin, leftover)?;
                } else {
                    session.store_remainder(node, leftover)?;
                }
            }
            NodeType::Custom => {
                let adapter = self.registry.custom(&node.id, &node.protocol)?;
                let inputs = session.resolve_inputs(node)?;
                let outputs = adapter
                    .call(node, inputs, &mut session.plan)
                    .await
                    .map_err(adapter_failed)?;
                if outputs.len() != node.outputs.len() {
                    return Err(CompileError::internal(
                        &node.id,
                        format!(
                            "adapter returned {} output(s) for {} declared",
                            outputs.len(),
                            node.outputs.len()
                        ),
                    ));
                }
                for (port, resource) in node.outputs.iter().zip(outputs) {
                    session.cache.insert(node.output_ref(&port.id), resource)?;
                }
            }
        }
        Ok(())
    }
}

/// Port name for coins a node returns without declaring them.
pub const REMAINDER_PORT: &str = "remainder";

/// A literal in a coin position names a transaction input the assembler supplies.
fn into_resource(node: &Node, name: &str, input: ResolvedInput) -> Resource {
    match input {
        ResolvedInput::Resource(resource) => resource,
        ResolvedInput::Literal(value) => {
            let handle = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            debug!(node = %node.id, input = name, %handle, "literal coin input");
            Resource::coin(Handle::Input(handle), None, None)
        }
    }
}

/// Everything one compilation accumulates. Dropped wholesale on failure.
struct Session {
    plan: CallPlan,
    cache: ResultCache,
    estimates: BTreeMap<String, SwapEstimate>,
    best_effort_nodes: Vec<String>,
}

impl Session {
    fn new(call_limit: usize) -> Self {
        Self {
            plan: CallPlan::new(call_limit),
            cache: ResultCache::new(),
            estimates: BTreeMap::new(),
            best_effort_nodes: Vec::new(),
        }
    }

    /// Moves each referenced resource out of the cache. A missing key means an
    /// earlier stage let something through it should not have.
    fn resolve_inputs(&mut self, node: &Node) -> Result<BTreeMap<String, ResolvedInput>, CompileError> {
        node.inputs
            .iter()
            .map(|(name, value)| {
                let resolved = match value {
                    InputValue::Reference(reference) => {
                        let resource = self.cache.take(reference).ok_or_else(|| {
                            CompileError::internal(
                                &node.id,
                                format!(
                                    "input '{}' references '{}', which is not in the result cache",
                                    name, reference
                                ),
                            )
                        })?;
                        ResolvedInput::Resource(resource)
                    }
                    InputValue::Literal(literal) => ResolvedInput::Literal(literal.clone()),
                };
                Ok((name.clone(), resolved))
            })
            .collect()
    }

    /// Files `resource` under the node's first output of `kind`.
    fn store(&mut self, node: &Node, kind: ResourceKind, resource: Resource) -> Result<(), CompileError> {
        let port = node.output_of_kind(kind).ok_or_else(|| {
            CompileError::internal(&node.id, format!("node declares no {} output", kind))
        })?;
        self.cache.insert(node.output_ref(&port.id), resource)
    }

    /// Files a coin the node produces but does not declare, so it still shows up in
    /// the result snapshot for the caller to route.
    fn store_remainder(&mut self, node: &Node, resource: Resource) -> Result<(), CompileError> {
        let mut port = REMAINDER_PORT.to_string();
        while node.output(&port).is_some() {
            port.push('_');
        }
        debug!(node = %node.id, port = %port, "undeclared coin kept as remainder");
        self.cache.insert(node.output_ref(&port), resource)
    }

    fn finish(self, strategy: &Strategy, warnings: Vec<GraphIssue>) -> CompiledTransaction {
        CompiledTransaction {
            strategy_id: strategy.id.clone(),
            calls: self.plan.into_calls(),
            results: self.cache.into_snapshot(),
            final_outputs: strategy.outputs.iter().map(ToString::to_string).collect(),
            estimates: self.estimates,
            best_effort_nodes: self.best_effort_nodes,
            warnings,
        }
    }
}
