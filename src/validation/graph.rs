//! Semantic validation of the node/edge graph.

use super::issue::{GraphIssue, GraphRule, ValidationReport};
use crate::strategy::{
    Edge, InputValue, Node, NodeRef, NodeType, ResourceKind, Strategy, SwapParams,
};
use crate::topology::TopologicalSort;
use ahash::{AHashMap, AHashSet};
use tracing::debug;

/// Declared ports of one node.
struct PortIndex<'a> {
    position: usize,
    node: &'a Node,
    outputs: AHashMap<&'a str, ResourceKind>,
}

/// Checks reference integrity, port kinds, resource linearity, acyclicity and the
/// borrow/repay balance of a schema-valid strategy.
pub struct GraphValidator<'a> {
    strategy: &'a Strategy,
    ports: AHashMap<&'a str, PortIndex<'a>>,
    errors: Vec<GraphIssue>,
    warnings: Vec<GraphIssue>,
}

impl<'a> GraphValidator<'a> {
    /// Returns every error-severity issue, or `Ok` if there are none.
    pub fn validate(strategy: &'a Strategy) -> Result<(), Vec<GraphIssue>> {
        let report = Self::inspect(strategy);
        if report.graph_errors.is_empty() {
            Ok(())
        } else {
            Err(report.graph_errors)
        }
    }

    /// Runs every check and returns errors and warnings separately.
    pub fn inspect(strategy: &'a Strategy) -> ValidationReport {
        let mut validator = Self {
            strategy,
            ports: AHashMap::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
        };
        validator.index_ports();
        let valid_edges = validator.check_edges();
        validator.check_reference_inputs();
        validator.check_consumption(&valid_edges);
        validator.check_cycles();
        validator.check_receipt_balance();
        validator.check_node_shapes();
        validator.check_isolated_nodes();

        debug!(
            strategy = %strategy.id,
            errors = validator.errors.len(),
            warnings = validator.warnings.len(),
            "graph validation finished"
        );
        ValidationReport {
            schema_errors: Vec::new(),
            graph_errors: validator.errors,
            warnings: validator.warnings,
        }
    }

    fn error(&mut self, rule: GraphRule, path: String, message: String) {
        self.errors.push(GraphIssue::error(rule, path, message));
    }

    fn warn(&mut self, rule: GraphRule, path: String, message: String) {
        self.warnings.push(GraphIssue::warning(rule, path, message));
    }

    // Step 1: port index.
    fn index_ports(&mut self) {
        let strategy = self.strategy;
        for (position, node) in strategy.nodes.iter().enumerate() {
            if self.ports.contains_key(node.id.as_str()) {
                self.error(
                    GraphRule::DuplicateNode,
                    format!("nodes.{}.id", position),
                    format!("node id '{}' is declared more than once", node.id),
                );
                continue;
            }
            let outputs = node
                .outputs
                .iter()
                .map(|o| (o.id.as_str(), o.kind))
                .collect();
            self.ports.insert(
                node.id.as_str(),
                PortIndex {
                    position,
                    node,
                    outputs,
                },
            );
        }
    }

    /// Step 2: endpoint, port and kind checks. Returns the edges that passed.
    fn check_edges(&mut self) -> Vec<&'a Edge> {
        let strategy = self.strategy;
        let mut seen_ids = AHashSet::new();
        let mut valid = Vec::new();

        for (i, edge) in strategy.edges.iter().enumerate() {
            let path = format!("edges.{}", i);
            if !seen_ids.insert(edge.id.as_str()) {
                self.error(
                    GraphRule::DuplicateEdge,
                    format!("{}.id", path),
                    format!("edge id '{}' is declared more than once", edge.id),
                );
            }

            let mut ok = true;
            let source: Option<&'a Node> = self.ports.get(edge.source.as_str()).map(|p| p.node);
            let target: Option<&'a Node> = self.ports.get(edge.target.as_str()).map(|p| p.node);

            let source_kind = match source {
                None => {
                    ok = false;
                    None
                }
                Some(node) => node.output(&edge.source_output).map(|o| o.kind),
            };
            let target_binding = target.map(|node| node.inputs.get(&edge.target_input));

            if source.is_none() {
                self.error(
                    GraphRule::UnknownNode,
                    format!("{}.source", path),
                    format!("edge '{}' starts at unknown node '{}'", edge.id, edge.source),
                );
            } else if source_kind.is_none() {
                ok = false;
                self.error(
                    GraphRule::UnknownPort,
                    format!("{}.source_output", path),
                    format!(
                        "node '{}' declares no output '{}'",
                        edge.source, edge.source_output
                    ),
                );
            }

            match target_binding {
                None => {
                    ok = false;
                    self.error(
                        GraphRule::UnknownNode,
                        format!("{}.target", path),
                        format!("edge '{}' ends at unknown node '{}'", edge.id, edge.target),
                    );
                }
                Some(None) => {
                    ok = false;
                    self.error(
                        GraphRule::UnknownPort,
                        format!("{}.target_input", path),
                        format!(
                            "node '{}' declares no input '{}'",
                            edge.target, edge.target_input
                        ),
                    );
                }
                Some(Some(binding)) => {
                    let expected = edge.source_ref();
                    if binding.as_reference() != Some(&expected) {
                        ok = false;
                        self.error(
                            GraphRule::EdgeInputMismatch,
                            format!("{}.target_input", path),
                            format!(
                                "input '{}' of node '{}' is bound to {}, but edge '{}' feeds it from '{}'",
                                edge.target_input,
                                edge.target,
                                describe_binding(binding),
                                edge.id,
                                expected
                            ),
                        );
                    }
                }
            }

            if let Some(kind) = source_kind {
                if kind != edge.edge_type.resource_kind() {
                    ok = false;
                    self.error(
                        GraphRule::KindMismatch,
                        format!("{}.edge_type", path),
                        format!(
                            "edge '{}' is {} but output '{}' is {}",
                            edge.id,
                            edge.edge_type,
                            edge.source_ref(),
                            kind
                        ),
                    );
                }
            }

            if let (Some(expected), Some(declared)) = (
                source.and_then(|node| known_coin_type(node, &edge.source_output)),
                edge.coin_type.as_deref(),
            ) {
                if expected != declared {
                    self.warn(
                        GraphRule::CoinTypeMismatch,
                        format!("{}.coin_type", path),
                        format!(
                            "edge '{}' is tagged {} but '{}' produces {}",
                            edge.id,
                            declared,
                            edge.source_ref(),
                            expected
                        ),
                    );
                }
            }

            if ok {
                valid.push(edge);
            }
        }
        valid
    }

    /// Every reference input must point at a declared output and be materialized by an edge.
    fn check_reference_inputs(&mut self) {
        let strategy = self.strategy;
        let mut edge_count: AHashMap<(&str, &str), usize> = AHashMap::new();
        for edge in &strategy.edges {
            *edge_count
                .entry((edge.target.as_str(), edge.target_input.as_str()))
                .or_default() += 1;
        }

        for (position, node) in strategy.nodes.iter().enumerate() {
            for (input, reference) in node.reference_inputs() {
                let path = format!("nodes.{}.inputs.{}", position, input);
                let declared = self
                    .ports
                    .get(reference.node_id.as_str())
                    .map(|p| p.outputs.contains_key(reference.output_id.as_str()));
                if declared != Some(true) {
                    self.error(
                        GraphRule::DanglingReference,
                        path.clone(),
                        format!(
                            "input '{}' of node '{}' references '{}', which does not exist",
                            input, node.id, reference
                        ),
                    );
                }
                match edge_count.get(&(node.id.as_str(), input)).copied().unwrap_or(0) {
                    0 => self.error(
                        GraphRule::MissingEdge,
                        path,
                        format!(
                            "input '{}' of node '{}' references '{}' but no edge carries it",
                            input, node.id, reference
                        ),
                    ),
                    1 => {}
                    n => self.error(
                        GraphRule::DuplicateInputEdge,
                        path,
                        format!("input '{}' of node '{}' is fed by {} edges", input, node.id, n),
                    ),
                }
            }
        }
    }

    // Step 3: linear resources.
    fn check_consumption(&mut self, valid_edges: &[&'a Edge]) {
        let strategy = self.strategy;
        let mut consumed: AHashMap<NodeRef, usize> = AHashMap::new();
        for edge in valid_edges {
            *consumed.entry(edge.source_ref()).or_default() += 1;
        }

        for (i, reference) in strategy.outputs.iter().enumerate() {
            let path = format!("outputs.{}", i);
            let kind = self
                .ports
                .get(reference.node_id.as_str())
                .and_then(|p| p.outputs.get(reference.output_id.as_str()).copied());
            match kind {
                Some(ResourceKind::Coin) => {
                    if consumed.contains_key(reference) {
                        self.error(
                            GraphRule::InvalidFinalOutput,
                            path,
                            format!("final output '{}' is also consumed by an edge", reference),
                        );
                    }
                }
                Some(kind) => self.error(
                    GraphRule::InvalidFinalOutput,
                    path,
                    format!("final output '{}' is {}, only COIN outputs can be final", reference, kind),
                ),
                None => self.error(
                    GraphRule::InvalidFinalOutput,
                    path,
                    format!("final output '{}' does not exist", reference),
                ),
            }
        }

        for (position, node) in strategy.nodes.iter().enumerate() {
            if self.ports.get(node.id.as_str()).map(|p| p.position) != Some(position) {
                continue;
            }
            for (o, output) in node.outputs.iter().enumerate() {
                let reference = node.output_ref(&output.id);
                let count = consumed.get(&reference).copied().unwrap_or(0);
                let path = format!("nodes.{}.outputs.{}", position, o);
                match (output.kind, count) {
                    (ResourceKind::Receipt, 0) => self.error(
                        GraphRule::ReceiptNotConsumed,
                        path,
                        format!("receipt '{}' is never consumed", reference),
                    ),
                    (ResourceKind::Receipt, n) if n > 1 => self.error(
                        GraphRule::ReceiptDuplicated,
                        path,
                        format!("receipt '{}' is consumed {} times", reference, n),
                    ),
                    (ResourceKind::Coin, 0) if !strategy.is_final_output(&reference) => self.error(
                        GraphRule::CoinUnconsumed,
                        path,
                        format!(
                            "coin '{}' is never consumed and is not declared as a final output",
                            reference
                        ),
                    ),
                    (ResourceKind::Coin, n) if n > 1 => self.error(
                        GraphRule::CoinDuplicated,
                        path,
                        format!("coin '{}' is consumed {} times", reference, n),
                    ),
                    _ => {}
                }
            }
        }
    }

    // Step 4.
    fn check_cycles(&mut self) {
        if let Some(cycle) = TopologicalSort::find_cycle(self.strategy) {
            let mut rendered = cycle.clone();
            rendered.push(cycle[0].clone());
            let path = self
                .ports
                .get(cycle[0].as_str())
                .map(|p| format!("nodes.{}", p.position))
                .unwrap_or_else(|| "edges".to_string());
            self.error(
                GraphRule::Cycle,
                path,
                format!("cycle detected: {}", rendered.join(" -> ")),
            );
        }
    }

    // Step 5: every borrow receipt must end at a repay of the same protocol.
    fn check_receipt_balance(&mut self) {
        let strategy = self.strategy;
        for (position, node) in strategy.nodes.iter().enumerate() {
            if node.node_type != NodeType::FlashBorrow {
                continue;
            }
            let mut visited: AHashSet<&str> = AHashSet::new();
            let mut frontier: Vec<NodeRef> = node
                .outputs_of_kind(ResourceKind::Receipt)
                .map(|o| node.output_ref(&o.id))
                .collect();
            let mut repaid_by = None;
            let mut wrong_protocol = None;

            while let Some(reference) = frontier.pop() {
                for edge in strategy.edges.iter().filter(|e| {
                    e.source == reference.node_id && e.source_output == reference.output_id
                }) {
                    let Some(target) = self.ports.get(edge.target.as_str()).map(|p| p.node) else {
                        continue;
                    };
                    if !visited.insert(target.id.as_str()) {
                        continue;
                    }
                    match target.node_type {
                        NodeType::FlashRepay if target.protocol == node.protocol => {
                            repaid_by = Some(target.id.as_str());
                        }
                        NodeType::FlashRepay => wrong_protocol = Some(target),
                        _ => frontier.extend(
                            target
                                .outputs_of_kind(ResourceKind::Receipt)
                                .map(|o| target.output_ref(&o.id)),
                        ),
                    }
                }
            }

            if repaid_by.is_none() {
                let detail = match wrong_protocol {
                    Some(repay) => format!(
                        "its receipt reaches repay node '{}' of protocol '{}' instead",
                        repay.id, repay.protocol
                    ),
                    None => "its receipt never reaches a FLASH_REPAY node".to_string(),
                };
                self.error(
                    GraphRule::UnbalancedReceipt,
                    format!("nodes.{}", position),
                    format!(
                        "flash borrow '{}' ({}) is not repaid: {}",
                        node.id, node.protocol, detail
                    ),
                );
            }
        }
    }

    fn check_node_shapes(&mut self) {
        let strategy = self.strategy;
        for (position, node) in strategy.nodes.iter().enumerate() {
            let coins_out = node.outputs_of_kind(ResourceKind::Coin).count();
            let receipts_out = node.outputs_of_kind(ResourceKind::Receipt).count();
            // A literal input names a coin the assembler supplies.
            let mut coins_in = node.inputs.values().filter(|v| v.as_reference().is_none()).count();
            let mut receipts_in = 0;
            for (_, reference) in node.reference_inputs() {
                match self
                    .ports
                    .get(reference.node_id.as_str())
                    .and_then(|p| p.outputs.get(reference.output_id.as_str()))
                {
                    Some(ResourceKind::Coin) => coins_in += 1,
                    Some(ResourceKind::Receipt) => receipts_in += 1,
                    _ => {}
                }
            }

            let problem = match node.node_type {
                NodeType::FlashBorrow if coins_out != 1 || receipts_out != 1 => {
                    Some("a flash borrow must declare exactly one COIN and one RECEIPT output")
                }
                NodeType::FlashBorrow if node.reference_inputs().next().is_some() => {
                    Some("a flash borrow takes no inputs from other nodes")
                }
                NodeType::DexSwap if node.inputs.len() != 1 => {
                    Some("a swap must have exactly one input coin")
                }
                NodeType::DexSwap if coins_out != 1 || node.outputs.len() != 1 => {
                    Some("a swap must declare exactly one COIN output")
                }
                NodeType::FlashRepay if receipts_in != 1 || coins_in != 1 || node.inputs.len() != 2 => {
                    Some("a flash repay consumes exactly one RECEIPT and one COIN")
                }
                NodeType::FlashRepay if coins_out > 1 || node.outputs.len() != coins_out => {
                    Some("a flash repay declares at most one COIN output for the leftover")
                }
                _ => None,
            };
            if let Some(problem) = problem {
                self.error(
                    GraphRule::NodeShape,
                    format!("nodes.{}", position),
                    format!("node '{}' ({}): {}", node.id, node.node_type, problem),
                );
            }
        }
    }

    fn check_isolated_nodes(&mut self) {
        let strategy = self.strategy;
        if strategy.nodes.len() < 2 {
            return;
        }
        let connected: AHashSet<&str> = strategy
            .edges
            .iter()
            .flat_map(|e| [e.source.as_str(), e.target.as_str()])
            .collect();
        for (position, node) in strategy.nodes.iter().enumerate() {
            if !connected.contains(node.id.as_str()) {
                self.warn(
                    GraphRule::IsolatedNode,
                    format!("nodes.{}", position),
                    format!("node '{}' is not connected to any other node", node.id),
                );
            }
        }
    }
}

fn describe_binding(binding: &InputValue) -> String {
    match binding {
        InputValue::Reference(r) => format!("'{}'", r),
        InputValue::Literal(v) => format!("literal {}", v),
    }
}

/// The coin type a node's output is known to carry, when the params say so.
fn known_coin_type(node: &Node, output_id: &str) -> Option<String> {
    if node.output(output_id)?.kind != ResourceKind::Coin {
        return None;
    }
    match node.node_type {
        NodeType::FlashBorrow | NodeType::FlashRepay => node.param_str("asset").map(str::to_string),
        NodeType::DexSwap => node
            .params_as::<SwapParams>()
            .ok()
            .map(|p| p.coin_out().to_string()),
        NodeType::Custom => None,
    }
}
