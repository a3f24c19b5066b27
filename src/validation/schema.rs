//! Structural validation of a raw strategy document.
//!
//! The schema validator looks at one field at a time and never at relationships between
//! nodes; that is the graph validator's job. It reports every violation it finds.

use super::issue::{SchemaIssue, SchemaRule};
use crate::adapters::math::Slippage;
use crate::strategy::{
    Amount, AmountMode, EdgeType, NodeRef, NodeType, ResourceKind, Strategy, SwapDirection,
};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::debug;

static ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^0x[a-fA-F0-9]{1,64}$").expect("address pattern is valid"));

/// `0xADDR::module::Name`, used for both coin types and call targets.
static MOVE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^0x[a-fA-F0-9]+::\w+::\w+$").expect("move path pattern is valid")
});

const ROOT: &str = "$";

pub struct SchemaValidator;

impl SchemaValidator {
    /// Validates a strategy document, returning every violation found.
    pub fn validate(document: &Value) -> Result<(), Vec<SchemaIssue>> {
        let mut walker = Walker::default();
        walker.strategy(document);
        debug!(issues = walker.issues.len(), "schema validation finished");
        if walker.issues.is_empty() {
            Ok(())
        } else {
            Err(walker.issues)
        }
    }

    /// Validates and returns the typed strategy.
    pub fn validate_and_parse(document: &Value) -> Result<Strategy, Vec<SchemaIssue>> {
        Self::validate(document)?;
        Strategy::from_value(document.clone()).map_err(|e| {
            vec![SchemaIssue::error(
                SchemaRule::InvalidDocument,
                ROOT,
                format!("document passed field checks but could not be decoded: {}", e),
            )]
        })
    }

    pub fn is_valid_address(address: &str) -> bool {
        ADDRESS.is_match(address)
    }

    pub fn is_valid_coin_type(coin_type: &str) -> bool {
        MOVE_PATH.is_match(coin_type)
    }

    pub fn is_valid_call_target(target: &str) -> bool {
        MOVE_PATH.is_match(target)
    }

    pub fn is_valid_node_reference(reference: &str) -> bool {
        NodeRef::is_well_formed(reference)
    }
}

fn join(path: &str, key: &str) -> String {
    if path == ROOT {
        key.to_string()
    } else {
        format!("{}.{}", path, key)
    }
}

fn index(path: &str, i: usize) -> String {
    format!("{}.{}", path, i)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[derive(Default)]
struct Walker {
    issues: Vec<SchemaIssue>,
}

impl Walker {
    fn push(&mut self, rule: SchemaRule, path: &str, message: impl Into<String>) {
        self.issues.push(SchemaIssue::error(rule, path, message));
    }

    fn wrong_type(&mut self, path: &str, expected: &str, found: &Value) {
        self.push(
            SchemaRule::WrongType,
            path,
            format!("expected {}, found {}", expected, type_name(found)),
        );
    }

    fn as_object<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            other => {
                self.wrong_type(path, "object", other);
                None
            }
        }
    }

    fn as_array<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v Vec<Value>> {
        match value {
            Value::Array(items) => Some(items),
            other => {
                self.wrong_type(path, "array", other);
                None
            }
        }
    }

    fn as_str<'v>(&mut self, value: &'v Value, path: &str) -> Option<&'v str> {
        match value {
            Value::String(s) => Some(s),
            other => {
                self.wrong_type(path, "string", other);
                None
            }
        }
    }

    fn required<'v>(
        &mut self,
        object: &'v Map<String, Value>,
        key: &str,
        parent: &str,
    ) -> Option<&'v Value> {
        let value = object.get(key);
        if value.is_none() {
            self.push(
                SchemaRule::MissingField,
                &join(parent, key),
                format!("required field '{}' is missing", key),
            );
        }
        value
    }

    fn required_str<'v>(
        &mut self,
        object: &'v Map<String, Value>,
        key: &str,
        parent: &str,
    ) -> Option<&'v str> {
        let value = self.required(object, key, parent)?;
        let path = join(parent, key);
        let text = self.as_str(value, &path)?;
        if text.trim().is_empty() {
            self.push(SchemaRule::EmptyValue, &path, format!("'{}' must not be empty", key));
            return None;
        }
        Some(text)
    }

    fn optional_str<'v>(
        &mut self,
        object: &'v Map<String, Value>,
        key: &str,
        parent: &str,
    ) -> Option<&'v str> {
        let value = object.get(key)?;
        self.as_str(value, &join(parent, key))
    }

    fn enum_value(&mut self, value: Option<&str>, path: &str, allowed: &[&str]) {
        if let Some(text) = value {
            if !allowed.contains(&text) {
                self.push(
                    SchemaRule::InvalidEnumValue,
                    path,
                    format!("'{}' is not one of {}", text, allowed.join(", ")),
                );
            }
        }
    }

    fn address(&mut self, value: Option<&str>, path: &str) {
        if let Some(text) = value {
            if !SchemaValidator::is_valid_address(text) {
                self.push(
                    SchemaRule::InvalidAddress,
                    path,
                    format!("'{}' is not a 0x-prefixed hex address", text),
                );
            }
        }
    }

    fn coin_type(&mut self, value: Option<&str>, path: &str) {
        if let Some(text) = value {
            if !SchemaValidator::is_valid_coin_type(text) {
                self.push(
                    SchemaRule::InvalidCoinType,
                    path,
                    format!("'{}' is not a coin type of the form 0xADDR::module::Type", text),
                );
            }
        }
    }

    fn amount(&mut self, value: Option<&Value>, path: &str) {
        if let Some(raw) = value {
            if Amount::parse(raw).is_none() {
                self.push(
                    SchemaRule::InvalidAmount,
                    path,
                    format!("{} is not a non-negative integer amount that fits in u64", raw),
                );
            }
        }
    }

    // --- document structure ---

    fn strategy(&mut self, document: &Value) {
        let Some(root) = (match document {
            Value::Object(map) => Some(map),
            other => {
                self.push(
                    SchemaRule::InvalidDocument,
                    ROOT,
                    format!("strategy document must be an object, found {}", type_name(other)),
                );
                None
            }
        }) else {
            return;
        };

        self.required_str(root, "id", ROOT);
        if let Some(version) = self.required(root, "version", ROOT) {
            self.as_str(version, "version");
        }
        if let Some(meta) = self.required(root, "meta", ROOT) {
            self.meta(meta);
        }
        if let Some(nodes) = self.required(root, "nodes", ROOT) {
            if let Some(items) = self.as_array(nodes, "nodes") {
                for (i, node) in items.iter().enumerate() {
                    self.node(node, &index("nodes", i));
                }
            }
        }
        if let Some(edges) = self.required(root, "edges", ROOT) {
            if let Some(items) = self.as_array(edges, "edges") {
                for (i, edge) in items.iter().enumerate() {
                    self.edge(edge, &index("edges", i));
                }
            }
        }
        if let Some(outputs) = root.get("outputs") {
            if let Some(items) = self.as_array(outputs, "outputs") {
                for (i, item) in items.iter().enumerate() {
                    let path = index("outputs", i);
                    if let Some(reference) = self.as_str(item, &path) {
                        self.node_reference(reference, &path);
                    }
                }
            }
        }
    }

    fn meta(&mut self, meta: &Value) {
        let Some(meta) = self.as_object(meta, "meta") else {
            return;
        };
        self.optional_str(meta, "name", "meta");
        self.optional_str(meta, "description", "meta");
        let author = self.optional_str(meta, "author", "meta");
        self.address(author, "meta.author");

        for key in ["created_at", "updated_at"] {
            if let Some(value) = meta.get(key) {
                if value.as_u64().is_none() {
                    self.push(
                        SchemaRule::InvalidNumber,
                        &join("meta", key),
                        format!("'{}' must be a non-negative integer timestamp", key),
                    );
                }
            }
        }
        if let Some(tags) = meta.get("tags") {
            if let Some(items) = self.as_array(tags, "meta.tags") {
                for (i, tag) in items.iter().enumerate() {
                    self.as_str(tag, &index("meta.tags", i));
                }
            }
        }
        if let Some(price) = meta.get("price_sui") {
            match price.as_f64() {
                Some(p) if p >= 0.0 => {}
                _ => self.push(
                    SchemaRule::InvalidNumber,
                    "meta.price_sui",
                    "price_sui must be a non-negative number",
                ),
            }
        }
    }

    fn node_reference(&mut self, reference: &str, path: &str) {
        if !NodeRef::is_well_formed(reference) {
            self.push(
                SchemaRule::InvalidNodeReference,
                path,
                format!("'{}' is not of the form nodeId.outputId", reference),
            );
        }
    }

    fn node(&mut self, node: &Value, path: &str) {
        let Some(node) = self.as_object(node, path) else {
            return;
        };
        self.required_str(node, "id", path);
        let node_type = self.required_str(node, "type", path);
        self.enum_value(node_type, &join(path, "type"), &NodeType::ALL);
        self.required_str(node, "protocol", path);

        if let Some(inputs) = node.get("inputs") {
            let inputs_path = join(path, "inputs");
            if let Some(inputs) = self.as_object(inputs, &inputs_path) {
                for (name, value) in inputs {
                    let input_path = join(&inputs_path, name);
                    match value {
                        Value::String(s) if s.contains('.') => self.node_reference(s, &input_path),
                        Value::String(_) | Value::Number(_) | Value::Bool(_) => {}
                        other => self.wrong_type(&input_path, "node reference or literal", other),
                    }
                }
            }
        }

        if let Some(outputs) = node.get("outputs") {
            let outputs_path = join(path, "outputs");
            if let Some(items) = self.as_array(outputs, &outputs_path) {
                for (i, output) in items.iter().enumerate() {
                    self.output_port(output, &index(&outputs_path, i));
                }
            }
        }

        let params_path = join(path, "params");
        let Some(params) = self.required(node, "params", path) else {
            return;
        };
        let Some(params) = self.as_object(params, &params_path) else {
            return;
        };
        match node_type {
            Some("FLASH_BORROW") => {
                let asset = self.required_str(params, "asset", &params_path);
                self.coin_type(asset, &join(&params_path, "asset"));
                let amount = self.required(params, "amount", &params_path);
                self.amount(amount, &join(&params_path, "amount"));
            }
            Some("FLASH_REPAY") => {
                let asset = self.required_str(params, "asset", &params_path);
                self.coin_type(asset, &join(&params_path, "asset"));
                self.amount(params.get("amount"), &join(&params_path, "amount"));
            }
            Some("DEX_SWAP") => self.swap_params(params, &params_path),
            Some("CUSTOM") => self.custom_params(params, &params_path),
            _ => {}
        }
    }

    fn output_port(&mut self, output: &Value, path: &str) {
        let Some(output) = self.as_object(output, path) else {
            return;
        };
        self.required_str(output, "id", path);
        self.optional_str(output, "type", path);
        let key = if output.contains_key("output_type") || !output.contains_key("kind") {
            "output_type"
        } else {
            "kind"
        };
        let kind = self.required_str(output, key, path);
        self.enum_value(kind, &join(path, key), &ResourceKind::ALL);
    }

    fn swap_params(&mut self, params: &Map<String, Value>, path: &str) {
        let pool = self.required_str(params, "pool_id", path);
        self.address(pool, &join(path, "pool_id"));
        for key in ["coin_type_a", "coin_type_b"] {
            let coin = self.required_str(params, key, path);
            self.coin_type(coin, &join(path, key));
        }
        let direction = self.required_str(params, "direction", path);
        self.enum_value(direction, &join(path, "direction"), &SwapDirection::ALL);
        let mode = self.required_str(params, "amount_mode", path);
        self.enum_value(mode, &join(path, "amount_mode"), &AmountMode::ALL);

        if let Some(slippage) = self.required(params, "slippage_tolerance", path) {
            let text = match slippage {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            };
            if text.as_deref().and_then(Slippage::from_decimal_str).is_none() {
                self.push(
                    SchemaRule::InvalidSlippage,
                    &join(path, "slippage_tolerance"),
                    format!("{} is not a decimal fraction in [0, 1)", slippage),
                );
            }
        }
        self.amount(params.get("amount"), &join(path, "amount"));
        if mode == Some("EXACT_OUT") && !params.contains_key("amount") {
            self.push(
                SchemaRule::MissingField,
                &join(path, "amount"),
                "EXACT_OUT swaps must state the output amount",
            );
        }
        if let Some(limit) = params.get("sqrt_price_limit") {
            let limit_path = join(path, "sqrt_price_limit");
            if let Some(text) = self.as_str(limit, &limit_path) {
                if text.parse::<u128>().is_err() {
                    self.push(
                        SchemaRule::InvalidAmount,
                        &limit_path,
                        format!("'{}' is not a u128", text),
                    );
                }
            }
        }
        let fee_type = self.optional_str(params, "fee_type", path);
        self.coin_type(fee_type, &join(path, "fee_type"));
    }

    fn custom_params(&mut self, params: &Map<String, Value>, path: &str) {
        if let Some(target) = self.required_str(params, "target", path) {
            if !SchemaValidator::is_valid_call_target(target) {
                self.push(
                    SchemaRule::InvalidCallTarget,
                    &join(path, "target"),
                    format!("'{}' is not of the form 0xADDR::module::function", target),
                );
            }
        }
        if let Some(type_args) = params.get("type_arguments") {
            let type_path = join(path, "type_arguments");
            if let Some(items) = self.as_array(type_args, &type_path) {
                for (i, item) in items.iter().enumerate() {
                    let item_path = index(&type_path, i);
                    let coin = self.as_str(item, &item_path);
                    self.coin_type(coin, &item_path);
                }
            }
        }
        if let Some(arguments) = params.get("arguments") {
            self.as_array(arguments, &join(path, "arguments"));
        }
    }

    fn edge(&mut self, edge: &Value, path: &str) {
        let Some(edge) = self.as_object(edge, path) else {
            return;
        };
        for key in ["id", "source", "source_output", "target", "target_input"] {
            self.required_str(edge, key, path);
        }
        let edge_type = self.required_str(edge, "edge_type", path);
        self.enum_value(edge_type, &join(path, "edge_type"), &EdgeType::ALL);
        if let Some(coin) = edge.get("coin_type") {
            if !coin.is_null() {
                let coin_path = join(path, "coin_type");
                let coin = self.as_str(coin, &coin_path);
                self.coin_type(coin, &coin_path);
            }
        }
    }
}
