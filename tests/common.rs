//! Common test utilities for building strategy documents, pools and address books.
use sail::prelude::*;
use sail::strategy::{EdgeType, InputValue};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const SUI: &str = "0x2::sui::SUI";
pub const USDC: &str =
    "0xdba34672e30cb065b1f93e3ab55318768fd6fef66c15942c9f7cb846e2f900e7::usdc::USDC";
pub const TURBOS_FEE_TIER: &str =
    "0x91bfbc386a41afcfd9b2533058d7e915a1d3829089cc268ff4333d54d6339ca1::fee3000bps::FEE3000BPS";

pub const CETUS_POOL: &str = "0xcf994611fd4c48e277ce3ffd4d4364c914af2c3cbb05f7bf6facd371de688630";
pub const TURBOS_POOL: &str = "0x5eb2dfcdd1b15d2021328258f6d5ec081e9a0cdcfa9e13a0eaeb9b5f7505ca78";

pub const NAVI_PACKAGE: &str = "0x834a86970ae93a73faf4fff16ae40bdb72b91c47be585fff19a2af60a19ddca3";
pub const NAVI_SUI_POOL: &str = "0x96df0fce3c471489f4debaaa762cf960b3d97820bd1f3f025ff8190730e958c5";
pub const DEEPBOOK_PACKAGE: &str = "0xdee9";
pub const DEEPBOOK_SUI_POOL: &str =
    "0x4405b50d791fd3346754e8171aaab6bc2ed26c2c46efdd033c14b30ae507ac33";
pub const CETUS_PACKAGE: &str = "0x1eabed72c53feb3805120a081dc15963c204dc8d091542592abaf7a35689b2fb";
pub const CETUS_CONFIG: &str = "0xdaa46292632c3c4d8f31f23ea0f9b36a28ff3677e9684980e4438403a67a3d8f";
pub const TURBOS_PACKAGE: &str = "0x91bfbc386a41afcfd9b2533058d7e915a1d3829089cc268ff4333d54d6339ca1";
pub const TURBOS_VERSIONED: &str =
    "0xf1cf0e81048df168ebeb1b8030fad24b3e0b53ae827c25053fff0779c1445b6f";

/// 1 SUI in base units.
pub const ONE_SUI: u64 = 1_000_000_000;

/// A SUI/USDC pool at roughly 2 USDC per SUI, 0.25% fee.
#[allow(dead_code)]
pub fn cetus_pool() -> PoolState {
    PoolState {
        pool_id: CETUS_POOL.to_string(),
        coin_type_a: SUI.to_string(),
        coin_type_b: USDC.to_string(),
        reserve_a: 1_000_000_000_000_000,
        reserve_b: 2_000_000_000_000,
        fee_rate: FeeRate::from_ppm(2_500),
    }
}

/// A USDC/SUI pool at roughly 0.6 SUI per USDC, 0.3% fee.
#[allow(dead_code)]
pub fn turbos_pool() -> PoolState {
    PoolState {
        pool_id: TURBOS_POOL.to_string(),
        coin_type_a: USDC.to_string(),
        coin_type_b: SUI.to_string(),
        reserve_a: 1_000_000_000_000,
        reserve_b: 600_000_000_000_000,
        fee_rate: FeeRate::from_ppm(3_000),
    }
}

#[allow(dead_code)]
pub fn static_pools() -> StaticPoolReader {
    StaticPoolReader::new()
        .with_pool(cetus_pool())
        .with_pool(turbos_pool())
}

#[allow(dead_code)]
pub fn address_book() -> StaticAddressBook {
    StaticAddressBook::new()
        .with_address(&format!("NAVI:{}", SUI), NAVI_PACKAGE, NAVI_SUI_POOL)
        .with_address(&format!("DEEPBOOK:{}", SUI), DEEPBOOK_PACKAGE, DEEPBOOK_SUI_POOL)
        .with_address("CETUS", CETUS_PACKAGE, CETUS_CONFIG)
        .with_address("TURBOS", TURBOS_PACKAGE, TURBOS_VERSIONED)
}

#[allow(dead_code)]
pub fn compiler_with(pools: StaticPoolReader, options: CompilerOptions) -> TransactionBuilder {
    CompilerBuilder::with_defaults(Arc::new(pools), Arc::new(address_book()), options).build()
}

#[allow(dead_code)]
pub fn default_compiler() -> TransactionBuilder {
    compiler_with(static_pools(), CompilerOptions::default())
}

#[allow(dead_code)]
pub fn best_effort_options() -> CompilerOptions {
    CompilerOptions {
        estimate_mode: EstimateMode::BestEffort,
        ..CompilerOptions::default()
    }
}

#[allow(dead_code)]
pub fn parse(document: &Value) -> Strategy {
    SchemaValidator::validate_and_parse(document).expect("fixture should pass schema validation")
}

// --- JSON building blocks ---

#[allow(dead_code)]
pub fn borrow_node(id: &str, protocol: &str, amount: u64) -> Value {
    json!({
        "id": id,
        "type": "FLASH_BORROW",
        "protocol": protocol,
        "params": { "asset": SUI, "amount": amount.to_string() },
        "inputs": {},
        "outputs": [
            { "id": "coin", "type": "Coin<SUI>", "output_type": "COIN" },
            { "id": "receipt", "type": "FlashLoanReceipt", "output_type": "RECEIPT" }
        ]
    })
}

#[allow(dead_code)]
pub fn repay_node(id: &str, protocol: &str, coin_from: &str, receipt_from: &str) -> Value {
    json!({
        "id": id,
        "type": "FLASH_REPAY",
        "protocol": protocol,
        "params": { "asset": SUI },
        "inputs": { "coin": coin_from, "receipt": receipt_from },
        "outputs": [ { "id": "leftover", "output_type": "COIN" } ]
    })
}

#[allow(dead_code)]
pub fn swap_node(id: &str, protocol: &str, pool_id: &str, coin_a: &str, coin_b: &str, coin_from: &str) -> Value {
    let mut params = json!({
        "pool_id": pool_id,
        "coin_type_a": coin_a,
        "coin_type_b": coin_b,
        "direction": "A_TO_B",
        "amount_mode": "EXACT_IN",
        "slippage_tolerance": "0.01"
    });
    if protocol == "TURBOS" {
        params["fee_type"] = json!(TURBOS_FEE_TIER);
    }
    json!({
        "id": id,
        "type": "DEX_SWAP",
        "protocol": protocol,
        "params": params,
        "inputs": { "coin_in": coin_from },
        "outputs": [ { "id": "coin_out", "output_type": "COIN" } ]
    })
}

#[allow(dead_code)]
pub fn edge(id: &str, source: &str, source_output: &str, target: &str, target_input: &str, edge_type: &str) -> Value {
    json!({
        "id": id,
        "source": source,
        "source_output": source_output,
        "target": target,
        "target_input": target_input,
        "edge_type": edge_type
    })
}

#[allow(dead_code)]
pub fn strategy_document(id: &str, nodes: Vec<Value>, edges: Vec<Value>, outputs: Vec<&str>) -> Value {
    json!({
        "id": id,
        "version": "1.0.0",
        "meta": {
            "name": "test strategy",
            "author": "0x0000000000000000000000000000000000000000000000000000000000000abc",
            "created_at": 1_700_000_000_000u64,
            "tags": ["flash-loan"]
        },
        "nodes": nodes,
        "edges": edges,
        "outputs": outputs
    })
}

/// FLASH_BORROW wired straight into FLASH_REPAY on the same protocol.
#[allow(dead_code)]
pub fn flash_loan_roundtrip(protocol: &str, amount: u64) -> Value {
    strategy_document(
        "roundtrip",
        vec![
            borrow_node("borrow", protocol, amount),
            repay_node("repay", protocol, "borrow.coin", "borrow.receipt"),
        ],
        vec![
            edge("e1", "borrow", "coin", "repay", "coin", "COIN"),
            edge("e2", "borrow", "receipt", "repay", "receipt", "RECEIPT"),
        ],
        vec!["repay.leftover"],
    )
}

/// Borrow SUI on NAVI, sell it on Cetus, buy it back on Turbos, repay NAVI.
#[allow(dead_code)]
pub fn arbitrage_strategy() -> Value {
    strategy_document(
        "sui-usdc-arbitrage",
        vec![
            borrow_node("borrow", "NAVI", ONE_SUI),
            swap_node("sell", "CETUS", CETUS_POOL, SUI, USDC, "borrow.coin"),
            swap_node("buy", "TURBOS", TURBOS_POOL, USDC, SUI, "sell.coin_out"),
            repay_node("repay", "NAVI", "buy.coin_out", "borrow.receipt"),
        ],
        vec![
            edge("e1", "borrow", "coin", "sell", "coin_in", "COIN"),
            edge("e2", "sell", "coin_out", "buy", "coin_in", "COIN"),
            edge("e3", "buy", "coin_out", "repay", "coin", "COIN"),
            edge("e4", "borrow", "receipt", "repay", "receipt", "RECEIPT"),
        ],
        vec!["repay.leftover"],
    )
}

// --- Typed graphs for ordering tests ---

/// A CUSTOM node with one COIN output `out` and one reference input per upstream node.
#[allow(dead_code)]
pub fn plain_node(id: &str, upstream: &[&str]) -> Node {
    let mut node: Node = serde_json::from_value(json!({
        "id": id,
        "type": "CUSTOM",
        "protocol": "CUSTOM",
        "params": { "target": "0x2::test::noop" },
        "outputs": [ { "id": "out", "output_type": "COIN" } ]
    }))
    .expect("plain node");
    node.inputs = upstream
        .iter()
        .map(|u| {
            (
                format!("from_{}", u),
                InputValue::Reference(NodeRef::new(u, "out")),
            )
        })
        .collect::<BTreeMap<_, _>>();
    node
}

/// Builds a strategy from `(id, upstream ids)` pairs, adding one COIN edge per dependency.
#[allow(dead_code)]
pub fn graph(nodes: &[(&str, &[&str])]) -> Strategy {
    let mut edges = Vec::new();
    for (target, upstream) in nodes {
        for source in upstream.iter() {
            edges.push(Edge {
                id: format!("{}->{}", source, target),
                source: source.to_string(),
                source_output: "out".to_string(),
                target: target.to_string(),
                target_input: format!("from_{}", source),
                edge_type: EdgeType::Coin,
                coin_type: None,
            });
        }
    }
    Strategy {
        id: "graph".to_string(),
        version: "1".to_string(),
        meta: Default::default(),
        nodes: nodes.iter().map(|(id, up)| plain_node(id, up)).collect(),
        edges,
        outputs: Vec::new(),
    }
}
