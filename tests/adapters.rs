//! Tests for fee and slippage math, pool quoting and the protocol adapters.
mod common;
use common::*;
use sail::adapters::dex::quote::{
    MAX_SQRT_PRICE, MIN_SQRT_PRICE, estimate_swap, quote_exact_in, quote_exact_out,
};
use sail::adapters::flashloan::navi::NAVI_FEE_RATE;
use sail::adapters::{
    AdapterRegistry, CetusDex, CustomCallAdapter, DeepBookFlashLoan, DexAdapter,
    FlashLoanAdapter, MoveCallAdapter, NaviFlashLoan, PoolStateReader, ResolvedInput, TurbosDex,
};
use sail::compiler::CallPlan;
use sail::prelude::*;
use sail::strategy::SwapParams;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_test::block_on;

fn node(value: Value) -> Node {
    serde_json::from_value(value).expect("fixture node should parse")
}

fn swap_params(value: &Value) -> SwapParams {
    node(value.clone()).params_as().expect("swap params should parse")
}

// --- fees and slippage ---

#[test]
fn test_fee_rate_rounds_down() {
    assert_eq!(NAVI_FEE_RATE.apply(1_666).unwrap(), 0);
    assert_eq!(NAVI_FEE_RATE.apply(1_667).unwrap(), 1);
    assert_eq!(NAVI_FEE_RATE.apply(ONE_SUI).unwrap(), 600_000);
    assert_eq!(NAVI_FEE_RATE.with_fee(ONE_SUI).unwrap(), 1_000_600_000);
    assert_eq!(FeeRate::ZERO.with_fee(ONE_SUI).unwrap(), ONE_SUI);
    assert_eq!(NAVI_FEE_RATE.to_string(), "6/10000");
}

#[test]
fn test_fee_rate_overflow_and_validity() {
    assert!(matches!(
        FeeRate::new(1, 0).apply(10),
        Err(AdapterError::Arithmetic { .. })
    ));
    assert!(matches!(
        FeeRate::new(1, 2).with_fee(u64::MAX),
        Err(AdapterError::Arithmetic { .. })
    ));
    assert!(FeeRate::from_ppm(2_500).is_valid());
    assert!(!FeeRate::new(1, 1).is_valid());
    assert!(!FeeRate::new(1, 0).is_valid());
}

#[test]
fn test_slippage_parsing() {
    assert_eq!(Slippage::from_decimal_str("0.01").unwrap().ppm(), 10_000);
    assert_eq!(Slippage::from_decimal_str(" 0.005 ").unwrap().ppm(), 5_000);
    assert_eq!(Slippage::from_decimal_str("0").unwrap().ppm(), 0);
    // Precision beyond ppm is truncated.
    assert_eq!(Slippage::from_decimal_str("0.0000009").unwrap().ppm(), 0);
    assert!(Slippage::from_decimal_str("1").is_none());
    assert!(Slippage::from_decimal_str("-0.1").is_none());
    assert!(Slippage::from_decimal_str("1%").is_none());
    assert!(Slippage::from_ppm(1_000_000).is_none());
}

#[test]
fn test_slippage_bounds() {
    let one_percent = Slippage::from_ppm(10_000).unwrap();
    assert_eq!(one_percent.min_output(1_000_000), 990_000);
    assert_eq!(one_percent.max_input(1_000_000).unwrap(), 1_010_000);
    assert_eq!(one_percent.min_output(99), 98);
    assert_eq!(one_percent.max_input(99).unwrap(), 99);
    assert!(one_percent.max_input(u64::MAX).is_err());
    assert_eq!(one_percent.to_string(), "10000 ppm");
}

#[test]
fn test_slippage_serde() {
    let slippage: Slippage = serde_json::from_value(json!("0.01")).unwrap();
    assert_eq!(slippage.ppm(), 10_000);
    let slippage: Slippage = serde_json::from_value(json!(0.25)).unwrap();
    assert_eq!(slippage.ppm(), 250_000);
    assert_eq!(serde_json::to_value(slippage).unwrap(), json!("0.25"));
    assert!(serde_json::from_value::<Slippage>(json!("2")).is_err());
}

// --- constant-product quotes ---

fn even_pool(fee_ppm: u64) -> PoolState {
    PoolState {
        pool_id: "0x1".to_string(),
        coin_type_a: SUI.to_string(),
        coin_type_b: USDC.to_string(),
        reserve_a: 1_000_000,
        reserve_b: 1_000_000,
        fee_rate: FeeRate::from_ppm(fee_ppm),
    }
}

#[test]
fn test_quote_exact_in() {
    let quote = quote_exact_in(&even_pool(3_000), true, 10_000).unwrap();
    assert_eq!(quote.amount_in, 10_000);
    assert_eq!(quote.fee, 30);
    assert_eq!(quote.amount_out, 9_871);
    assert_eq!(quote.price_impact_ppm, 9_871);

    let quote = quote_exact_in(&cetus_pool(), true, ONE_SUI).unwrap();
    assert_eq!(quote.fee, 2_500_000);
    assert_eq!(quote.amount_out, 1_994_998);
    assert_eq!(quote.price_impact_ppm, 0);

    let quote = quote_exact_in(&cetus_pool(), false, 2_000_000).unwrap();
    assert_eq!(quote.fee, 5_000);
    assert_eq!(quote.amount_out, 997_499_004);
}

#[test]
fn test_quote_exact_out_rounds_up() {
    let quote = quote_exact_out(&even_pool(3_000), true, 9_871).unwrap();
    assert_eq!(quote.amount_in, 10_000);
    assert_eq!(quote.fee, 30);
    assert_eq!(quote.amount_out, 9_871);

    let quote = quote_exact_out(&cetus_pool(), true, 1_000_000).unwrap();
    assert_eq!(quote.amount_in, 501_253_385);
    assert_eq!(quote.fee, 1_253_134);
    assert_eq!(quote.price_impact_ppm, 0);
}

#[test]
fn test_quote_rejects_degenerate_pools() {
    let mut empty = even_pool(3_000);
    empty.reserve_b = 0;
    assert!(matches!(
        quote_exact_in(&empty, true, 10),
        Err(AdapterError::Estimation { .. })
    ));

    let mut bad_fee = even_pool(0);
    bad_fee.fee_rate = FeeRate::new(5, 5);
    assert!(matches!(
        quote_exact_out(&bad_fee, true, 10),
        Err(AdapterError::Estimation { .. })
    ));

    // Dust rounds to nothing.
    assert!(matches!(
        quote_exact_in(&cetus_pool(), true, 100),
        Err(AdapterError::Estimation { .. })
    ));
    // More than the pool holds.
    assert!(matches!(
        quote_exact_out(&even_pool(3_000), true, 1_000_000),
        Err(AdapterError::Estimation { .. })
    ));
}

// --- estimate routine ---

fn sell_params() -> SwapParams {
    swap_params(&swap_node("sell", "CETUS", CETUS_POOL, SUI, USDC, "borrow.coin"))
}

#[test]
fn test_estimate_uses_upstream_amount() {
    let pools = static_pools();
    let estimate = block_on(estimate_swap(
        &pools,
        EstimateMode::Production,
        &sell_params(),
        Some(ONE_SUI),
    ))
    .unwrap();

    assert_eq!(
        estimate,
        SwapEstimate {
            amount_in: ONE_SUI,
            amount_out: 1_994_998,
            fee: 2_500_000,
            price_impact_ppm: 0,
            sqrt_price_limit: MIN_SQRT_PRICE,
            amount_limit: 1_975_048,
            quality: EstimateQuality::Live,
        }
    );
}

#[test]
fn test_estimate_needs_some_amount() {
    let pools = static_pools();
    let err = block_on(estimate_swap(&pools, EstimateMode::Production, &sell_params(), None))
        .unwrap_err();
    assert!(matches!(err, AdapterError::InvalidParams { ref field, .. } if field == "amount"));
}

#[test]
fn test_estimate_exact_out() {
    let mut document = swap_node("sell", "CETUS", CETUS_POOL, SUI, USDC, "borrow.coin");
    document["params"]["amount_mode"] = json!("EXACT_OUT");
    document["params"]["amount"] = json!("1000000");
    let pools = static_pools();

    // The upstream amount is ignored when the node states one.
    let estimate = block_on(estimate_swap(
        &pools,
        EstimateMode::Production,
        &swap_params(&document),
        Some(ONE_SUI),
    ))
    .unwrap();
    assert_eq!(estimate.amount_out, 1_000_000);
    assert_eq!(estimate.amount_in, 501_253_385);
    assert_eq!(estimate.amount_limit, 506_265_918);
}

#[test]
fn test_estimate_b_to_a_defaults_to_max_sqrt_price() {
    let mut document = swap_node("sell", "CETUS", CETUS_POOL, SUI, USDC, "borrow.coin");
    document["params"]["direction"] = json!("B_TO_A");
    document["params"]["amount"] = json!(2_000_000);
    let pools = static_pools();
    let estimate = block_on(estimate_swap(
        &pools,
        EstimateMode::Production,
        &swap_params(&document),
        None,
    ))
    .unwrap();
    assert_eq!(estimate.sqrt_price_limit, MAX_SQRT_PRICE);
    assert_eq!(estimate.amount_out, 997_499_004);

    document["params"]["sqrt_price_limit"] = json!("18446744073709551616");
    let estimate = block_on(estimate_swap(
        &pools,
        EstimateMode::Production,
        &swap_params(&document),
        None,
    ))
    .unwrap();
    assert_eq!(estimate.sqrt_price_limit, 1u128 << 64);
}

#[test]
fn test_estimate_rejects_pool_with_other_coins() {
    let document = swap_node("sell", "CETUS", TURBOS_POOL, SUI, USDC, "borrow.coin");
    let pools = static_pools();
    let err = block_on(estimate_swap(
        &pools,
        EstimateMode::Production,
        &swap_params(&document),
        Some(ONE_SUI),
    ))
    .unwrap_err();
    assert!(matches!(err, AdapterError::InvalidParams { ref field, .. } if field == "pool_id"));
}

#[test]
fn test_unavailable_pool_depends_on_mode() {
    let pools = static_pools().mark_unavailable(CETUS_POOL);

    let err = block_on(estimate_swap(
        &pools,
        EstimateMode::Production,
        &sell_params(),
        Some(ONE_SUI),
    ))
    .unwrap_err();
    assert!(matches!(err, AdapterError::PoolUnavailable { ref pool_id, .. } if pool_id == CETUS_POOL));

    let estimate = block_on(estimate_swap(
        &pools,
        EstimateMode::BestEffort,
        &sell_params(),
        Some(ONE_SUI),
    ))
    .unwrap();
    assert!(estimate.is_best_effort());
    assert_eq!(estimate.amount_in, ONE_SUI);
    assert_eq!(estimate.amount_out, ONE_SUI);
    assert_eq!(estimate.fee, 0);
    assert_eq!(estimate.amount_limit, 990_000_000);
}

#[test]
fn test_missing_pool_is_never_best_effort() {
    let pools = StaticPoolReader::new();
    let err = block_on(estimate_swap(
        &pools,
        EstimateMode::BestEffort,
        &sell_params(),
        Some(ONE_SUI),
    ))
    .unwrap_err();
    assert!(matches!(err, AdapterError::NotFound { ref key } if key == CETUS_POOL));
}

// --- collaborators ---

#[test]
fn test_static_pool_reader_from_json() {
    let text = serde_json::to_string(&json!({
        "pools": {
            CETUS_POOL: serde_json::to_value(cetus_pool()).unwrap()
        },
        "unavailable": [TURBOS_POOL]
    }))
    .unwrap();
    let reader = StaticPoolReader::from_json_str(&text).unwrap();
    assert_eq!(reader.len(), 1);
    assert!(!reader.is_empty());
    assert_eq!(block_on(reader.get_pool_state(CETUS_POOL)).unwrap(), cetus_pool());
    assert!(matches!(
        block_on(reader.get_pool_state(TURBOS_POOL)),
        Err(LookupError::Unavailable { .. })
    ));
    assert!(matches!(
        block_on(reader.get_pool_state("0xabc")),
        Err(LookupError::NotFound(_))
    ));
}

#[test]
fn test_address_book_selects_network() {
    use sail::adapters::AddressRegistry;
    let text = r#"{
        "mainnet": { "CETUS": { "package_id": "0x1", "object_id": "0x2" } },
        "testnet": { "CETUS": { "package_id": "0x3", "object_id": "0x4" } }
    }"#;
    let mainnet = StaticAddressBook::from_json_str(text, Network::Mainnet).unwrap();
    let testnet = StaticAddressBook::from_json_str(text, Network::Testnet).unwrap();
    assert_eq!(block_on(mainnet.resolve_address("CETUS")).unwrap().package_id, "0x1");
    assert_eq!(block_on(testnet.resolve_address("CETUS")).unwrap().object_id, "0x4");
    assert!(matches!(
        block_on(testnet.resolve_address("TURBOS")),
        Err(LookupError::NotFound(ref key)) if key == "TURBOS"
    ));

    let only_mainnet = r#"{ "mainnet": {} }"#;
    let empty = StaticAddressBook::from_json_str(only_mainnet, Network::Testnet).unwrap();
    assert!(block_on(empty.resolve_address("CETUS")).is_err());
}

// --- flash loans ---

#[test]
fn test_navi_borrow_and_repay() {
    let navi = NaviFlashLoan::new(Arc::new(address_book()));
    assert_eq!(navi.fee(ONE_SUI).unwrap(), 600_000);
    assert_eq!(navi.repay_amount(ONE_SUI).unwrap(), 1_000_600_000);

    let mut plan = CallPlan::default();
    let borrow = node(borrow_node("borrow", "NAVI", ONE_SUI));
    let out = block_on(navi.borrow(&borrow, &mut plan)).unwrap();

    assert_eq!(out.coin.handle, Handle::NestedResult(0, 0));
    assert_eq!(out.coin.amount, Some(ONE_SUI));
    assert_eq!(out.receipt.handle, Handle::NestedResult(0, 1));
    assert_eq!(out.receipt.kind, ResourceKind::Receipt);
    assert_eq!(out.receipt.issuer.as_deref(), Some("NAVI"));
    assert_eq!(out.receipt.amount, Some(ONE_SUI));

    let call = &plan.calls()[0];
    assert_eq!(call.target, format!("{}::flash_loan::borrow", NAVI_PACKAGE));
    assert_eq!(call.type_arguments, vec![SUI.to_string()]);
    assert_eq!(
        call.arguments,
        vec![
            Argument::Object(NAVI_SUI_POOL.to_string()),
            Argument::Pure(PureValue::U64(ONE_SUI)),
        ]
    );

    // Top the coin up so it covers the fee.
    let coin = Resource::coin(Handle::Input("funds".to_string()), Some(SUI.to_string()), Some(1_001_000_000));
    let repay = node(repay_node("repay", "NAVI", "borrow.coin", "borrow.receipt"));
    let leftover = block_on(navi.repay(&repay, coin, out.receipt, &mut plan)).unwrap();

    assert_eq!(plan.len(), 2);
    assert_eq!(leftover.handle, Handle::Result(1));
    assert_eq!(leftover.amount, Some(400_000));
    assert_eq!(
        plan.calls()[1].arguments,
        vec![
            Argument::Object(NAVI_SUI_POOL.to_string()),
            Argument::Handle(Handle::Input("funds".to_string())),
            Argument::Handle(Handle::NestedResult(0, 1)),
            Argument::Pure(PureValue::U64(1_000_600_000)),
        ]
    );
}

#[test]
fn test_deepbook_repay_takes_no_amount() {
    let deepbook = DeepBookFlashLoan::new(Arc::new(address_book()));
    assert_eq!(deepbook.fee(ONE_SUI).unwrap(), 0);

    let mut plan = CallPlan::default();
    let out = block_on(deepbook.borrow(&node(borrow_node("b", "DEEPBOOK", ONE_SUI)), &mut plan)).unwrap();
    let repay = node(repay_node("r", "DEEPBOOK", "b.coin", "b.receipt"));
    let leftover = block_on(deepbook.repay(&repay, out.coin, out.receipt, &mut plan)).unwrap();

    assert_eq!(
        plan.calls()[0].target,
        format!("{}::pool::borrow_flashloan_base", DEEPBOOK_PACKAGE)
    );
    assert_eq!(
        plan.calls()[1].target,
        format!("{}::pool::return_flashloan_base", DEEPBOOK_PACKAGE)
    );
    assert_eq!(plan.calls()[1].arguments.len(), 3);
    assert_eq!(leftover.amount, Some(0));
}

#[test]
fn test_borrow_rejects_zero_and_unknown_pools() {
    let navi = NaviFlashLoan::new(Arc::new(address_book()));
    let mut plan = CallPlan::default();

    let err = block_on(navi.borrow(&node(borrow_node("b", "NAVI", 0)), &mut plan)).unwrap_err();
    assert!(matches!(err, AdapterError::InvalidParams { ref field, .. } if field == "amount"));

    let mut usdc_borrow = borrow_node("b", "NAVI", ONE_SUI);
    usdc_borrow["params"]["asset"] = json!(USDC);
    let err = block_on(navi.borrow(&node(usdc_borrow), &mut plan)).unwrap_err();
    assert!(matches!(err, AdapterError::NotFound { ref key } if key == &format!("NAVI:{}", USDC)));
    assert!(plan.is_empty());
}

#[test]
fn test_repay_rejects_foreign_receipt() {
    let navi = NaviFlashLoan::new(Arc::new(address_book()));
    let mut plan = CallPlan::default();
    let coin = Resource::coin(Handle::Result(0), Some(SUI.to_string()), Some(ONE_SUI));
    let receipt = Resource::receipt(Handle::Result(1), "DEEPBOOK", SUI, ONE_SUI);
    let repay = node(repay_node("r", "NAVI", "b.coin", "b.receipt"));

    let err = block_on(navi.repay(&repay, coin, receipt, &mut plan)).unwrap_err();
    assert!(matches!(err, AdapterError::InvalidParams { ref field, .. } if field == "receipt"));
    assert!(plan.is_empty());
}

#[test]
fn test_repay_with_short_coin_still_emits() {
    let navi = NaviFlashLoan::new(Arc::new(address_book()));
    let mut plan = CallPlan::default();
    let coin = Resource::coin(Handle::Result(0), Some(SUI.to_string()), Some(ONE_SUI));
    let receipt = Resource::receipt(Handle::Result(1), "navi", SUI, ONE_SUI);
    let repay = node(repay_node("r", "NAVI", "b.coin", "b.receipt"));

    let leftover = block_on(navi.repay(&repay, coin, receipt, &mut plan)).unwrap();
    assert_eq!(plan.len(), 1);
    assert_eq!(leftover.amount, None);
}

// --- DEX adapters ---

#[test]
fn test_cetus_swap_call() {
    let cetus = CetusDex::new(Arc::new(static_pools()), Arc::new(address_book()), EstimateMode::Production);
    let sell = node(swap_node("sell", "CETUS", CETUS_POOL, SUI, USDC, "borrow.coin"));
    let estimate = block_on(cetus.estimate(&sell, Some(ONE_SUI))).unwrap();

    let mut plan = CallPlan::default();
    let coin_in = Resource::coin(Handle::NestedResult(0, 0), Some(SUI.to_string()), Some(ONE_SUI));
    let out = block_on(cetus.swap(&sell, coin_in, &estimate, &mut plan)).unwrap();

    assert_eq!(out.coin_out.handle, Handle::Result(0));
    assert_eq!(out.coin_out.coin_type.as_deref(), Some(USDC));
    assert_eq!(out.coin_out.amount, Some(1_975_048));
    assert!(out.remainder.is_none());

    let call = &plan.calls()[0];
    assert_eq!(call.target, format!("{}::pool::swap", CETUS_PACKAGE));
    assert_eq!(call.type_arguments, vec![SUI.to_string(), USDC.to_string()]);
    assert_eq!(
        call.arguments,
        vec![
            Argument::Object(CETUS_CONFIG.to_string()),
            Argument::Object(CETUS_POOL.to_string()),
            Argument::Handle(Handle::NestedResult(0, 0)),
            Argument::Pure(PureValue::Bool(true)),
            Argument::Pure(PureValue::Bool(true)),
            Argument::Pure(PureValue::U64(ONE_SUI)),
            Argument::Pure(PureValue::U128(MIN_SQRT_PRICE)),
            Argument::Pure(PureValue::U64(1_975_048)),
        ]
    );
}

#[test]
fn test_swap_rejects_wrong_input_coin() {
    let cetus = CetusDex::new(Arc::new(static_pools()), Arc::new(address_book()), EstimateMode::Production);
    let sell = node(swap_node("sell", "CETUS", CETUS_POOL, SUI, USDC, "borrow.coin"));
    let estimate = block_on(cetus.estimate(&sell, Some(ONE_SUI))).unwrap();

    let mut plan = CallPlan::default();
    let usdc = Resource::coin(Handle::Result(0), Some(USDC.to_string()), Some(ONE_SUI));
    let err = block_on(cetus.swap(&sell, usdc, &estimate, &mut plan)).unwrap_err();
    assert!(matches!(err, AdapterError::InvalidParams { ref field, .. } if field == "inputs"));
    assert!(plan.is_empty());
}

#[test]
fn test_turbos_swap_call() {
    let turbos = TurbosDex::new(Arc::new(static_pools()), Arc::new(address_book()), EstimateMode::Production);
    let buy = node(swap_node("buy", "TURBOS", TURBOS_POOL, USDC, SUI, "sell.coin_out"));
    let estimate = block_on(turbos.estimate(&buy, Some(1_975_048))).unwrap();
    assert_eq!(estimate.fee, 5_925);
    assert_eq!(estimate.amount_out, 1_181_471_473);
    assert_eq!(estimate.price_impact_ppm, 1);
    assert_eq!(estimate.amount_limit, 1_169_656_758);

    let mut plan = CallPlan::default();
    let coin_in = Resource::coin(Handle::Result(3), Some(USDC.to_string()), Some(1_975_048));
    let out = block_on(turbos.swap(&buy, coin_in, &estimate, &mut plan)).unwrap();
    assert_eq!(out.coin_out.handle, Handle::NestedResult(0, 0));
    assert_eq!(out.coin_out.amount, Some(1_169_656_758));
    // The router hands back what it did not spend of the input coin.
    let remainder = out.remainder.expect("turbos returns the unspent input");
    assert_eq!(remainder.handle, Handle::NestedResult(0, 1));
    assert_eq!(remainder.coin_type.as_deref(), Some(USDC));
    assert_eq!(remainder.amount, None);

    let call = &plan.calls()[0];
    assert_eq!(
        call.target,
        format!("{}::swap_router::swap_a_b_with_return_", TURBOS_PACKAGE)
    );
    assert_eq!(
        call.type_arguments,
        vec![USDC.to_string(), SUI.to_string(), TURBOS_FEE_TIER.to_string()]
    );
    assert_eq!(call.arguments[0], Argument::Object(TURBOS_POOL.to_string()));
    assert_eq!(call.arguments[2], Argument::Pure(PureValue::U64(1_975_048)));
    assert_eq!(call.arguments[3], Argument::Pure(PureValue::U64(1_169_656_758)));
    assert_eq!(call.arguments[6], Argument::Object("0x6".to_string()));
    assert_eq!(call.arguments[7], Argument::Object(TURBOS_VERSIONED.to_string()));
}

#[test]
fn test_turbos_requires_fee_type() {
    let turbos = TurbosDex::new(Arc::new(static_pools()), Arc::new(address_book()), EstimateMode::Production);
    let mut buy = swap_node("buy", "TURBOS", TURBOS_POOL, USDC, SUI, "sell.coin_out");
    buy["params"].as_object_mut().unwrap().remove("fee_type");
    let buy = node(buy);
    let estimate = block_on(turbos.estimate(&buy, Some(1_975_048))).unwrap();

    let mut plan = CallPlan::default();
    let coin_in = Resource::coin(Handle::Result(0), Some(USDC.to_string()), None);
    let err = block_on(turbos.swap(&buy, coin_in, &estimate, &mut plan)).unwrap_err();
    assert!(matches!(err, AdapterError::InvalidParams { ref field, .. } if field == "fee_type"));
}

// --- custom calls ---

#[test]
fn test_move_call_places_named_inputs() {
    let custom = node(json!({
        "id": "split",
        "type": "CUSTOM",
        "protocol": "CUSTOM",
        "params": {
            "target": "0x2::coin::split",
            "type_arguments": [SUI],
            "arguments": ["$coin", 500, true]
        },
        "inputs": { "coin": "borrow.coin", "memo": "hello" },
        "outputs": [
            { "id": "part", "output_type": "COIN" },
            { "id": "rest", "output_type": "COIN" }
        ]
    }));
    let mut inputs = BTreeMap::new();
    inputs.insert(
        "coin".to_string(),
        ResolvedInput::Resource(Resource::coin(Handle::NestedResult(0, 0), None, None)),
    );
    inputs.insert("memo".to_string(), ResolvedInput::Literal(json!("hello")));

    let mut plan = CallPlan::default();
    let outputs = block_on(MoveCallAdapter::new().call(&custom, inputs, &mut plan)).unwrap();

    assert_eq!(
        plan.calls()[0].arguments,
        vec![
            Argument::Handle(Handle::NestedResult(0, 0)),
            Argument::Pure(PureValue::U64(500)),
            Argument::Pure(PureValue::Bool(true)),
            Argument::Pure(PureValue::String("hello".to_string())),
        ]
    );
    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs[0].handle, Handle::NestedResult(0, 0));
    assert_eq!(outputs[1].handle, Handle::NestedResult(0, 1));
}

#[test]
fn test_move_call_unknown_placeholder() {
    let custom = node(json!({
        "id": "noop",
        "type": "CUSTOM",
        "protocol": "CUSTOM",
        "params": { "target": "0x2::noop::run", "arguments": ["$missing"] },
        "outputs": [ { "id": "out", "output_type": "OTHER" } ]
    }));
    let mut plan = CallPlan::default();
    let err = block_on(MoveCallAdapter::new().call(&custom, BTreeMap::new(), &mut plan)).unwrap_err();
    assert!(matches!(err, AdapterError::InvalidParams { ref field, .. } if field == "arguments"));
}

// --- registry and call plan ---

#[test]
fn test_registry_defaults_and_lookup() {
    let registry = AdapterRegistry::with_defaults(
        Arc::new(static_pools()),
        Arc::new(address_book()),
        EstimateMode::Production,
    );
    let (loans, dexes, custom) = registry.protocols();
    assert_eq!(loans, vec!["DEEPBOOK", "NAVI"]);
    assert_eq!(dexes, vec!["CETUS", "TURBOS"]);
    assert_eq!(custom, vec!["CUSTOM"]);

    assert_eq!(registry.flash_loan("b", "navi").unwrap().protocol(), "NAVI");
    assert_eq!(registry.dex("s", "Cetus").unwrap().protocol(), "CETUS");

    let err = registry.dex("s", "AFTERMATH").err().unwrap();
    assert!(matches!(
        err,
        CompileError::UnsupportedProtocol { ref protocol, family: "DEX", .. } if protocol == "AFTERMATH"
    ));
    assert!(registry.flash_loan("b", "CETUS").is_err());
}

#[test]
fn test_registry_register_replaces() {
    let mut registry = AdapterRegistry::new();
    registry.register_custom(Box::new(MoveCallAdapter::named("scallop")));
    assert!(registry.custom("n", "SCALLOP").is_ok());
    assert!(registry.custom("n", "CUSTOM").is_err());
}

#[test]
fn test_call_plan_limit() {
    let mut plan = CallPlan::new(2);
    for _ in 0..2 {
        plan.move_call("0x2::a::b".to_string(), vec![], vec![]).unwrap();
    }
    let err = plan.move_call("0x2::a::b".to_string(), vec![], vec![]).unwrap_err();
    assert_eq!(err, AdapterError::CallLimit { limit: 2 });
    assert_eq!(plan.len(), 2);
}
