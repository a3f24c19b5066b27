//! Flash-loan adapters: borrow a coin against a receipt, then hand both back.

use super::external::{AddressRegistry, ProtocolAddress};
use super::math::FeeRate;
use crate::compiler::CallPlan;
use crate::error::AdapterError;
use crate::strategy::{Argument, FlashLoanParams, Node, PureValue, Resource, ResourceKind};
use async_trait::async_trait;
use tracing::warn;

pub mod deepbook;
pub mod navi;

pub use deepbook::DeepBookFlashLoan;
pub use navi::NaviFlashLoan;

/// What a borrow hands to the rest of the transaction.
#[derive(Debug)]
pub struct BorrowOutput {
    pub coin: Resource,
    /// The hot potato: it has to reach a repay call of the same protocol.
    pub receipt: Resource,
}

#[async_trait]
pub trait FlashLoanAdapter: Send + Sync {
    fn protocol(&self) -> &str;

    fn fee_rate(&self) -> FeeRate;

    /// `floor(amount * fee_rate)`.
    fn fee(&self, amount: u64) -> Result<u64, AdapterError> {
        self.fee_rate().apply(amount)
    }

    fn repay_amount(&self, amount: u64) -> Result<u64, AdapterError> {
        self.fee_rate().with_fee(amount)
    }

    async fn borrow(&self, node: &Node, plan: &mut CallPlan) -> Result<BorrowOutput, AdapterError>;

    /// Returns the coin and the receipt to the lender. Both resources are consumed;
    /// the returned resource is whatever is left of the coin.
    async fn repay(
        &self,
        node: &Node,
        coin: Resource,
        receipt: Resource,
        plan: &mut CallPlan,
    ) -> Result<Resource, AdapterError>;
}

/// Entry points of a lending pool's flash-loan API.
pub(crate) struct LoanEntryPoints {
    pub module: &'static str,
    pub borrow: &'static str,
    pub repay: &'static str,
    /// Whether the repay function takes the amount owed as an explicit argument.
    pub repay_takes_amount: bool,
}

pub(crate) fn loan_params(node: &Node) -> Result<FlashLoanParams, AdapterError> {
    node.params_as::<FlashLoanParams>()
        .map_err(|e| AdapterError::invalid("params", e.to_string()))
}

/// Looks up the lending pool for `asset`, keyed `"<PROTOCOL>:<asset>"`.
pub(crate) async fn lending_pool(
    addresses: &dyn AddressRegistry,
    protocol: &str,
    asset: &str,
) -> Result<ProtocolAddress, AdapterError> {
    Ok(addresses
        .resolve_address(&format!("{}:{}", protocol, asset))
        .await?)
}

pub(crate) async fn emit_borrow(
    adapter: &dyn FlashLoanAdapter,
    addresses: &dyn AddressRegistry,
    entry: &LoanEntryPoints,
    node: &Node,
    plan: &mut CallPlan,
) -> Result<BorrowOutput, AdapterError> {
    let params = loan_params(node)?;
    let amount = params
        .amount
        .ok_or_else(|| AdapterError::invalid("amount", "a flash borrow needs an amount"))?
        .0;
    if amount == 0 {
        return Err(AdapterError::invalid("amount", "cannot borrow zero"));
    }
    let pool = lending_pool(addresses, adapter.protocol(), &params.asset).await?;

    let call = plan.move_call(
        format!("{}::{}::{}", pool.package_id, entry.module, entry.borrow),
        vec![params.asset.clone()],
        vec![
            Argument::Object(pool.object_id),
            Argument::Pure(PureValue::U64(amount)),
        ],
    )?;

    Ok(BorrowOutput {
        coin: Resource::coin(call.nested(0), Some(params.asset.clone()), Some(amount)),
        receipt: Resource::receipt(call.nested(1), adapter.protocol(), &params.asset, amount),
    })
}

pub(crate) async fn emit_repay(
    adapter: &dyn FlashLoanAdapter,
    addresses: &dyn AddressRegistry,
    entry: &LoanEntryPoints,
    node: &Node,
    coin: Resource,
    receipt: Resource,
    plan: &mut CallPlan,
) -> Result<Resource, AdapterError> {
    let params = loan_params(node)?;
    if receipt.kind != ResourceKind::Receipt {
        return Err(AdapterError::invalid("receipt", format!("expected a RECEIPT, got {}", receipt.kind)));
    }
    if coin.kind != ResourceKind::Coin {
        return Err(AdapterError::invalid("coin", format!("expected a COIN, got {}", coin.kind)));
    }
    match receipt.issuer.as_deref() {
        Some(issuer) if issuer.eq_ignore_ascii_case(adapter.protocol()) => {}
        other => {
            return Err(AdapterError::invalid(
                "receipt",
                format!(
                    "receipt was issued by {}, not {}",
                    other.unwrap_or("an unknown protocol"),
                    adapter.protocol()
                ),
            ));
        }
    }
    if receipt.coin_type.as_deref() != Some(params.asset.as_str()) {
        return Err(AdapterError::invalid(
            "asset",
            format!(
                "receipt is for {}, repay names {}",
                receipt.coin_type.as_deref().unwrap_or("an unknown asset"),
                params.asset
            ),
        ));
    }

    let principal = receipt
        .amount
        .ok_or_else(|| AdapterError::invalid("receipt", "receipt carries no principal"))?;
    let repay_amount = adapter.repay_amount(principal)?;
    if let Some(available) = coin.amount {
        if available < repay_amount {
            warn!(
                node = %node.id,
                available,
                repay_amount,
                "guaranteed coin amount does not cover the repayment; the transaction relies on estimates"
            );
        }
    }

    let pool = lending_pool(addresses, adapter.protocol(), &params.asset).await?;
    let mut arguments = vec![
        Argument::Object(pool.object_id),
        coin.argument(),
        receipt.argument(),
    ];
    if entry.repay_takes_amount {
        arguments.push(Argument::Pure(PureValue::U64(repay_amount)));
    }
    let call = plan.move_call(
        format!("{}::{}::{}", pool.package_id, entry.module, entry.repay),
        vec![params.asset.clone()],
        arguments,
    )?;

    let leftover = coin.amount.and_then(|a| a.checked_sub(repay_amount));
    Ok(Resource::coin(call.single(), Some(params.asset), leftover))
}
