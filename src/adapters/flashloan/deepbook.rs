use super::{BorrowOutput, FlashLoanAdapter, LoanEntryPoints, emit_borrow, emit_repay};
use crate::adapters::external::AddressRegistry;
use crate::adapters::math::FeeRate;
use crate::compiler::CallPlan;
use crate::error::AdapterError;
use crate::strategy::{Node, Resource};
use async_trait::async_trait;
use std::sync::Arc;

// DeepBook charges nothing and checks the returned value itself, so the repay call
// takes no amount.
const ENTRY: LoanEntryPoints = LoanEntryPoints {
    module: "pool",
    borrow: "borrow_flashloan_base",
    repay: "return_flashloan_base",
    repay_takes_amount: false,
};

/// Fee-free flash loans against DeepBook pools, registered under `"DEEPBOOK:<asset>"`.
pub struct DeepBookFlashLoan {
    addresses: Arc<dyn AddressRegistry>,
}

impl DeepBookFlashLoan {
    pub const PROTOCOL: &'static str = "DEEPBOOK";

    pub fn new(addresses: Arc<dyn AddressRegistry>) -> Self {
        Self { addresses }
    }
}

#[async_trait]
impl FlashLoanAdapter for DeepBookFlashLoan {
    fn protocol(&self) -> &str {
        Self::PROTOCOL
    }

    fn fee_rate(&self) -> FeeRate {
        FeeRate::ZERO
    }

    async fn borrow(&self, node: &Node, plan: &mut CallPlan) -> Result<BorrowOutput, AdapterError> {
        emit_borrow(self, self.addresses.as_ref(), &ENTRY, node, plan).await
    }

    async fn repay(
        &self,
        node: &Node,
        coin: Resource,
        receipt: Resource,
        plan: &mut CallPlan,
    ) -> Result<Resource, AdapterError> {
        emit_repay(self, self.addresses.as_ref(), &ENTRY, node, coin, receipt, plan).await
    }
}
