use super::{BorrowOutput, FlashLoanAdapter, LoanEntryPoints, emit_borrow, emit_repay};
use crate::adapters::external::AddressRegistry;
use crate::adapters::math::FeeRate;
use crate::compiler::CallPlan;
use crate::error::AdapterError;
use crate::strategy::{Node, Resource};
use async_trait::async_trait;
use std::sync::Arc;

/// 0.06%.
pub const NAVI_FEE_RATE: FeeRate = FeeRate::new(6, 10_000);

const ENTRY: LoanEntryPoints = LoanEntryPoints {
    module: "flash_loan",
    borrow: "borrow",
    repay: "repay",
    repay_takes_amount: true,
};

/// NAVI lending pools. Each asset has its own pool object, registered under
/// `"NAVI:<asset>"`.
pub struct NaviFlashLoan {
    addresses: Arc<dyn AddressRegistry>,
}

impl NaviFlashLoan {
    pub const PROTOCOL: &'static str = "NAVI";

    pub fn new(addresses: Arc<dyn AddressRegistry>) -> Self {
        Self { addresses }
    }
}

#[async_trait]
impl FlashLoanAdapter for NaviFlashLoan {
    fn protocol(&self) -> &str {
        Self::PROTOCOL
    }

    fn fee_rate(&self) -> FeeRate {
        NAVI_FEE_RATE
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
