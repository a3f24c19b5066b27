use super::quote::estimate_swap;
use super::{
    DexAdapter, EstimateMode, SwapEstimate, SwapOutput, call_amount, check_coin_in, coin_out, swap_params,
};
use crate::adapters::external::{AddressRegistry, PoolStateReader};
use crate::compiler::CallPlan;
use crate::error::AdapterError;
use crate::strategy::{AmountMode, Argument, Node, PureValue, Resource};
use async_trait::async_trait;
use std::sync::Arc;

/// Cetus CLMM pools. The package and its global config object are registered under `"CETUS"`.
pub struct CetusDex {
    pools: Arc<dyn PoolStateReader>,
    addresses: Arc<dyn AddressRegistry>,
    mode: EstimateMode,
}

impl CetusDex {
    pub const PROTOCOL: &'static str = "CETUS";

    pub fn new(
        pools: Arc<dyn PoolStateReader>,
        addresses: Arc<dyn AddressRegistry>,
        mode: EstimateMode,
    ) -> Self {
        Self {
            pools,
            addresses,
            mode,
        }
    }
}

#[async_trait]
impl DexAdapter for CetusDex {
    fn protocol(&self) -> &str {
        Self::PROTOCOL
    }

    async fn estimate(&self, node: &Node, upstream: Option<u64>) -> Result<SwapEstimate, AdapterError> {
        let params = swap_params(node)?;
        estimate_swap(self.pools.as_ref(), self.mode, &params, upstream).await
    }

    async fn swap(
        &self,
        node: &Node,
        coin_in: Resource,
        estimate: &SwapEstimate,
        plan: &mut CallPlan,
    ) -> Result<SwapOutput, AdapterError> {
        let params = swap_params(node)?;
        check_coin_in(&coin_in, &params)?;
        let cetus = self.addresses.resolve_address(Self::PROTOCOL).await?;

        let call = plan.move_call(
            format!("{}::pool::swap", cetus.package_id),
            vec![params.coin_type_a.clone(), params.coin_type_b.clone()],
            vec![
                Argument::Object(cetus.object_id),
                Argument::Object(params.pool_id.clone()),
                coin_in.argument(),
                Argument::Pure(PureValue::Bool(params.direction.a2b())),
                Argument::Pure(PureValue::Bool(params.amount_mode == AmountMode::ExactIn)),
                Argument::Pure(PureValue::U64(call_amount(&params, estimate))),
                Argument::Pure(PureValue::U128(estimate.sqrt_price_limit)),
                Argument::Pure(PureValue::U64(estimate.amount_limit)),
            ],
        )?;
        Ok(SwapOutput::single(coin_out(call.single(), &params, estimate)))
    }
}
