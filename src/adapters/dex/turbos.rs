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

/// The shared clock object.
const CLOCK: &str = "0x6";

/// Turbos CLMM pools. Pools are generic over a fee tier, so swap nodes must name
/// it in `params.fee_type`. The package and its versioned object are registered
/// under `"TURBOS"`.
pub struct TurbosDex {
    pools: Arc<dyn PoolStateReader>,
    addresses: Arc<dyn AddressRegistry>,
    mode: EstimateMode,
}

impl TurbosDex {
    pub const PROTOCOL: &'static str = "TURBOS";

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
impl DexAdapter for TurbosDex {
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
        let fee_type = params
            .fee_type
            .clone()
            .ok_or_else(|| AdapterError::invalid("fee_type", "Turbos pools need their fee tier type"))?;
        let turbos = self.addresses.resolve_address(Self::PROTOCOL).await?;

        let function = if params.direction.a2b() {
            "swap_a_b_with_return_"
        } else {
            "swap_b_a_with_return_"
        };
        let call = plan.move_call(
            format!("{}::swap_router::{}", turbos.package_id, function),
            vec![params.coin_type_a.clone(), params.coin_type_b.clone(), fee_type],
            vec![
                Argument::Object(params.pool_id.clone()),
                coin_in.argument(),
                Argument::Pure(PureValue::U64(call_amount(&params, estimate))),
                Argument::Pure(PureValue::U64(estimate.amount_limit)),
                Argument::Pure(PureValue::U128(estimate.sqrt_price_limit)),
                Argument::Pure(PureValue::Bool(params.amount_mode == AmountMode::ExactIn)),
                Argument::Object(CLOCK.to_string()),
                Argument::Object(turbos.object_id),
            ],
        )?;
        // Returns (coin_out, unspent coin_in).
        Ok(SwapOutput {
            coin_out: coin_out(call.nested(0), &params, estimate),
            remainder: Some(Resource::coin(
                call.nested(1),
                Some(params.coin_in().to_string()),
                None,
            )),
        })
    }
}
