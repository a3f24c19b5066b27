//! DEX adapters: quote a swap, then emit the call that executes it within the quoted bound.

use crate::compiler::CallPlan;
use crate::error::AdapterError;
use crate::strategy::{AmountMode, Handle, Node, Resource, ResourceKind, SwapParams};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod cetus;
pub mod quote;
pub mod turbos;

pub use cetus::CetusDex;
pub use turbos::TurbosDex;

/// How far to trust a [`SwapEstimate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EstimateQuality {
    /// Quoted from pool state read during this compilation.
    Live,
    /// Guessed because the pool could not be read. Not fit for production use.
    BestEffort,
}

impl fmt::Display for EstimateQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimateQuality::Live => write!(f, "live"),
            EstimateQuality::BestEffort => write!(f, "best-effort"),
        }
    }
}

/// Whether adapters may fall back to best-effort estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateMode {
    #[default]
    Production,
    BestEffort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapEstimate {
    pub amount_in: u64,
    pub amount_out: u64,
    pub fee: u64,
    /// Price impact in parts per million.
    pub price_impact_ppm: u64,
    pub sqrt_price_limit: u128,
    /// Minimum output for exact-input swaps, maximum input for exact-output swaps.
    pub amount_limit: u64,
    pub quality: EstimateQuality,
}

impl SwapEstimate {
    pub fn is_best_effort(&self) -> bool {
        self.quality == EstimateQuality::BestEffort
    }
}

/// The coins a swap call hands back.
#[derive(Debug)]
pub struct SwapOutput {
    pub coin_out: Resource,
    /// Whatever the call returns of the input coin, for routers that give it back.
    pub remainder: Option<Resource>,
}

impl SwapOutput {
    pub fn single(coin_out: Resource) -> Self {
        Self {
            coin_out,
            remainder: None,
        }
    }
}

#[async_trait]
pub trait DexAdapter: Send + Sync {
    fn protocol(&self) -> &str;

    /// Quotes the swap `node` describes. `upstream` is the known amount of the coin
    /// flowing in, used when the node itself states no amount.
    async fn estimate(&self, node: &Node, upstream: Option<u64>) -> Result<SwapEstimate, AdapterError>;

    /// Emits the swap call. Consumes `coin_in` and returns the output coin, plus the
    /// unspent input when the protocol returns one.
    async fn swap(
        &self,
        node: &Node,
        coin_in: Resource,
        estimate: &SwapEstimate,
        plan: &mut CallPlan,
    ) -> Result<SwapOutput, AdapterError>;
}

pub(crate) fn swap_params(node: &Node) -> Result<SwapParams, AdapterError> {
    node.params_as::<SwapParams>()
        .map_err(|e| AdapterError::invalid("params", e.to_string()))
}

/// Rejects an incoming coin whose kind or known type does not fit the swap.
pub(crate) fn check_coin_in(coin_in: &Resource, params: &SwapParams) -> Result<(), AdapterError> {
    if coin_in.kind != ResourceKind::Coin {
        return Err(AdapterError::invalid(
            "inputs",
            format!("a swap needs a COIN input, got {}", coin_in.kind),
        ));
    }
    match coin_in.coin_type.as_deref() {
        Some(coin_type) if coin_type != params.coin_in() => Err(AdapterError::invalid(
            "inputs",
            format!("swap expects {} but receives {}", params.coin_in(), coin_type),
        )),
        _ => Ok(()),
    }
}

/// The amount argument of the swap call: the input for exact-in, the output for exact-out.
pub(crate) fn call_amount(params: &SwapParams, estimate: &SwapEstimate) -> u64 {
    match params.amount_mode {
        AmountMode::ExactIn => estimate.amount_in,
        AmountMode::ExactOut => estimate.amount_out,
    }
}

/// The output coin, carrying the amount the swap is guaranteed to deliver.
pub(crate) fn coin_out(handle: Handle, params: &SwapParams, estimate: &SwapEstimate) -> Resource {
    let guaranteed = match params.amount_mode {
        AmountMode::ExactIn => estimate.amount_limit,
        AmountMode::ExactOut => estimate.amount_out,
    };
    Resource::coin(handle, Some(params.coin_out().to_string()), Some(guaranteed))
}
