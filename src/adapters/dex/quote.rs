//! Constant-product quoting and the estimate routine shared by the DEX adapters.

use super::{EstimateMode, EstimateQuality, SwapEstimate};
use crate::adapters::external::{PoolState, PoolStateReader};
use crate::adapters::math::{PPM, div_ceil};
use crate::error::{AdapterError, LookupError};
use crate::strategy::{AmountMode, SwapParams};
use tracing::{debug, warn};

/// Lowest sqrt price a pool accepts; the default limit for A to B swaps.
pub const MIN_SQRT_PRICE: u128 = 4_295_048_016;
/// Highest sqrt price a pool accepts; the default limit for B to A swaps.
pub const MAX_SQRT_PRICE: u128 = 79_226_673_515_401_279_992_447_579_055;

pub fn default_sqrt_price_limit(a2b: bool) -> u128 {
    if a2b { MIN_SQRT_PRICE } else { MAX_SQRT_PRICE }
}

/// The four numbers a pool quote boils down to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub amount_in: u64,
    pub amount_out: u64,
    pub fee: u64,
    pub price_impact_ppm: u64,
}

fn liquid_reserves(pool: &PoolState, a2b: bool) -> Result<(u128, u128), AdapterError> {
    let (reserve_in, reserve_out) = pool.reserves(a2b);
    if reserve_in == 0 || reserve_out == 0 {
        return Err(AdapterError::estimation(format!(
            "pool '{}' has no liquidity",
            pool.pool_id
        )));
    }
    if !pool.fee_rate.is_valid() {
        return Err(AdapterError::estimation(format!(
            "pool '{}' reports an invalid fee rate {}",
            pool.pool_id, pool.fee_rate
        )));
    }
    Ok((reserve_in, reserve_out))
}

fn price_impact_ppm(net_in: u128, reserve_in: u128) -> Result<u64, AdapterError> {
    let scaled = net_in
        .checked_mul(u128::from(PPM))
        .ok_or_else(|| AdapterError::arithmetic("price impact"))?;
    let denominator = reserve_in
        .checked_add(net_in)
        .ok_or_else(|| AdapterError::arithmetic("price impact"))?;
    u64::try_from(scaled / denominator).map_err(|_| AdapterError::arithmetic("price impact"))
}

/// Output for a fixed input. The fee is taken from the input before it reaches the curve.
pub fn quote_exact_in(pool: &PoolState, a2b: bool, amount_in: u64) -> Result<Quote, AdapterError> {
    let (reserve_in, reserve_out) = liquid_reserves(pool, a2b)?;
    let fee = pool.fee_rate.apply(amount_in)?;
    let net_in = u128::from(amount_in - fee);

    let numerator = reserve_out
        .checked_mul(net_in)
        .ok_or_else(|| AdapterError::arithmetic("exact-in output"))?;
    let denominator = reserve_in
        .checked_add(net_in)
        .ok_or_else(|| AdapterError::arithmetic("exact-in output"))?;
    let amount_out = u64::try_from(numerator / denominator)
        .map_err(|_| AdapterError::arithmetic("exact-in output"))?;
    if amount_out == 0 {
        return Err(AdapterError::estimation(format!(
            "swapping {} through pool '{}' returns nothing",
            amount_in, pool.pool_id
        )));
    }

    Ok(Quote {
        amount_in,
        amount_out,
        fee,
        price_impact_ppm: price_impact_ppm(net_in, reserve_in)?,
    })
}

/// Input needed for a fixed output. Every division rounds up so the quote never
/// understates what the pool will ask for.
pub fn quote_exact_out(pool: &PoolState, a2b: bool, amount_out: u64) -> Result<Quote, AdapterError> {
    let (reserve_in, reserve_out) = liquid_reserves(pool, a2b)?;
    let wanted = u128::from(amount_out);
    if wanted >= reserve_out {
        return Err(AdapterError::estimation(format!(
            "pool '{}' holds {} but {} was requested",
            pool.pool_id, reserve_out, amount_out
        )));
    }

    let numerator = reserve_in
        .checked_mul(wanted)
        .ok_or_else(|| AdapterError::arithmetic("exact-out input"))?;
    let net_in = div_ceil(numerator, reserve_out - wanted)
        .ok_or_else(|| AdapterError::arithmetic("exact-out input"))?;

    let rate = pool.fee_rate;
    let gross = net_in
        .checked_mul(u128::from(rate.denominator))
        .and_then(|n| div_ceil(n, u128::from(rate.denominator - rate.numerator)))
        .ok_or_else(|| AdapterError::arithmetic("exact-out input"))?;
    let amount_in =
        u64::try_from(gross).map_err(|_| AdapterError::arithmetic("exact-out input"))?;
    let fee = u64::try_from(gross - net_in).map_err(|_| AdapterError::arithmetic("exact-out fee"))?;

    Ok(Quote {
        amount_in,
        amount_out,
        fee,
        price_impact_ppm: price_impact_ppm(net_in, reserve_in)?,
    })
}

/// The amount a swap works with: `params.amount`, or for exact-input swaps the
/// known amount of the incoming coin.
pub fn swap_amount(params: &SwapParams, upstream: Option<u64>) -> Result<u64, AdapterError> {
    match (params.amount, params.amount_mode) {
        (Some(amount), _) => Ok(amount.0),
        (None, AmountMode::ExactIn) => upstream.ok_or_else(|| {
            AdapterError::invalid(
                "amount",
                "no amount given and the incoming coin amount is unknown",
            )
        }),
        (None, AmountMode::ExactOut) => Err(AdapterError::invalid(
            "amount",
            "exact-output swaps must state the output amount",
        )),
    }
}

pub fn sqrt_price_limit(params: &SwapParams) -> Result<u128, AdapterError> {
    match &params.sqrt_price_limit {
        Some(text) => text
            .parse()
            .map_err(|_| AdapterError::invalid("sqrt_price_limit", format!("'{}' is not a u128", text))),
        None => Ok(default_sqrt_price_limit(params.direction.a2b())),
    }
}

fn check_pool_matches(pool: &PoolState, params: &SwapParams) -> Result<(), AdapterError> {
    if pool.coin_type_a != params.coin_type_a || pool.coin_type_b != params.coin_type_b {
        return Err(AdapterError::invalid(
            "pool_id",
            format!(
                "pool '{}' trades {}/{}, not {}/{}",
                pool.pool_id,
                pool.coin_type_a,
                pool.coin_type_b,
                params.coin_type_a,
                params.coin_type_b
            ),
        ));
    }
    Ok(())
}

/// Quotes a swap against live pool state and derives its slippage bound.
///
/// When the pool cannot be read and `mode` is [`EstimateMode::BestEffort`], the result
/// is a 1:1 estimate flagged [`EstimateQuality::BestEffort`]. A pool that does not
/// exist is always an error.
pub async fn estimate_swap(
    pools: &dyn PoolStateReader,
    mode: EstimateMode,
    params: &SwapParams,
    upstream: Option<u64>,
) -> Result<SwapEstimate, AdapterError> {
    let amount = swap_amount(params, upstream)?;
    let a2b = params.direction.a2b();
    let limit = sqrt_price_limit(params)?;

    let pool = match pools.get_pool_state(&params.pool_id).await {
        Ok(pool) => pool,
        Err(LookupError::Unavailable { key, reason }) => {
            if mode == EstimateMode::BestEffort {
                warn!(pool = %key, %reason, "pool state unavailable, falling back to a best-effort estimate");
                return best_effort(params, amount, limit);
            }
            return Err(AdapterError::PoolUnavailable {
                pool_id: key,
                reason,
            });
        }
        Err(err) => return Err(err.into()),
    };
    check_pool_matches(&pool, params)?;

    let (quote, amount_limit) = match params.amount_mode {
        AmountMode::ExactIn => {
            let quote = quote_exact_in(&pool, a2b, amount)?;
            (quote, params.slippage_tolerance.min_output(quote.amount_out))
        }
        AmountMode::ExactOut => {
            let quote = quote_exact_out(&pool, a2b, amount)?;
            (quote, params.slippage_tolerance.max_input(quote.amount_in)?)
        }
    };
    debug!(
        pool = %pool.pool_id,
        amount_in = quote.amount_in,
        amount_out = quote.amount_out,
        amount_limit,
        "swap quoted"
    );

    Ok(SwapEstimate {
        amount_in: quote.amount_in,
        amount_out: quote.amount_out,
        fee: quote.fee,
        price_impact_ppm: quote.price_impact_ppm,
        sqrt_price_limit: limit,
        amount_limit,
        quality: EstimateQuality::Live,
    })
}

fn best_effort(params: &SwapParams, amount: u64, limit: u128) -> Result<SwapEstimate, AdapterError> {
    let amount_limit = match params.amount_mode {
        AmountMode::ExactIn => params.slippage_tolerance.min_output(amount),
        AmountMode::ExactOut => params.slippage_tolerance.max_input(amount)?,
    };
    Ok(SwapEstimate {
        amount_in: amount,
        amount_out: amount,
        fee: 0,
        price_impact_ppm: 0,
        sqrt_price_limit: limit,
        amount_limit,
        quality: EstimateQuality::BestEffort,
    })
}
