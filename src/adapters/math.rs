//! Fixed-point rationals used for fees and slippage.
//!
//! Everything here is integer arithmetic: on-chain code rounds with integers, so the
//! compiler must produce bit-identical limits.

use crate::error::AdapterError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Denominator of every parts-per-million quantity.
pub const PPM: u64 = 1_000_000;

/// A fee expressed as `numerator / denominator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRate {
    pub numerator: u64,
    pub denominator: u64,
}

impl FeeRate {
    pub const ZERO: FeeRate = FeeRate::new(0, 1);

    pub const fn new(numerator: u64, denominator: u64) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub const fn from_ppm(ppm: u64) -> Self {
        Self::new(ppm, PPM)
    }

    /// `floor(amount * numerator / denominator)`.
    pub fn apply(&self, amount: u64) -> Result<u64, AdapterError> {
        if self.denominator == 0 {
            return Err(AdapterError::arithmetic("fee rate with zero denominator"));
        }
        let fee = u128::from(amount) * u128::from(self.numerator) / u128::from(self.denominator);
        u64::try_from(fee).map_err(|_| AdapterError::arithmetic("fee exceeds u64"))
    }

    /// Principal plus fee, i.e. what has to be handed back to the lender.
    pub fn with_fee(&self, amount: u64) -> Result<u64, AdapterError> {
        amount
            .checked_add(self.apply(amount)?)
            .ok_or_else(|| AdapterError::arithmetic("repay amount exceeds u64"))
    }

    pub fn is_valid(&self) -> bool {
        self.denominator != 0 && self.numerator < self.denominator
    }
}

impl fmt::Display for FeeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Slippage tolerance in parts-per-million of the estimated amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Slippage {
    ppm: u32,
}

impl Slippage {
    pub fn from_ppm(ppm: u32) -> Option<Self> {
        (u64::from(ppm) < PPM).then_some(Self { ppm })
    }

    /// Parses a decimal fraction such as `"0.01"`. Digits beyond the sixth decimal
    /// place are truncated, which only ever tightens the bound.
    pub fn from_decimal_str(text: &str) -> Option<Self> {
        let fraction = Decimal::from_str(text.trim()).ok()?;
        if fraction.is_sign_negative() || fraction >= Decimal::ONE {
            return None;
        }
        let ppm = (fraction * Decimal::from(PPM)).trunc().to_u32()?;
        Self::from_ppm(ppm)
    }

    pub fn ppm(&self) -> u32 {
        self.ppm
    }

    pub fn as_decimal(&self) -> Decimal {
        Decimal::new(i64::from(self.ppm), 6).normalize()
    }

    /// Minimum acceptable output for an exact-input swap: `floor(out * (1 - s))`.
    pub fn min_output(&self, estimated_output: u64) -> u64 {
        let scaled = u128::from(estimated_output) * u128::from(PPM - u64::from(self.ppm));
        // Never larger than the estimate, so it always fits.
        (scaled / u128::from(PPM)) as u64
    }

    /// Maximum acceptable input for an exact-output swap: `floor(in * (1 + s))`.
    pub fn max_input(&self, estimated_input: u64) -> Result<u64, AdapterError> {
        let scaled = u128::from(estimated_input) * u128::from(PPM + u64::from(self.ppm));
        u64::try_from(scaled / u128::from(PPM))
            .map_err(|_| AdapterError::arithmetic("maximum input exceeds u64"))
    }
}

impl fmt::Display for Slippage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ppm", self.ppm)
    }
}

impl Serialize for Slippage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.as_decimal().to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDecimal {
    Text(String),
    Number(f64),
}

impl<'de> Deserialize<'de> for Slippage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = match RawDecimal::deserialize(deserializer)? {
            RawDecimal::Text(s) => s,
            RawDecimal::Number(n) => n.to_string(),
        };
        Slippage::from_decimal_str(&text).ok_or_else(|| {
            serde::de::Error::custom(format!("slippage '{}' is not a fraction in [0, 1)", text))
        })
    }
}

/// Ceiling division for the exact-output direction of the quoting math.
pub(crate) fn div_ceil(numerator: u128, denominator: u128) -> Option<u128> {
    if denominator == 0 {
        return None;
    }
    Some(numerator.div_ceil(denominator))
}
