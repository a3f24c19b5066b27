//! Typed views over the protocol-specific `params` map of a node.

use crate::adapters::math::Slippage;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A token amount in base units. Accepts `"1000"` or `1000` in documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Amount(pub u64);

impl Amount {
    pub fn parse(value: &Value) -> Option<u64> {
        match value {
            Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => {
                s.parse().ok()
            }
            Value::Number(n) => n.as_u64(),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        Amount::parse(&raw)
            .map(Amount)
            .ok_or_else(|| serde::de::Error::custom(format!("'{}' is not a u64 amount", raw)))
    }
}

/// Params shared by FLASH_BORROW and FLASH_REPAY nodes.
#[derive(Debug, Clone, Deserialize)]
pub struct FlashLoanParams {
    pub asset: String,
    #[serde(default)]
    pub amount: Option<Amount>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SwapDirection {
    AToB,
    BToA,
}

impl SwapDirection {
    pub const ALL: [&'static str; 2] = ["A_TO_B", "B_TO_A"];

    pub fn a2b(self) -> bool {
        matches!(self, SwapDirection::AToB)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AmountMode {
    ExactIn,
    ExactOut,
}

impl AmountMode {
    pub const ALL: [&'static str; 2] = ["EXACT_IN", "EXACT_OUT"];
}

#[derive(Debug, Clone, Deserialize)]
pub struct SwapParams {
    pub pool_id: String,
    pub coin_type_a: String,
    pub coin_type_b: String,
    pub direction: SwapDirection,
    pub amount_mode: AmountMode,
    pub slippage_tolerance: Slippage,
    #[serde(default)]
    pub amount: Option<Amount>,
    #[serde(default)]
    pub sqrt_price_limit: Option<String>,
    /// Fee-tier type argument some pools are generic over.
    #[serde(default)]
    pub fee_type: Option<String>,
}

impl SwapParams {
    pub fn coin_in(&self) -> &str {
        match self.direction {
            SwapDirection::AToB => &self.coin_type_a,
            SwapDirection::BToA => &self.coin_type_b,
        }
    }

    pub fn coin_out(&self) -> &str {
        match self.direction {
            SwapDirection::AToB => &self.coin_type_b,
            SwapDirection::BToA => &self.coin_type_a,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustomCallParams {
    pub target: String,
    #[serde(default)]
    pub type_arguments: Vec<String>,
    #[serde(default)]
    pub arguments: Vec<Value>,
}
