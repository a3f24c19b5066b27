//! Read-only services the adapters consult while compiling: pool state and
//! package/object address lookups.

use super::math::FeeRate;
use crate::error::LookupError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The chain an address book describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    #[default]
    Testnet,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Network::Mainnet => write!(f, "mainnet"),
            Network::Testnet => write!(f, "testnet"),
        }
    }
}

/// A snapshot of a constant-product pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    pub pool_id: String,
    pub coin_type_a: String,
    pub coin_type_b: String,
    pub reserve_a: u128,
    pub reserve_b: u128,
    pub fee_rate: FeeRate,
}

impl PoolState {
    /// `(reserve_in, reserve_out)` for a swap in the given direction.
    pub fn reserves(&self, a2b: bool) -> (u128, u128) {
        if a2b {
            (self.reserve_a, self.reserve_b)
        } else {
            (self.reserve_b, self.reserve_a)
        }
    }
}

/// Where a protocol's entry points live and which shared object they operate on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolAddress {
    pub package_id: String,
    pub object_id: String,
}

#[async_trait]
pub trait PoolStateReader: Send + Sync {
    async fn get_pool_state(&self, pool_id: &str) -> Result<PoolState, LookupError>;
}

#[async_trait]
pub trait AddressRegistry: Send + Sync {
    /// Resolves a key such as `"NAVI:0x2::sui::SUI"` or `"CETUS"`.
    async fn resolve_address(&self, key: &str) -> Result<ProtocolAddress, LookupError>;
}

/// Pool states held in memory. Pools can be marked unavailable to simulate an
/// unreachable RPC.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticPoolReader {
    #[serde(default)]
    pools: BTreeMap<String, PoolState>,
    #[serde(default)]
    unavailable: BTreeSet<String>,
}

impl StaticPoolReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool(mut self, pool: PoolState) -> Self {
        self.pools.insert(pool.pool_id.clone(), pool);
        self
    }

    pub fn mark_unavailable(mut self, pool_id: &str) -> Self {
        self.unavailable.insert(pool_id.to_string());
        self
    }

    /// Loads `{"pools": {"<id>": PoolState, ...}, "unavailable": [...]}`.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn len(&self) -> usize {
        self.pools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

#[async_trait]
impl PoolStateReader for StaticPoolReader {
    async fn get_pool_state(&self, pool_id: &str) -> Result<PoolState, LookupError> {
        if self.unavailable.contains(pool_id) {
            return Err(LookupError::Unavailable {
                key: pool_id.to_string(),
                reason: "pool marked unavailable".to_string(),
            });
        }
        self.pools
            .get(pool_id)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(pool_id.to_string()))
    }
}

/// Addresses for a single network, held in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticAddressBook {
    #[serde(default)]
    entries: BTreeMap<String, ProtocolAddress>,
}

impl StaticAddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_address(mut self, key: &str, package_id: &str, object_id: &str) -> Self {
        self.entries.insert(
            key.to_string(),
            ProtocolAddress {
                package_id: package_id.to_string(),
                object_id: object_id.to_string(),
            },
        );
        self
    }

    /// Loads the table for `network` from `{"mainnet": {...}, "testnet": {...}}`.
    /// A missing section yields an empty book.
    pub fn from_json_str(text: &str, network: Network) -> Result<Self, serde_json::Error> {
        let mut tables: BTreeMap<Network, BTreeMap<String, ProtocolAddress>> =
            serde_json::from_str(text)?;
        Ok(Self {
            entries: tables.remove(&network).unwrap_or_default(),
        })
    }
}

#[async_trait]
impl AddressRegistry for StaticAddressBook {
    async fn resolve_address(&self, key: &str) -> Result<ProtocolAddress, LookupError> {
        self.entries
            .get(key)
            .cloned()
            .ok_or_else(|| LookupError::NotFound(key.to_string()))
    }
}
