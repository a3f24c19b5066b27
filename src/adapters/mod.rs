//! Protocol adapters, grouped by the node type they compile, and the registry the
//! transaction builder dispatches through.

use crate::error::CompileError;
use ahash::AHashMap;
use itertools::Itertools;
use std::sync::Arc;

pub mod custom;
pub mod dex;
pub mod external;
pub mod flashloan;
pub mod math;

pub use custom::{CustomCallAdapter, MoveCallAdapter, ResolvedInput};
pub use dex::{
    CetusDex, DexAdapter, EstimateMode, EstimateQuality, SwapEstimate, SwapOutput, TurbosDex,
};
pub use external::{
    AddressRegistry, Network, PoolState, PoolStateReader, ProtocolAddress, StaticAddressBook,
    StaticPoolReader,
};
pub use flashloan::{BorrowOutput, DeepBookFlashLoan, FlashLoanAdapter, NaviFlashLoan};
pub use math::{FeeRate, Slippage};

/// Adapters keyed by protocol name, one table per family. Keys are matched
/// case-insensitively.
#[derive(Default)]
pub struct AdapterRegistry {
    flash_loans: AHashMap<String, Box<dyn FlashLoanAdapter>>,
    dexes: AHashMap<String, Box<dyn DexAdapter>>,
    custom: AHashMap<String, Box<dyn CustomCallAdapter>>,
}

fn key(protocol: &str) -> String {
    protocol.to_ascii_uppercase()
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// NAVI and DEEPBOOK flash loans, CETUS and TURBOS swaps, and the CUSTOM move call.
    pub fn with_defaults(
        pools: Arc<dyn PoolStateReader>,
        addresses: Arc<dyn AddressRegistry>,
        mode: EstimateMode,
    ) -> Self {
        let mut registry = Self::new();
        registry.register_flash_loan(Box::new(NaviFlashLoan::new(addresses.clone())));
        registry.register_flash_loan(Box::new(DeepBookFlashLoan::new(addresses.clone())));
        registry.register_dex(Box::new(CetusDex::new(pools.clone(), addresses.clone(), mode)));
        registry.register_dex(Box::new(TurbosDex::new(pools, addresses, mode)));
        registry.register_custom(Box::new(MoveCallAdapter::new()));
        registry
    }

    /// Registers an adapter, replacing any previous one for the same protocol.
    pub fn register_flash_loan(&mut self, adapter: Box<dyn FlashLoanAdapter>) {
        self.flash_loans.insert(key(adapter.protocol()), adapter);
    }

    pub fn register_dex(&mut self, adapter: Box<dyn DexAdapter>) {
        self.dexes.insert(key(adapter.protocol()), adapter);
    }

    pub fn register_custom(&mut self, adapter: Box<dyn CustomCallAdapter>) {
        self.custom.insert(key(adapter.protocol()), adapter);
    }

    pub fn flash_loan(&self, node_id: &str, protocol: &str) -> Result<&dyn FlashLoanAdapter, CompileError> {
        self.flash_loans
            .get(&key(protocol))
            .map(|adapter| &**adapter)
            .ok_or_else(|| unsupported(node_id, protocol, "flash-loan"))
    }

    pub fn dex(&self, node_id: &str, protocol: &str) -> Result<&dyn DexAdapter, CompileError> {
        self.dexes
            .get(&key(protocol))
            .map(|adapter| &**adapter)
            .ok_or_else(|| unsupported(node_id, protocol, "DEX"))
    }

    pub fn custom(&self, node_id: &str, protocol: &str) -> Result<&dyn CustomCallAdapter, CompileError> {
        self.custom
            .get(&key(protocol))
            .map(|adapter| &**adapter)
            .ok_or_else(|| unsupported(node_id, protocol, "custom-call"))
    }

    /// Registered protocol names per family, sorted.
    pub fn protocols(&self) -> (Vec<&str>, Vec<&str>, Vec<&str>) {
        (
            self.flash_loans.keys().map(String::as_str).sorted().collect(),
            self.dexes.keys().map(String::as_str).sorted().collect(),
            self.custom.keys().map(String::as_str).sorted().collect(),
        )
    }
}

fn unsupported(node_id: &str, protocol: &str, family: &'static str) -> CompileError {
    CompileError::UnsupportedProtocol {
        node_id: node_id.to_string(),
        protocol: protocol.to_string(),
        family,
    }
}
