//! # Sail - Strategy Compiler for Atomic DeFi Transactions
//!
//! **Sail** turns a graph of flash-loan, swap and custom-call nodes into a single ordered
//! list of move calls that a chain executes atomically. A flash-loan receipt is a hot
//! potato: it has to be created and destroyed inside the same transaction, and the
//! compiler refuses any graph in which that cannot happen.
//!
//! ## Core Workflow
//!
//! 1.  **Validate the document**: `SchemaValidator` checks field presence, types and
//!     formats, reporting every problem with a rule id and a dotted path.
//! 2.  **Validate the graph**: `GraphValidator` checks references, port kinds, resource
//!     linearity, acyclicity and that every borrow is repaid to the same protocol.
//! 3.  **Order**: `TopologicalSort` linearizes the nodes with Kahn's algorithm, breaking
//!     ties by document order.
//! 4.  **Compile**: `TransactionBuilder` walks the ordered nodes, moves each input out of
//!     a per-compilation result cache, and dispatches to the adapter registered for the
//!     node's protocol. Adapters quote swaps, compute fees and limits with integer
//!     arithmetic, and emit call descriptors.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sail::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> std::result::Result<(), Box<dyn std::error::Error>> {
//! let pools = StaticPoolReader::from_json_str(&std::fs::read_to_string("pools.json")?)?;
//! let addresses = StaticAddressBook::from_json_str(
//!     &std::fs::read_to_string("addresses.json")?,
//!     Network::Testnet,
//! )?;
//!
//! let compiler = CompilerBuilder::with_defaults(
//!     Arc::new(pools),
//!     Arc::new(addresses),
//!     CompilerOptions::default(),
//! )
//! .build();
//!
//! let document: serde_json::Value =
//!     serde_json::from_str(&std::fs::read_to_string("strategy.json")?)?;
//! let compiled = compiler.compile(&document).await?;
//!
//! println!("{}", compiled);
//! compiled.save("strategy.bin")?;
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod compiler;
pub mod error;
pub mod prelude;
pub mod strategy;
pub mod topology;
pub mod validation;

pub use compiler::{CompilerBuilder, CompilerOptions, TransactionBuilder};
pub use strategy::{CompiledTransaction, Strategy};
