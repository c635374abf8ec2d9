//! Implementations of the ports.
//!
//! - **InMemoryLedger**: tests and dry runs
//! - **JsonFileLedger**: durable ledger for the CLI
//! - **BridgeAdapter**: article platforms through the sync bridge
//! - **ScriptedAdapter**: deterministic outcomes, no network

pub mod bridge;
pub mod json_ledger;
mod ledger_state;
pub mod memory_ledger;
pub mod scripted;

pub use self::bridge::{BridgeAdapter, BridgeConfig};
pub use self::json_ledger::JsonFileLedger;
pub use self::memory_ledger::InMemoryLedger;
pub use self::scripted::{Script, ScriptedAdapter};
