//! Ports: the traits the engine depends on.
//!
//! - `PlatformAdapter`: publishes to platforms (HTTP bridge, official APIs, ...)
//! - `ContentLedger`: durable state (articles, publish records, accounts)
//! - `Clock` / `IdGenerator`: time and task ids, swappable in tests

pub mod adapter;
pub mod clock;
pub mod id_generator;
pub mod ledger;

pub use self::adapter::PlatformAdapter;
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::ledger::ContentLedger;
