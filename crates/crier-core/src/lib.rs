//! crier-core
//!
//! Publish one piece of content to many platforms at once.
//!
//! # Modules
//! - **domain**: requests, fingerprints, records, statuses, results, errors
//! - **ports**: `PlatformAdapter`, `ContentLedger`, `Clock`, `IdGenerator`
//! - **app**: the `Dispatcher` engine and its builder
//! - **impls**: ledgers and adapters

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{Dispatcher, DispatcherBuilder};
pub use domain::CrierError;
