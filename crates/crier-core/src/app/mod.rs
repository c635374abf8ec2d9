//! Application layer: combines the ports into the publish engine.
//!
//! - **DispatcherBuilder**: wiring and startup validation
//! - **Dispatcher**: submit / status / retry / redrive / list_targets / history
//! - **AdapterRegistry**: platform -> adapter
//! - **retry**: per-platform backoff wrapper
//! - **status**: task view over ledger records

pub mod builder;
pub mod dispatcher;
pub mod registry;
pub mod retry;
pub mod status;

pub use self::builder::{BuildError, DispatcherBuilder};
pub use self::dispatcher::{DEFAULT_PROBE_TIMEOUT, Dispatcher, MAX_CONCURRENCY};
pub use self::registry::{AdapterRegistry, RegistryError};
pub use self::retry::{MAX_RETRIES, RetryPolicy, publish_with_retry};
