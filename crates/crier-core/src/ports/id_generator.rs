//! IdGenerator port: mints task ids.
//!
//! # Implementation
//! - **UlidGenerator**: ULID-based, timestamp taken from a `Clock`.

use ulid::Ulid;

use crate::domain::ids::{TASK_ID_LEN, TaskId};
use crate::ports::Clock;

pub trait IdGenerator: Send + Sync {
    fn generate_task_id(&self) -> TaskId;
}

/// Mints task ids from the random tail of a ULID.
///
/// The last `TASK_ID_LEN` Crockford characters of a ULID come from its
/// 80 random bits, so ids minted within the same millisecond stay distinct.
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_task_id(&self) -> TaskId {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        let ulid = Ulid::from_parts(timestamp_ms, rand::random());
        let encoded = ulid.to_string().to_ascii_lowercase();
        TaskId::new(&encoded[encoded.len() - TASK_ID_LEN..])
    }
}
