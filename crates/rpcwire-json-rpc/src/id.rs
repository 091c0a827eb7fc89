//! Correlation ID generation for outbound calls.

use std::sync::atomic::{AtomicI64, Ordering};

use uuid::Uuid;

use crate::types::RequestId;

/// Source of correlation IDs, injected into clients at construction.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> RequestId;
}

/// 128-bit random IDs rendered as hyphenated hex (`xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`).
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn next_id(&self) -> RequestId {
        RequestId::String(Uuid::new_v4().hyphenated().to_string())
    }
}

/// Monotonic integer IDs; deterministic, for tests and single-client tooling.
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    next: AtomicI64,
}

impl SequentialIdGenerator {
    pub fn starting_at(first: i64) -> Self {
        Self {
            next: AtomicI64::new(first),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> RequestId {
        RequestId::Number(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
