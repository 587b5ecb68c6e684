use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::AppError;
use crate::models::shipment::DocketNumber;

/// Storage-level counter. `increment` must be a single atomic operation:
/// two concurrent calls may never observe the same value.
pub trait CounterStore: Send + Sync {
    fn prefix(&self) -> &str;
    fn increment(&self) -> Result<u64, AppError>;
}

pub struct InMemoryCounter {
    prefix: String,
    last_issued: AtomicU64,
}

impl InMemoryCounter {
    pub fn new(prefix: String, last_issued: u64) -> Self {
        Self {
            prefix,
            last_issued: AtomicU64::new(last_issued),
        }
    }
}

impl CounterStore for InMemoryCounter {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn increment(&self) -> Result<u64, AppError> {
        Ok(self.last_issued.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

pub fn allocate(counter: &dyn CounterStore) -> Result<DocketNumber, AppError> {
    let number = counter.increment()?;

    Ok(DocketNumber {
        prefix: counter.prefix().to_string(),
        number,
    })
}
