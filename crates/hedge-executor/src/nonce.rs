//! Signature timestamps with monotonic guarantees.
//!
//! The order timestamp doubles as the exchange nonce, so two orders signed in
//! the same millisecond must still carry distinct values.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hedge_core::Clock;

/// Issues `max(last + 1, now_ms)`.
pub struct NonceManager {
    counter: AtomicU64,
    clock: Arc<dyn Clock>,
}

impl NonceManager {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            counter: AtomicU64::new(0),
            clock,
        }
    }

    /// Next timestamp in milliseconds. Thread-safe via CAS loop.
    pub fn next(&self) -> u64 {
        let target = self.clock.now_ms();

        loop {
            let current = self.counter.load(Ordering::Acquire);
            let next_val = current.saturating_add(1).max(target);

            match self.counter.compare_exchange_weak(
                current,
                next_val,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next_val,
                Err(_) => continue,
            }
        }
    }
}
