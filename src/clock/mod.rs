// Clock module - Logical time source for deadline evaluation
//
// The ledger never reads wall time directly. Every campaign operation asks
// an injected Clock, so simulations and tests can drive deadlines by hand.

mod manual;
mod system;

pub use manual::ManualClock;
pub use system::SystemClock;

/// Query-only, monotonic source of the current logical time
pub trait Clock: Send + Sync {
    /// Current logical time. Never decreases between calls.
    fn now(&self) -> u64;
}
