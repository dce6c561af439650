//! Time source for activity tracking.

use tokio::time::Instant;

/// Supplies "now" for last-activity stamps and idle checks.
///
/// Returns a tokio [`Instant`] so a paused test runtime controls it.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

/// The runtime's clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}
