//! Timer facility used by the collector.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::time::Instant;

/// Clock and timer source for collection timing.
///
/// Wall-clock times in a schedule are turned into waits through this trait so
/// the collector never touches the system clock directly.
#[async_trait]
pub trait Scheduler: Send + Sync + 'static {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;

    /// Complete once `deadline` has been reached. Returns immediately for a
    /// deadline in the past.
    async fn sleep_until(&self, deadline: DateTime<Utc>);
}

/// Scheduler backed by the tokio timer.
///
/// Wall-clock time is anchored once at construction and then advanced by the
/// runtime clock, so a paused tokio clock (`tokio::time::pause`) drives it in
/// virtual time.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    anchor_wall: DateTime<Utc>,
    anchor: Instant,
}

impl TokioScheduler {
    /// Anchor at the current system time.
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Anchor at an arbitrary wall-clock time (useful with a paused clock).
    pub fn starting_at(wall: DateTime<Utc>) -> Self {
        Self {
            anchor_wall: wall,
            anchor: Instant::now(),
        }
    }

    fn instant_for(&self, deadline: DateTime<Utc>) -> Instant {
        let offset = (deadline - self.anchor_wall)
            .to_std()
            .unwrap_or(Duration::ZERO);
        self.anchor + offset
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scheduler for TokioScheduler {
    fn now(&self) -> DateTime<Utc> {
        self.anchor_wall + self.anchor.elapsed()
    }

    async fn sleep_until(&self, deadline: DateTime<Utc>) {
        tokio::time::sleep_until(self.instant_for(deadline)).await;
    }
}
