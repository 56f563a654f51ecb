//! Periodic recompute for live displays
//!
//! Each subscriber gets its own tokio task that calls a pure recompute
//! function on a fixed period and publishes the result on a watch channel.
//! Only the newest value is kept, so a late reader never sees a backlog.
//! Cancelling or dropping one handle stops only that task.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::trace;

use crate::activity::{ActivityTypeDefinition, TimerSnapshot};

/// Receiving end of one ticker
pub struct TickerHandle<T> {
    rx: watch::Receiver<T>,
    task: JoinHandle<()>,
}

impl<T: Clone> TickerHandle<T> {
    /// Wait for a value newer than the last one read. `None` after cancellation.
    pub async fn next(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        let value = self.rx.borrow_and_update().clone();
        Some(value)
    }
}

impl<T> TickerHandle<T> {
    pub fn cancel(self) {
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T> Drop for TickerHandle<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Shortest accepted period; `tokio::time::interval` rejects zero
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Call `recompute` with the current time every `period`, starting immediately.
///
/// Periods below [`MIN_PERIOD`] are raised to it.
pub fn spawn_with<T, F>(period: Duration, mut recompute: F) -> TickerHandle<T>
where
    T: Send + Sync + 'static,
    F: FnMut(DateTime<Utc>) -> T + Send + 'static,
{
    let (tx, rx) = watch::channel(recompute(Utc::now()));
    let period = period.max(MIN_PERIOD);

    let task = tokio::spawn(async move {
        let mut ticks = interval(period);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticks.tick().await;
            if tx.is_closed() {
                trace!("ticker receiver dropped");
                break;
            }
            tx.send_replace(recompute(Utc::now()));
        }
    });

    TickerHandle { rx, task }
}

/// Tick a single activity timer
pub fn spawn(
    started_at: DateTime<Utc>,
    def: ActivityTypeDefinition,
    period: Duration,
) -> TickerHandle<TimerSnapshot> {
    spawn_with(period, move |now| {
        TimerSnapshot::compute(started_at, now, &def)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::defaults::find_built_in;
    use crate::activity::TimerStatus;

    #[tokio::test]
    async fn test_ticks_recompute_from_start_time() {
        let def = find_built_in("potty").unwrap().to_definition();
        let started_at = Utc::now() - chrono::Duration::minutes(25);
        let mut handle = spawn(started_at, def, Duration::from_millis(10));

        for _ in 0..3 {
            let snap = handle.next().await.unwrap();
            assert_eq!(snap.elapsed_minutes, 25);
            assert_eq!(snap.status, TimerStatus::Warning);
        }
        handle.cancel();
    }

    #[tokio::test]
    async fn test_cancelling_one_leaves_others_running() {
        let mut first = spawn_with(Duration::from_millis(5), |_| 1u8);
        let mut second = spawn_with(Duration::from_millis(5), |_| 2u8);

        assert_eq!(first.next().await, Some(1));
        assert_eq!(second.next().await, Some(2));

        first.cancel();

        for _ in 0..3 {
            assert_eq!(second.next().await, Some(2));
        }
    }

    #[tokio::test]
    async fn test_next_returns_none_after_task_ends() {
        let mut handle = spawn_with(Duration::from_millis(5), |_| ());
        assert!(handle.next().await.is_some());
        handle.task.abort();
        // At most one unread value remains, then the channel closes
        while handle.next().await.is_some() {}
    }

    #[tokio::test]
    async fn test_late_reader_gets_fresh_value() {
        let mut handle = spawn_with(Duration::from_millis(10), |now| now);
        assert!(handle.next().await.is_some());

        tokio::time::sleep(Duration::from_millis(500)).await;

        let value = handle.next().await.unwrap();
        let age = (Utc::now() - value).num_milliseconds();
        assert!(age < 100, "snapshot is {} ms old", age);
    }

    #[tokio::test]
    async fn test_zero_period_is_clamped() {
        let mut handle = spawn_with(Duration::ZERO, |_| 7u8);
        assert_eq!(handle.next().await, Some(7));
        assert_eq!(handle.next().await, Some(7));
    }
}
