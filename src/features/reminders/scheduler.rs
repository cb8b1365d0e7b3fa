//! Per-reminder timer scheduling
//!
//! Each scheduled reminder owns one spawned tokio task. The task sleeps to
//! the next minute boundary, checks its schedule against the wall clock and
//! fires at most once per matching minute. A slow or failing fire callback
//! only ever delays its own reminder.
//!
//! Wall-clock reads go through the [`Clock`] trait so tests can drive a
//! virtual clock against tokio's paused time.

// `::cron` is the crates.io parser; plain `cron` would hit our wrapper module
use ::cron::Schedule;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use crate::features::reminders::cron;

/// Source of wall-clock time for timer tick decisions.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Spawns and owns nothing itself; hands out one [`TimerHandle`] per call.
#[derive(Clone)]
pub struct Scheduler {
    clock: Arc<dyn Clock>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Scheduler { clock }
    }

    /// Spawn a timer task evaluating `schedule` once per minute boundary.
    ///
    /// `on_fire` is invoked exactly once for each minute the schedule
    /// matches while the timer is live. The first evaluation happens at the
    /// next minute boundary strictly after the call, never inside the
    /// current minute.
    pub fn schedule<F, Fut>(&self, schedule: Schedule, on_fire: F) -> TimerHandle
    where
        F: Fn() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let stopped = Arc::new(AtomicBool::new(false));
        let stop_signal = Arc::new(Notify::new());

        let clock = self.clock.clone();
        let task_stopped = stopped.clone();
        let task_signal = stop_signal.clone();

        let task = tokio::spawn(async move {
            let mut last_fired: Option<DateTime<Utc>> = None;

            loop {
                if task_stopped.load(Ordering::SeqCst) {
                    break;
                }

                let wait = until_next_minute(clock.now());
                tokio::select! {
                    _ = task_signal.notified() => break,
                    _ = tokio::time::sleep(wait) => {}
                }

                if task_stopped.load(Ordering::SeqCst) {
                    break;
                }

                let minute = cron::minute_of(clock.now());
                if last_fired == Some(minute) {
                    continue;
                }

                if cron::matches_minute(&schedule, minute) {
                    last_fired = Some(minute);
                    // Last look at the flag: a stop() that has returned must
                    // never be followed by a fresh fire
                    if task_stopped.load(Ordering::SeqCst) {
                        break;
                    }
                    on_fire().await;
                }
            }
        });

        TimerHandle {
            stopped,
            stop_signal,
            _task: task,
        }
    }
}

/// Time left until the next minute boundary strictly after `now`.
fn until_next_minute(now: DateTime<Utc>) -> Duration {
    let next = cron::minute_of(now) + ChronoDuration::seconds(60);
    (next - now).to_std().unwrap_or(Duration::from_secs(60))
}

/// Exclusive handle to one running timer task.
pub struct TimerHandle {
    stopped: Arc<AtomicBool>,
    stop_signal: Arc<Notify>,
    _task: tokio::task::JoinHandle<()>,
}

impl TimerHandle {
    /// Stop the timer. Idempotent.
    ///
    /// After this returns no new fire can start; a fire already in flight
    /// is left to finish. The stored notify permit wakes the task even if
    /// it has not reached its sleep yet, so the timer never lingers for a
    /// full minute after being stopped.
    pub fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        self.stop_signal.notify_one();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reminders::test_support::VirtualClock;
    use chrono::TimeZone;
    use std::sync::atomic::AtomicUsize;

    fn counting_scheduler(base: DateTime<Utc>) -> (Scheduler, Arc<AtomicUsize>) {
        let scheduler = Scheduler::with_clock(Arc::new(VirtualClock::starting_at(base)));
        (scheduler, Arc::new(AtomicUsize::new(0)))
    }

    fn count_fires(counter: &Arc<AtomicUsize>) -> impl Fn() -> std::future::Ready<()> + Send + 'static {
        let counter = counter.clone();
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_per_matching_minute() {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let (scheduler, fires) = counting_scheduler(base);

        let handle = scheduler.schedule(cron::parse("* * * * *").unwrap(), count_fires(&fires));

        tokio::time::sleep(Duration::from_secs(5 * 60 + 1)).await;
        assert_eq!(fires.load(Ordering::SeqCst), 5);

        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_fire_before_first_minute_boundary() {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 30).unwrap();
        let (scheduler, fires) = counting_scheduler(base);

        let handle = scheduler.schedule(cron::parse("* * * * *").unwrap(), count_fires(&fires));

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(fires.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fires.load(Ordering::SeqCst), 1);

        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_schedule_fires_on_step_minutes_only() {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let (scheduler, fires) = counting_scheduler(base);

        let handle = scheduler.schedule(cron::parse("*/5 * * * *").unwrap(), count_fires(&fires));

        // Minutes 1..=4 do not match, minute 5 does
        tokio::time::sleep(Duration::from_secs(4 * 60 + 1)).await;
        assert_eq!(fires.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fires.load(Ordering::SeqCst), 1);

        handle.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_suppresses_future_fires() {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let (scheduler, fires) = counting_scheduler(base);

        let handle = scheduler.schedule(cron::parse("* * * * *").unwrap(), count_fires(&fires));

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(fires.load(Ordering::SeqCst), 1);

        handle.stop();
        assert!(handle.is_stopped());

        tokio::time::sleep(Duration::from_secs(2 * 60 + 1)).await;
        assert_eq!(fires.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_just_before_boundary_prevents_fire() {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let (scheduler, fires) = counting_scheduler(base);

        let handle = scheduler.schedule(cron::parse("* * * * *").unwrap(), count_fires(&fires));

        // Timer is mid-sleep, one second short of its first matching minute
        tokio::time::sleep(Duration::from_secs(59)).await;
        handle.stop();

        tokio::time::sleep(Duration::from_secs(3 * 60)).await;
        assert_eq!(fires.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let (scheduler, fires) = counting_scheduler(base);

        let handle = scheduler.schedule(cron::parse("* * * * *").unwrap(), count_fires(&fires));

        handle.stop();
        handle.stop();
        assert!(handle.is_stopped());

        tokio::time::sleep(Duration::from_secs(3 * 60)).await;
        assert_eq!(fires.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_fire_does_not_affect_other_timers() {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let scheduler = Scheduler::with_clock(Arc::new(VirtualClock::starting_at(base)));

        let slow_fires = Arc::new(AtomicUsize::new(0));
        let slow_counter = slow_fires.clone();
        let slow = scheduler.schedule(cron::parse("* * * * *").unwrap(), move || {
            let counter = slow_counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                // Delivery stuck well past the next boundary
                tokio::time::sleep(Duration::from_secs(10 * 60)).await;
            }
        });

        let fast_fires = Arc::new(AtomicUsize::new(0));
        let fast = scheduler.schedule(
            cron::parse("* * * * *").unwrap(),
            count_fires(&fast_fires),
        );

        tokio::time::sleep(Duration::from_secs(5 * 60 + 1)).await;
        assert_eq!(slow_fires.load(Ordering::SeqCst), 1);
        assert_eq!(fast_fires.load(Ordering::SeqCst), 5);

        slow.stop();
        fast.stop();
    }
}
