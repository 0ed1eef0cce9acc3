//! Repeating sample timer.
//!
//! The timer owns at most one tokio task that calls a tick closure once per
//! period. Starting an already running timer and stopping an idle one are
//! both no-ops, and dropping the timer tears the task down.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Handle to a cancellable repeating task.
#[derive(Debug)]
pub struct SampleTimer {
    period: Duration,
    task: Option<JoinHandle<()>>,
}

impl SampleTimer {
    /// Create an idle timer with the given period.
    pub fn new(period: Duration) -> Self {
        Self { period, task: None }
    }

    /// Start calling `tick` once per period, first after one full period.
    ///
    /// Must be called from within a tokio runtime. Returns `false` without
    /// spawning anything if the timer is already running.
    pub fn start<F>(&mut self, mut tick: F) -> bool
    where
        F: FnMut() + Send + 'static,
    {
        if self.is_running() {
            tracing::debug!("Sample timer already running, start ignored");
            return false;
        }

        let period = self.period;
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                tick();
            }
        });

        tracing::debug!(period_ms = period.as_millis() as u64, "Sample timer started");
        self.task = Some(handle);
        true
    }

    /// Cancel the pending task. Returns `false` if nothing was running.
    pub fn stop(&mut self) -> bool {
        match self.task.take() {
            Some(handle) => {
                handle.abort();
                tracing::debug!("Sample timer stopped");
                true
            }
            None => false,
        }
    }

    /// Whether a task is currently scheduled.
    pub fn is_running(&self) -> bool {
        self.task
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Drop for SampleTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        (count, move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_ticks_on_period() {
        let (count, tick) = counter();
        let mut timer = SampleTimer::new(Duration::from_millis(10));

        assert!(timer.start(tick));
        assert!(timer.is_running());

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(30)).await;
        let ticks = count.load(Ordering::SeqCst);
        assert!((2..=4).contains(&ticks), "unexpected tick count {ticks}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_keeps_single_task() {
        let (count, tick) = counter();
        let (other_count, other_tick) = counter();
        let mut timer = SampleTimer::new(Duration::from_millis(10));

        assert!(timer.start(tick));
        assert!(!timer.start(other_tick));

        tokio::time::sleep(Duration::from_millis(35)).await;
        let ticks = count.load(Ordering::SeqCst);
        assert!((2..=4).contains(&ticks), "unexpected tick count {ticks}");
        assert_eq!(other_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_and_is_idempotent() {
        let (count, tick) = counter();
        let mut timer = SampleTimer::new(Duration::from_millis(10));

        assert!(!timer.stop());
        assert!(!timer.is_running());

        timer.start(tick);
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(timer.stop());
        assert!(!timer.stop());
        assert!(!timer.is_running());

        let frozen = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), frozen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_stop() {
        let (count, tick) = counter();
        let (_, second_tick) = counter();
        let mut timer = SampleTimer::new(Duration::from_millis(10));

        timer.start(tick);
        timer.stop();
        assert!(timer.start(second_tick));
        assert!(timer.is_running());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_tears_down_task() {
        let (count, tick) = counter();
        {
            let mut timer = SampleTimer::new(Duration::from_millis(10));
            timer.start(tick);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
