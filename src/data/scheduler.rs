//! Fixed-interval refresh driver for the polled channels.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::channel::RefreshTarget;

/// Default polling interval for status and traffic.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(5000);

/// Lifecycle of a [`RefreshScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Created, timer not armed.
    Idle,
    /// Timer armed and firing.
    Scheduled,
    /// Torn down. Terminal.
    Cancelled,
}

/// Errors from scheduler lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    #[error("refresh scheduler is already running")]
    AlreadyScheduled,

    #[error("refresh scheduler has been torn down")]
    TornDown,
}

/// Fires its targets once at mount and then on every interval boundary.
///
/// Each tick spawns one task per target and does not wait for it, so a slow
/// fetch never delays the next tick and overlapping refreshes of the same
/// target are possible; channels resolve those by issue order. Every spawned
/// task is bound to the scheduler's cancellation token, so nothing runs or
/// lands after [`teardown`](Self::teardown).
pub struct RefreshScheduler {
    interval: Duration,
    targets: Vec<Arc<dyn RefreshTarget>>,
    cancel: CancellationToken,
    state: SchedulerState,
    timer: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.targets.iter().map(|t| t.name()).collect();
        f.debug_struct("RefreshScheduler")
            .field("interval", &self.interval)
            .field("targets", &names)
            .field("state", &self.state)
            .finish()
    }
}

impl RefreshScheduler {
    /// Create an idle scheduler.
    pub fn new(
        interval: Duration,
        targets: Vec<Arc<dyn RefreshTarget>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            interval,
            targets,
            cancel,
            state: SchedulerState::Idle,
            timer: None,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Arm the timer. The first refresh fires immediately.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(&mut self) -> Result<(), SchedulerError> {
        match self.state {
            SchedulerState::Idle => {}
            SchedulerState::Scheduled => return Err(SchedulerError::AlreadyScheduled),
            SchedulerState::Cancelled => return Err(SchedulerError::TornDown),
        }

        info!(
            interval_ms = self.interval.as_millis() as u64,
            targets = self.targets.len(),
            "refresh scheduler mounted"
        );

        self.timer = Some(tokio::spawn(run_timer(
            self.interval,
            self.targets.clone(),
            self.cancel.clone(),
        )));
        self.state = SchedulerState::Scheduled;
        Ok(())
    }

    /// Disarm the timer and cancel outstanding refreshes. Idempotent.
    pub fn teardown(&mut self) {
        if self.state == SchedulerState::Cancelled {
            return;
        }
        self.cancel.cancel();
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
        self.state = SchedulerState::Cancelled;
        info!("refresh scheduler torn down");
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn run_timer(
    period: Duration,
    targets: Vec<Arc<dyn RefreshTarget>>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                for target in &targets {
                    debug!(target = target.name(), "scheduled refresh");
                    let target = Arc::clone(target);
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        tokio::select! {
                            _ = cancel.cancelled() => {}
                            _ = target.trigger() => {}
                        }
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counter {
        hits: AtomicUsize,
    }

    #[async_trait]
    impl RefreshTarget for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }

        async fn trigger(&self) {
            self.hits.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl Counter {
        fn hits(&self) -> usize {
            self.hits.load(Ordering::SeqCst)
        }
    }

    fn scheduler_with(targets: &[Arc<Counter>]) -> RefreshScheduler {
        let targets = targets.iter().map(|t| t.clone() as Arc<dyn RefreshTarget>).collect();
        RefreshScheduler::new(DEFAULT_REFRESH_INTERVAL, targets, CancellationToken::new())
    }

    async fn advance_to(start: tokio::time::Instant, ms: u64) {
        tokio::time::sleep_until(start + Duration::from_millis(ms)).await;
        // Let spawned refresh tasks run.
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_at_mount_and_every_interval() {
        let status = Arc::new(Counter::default());
        let traffic = Arc::new(Counter::default());
        let mut scheduler = scheduler_with(&[status.clone(), traffic.clone()]);
        let start = tokio::time::Instant::now();

        scheduler.mount().unwrap();
        advance_to(start, 0).await;
        assert_eq!((status.hits(), traffic.hits()), (1, 1));

        advance_to(start, 4_999).await;
        assert_eq!((status.hits(), traffic.hits()), (1, 1));

        advance_to(start, 5_000).await;
        assert_eq!((status.hits(), traffic.hits()), (2, 2));

        advance_to(start, 15_000).await;
        assert_eq!((status.hits(), traffic.hits()), (4, 4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_invocations_after_teardown() {
        let status = Arc::new(Counter::default());
        let mut scheduler = scheduler_with(&[status.clone()]);
        let start = tokio::time::Instant::now();

        scheduler.mount().unwrap();
        advance_to(start, 5_000).await;
        assert_eq!(status.hits(), 2);

        scheduler.teardown();
        assert_eq!(scheduler.state(), SchedulerState::Cancelled);

        advance_to(start, 60_000).await;
        assert_eq!(status.hits(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lifecycle_transitions() {
        let mut scheduler = scheduler_with(&[Arc::new(Counter::default())]);
        assert_eq!(scheduler.state(), SchedulerState::Idle);

        scheduler.mount().unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Scheduled);
        assert_eq!(scheduler.mount(), Err(SchedulerError::AlreadyScheduled));

        scheduler.teardown();
        scheduler.teardown();
        assert_eq!(scheduler.state(), SchedulerState::Cancelled);
        assert_eq!(scheduler.mount(), Err(SchedulerError::TornDown));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_target_does_not_delay_ticks() {
        struct Slow {
            started: AtomicUsize,
        }

        #[async_trait]
        impl RefreshTarget for Slow {
            fn name(&self) -> &'static str {
                "slow"
            }

            async fn trigger(&self) {
                self.started.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_secs(12)).await;
            }
        }

        let slow = Arc::new(Slow {
            started: AtomicUsize::new(0),
        });
        let mut scheduler = RefreshScheduler::new(
            DEFAULT_REFRESH_INTERVAL,
            vec![slow.clone() as Arc<dyn RefreshTarget>],
            CancellationToken::new(),
        );
        let start = tokio::time::Instant::now();

        scheduler.mount().unwrap();
        advance_to(start, 10_000).await;

        // Three overlapping refreshes in flight, none finished.
        assert_eq!(slow.started.load(Ordering::SeqCst), 3);
        scheduler.teardown();
    }
}
