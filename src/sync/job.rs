//! The periodic background sync job (§4.6): a single Tokio task per user
//! that calls [`Syncer::full_sync`] on a fixed interval until stopped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::DEFAULT_SYNC_INTERVAL;

use super::executor::Syncer;

struct RunningJob {
    user_id: i64,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Idle until [`SyncJob::start`] spawns a ticking task; calling `start`
/// again (for the same or a different user) stops whatever was previously
/// running first, so at most one tick loop is ever in flight.
pub struct SyncJob {
    syncer: Arc<dyn Syncer>,
    running: Mutex<Option<RunningJob>>,
}

impl SyncJob {
    pub fn new(syncer: Arc<dyn Syncer>) -> Self {
        Self {
            syncer,
            running: Mutex::new(None),
        }
    }

    /// Start ticking `full_sync(user_id, ..)` every `interval`, substituting
    /// [`DEFAULT_SYNC_INTERVAL`] when `interval` is zero. Idempotent: a
    /// prior run (for this or any other user) is stopped before the new one
    /// begins, so repeated calls never leak tasks.
    pub async fn start(&self, user_id: i64, interval: Duration) {
        self.stop().await;

        let interval = if interval.is_zero() {
            DEFAULT_SYNC_INTERVAL
        } else {
            interval
        };
        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let syncer = Arc::clone(&self.syncer);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; skip it so `start` doesn't
            // race a sync against the caller's own initial state load.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => {
                        debug!(user_id, "sync job stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = syncer.full_sync(user_id, &task_cancel).await {
                            warn!(user_id, error = %e, "periodic sync failed");
                        }
                    }
                }
            }
        });

        *self.running.lock().await = Some(RunningJob {
            user_id,
            cancel,
            handle,
        });
    }

    /// Start with [`DEFAULT_SYNC_INTERVAL`].
    pub async fn start_default(&self, user_id: i64) {
        self.start(user_id, DEFAULT_SYNC_INTERVAL).await;
    }

    /// Stop the running task, if any, and wait for it to exit. A no-op if
    /// nothing is running.
    pub async fn stop(&self) {
        let job = self.running.lock().await.take();
        if let Some(job) = job {
            job.cancel.cancel();
            let _ = job.handle.await;
        }
    }

    /// The user_id the currently running task (if any) is syncing.
    pub async fn running_user_id(&self) -> Option<i64> {
        self.running.lock().await.as_ref().map(|j| j.user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSyncer {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Syncer for CountingSyncer {
        async fn full_sync(&self, _user_id: i64, _ctx: &CancellationToken) -> super::super::error::SyncResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Spec §8 scenario 5: sync job cadence.
    #[tokio::test]
    async fn ticks_at_least_three_times_in_fifty_five_milliseconds_then_stops() {
        let calls = Arc::new(AtomicUsize::new(0));
        let job = SyncJob::new(Arc::new(CountingSyncer { calls: calls.clone() }));

        job.start(1, Duration::from_millis(10)).await;
        tokio::time::sleep(Duration::from_millis(55)).await;
        job.stop().await;

        assert!(calls.load(Ordering::SeqCst) >= 3, "calls = {}", calls.load(Ordering::SeqCst));

        let after_stop = calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(calls.load(Ordering::SeqCst), after_stop, "ticks continued after stop");
    }

    /// Spec §8 scenario 6: restarting for a new user stops the old task.
    #[tokio::test]
    async fn starting_for_a_new_user_stops_the_previous_worker() {
        let calls = Arc::new(AtomicUsize::new(0));
        let job = SyncJob::new(Arc::new(CountingSyncer { calls: calls.clone() }));

        job.start(1, Duration::from_millis(10)).await;
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert_eq!(job.running_user_id().await, Some(1));

        job.start(2, Duration::from_millis(10)).await;
        assert_eq!(job.running_user_id().await, Some(2));

        tokio::time::sleep(Duration::from_millis(25)).await;
        job.stop().await;
        assert_eq!(job.running_user_id().await, None);
    }
}
