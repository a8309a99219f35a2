//! Periodic background task scoped to an owner's lifetime
//!
//! The position tracker and the recording ticker are `ScopedTask`s stored in
//! the slot they observe. Dropping the `ScopedTask` cancels its token and
//! aborts the task, so clearing the field is the whole teardown.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

pub(crate) struct ScopedTask {
    name: &'static str,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ScopedTask {
    /// Run `tick` every `period` until it returns false or the task is dropped
    ///
    /// The first tick fires one full period after spawning. `tick` receives the
    /// task's token so it can re-check cancellation after acquiring a lock.
    pub(crate) fn spawn_periodic<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        if !tick(token.clone()).await {
                            break;
                        }
                    }
                }
            }
            trace!("{} task exited", name);
        });

        trace!("{} task started ({}ms)", name, period.as_millis());
        Self { name, cancel, handle }
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for ScopedTask {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.handle.abort();
        trace!("{} task cancelled", self.name);
    }
}

impl std::fmt::Debug for ScopedTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedTask")
            .field("name", &self.name)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("finished", &self.is_finished())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(count: &Arc<AtomicUsize>, limit: usize) -> ScopedTask {
        let count = Arc::clone(count);
        ScopedTask::spawn_periodic("test", Duration::from_millis(100), move |_| {
            let count = Arc::clone(&count);
            async move { count.fetch_add(1, Ordering::SeqCst) + 1 < limit }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_once_per_period() {
        let count = Arc::new(AtomicUsize::new(0));
        let _task = counting(&count, usize::MAX);

        tokio::time::sleep(Duration::from_millis(350)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_ticking() {
        let count = Arc::new(AtomicUsize::new(0));
        let task = counting(&count, usize::MAX);

        tokio::time::sleep(Duration::from_millis(250)).await;
        drop(task);
        let seen = count.load(Ordering::SeqCst);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_returning_false_ends_task() {
        let count = Arc::new(AtomicUsize::new(0));
        let task = counting(&count, 2);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(task.is_finished());
    }
}
