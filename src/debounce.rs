//! Debounce controller.
//! One owned timer slot instead of a page-global handle: every `schedule`
//! cancels the armed timer before arming a new one. When a timer fires its
//! task is dispatched as a separate tokio task, so later cancels never touch
//! work that has already started.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::{JoinError, JoinHandle};

#[derive(Default)]
pub struct Debouncer {
    /// Bumped on every schedule/cancel. A timer only dispatches if its
    /// generation is still current when it wakes.
    generation: Arc<AtomicU64>,
    timer: Mutex<Option<JoinHandle<()>>>,
    dispatched: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Debouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels any pending timer, then arms one that runs `task` after `delay`.
    /// Must be called from inside a tokio runtime.
    pub fn schedule<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut timer = self.timer.lock();
        if let Some(previous) = timer.take() {
            previous.abort();
        }
        let my_generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = Arc::clone(&self.generation);
        let dispatched = Arc::clone(&self.dispatched);

        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if generation.load(Ordering::SeqCst) != my_generation {
                return;
            }
            tracing::debug!("debounce timer fired, dispatching");
            let handle = tokio::spawn(task);
            let mut dispatched = dispatched.lock();
            dispatched.retain(|h| !h.is_finished());
            dispatched.push(handle);
        }));
    }

    /// Cancels the pending timer if one is armed. Dispatched tasks keep running.
    pub fn cancel_pending(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(previous) = self.timer.lock().take() {
            previous.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.timer
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Waits for the armed timer (if any) to fire and for every dispatched
    /// task to complete.
    pub async fn settle(&self) {
        loop {
            let timer = self.timer.lock().take();
            let Some(timer) = timer else { break };
            report_join(timer.await);
        }
        loop {
            let pending: Vec<_> = std::mem::take(&mut *self.dispatched.lock());
            if pending.is_empty() {
                break;
            }
            for handle in pending {
                report_join(handle.await);
            }
        }
    }
}

/// Cancellation is expected; a panic inside a task is not.
fn report_join(result: Result<(), JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            tracing::warn!("debounced task panicked: {}", e);
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get_mut().take() {
            timer.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter_task(counter: Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_one_run() {
        let debouncer = Debouncer::new();
        let runs = Arc::new(AtomicUsize::new(0));

        for _ in 0..5 {
            debouncer.schedule(Duration::from_millis(200), counter_task(runs.clone()));
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(debouncer.is_armed());

        debouncer.settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert!(!debouncer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spaced_calls_each_run() {
        let debouncer = Debouncer::new();
        let runs = Arc::new(AtomicUsize::new(0));

        debouncer.schedule(Duration::from_millis(200), counter_task(runs.clone()));
        tokio::time::sleep(Duration::from_millis(300)).await;
        debouncer.schedule(Duration::from_millis(200), counter_task(runs.clone()));
        debouncer.settle().await;

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_pending_prevents_run() {
        let debouncer = Debouncer::new();
        let runs = Arc::new(AtomicUsize::new(0));

        debouncer.schedule(Duration::from_millis(200), counter_task(runs.clone()));
        debouncer.cancel_pending();
        assert!(!debouncer.is_armed());

        tokio::time::sleep(Duration::from_millis(500)).await;
        debouncer.settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatched_task_survives_new_schedule() {
        let debouncer = Debouncer::new();
        let finished = Arc::new(AtomicUsize::new(0));

        // Long-running dispatched task: fires at 200ms, finishes at 1200ms.
        let slow = {
            let finished = Arc::clone(&finished);
            async move {
                tokio::time::sleep(Duration::from_millis(1000)).await;
                finished.fetch_add(1, Ordering::SeqCst);
            }
        };
        debouncer.schedule(Duration::from_millis(200), slow);
        tokio::time::sleep(Duration::from_millis(300)).await;

        debouncer.schedule(Duration::from_millis(200), counter_task(finished.clone()));
        debouncer.cancel_pending();
        debouncer.settle().await;

        assert_eq!(finished.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_settle_survives_panicking_task() {
        let debouncer = Debouncer::new();
        let runs = Arc::new(AtomicUsize::new(0));

        debouncer.schedule(Duration::from_millis(200), async {
            panic!("view exploded");
        });
        debouncer.settle().await;

        debouncer.schedule(Duration::from_millis(200), counter_task(runs.clone()));
        debouncer.settle().await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }
}
