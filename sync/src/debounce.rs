//! Cancellable deferred task.
//!
//! Each `schedule` call replaces the pending task and restarts the quiet
//! period, so a burst of calls runs the task once. A task that has started
//! running is no longer cancellable.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct Pending {
    cancel: CancellationToken,
    started: Arc<AtomicBool>,
    handle: JoinHandle<()>
}

impl Pending {
    fn is_waiting(&self) -> bool {
        !self.started.load(Ordering::SeqCst) && !self.cancel.is_cancelled()
    }
}

#[derive(Default)]
struct Slots {
    waiting: Option<Pending>,
    /// Tasks past their quiet period, kept so callers can wait on them.
    started: Vec<JoinHandle<()>>
}

impl Slots {
    /// Clears the waiting slot. A task that already started moves to
    /// `started` instead of being cancelled.
    fn retire(&mut self) -> bool {
        self.started.retain(|handle| !handle.is_finished());
        match self.waiting.take() {
            Some(p) if p.started.load(Ordering::SeqCst) => {
                self.started.push(p.handle);
                false
            }
            Some(p) => {
                let was_waiting = !p.cancel.is_cancelled();
                p.cancel.cancel();
                was_waiting
            }
            None => false
        }
    }
}

pub struct Debouncer {
    delay: Duration,
    slots: Mutex<Slots>
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slots: Mutex::new(Slots::default())
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub async fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static
    {
        let mut slots = self.slots.lock().await;
        if slots.retire() {
            tracing::debug!("Restarting debounce timer");
        }

        let cancel = CancellationToken::new();
        let started = Arc::new(AtomicBool::new(false));
        let delay = self.delay;
        let handle = tokio::spawn({
            let cancel = cancel.clone();
            let started = started.clone();
            async move {
                tokio::select! {
                    () = cancel.cancelled() => {}
                    () = tokio::time::sleep(delay) => {
                        started.store(true, Ordering::SeqCst);
                        task.await;
                    }
                }
            }
        });

        slots.waiting = Some(Pending {
            cancel,
            started,
            handle
        });
    }

    /// Drops the pending task if it has not started. Returns whether one was
    /// waiting.
    pub async fn cancel(&self) -> bool {
        self.slots.lock().await.retire()
    }

    pub async fn is_pending(&self) -> bool {
        self.slots
            .lock()
            .await
            .waiting
            .as_ref()
            .is_some_and(Pending::is_waiting)
    }

    /// Waits for every task that already started to finish. A task still in
    /// its quiet period is left pending.
    pub async fn wait_started(&self) {
        let handles = {
            let mut slots = self.slots.lock().await;
            if slots
                .waiting
                .as_ref()
                .is_some_and(|p| p.started.load(Ordering::SeqCst))
            {
                slots.retire();
            }
            std::mem::take(&mut slots.started)
        };
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Debounced task ended abnormally");
            }
        }
    }
}
