//! Guard against concurrent collection jobs for the same user.
//!
//! The registry is purely in-memory; after a restart nothing is active and a
//! fresh external request is what resumes a job, with correctness coming from
//! the persisted state rather than from this marker.

use log::error;
use std::collections::HashSet;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Tracks which users currently have a job in flight, and keeps the spawned
/// task handles so their lifecycle stays observable by the process.
#[derive(Debug, Default)]
pub struct CollectionJobRegistry {
    active: Mutex<HashSet<String>>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl CollectionJobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a job for `user` if none is active. Returns `false` when a
    /// job is already running; the caller reports "already in progress"
    /// rather than starting a duplicate.
    pub async fn try_start(&self, user: &str) -> bool {
        self.active.lock().await.insert(user.to_string())
    }

    /// Clears the active marker for `user`. Idempotent; called once the job
    /// reaches a terminal state, successful or not.
    pub async fn finish(&self, user: &str) {
        self.active.lock().await.remove(user);
    }

    pub async fn is_active(&self, user: &str) -> bool {
        self.active.lock().await.contains(user)
    }

    /// Adopts a spawned job task so [`CollectionJobRegistry::wait_idle`] can
    /// reap it later.
    ///
    /// Handles of already-finished jobs are reaped here as well, so a
    /// long-lived process that starts many jobs does not accumulate them
    /// between `wait_idle` calls.
    pub async fn attach(&self, handle: JoinHandle<()>) {
        let mut handles = self.handles.lock().await;
        let mut live = Vec::with_capacity(handles.len() + 1);
        for old in handles.drain(..) {
            if old.is_finished() {
                // Completes immediately; surfaces the panic if the job had one.
                if let Err(e) = old.await {
                    error!("Collection job task aborted abnormally: {e}");
                }
            } else {
                live.push(old);
            }
        }
        *handles = live;
        handles.push(handle);
    }

    /// Awaits every attached job, including ones attached while waiting.
    /// Panicked jobs are logged when reaped.
    pub async fn wait_idle(&self) {
        loop {
            let batch: Vec<JoinHandle<()>> = {
                let mut handles = self.handles.lock().await;
                handles.drain(..).collect()
            };
            if batch.is_empty() {
                return;
            }
            for handle in batch {
                if let Err(e) = handle.await {
                    error!("Collection job task aborted abnormally: {e}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_start_for_same_user_is_rejected() {
        let registry = CollectionJobRegistry::new();
        assert!(registry.try_start("alice").await);
        assert!(!registry.try_start("alice").await);
        assert!(registry.try_start("bob").await);
    }

    #[tokio::test]
    async fn finish_releases_the_user_and_is_idempotent() {
        let registry = CollectionJobRegistry::new();
        assert!(registry.try_start("alice").await);
        registry.finish("alice").await;
        registry.finish("alice").await;
        assert!(!registry.is_active("alice").await);
        assert!(registry.try_start("alice").await);
    }

    #[tokio::test]
    async fn simultaneous_starts_admit_exactly_one() {
        use std::sync::Arc;

        let registry = Arc::new(CollectionJobRegistry::new());
        let mut admitted = 0;
        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(
                async move { registry.try_start("alice").await },
            ));
        }
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 1);
    }

    #[tokio::test]
    async fn wait_idle_reaps_attached_tasks() {
        let registry = CollectionJobRegistry::new();
        registry.attach(tokio::spawn(async {})).await;
        registry.attach(tokio::spawn(async {})).await;
        registry.wait_idle().await;
    }

    #[tokio::test]
    async fn finished_handles_do_not_accumulate_across_attaches() {
        let registry = CollectionJobRegistry::new();
        for _ in 0..32 {
            registry.attach(tokio::spawn(async {})).await;
            // Let the trivial task complete so the next attach can reap it.
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
        }
        // At most the last attached handle may still be pending.
        assert!(registry.handles.lock().await.len() <= 1);
        registry.wait_idle().await;
    }
}
