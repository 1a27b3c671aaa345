use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

use super::{JobHandle, JobSpec, SpamLoop, SpamStats};
use crate::error::{GuildForgeError, Result};

/// A spawned spam loop and its handle.
pub struct SpamTask {
    pub handle: JobHandle,
    join: JoinHandle<SpamStats>,
}

impl SpamTask {
    /// Wait for the loop to notice its stopped handle and exit.
    pub async fn join(self) -> Option<SpamStats> {
        self.join.await.ok()
    }
}

/// What a [`TaskRegistry::stop_all`] call stopped.
#[derive(Default)]
pub struct Stopped {
    pub bulk: Option<JobHandle>,
    pub spam: Option<SpamTask>,
}

impl Stopped {
    pub fn is_empty(&self) -> bool {
        self.bulk.is_none() && self.spam.is_none()
    }
}

/// Which families currently have a running job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStatus {
    pub bulk_running: bool,
    pub spam_running: bool,
}

#[derive(Default)]
struct Slots {
    bulk: Option<JobHandle>,
    spam: Option<SpamTask>,
    next_id: u64,
}

impl Slots {
    fn next_handle(&mut self) -> JobHandle {
        self.next_id += 1;
        JobHandle::new(self.next_id)
    }
}

/// Process-wide table of the current bulk job and spam loop.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    slots: Arc<Mutex<Slots>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new bulk job, stopping the previous one if any.
    pub async fn start_bulk_job(&self, spec: &JobSpec) -> JobHandle {
        let mut slots = self.slots.lock().await;
        if let Some(previous) = slots.bulk.take() {
            info!(job_id = previous.id(), "Stopping previous bulk job");
            previous.stop();
        }

        let handle = slots.next_handle();
        info!(
            job_id = handle.id(),
            kind = %spec.kind,
            guild_id = spec.target_collection_id,
            "Registered bulk job"
        );
        slots.bulk = Some(handle.clone());
        handle
    }

    /// Mark a bulk job finished and forget it if it is still the current one.
    pub async fn finish_bulk_job(&self, handle: &JobHandle) {
        handle.stop();
        let mut slots = self.slots.lock().await;
        if slots.bulk.as_ref().is_some_and(|current| current.same_job(handle)) {
            slots.bulk = None;
        }
    }

    /// Spawn a spam loop, stopping the previous one if any.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty message or target list.
    pub async fn start_spam(
        &self,
        spam: &SpamLoop,
        message: String,
        targets: Vec<u64>,
        interval: Duration,
    ) -> Result<JobHandle> {
        if message.trim().is_empty() {
            return Err(GuildForgeError::Validation("message cannot be empty".to_string()));
        }
        if targets.is_empty() {
            return Err(GuildForgeError::Validation("no target channels".to_string()));
        }

        let mut slots = self.slots.lock().await;
        if let Some(previous) = slots.spam.take() {
            info!(job_id = previous.handle.id(), "Stopping previous spam loop");
            previous.handle.stop();
        }

        let handle = slots.next_handle();
        let join = {
            let spam = spam.clone();
            let handle = handle.clone();
            tokio::spawn(async move { spam.run(message, targets, handle, interval).await })
        };
        slots.spam = Some(SpamTask {
            handle: handle.clone(),
            join,
        });
        Ok(handle)
    }

    /// Stop every tracked job and clear the table. A no-op when nothing runs.
    pub async fn stop_all(&self) -> Stopped {
        let mut slots = self.slots.lock().await;
        let stopped = Stopped {
            bulk: slots.bulk.take(),
            spam: slots.spam.take(),
        };

        if let Some(handle) = &stopped.bulk {
            handle.stop();
        }
        if let Some(task) = &stopped.spam {
            task.handle.stop();
        }
        if !stopped.is_empty() {
            info!(
                bulk = stopped.bulk.is_some(),
                spam = stopped.spam.is_some(),
                "Stopped all jobs"
            );
        }
        stopped
    }

    pub async fn status(&self) -> RegistryStatus {
        let slots = self.slots.lock().await;
        RegistryStatus {
            bulk_running: slots.bulk.as_ref().is_some_and(JobHandle::is_running),
            spam_running: slots.spam.as_ref().is_some_and(|task| task.handle.is_running()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::JobKind;
    use crate::platform::memory::MemoryPlatform;

    fn spec() -> JobSpec {
        JobSpec::create(JobKind::CreateChannels, 1, 2, "c-{n}")
    }

    #[tokio::test]
    async fn test_new_bulk_job_stops_previous() {
        let registry = TaskRegistry::new();
        let first = registry.start_bulk_job(&spec()).await;
        let second = registry.start_bulk_job(&spec()).await;

        assert!(!first.is_running());
        assert!(second.is_running());
        assert_ne!(first.id(), second.id());
    }

    #[tokio::test]
    async fn test_finish_of_replaced_job_keeps_current() {
        let registry = TaskRegistry::new();
        let first = registry.start_bulk_job(&spec()).await;
        let second = registry.start_bulk_job(&spec()).await;

        registry.finish_bulk_job(&first).await;
        assert!(registry.status().await.bulk_running);

        registry.finish_bulk_job(&second).await;
        assert!(!registry.status().await.bulk_running);
    }

    #[tokio::test]
    async fn test_stop_all_is_idempotent() {
        let registry = TaskRegistry::new();
        assert!(registry.stop_all().await.is_empty());
        assert!(registry.stop_all().await.is_empty());

        let handle = registry.start_bulk_job(&spec()).await;
        let stopped = registry.stop_all().await;
        assert!(stopped.bulk.is_some());
        assert!(!handle.is_running());
        assert!(registry.stop_all().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_all_joins_spam_loop() {
        let platform = Arc::new(MemoryPlatform::with_guild(1));
        let spam = SpamLoop::new(platform.clone());
        let registry = TaskRegistry::new();

        let handle = registry
            .start_spam(&spam, "ping".to_string(), vec![5, 6], Duration::from_millis(50))
            .await
            .unwrap();
        assert!(registry.status().await.spam_running);

        tokio::time::sleep(Duration::from_millis(25)).await;
        let stopped = registry.stop_all().await;
        assert!(!handle.is_running());

        let stats = stopped.spam.unwrap().join().await.unwrap();
        assert_eq!(stats.sent, 2);
        assert_eq!(platform.sent().len(), 2);
        assert_eq!(
            registry.status().await,
            RegistryStatus { bulk_running: false, spam_running: false }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_spam_stops_previous_loop() {
        let platform = Arc::new(MemoryPlatform::with_guild(1));
        let spam = SpamLoop::new(platform.clone());
        let registry = TaskRegistry::new();

        let first = registry
            .start_spam(&spam, "a".to_string(), vec![1], Duration::from_millis(50))
            .await
            .unwrap();
        let second = registry
            .start_spam(&spam, "b".to_string(), vec![2], Duration::from_millis(50))
            .await
            .unwrap();

        assert!(!first.is_running());
        assert!(second.is_running());
        registry.stop_all().await.spam.unwrap().join().await;
    }

    #[tokio::test]
    async fn test_start_spam_rejects_empty_input() {
        let spam = SpamLoop::new(Arc::new(MemoryPlatform::with_guild(1)));
        let registry = TaskRegistry::new();

        assert!(registry
            .start_spam(&spam, " ".to_string(), vec![1], Duration::from_secs(1))
            .await
            .is_err());
        assert!(registry
            .start_spam(&spam, "x".to_string(), Vec::new(), Duration::from_secs(1))
            .await
            .is_err());
        assert!(!registry.status().await.spam_running);
    }
}
