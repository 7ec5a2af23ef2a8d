//! Scheduled delivery checks.
//!
//! Each registered store gets one cron job per configured check hour. Hours
//! are configured in Korea Standard Time and converted to UTC cron
//! expressions, since KST has no daylight saving.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use uuid::Uuid;

const KST_OFFSET_HOURS: u32 = 9;

/// Cron expression (with seconds) firing daily at `kst_hour` KST.
#[must_use]
pub(crate) fn kst_hour_to_utc_cron(kst_hour: u32) -> String {
    let utc_hour = (kst_hour % 24 + 24 - KST_OFFSET_HOURS) % 24;
    format!("0 0 {utc_hour} * * *")
}

pub(crate) type CheckFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Runs the delivery check for one store.
pub(crate) type CheckFn = Arc<dyn Fn(String) -> CheckFuture + Send + Sync>;

/// Owns the cron scheduler and the jobs registered per store.
pub(crate) struct DeliveryScheduler {
    scheduler: JobScheduler,
    hours: Vec<u32>,
    check: CheckFn,
    jobs: HashMap<String, Vec<Uuid>>,
}

impl DeliveryScheduler {
    /// Create and start an empty scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`JobSchedulerError`] if the scheduler cannot start.
    pub(crate) async fn start(hours: Vec<u32>, check: CheckFn) -> Result<Self, JobSchedulerError> {
        let scheduler = JobScheduler::new().await?;
        scheduler.start().await?;
        Ok(Self {
            scheduler,
            hours,
            check,
            jobs: HashMap::new(),
        })
    }

    /// Schedule checks for `store_id`, replacing any existing registration.
    ///
    /// # Errors
    ///
    /// Returns [`JobSchedulerError`] if a job cannot be created or added.
    pub(crate) async fn register(&mut self, store_id: &str) -> Result<(), JobSchedulerError> {
        self.unregister(store_id).await?;

        let mut ids = Vec::with_capacity(self.hours.len());
        for &hour in &self.hours {
            let cron = kst_hour_to_utc_cron(hour);
            let check = Arc::clone(&self.check);
            let store = store_id.to_string();
            let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
                let check = Arc::clone(&check);
                let store = store.clone();
                Box::pin(async move {
                    tracing::info!(store_id = %store, "scheduler: starting delivery check");
                    check(store.clone()).await;
                    tracing::info!(store_id = %store, "scheduler: delivery check complete");
                })
            })?;
            ids.push(self.scheduler.add(job).await?);
            tracing::debug!(store_id, kst_hour = hour, cron = %cron, "scheduled delivery check");
        }
        self.jobs.insert(store_id.to_string(), ids);
        Ok(())
    }

    /// Remove every job for `store_id`. Returns whether any existed.
    ///
    /// # Errors
    ///
    /// Returns [`JobSchedulerError`] if a job cannot be removed.
    pub(crate) async fn unregister(&mut self, store_id: &str) -> Result<bool, JobSchedulerError> {
        let Some(ids) = self.jobs.remove(store_id) else {
            return Ok(false);
        };
        for id in ids {
            self.scheduler.remove(&id).await?;
        }
        tracing::debug!(store_id, "unscheduled delivery checks");
        Ok(true)
    }

    /// Remove all registered jobs.
    ///
    /// # Errors
    ///
    /// Returns [`JobSchedulerError`] if a job cannot be removed.
    pub(crate) async fn clear(&mut self) -> Result<(), JobSchedulerError> {
        let stores: Vec<String> = self.jobs.keys().cloned().collect();
        for store in stores {
            self.unregister(&store).await?;
        }
        Ok(())
    }

    #[must_use]
    pub(crate) fn registered_stores(&self) -> Vec<&str> {
        let mut stores: Vec<&str> = self.jobs.keys().map(String::as_str).collect();
        stores.sort_unstable();
        stores
    }

    /// Remove all jobs and stop the scheduler.
    ///
    /// # Errors
    ///
    /// Returns [`JobSchedulerError`] if jobs cannot be removed or the
    /// scheduler fails to stop.
    pub(crate) async fn shutdown(mut self) -> Result<(), JobSchedulerError> {
        self.clear().await?;
        self.scheduler.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn kst_hours_convert_to_utc() {
        assert_eq!(kst_hour_to_utc_cron(9), "0 0 0 * * *");
        assert_eq!(kst_hour_to_utc_cron(15), "0 0 6 * * *");
        assert_eq!(kst_hour_to_utc_cron(21), "0 0 12 * * *");
        assert_eq!(kst_hour_to_utc_cron(3), "0 0 18 * * *");
        assert_eq!(kst_hour_to_utc_cron(0), "0 0 15 * * *");
    }

    fn noop_check(counter: Arc<AtomicUsize>) -> CheckFn {
        Arc::new(move |_store: String| -> CheckFuture {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn register_unregister_and_clear() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut scheduler = DeliveryScheduler::start(vec![9, 15, 21], noop_check(counter))
            .await
            .unwrap();

        scheduler.register("store-b").await.unwrap();
        scheduler.register("store-a").await.unwrap();
        scheduler.register("store-a").await.unwrap();
        assert_eq!(scheduler.registered_stores(), vec!["store-a", "store-b"]);
        assert_eq!(scheduler.jobs["store-a"].len(), 3);

        assert!(scheduler.unregister("store-b").await.unwrap());
        assert!(!scheduler.unregister("store-b").await.unwrap());
        assert_eq!(scheduler.registered_stores(), vec!["store-a"]);

        scheduler.clear().await.unwrap();
        assert!(scheduler.registered_stores().is_empty());

        scheduler.shutdown().await.unwrap();
    }
}
