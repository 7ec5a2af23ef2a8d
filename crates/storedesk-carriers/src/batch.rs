//! Paced batch tracking over the single-call contract.

use std::time::Duration;

use storedesk_core::TrackInfo;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::TrackingError;
use crate::tracker::PackageTracker;

/// One parcel to look up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackRequest {
    pub carrier_id: String,
    pub tracking_number: String,
}

impl TrackRequest {
    pub fn new(carrier_id: impl Into<String>, tracking_number: impl Into<String>) -> Self {
        Self {
            carrier_id: carrier_id.into(),
            tracking_number: tracking_number.into(),
        }
    }
}

/// Runs tracking calls one at a time with a fixed gap between them so
/// batches never burst a carrier's endpoint.
///
/// The gap is shared by every caller of one tracker: concurrent `track_all`
/// runs queue behind each other instead of pacing independently.
pub struct PacedTracker<T> {
    inner: T,
    delay: Duration,
    /// End of the most recent call; locked for the duration of each call.
    last_call: Mutex<Option<Instant>>,
}

impl<T: PackageTracker> PacedTracker<T> {
    pub fn new(inner: T, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            last_call: Mutex::new(None),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Track every request in order. Failures are returned in place and do
    /// not stop the batch.
    pub async fn track_all(
        &self,
        requests: &[TrackRequest],
    ) -> Vec<Result<TrackInfo, TrackingError>> {
        let mut results = Vec::with_capacity(requests.len());
        for request in requests {
            let result = self.paced_call(request).await;
            if let Err(e) = &result {
                tracing::warn!(
                    carrier = %request.carrier_id,
                    tracking_number = %request.tracking_number,
                    error = %e,
                    "batch tracking call failed"
                );
            }
            results.push(result);
        }
        results
    }

    async fn paced_call(&self, request: &TrackRequest) -> Result<TrackInfo, TrackingError> {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            tokio::time::sleep_until(previous + self.delay).await;
        }
        let result = self
            .inner
            .track_package(&request.carrier_id, &request.tracking_number)
            .await;
        *last_call = Some(Instant::now());
        result
    }
}
