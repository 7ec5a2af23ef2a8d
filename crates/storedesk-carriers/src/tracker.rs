use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, NaiveTime};
use reqwest::Client;
use storedesk_core::{TrackEvent, TrackInfo};

use crate::adapters::{self, AdapterContext};
use crate::error::TrackingError;
use crate::registry::{carrier_by_id, clean_tracking_number, is_sandbox_number};
use crate::sandbox::sandbox_track_info;

/// Browser-like UA; several carrier sites reject obvious bot agents.
const CARRIER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Single-call tracking contract, implemented by [`CarrierTracker`] and by
/// test doubles.
pub trait PackageTracker {
    fn track_package(
        &self,
        carrier_id: &str,
        tracking_number: &str,
    ) -> impl Future<Output = Result<TrackInfo, TrackingError>> + Send;
}

/// HTTP client for every supported carrier.
///
/// One instance is safe to share across calls. It keeps a cookie store
/// because CJ binds its CSRF token to a session cookie.
pub struct CarrierTracker {
    client: Client,
    base_urls: HashMap<&'static str, String>,
}

impl CarrierTracker {
    /// # Errors
    ///
    /// Returns [`TrackingError::HttpClient`] if the `reqwest::Client` cannot
    /// be constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, TrackingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(CARRIER_USER_AGENT)
            .cookie_store(true)
            .build()?;
        Ok(Self {
            client,
            base_urls: HashMap::new(),
        })
    }

    /// Point one carrier at a different origin, e.g. a mock server.
    ///
    /// Unknown carrier ids are ignored.
    #[must_use]
    pub fn with_base_url(mut self, carrier_id: &str, base_url: impl Into<String>) -> Self {
        if let Some(carrier) = carrier_by_id(carrier_id) {
            self.base_urls.insert(carrier.id, base_url.into());
        }
        self
    }

    fn base_url(&self, carrier_id: &'static str) -> Option<&str> {
        self.base_urls
            .get(carrier_id)
            .map(String::as_str)
            .or_else(|| adapters::default_base_url(carrier_id))
    }

    /// Track one parcel and normalize the carrier's answer.
    ///
    /// A carrier that answers without a record yields `Ok` with
    /// `success == false`; only transport and protocol failures are `Err`.
    ///
    /// # Errors
    ///
    /// - [`TrackingError::UnknownCarrier`] for an unregistered id
    /// - [`TrackingError::InvalidTrackingNumber`] when the carrier's own
    ///   validation rejects the number
    /// - [`TrackingError::Upstream`] on network failure, non-2xx, or a payload
    ///   the adapter cannot read
    pub async fn track_package(
        &self,
        carrier_id: &str,
        tracking_number: &str,
    ) -> Result<TrackInfo, TrackingError> {
        let carrier = carrier_by_id(carrier_id)
            .ok_or_else(|| TrackingError::UnknownCarrier(carrier_id.to_string()))?;
        let cleaned = clean_tracking_number(tracking_number);
        if cleaned.is_empty() {
            return Err(TrackingError::invalid_number(carrier.id, tracking_number));
        }

        if is_sandbox_number(&cleaned) {
            tracing::debug!(carrier = carrier.id, tracking_number = %cleaned, "sandbox tracking");
            return Ok(sandbox_track_info(carrier.carrier_ref(), &cleaned));
        }

        let base_url = self
            .base_url(carrier.id)
            .ok_or_else(|| TrackingError::UnknownCarrier(carrier.id.to_string()))?;
        let ctx = AdapterContext {
            client: &self.client,
            base_url,
            carrier,
        };

        tracing::debug!(carrier = carrier.id, tracking_number = %cleaned, "tracking package");
        let mut info = match adapters::track(&ctx, &cleaned).await {
            Ok(info) => info,
            Err(e) => {
                tracing::warn!(carrier = carrier.id, tracking_number = %cleaned, error = %e, "tracking failed");
                return Err(e);
            }
        };
        sort_chronologically(&mut info.events);

        tracing::debug!(
            carrier = carrier.id,
            tracking_number = %cleaned,
            success = info.success,
            events = info.events.len(),
            "tracking complete"
        );
        Ok(info)
    }
}

impl PackageTracker for CarrierTracker {
    async fn track_package(
        &self,
        carrier_id: &str,
        tracking_number: &str,
    ) -> Result<TrackInfo, TrackingError> {
        CarrierTracker::track_package(self, carrier_id, tracking_number).await
    }
}

/// Carriers list scans newest-first or oldest-first; normalize to ascending.
///
/// Events are fully sorted only when every one carries a clock time. A
/// date-only column parses to midnight, which would jump ahead of earlier
/// scans that day, so otherwise the carrier order is kept and only reversed
/// when the clock-timed events run newest-first.
pub(crate) fn sort_chronologically(events: &mut [TrackEvent]) {
    if events.iter().all(|e| clock_time(e).is_some()) {
        events.sort_by_key(|e| e.time);
        return;
    }

    let timed: Vec<_> = events.iter().filter_map(clock_time).collect();
    let descending = timed.windows(2).filter(|w| w[0] > w[1]).count();
    let ascending = timed.windows(2).filter(|w| w[0] < w[1]).count();
    if descending > ascending {
        events.reverse();
    }
}

/// Timestamp of an event unless it is missing or sits exactly on midnight.
fn clock_time(event: &TrackEvent) -> Option<DateTime<FixedOffset>> {
    event.time.filter(|t| t.time() != NaiveTime::MIN)
}
