//! Tracking commands and the batch delivery check.
//!
//! A check re-tracks `IN_PROGRESS` records one carrier call at a time through
//! [`PacedTracker`] and upserts every answer. Per-record failures are logged
//! and counted rather than propagated so one bad parcel does not abort the
//! batch.

use chrono::Utc;
use storedesk_carriers::{carrier_by_id, PackageTracker, PacedTracker, TrackRequest};
use storedesk_core::{DeliveryStatus, TrackInfo};
use storedesk_db::{
    delete_tracking, list_in_progress, list_trackings, upsert_tracking, DbError, DeliveryTracking,
    TrackingKey, TrackingStore,
};

/// Outcome counts for one batch check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CheckSummary {
    pub(crate) checked: usize,
    pub(crate) updated: usize,
    pub(crate) delivered: usize,
    pub(crate) not_found: usize,
    pub(crate) failed: usize,
}

/// Re-track in-progress records, for one store or across all stores.
///
/// # Errors
///
/// Returns [`DbError`] only if the records to check cannot be loaded.
pub(crate) async fn run_delivery_check<S, T>(
    store: &S,
    tracker: &PacedTracker<T>,
    store_id: Option<&str>,
    limit: usize,
) -> Result<CheckSummary, DbError>
where
    S: TrackingStore,
    T: PackageTracker + Sync,
{
    let rows = match store_id {
        Some(id) => {
            let mut rows = list_trackings(store, id, Some(DeliveryStatus::InProgress)).await?;
            rows.truncate(limit);
            rows
        }
        None => list_in_progress(store, limit).await?,
    };

    let mut summary = CheckSummary {
        checked: rows.len(),
        ..CheckSummary::default()
    };
    if rows.is_empty() {
        tracing::info!(store_id = store_id.unwrap_or("*"), "no in-progress deliveries to check");
        return Ok(summary);
    }

    let requests: Vec<TrackRequest> = rows
        .iter()
        .map(|r| TrackRequest::new(&r.carrier_id, &r.tracking_number))
        .collect();
    let results = tracker.track_all(&requests).await;

    for (row, result) in rows.iter().zip(results) {
        match result {
            Ok(info) if info.success => {
                match upsert_tracking(store, &row.key(), &row.carrier_name, &info, None, Utc::now())
                    .await
                {
                    Ok(updated) => {
                        summary.updated += 1;
                        if updated.status == DeliveryStatus::Delivered {
                            summary.delivered += 1;
                            tracing::info!(
                                store_id = %row.store_id,
                                carrier_id = %row.carrier_id,
                                tracking_number = %row.tracking_number,
                                "delivery completed"
                            );
                        }
                    }
                    Err(e) => {
                        summary.failed += 1;
                        tracing::error!(
                            tracking_id = row.id,
                            error = %e,
                            "failed to persist tracking update"
                        );
                    }
                }
            }
            Ok(info) => {
                summary.not_found += 1;
                tracing::info!(
                    carrier_id = %row.carrier_id,
                    tracking_number = %row.tracking_number,
                    reason = info.error.as_deref().unwrap_or_default(),
                    "carrier has no record"
                );
            }
            Err(_) => summary.failed += 1,
        }
    }

    tracing::info!(
        checked = summary.checked,
        updated = summary.updated,
        delivered = summary.delivered,
        not_found = summary.not_found,
        failed = summary.failed,
        "delivery check complete"
    );
    Ok(summary)
}

/// Track one parcel and, when `store_id` is given, record it.
///
/// # Errors
///
/// Returns an error for unknown carriers, tracking failures, or storage
/// failures.
pub(crate) async fn run_track<S, T>(
    store: &S,
    tracker: &T,
    carrier_id: &str,
    tracking_number: &str,
    store_id: Option<&str>,
    memo: Option<&str>,
) -> anyhow::Result<(TrackInfo, Option<DeliveryTracking>)>
where
    S: TrackingStore,
    T: PackageTracker + Sync,
{
    let carrier = carrier_by_id(carrier_id)
        .ok_or_else(|| anyhow::anyhow!("unknown carrier '{carrier_id}'"))?;
    let info = tracker.track_package(carrier.id, tracking_number).await?;

    let saved = match store_id {
        Some(store_id) if info.success => {
            let key = TrackingKey::new(store_id, carrier.id, info.tracking_number.clone());
            let row =
                upsert_tracking(store, &key, carrier.display_name, &info, memo, Utc::now()).await?;
            Some(row)
        }
        Some(_) => {
            tracing::warn!(
                carrier_id = carrier.id,
                tracking_number,
                "carrier has no record; nothing saved"
            );
            None
        }
        None => None,
    };
    Ok((info, saved))
}

pub(crate) async fn run_trackings_list<S: TrackingStore>(
    store: &S,
    store_id: &str,
    status: Option<DeliveryStatus>,
) -> anyhow::Result<()> {
    let rows = list_trackings(store, store_id, status).await?;
    if rows.is_empty() {
        println!("no trackings for store '{store_id}'");
        return Ok(());
    }
    for row in &rows {
        println!(
            "{:>6}  {:<11}  {:<12}  {:<16}  {}",
            row.id,
            row.status.as_str(),
            row.carrier_id,
            row.tracking_number,
            row.latest_event_description.as_deref().unwrap_or("-"),
        );
    }
    Ok(())
}

pub(crate) async fn run_trackings_delete<S: TrackingStore>(
    store: &S,
    id: i64,
    store_id: &str,
) -> anyhow::Result<()> {
    match delete_tracking(store, id, store_id).await {
        Ok(()) => {
            println!("deleted tracking {id}");
            Ok(())
        }
        Err(DbError::NotFound) => {
            anyhow::bail!("tracking {id} not found for store '{store_id}'")
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
#[path = "deliveries_test.rs"]
mod tests;
