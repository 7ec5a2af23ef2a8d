//! Persistence for `delivery_trackings`.
//!
//! [`upsert_tracking`] owns the invariants: derived columns come from
//! [`derive_tracking_update`], the `(store_id, carrier_id, tracking_number)`
//! triple is unique, and `completed_at` is never cleared once set. Storage
//! backends only read and write rows.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use storedesk_core::{DeliveryStatus, TrackEvent, TrackEventStatusCode, TrackInfo};
use uuid::Uuid;

use crate::normalize::{derive_tracking_update, TrackingUpdate};
use crate::DbError;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Identity of a tracked parcel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TrackingKey {
    pub store_id: String,
    pub carrier_id: String,
    pub tracking_number: String,
}

impl TrackingKey {
    pub fn new(
        store_id: impl Into<String>,
        carrier_id: impl Into<String>,
        tracking_number: impl Into<String>,
    ) -> Self {
        Self {
            store_id: store_id.into(),
            carrier_id: carrier_id.into(),
            tracking_number: tracking_number.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryTracking {
    pub id: i64,
    pub public_id: Uuid,
    pub store_id: String,
    pub carrier_id: String,
    pub carrier_name: String,
    pub tracking_number: String,
    pub status: DeliveryStatus,
    pub latest_event_status: Option<TrackEventStatusCode>,
    pub latest_event_time: Option<DateTime<Utc>>,
    pub latest_event_description: Option<String>,
    pub sender_name: Option<String>,
    pub sender_address: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_address: Option<String>,
    pub product_name: Option<String>,
    pub memo: Option<String>,
    pub events: Vec<TrackEvent>,
    /// Set on the first transition to `DELIVERED`; never cleared.
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeliveryTracking {
    #[must_use]
    pub fn key(&self) -> TrackingKey {
        TrackingKey::new(&self.store_id, &self.carrier_id, &self.tracking_number)
    }
}

/// Everything a backend needs to write one row.
#[derive(Debug, Clone)]
pub struct TrackingWrite<'a> {
    pub key: &'a TrackingKey,
    pub carrier_name: &'a str,
    pub update: &'a TrackingUpdate,
    /// `None` keeps the stored memo.
    pub memo: Option<&'a str>,
    pub completed_at: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
}

/// Storage backend for tracking rows.
pub trait TrackingStore: Send + Sync {
    fn find(
        &self,
        key: &TrackingKey,
    ) -> impl Future<Output = Result<Option<DeliveryTracking>, DbError>> + Send;

    /// Insert or update the row for `write.key`. Must not clear an existing
    /// `completed_at`.
    fn save(
        &self,
        write: TrackingWrite<'_>,
    ) -> impl Future<Output = Result<DeliveryTracking, DbError>> + Send;

    /// Delete by id when the row belongs to `store_id`; returns whether a
    /// row was deleted.
    fn delete(&self, id: i64, store_id: &str) -> impl Future<Output = Result<bool, DbError>> + Send;

    /// Rows for a store, newest first.
    fn list(
        &self,
        store_id: &str,
        status: Option<DeliveryStatus>,
    ) -> impl Future<Output = Result<Vec<DeliveryTracking>, DbError>> + Send;

    /// `IN_PROGRESS` rows across all stores, least recently updated first.
    fn list_in_progress(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<DeliveryTracking>, DbError>> + Send;
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Record the latest tracking snapshot for `key`.
///
/// A repeated call for the same key updates the existing row in place. A
/// `DELIVERED` row that receives a non-delivered latest event is rewritten
/// to `IN_PROGRESS` but keeps its `completed_at`; the divergence is logged.
///
/// # Errors
///
/// Returns [`DbError`] if the backend fails.
pub async fn upsert_tracking<S: TrackingStore>(
    store: &S,
    key: &TrackingKey,
    carrier_name: &str,
    info: &TrackInfo,
    memo: Option<&str>,
    now: DateTime<Utc>,
) -> Result<DeliveryTracking, DbError> {
    let update = derive_tracking_update(info);
    let existing = store.find(key).await?;

    let previous_completed_at = existing.as_ref().and_then(|row| row.completed_at);
    if let Some(row) = &existing {
        if row.status == DeliveryStatus::Delivered && update.status != DeliveryStatus::Delivered {
            tracing::warn!(
                store_id = %key.store_id,
                carrier_id = %key.carrier_id,
                tracking_number = %key.tracking_number,
                latest_event_status = update.latest_event_status.map_or("NONE", TrackEventStatusCode::as_str),
                "carrier reverted a delivered parcel; keeping completed_at"
            );
        }
    }
    let completed_at = previous_completed_at
        .or_else(|| (update.status == DeliveryStatus::Delivered).then_some(now));

    store
        .save(TrackingWrite {
            key,
            carrier_name,
            update: &update,
            memo,
            completed_at,
            now,
        })
        .await
}

/// Delete a tracking row owned by `store_id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no such row exists for this store.
pub async fn delete_tracking<S: TrackingStore>(
    store: &S,
    id: i64,
    store_id: &str,
) -> Result<(), DbError> {
    if store.delete(id, store_id).await? {
        Ok(())
    } else {
        Err(DbError::NotFound)
    }
}

/// # Errors
///
/// Returns [`DbError`] if the backend fails.
pub async fn list_trackings<S: TrackingStore>(
    store: &S,
    store_id: &str,
    status: Option<DeliveryStatus>,
) -> Result<Vec<DeliveryTracking>, DbError> {
    store.list(store_id, status).await
}

/// # Errors
///
/// Returns [`DbError`] if the backend fails.
pub async fn list_in_progress<S: TrackingStore>(
    store: &S,
    limit: usize,
) -> Result<Vec<DeliveryTracking>, DbError> {
    store.list_in_progress(limit).await
}

// ---------------------------------------------------------------------------
// Postgres
// ---------------------------------------------------------------------------

const COLUMNS: &str = "id, public_id, store_id, carrier_id, carrier_name, tracking_number, \
     status, latest_event_status, latest_event_time, latest_event_description, \
     sender_name, sender_address, recipient_name, recipient_address, product_name, \
     memo, events, completed_at, created_at, updated_at";

/// A row from the `delivery_trackings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct DeliveryTrackingRow {
    id: i64,
    public_id: Uuid,
    store_id: String,
    carrier_id: String,
    carrier_name: String,
    tracking_number: String,
    status: String,
    latest_event_status: Option<String>,
    latest_event_time: Option<DateTime<Utc>>,
    latest_event_description: Option<String>,
    sender_name: Option<String>,
    sender_address: Option<String>,
    recipient_name: Option<String>,
    recipient_address: Option<String>,
    product_name: Option<String>,
    memo: Option<String>,
    events: serde_json::Value,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<DeliveryTrackingRow> for DeliveryTracking {
    type Error = DbError;

    fn try_from(row: DeliveryTrackingRow) -> Result<Self, DbError> {
        let status = row
            .status
            .parse::<DeliveryStatus>()
            .map_err(|_| DbError::InvalidColumn {
                column: "status",
                value: row.status.clone(),
            })?;
        Ok(Self {
            id: row.id,
            public_id: row.public_id,
            store_id: row.store_id,
            carrier_id: row.carrier_id,
            carrier_name: row.carrier_name,
            tracking_number: row.tracking_number,
            status,
            latest_event_status: row
                .latest_event_status
                .as_deref()
                .map(TrackEventStatusCode::parse),
            latest_event_time: row.latest_event_time,
            latest_event_description: row.latest_event_description,
            sender_name: row.sender_name,
            sender_address: row.sender_address,
            recipient_name: row.recipient_name,
            recipient_address: row.recipient_address,
            product_name: row.product_name,
            memo: row.memo,
            events: serde_json::from_value(row.events)?,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn into_trackings(rows: Vec<DeliveryTrackingRow>) -> Result<Vec<DeliveryTracking>, DbError> {
    rows.into_iter().map(DeliveryTracking::try_from).collect()
}

/// [`TrackingStore`] over a Postgres pool.
#[derive(Debug, Clone)]
pub struct PgTrackingStore {
    pool: PgPool,
}

impl PgTrackingStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl TrackingStore for PgTrackingStore {
    async fn find(&self, key: &TrackingKey) -> Result<Option<DeliveryTracking>, DbError> {
        let row = sqlx::query_as::<_, DeliveryTrackingRow>(&format!(
            "SELECT {COLUMNS} FROM delivery_trackings \
             WHERE store_id = $1 AND carrier_id = $2 AND tracking_number = $3"
        ))
        .bind(&key.store_id)
        .bind(&key.carrier_id)
        .bind(&key.tracking_number)
        .fetch_optional(&self.pool)
        .await?;

        row.map(DeliveryTracking::try_from).transpose()
    }

    /// `completed_at` is merged with `COALESCE` so a concurrent writer can
    /// never clear it either.
    async fn save(&self, write: TrackingWrite<'_>) -> Result<DeliveryTracking, DbError> {
        let update = write.update;
        let events = serde_json::to_value(&update.events)?;

        let row = sqlx::query_as::<_, DeliveryTrackingRow>(&format!(
            "INSERT INTO delivery_trackings \
                 (public_id, store_id, carrier_id, carrier_name, tracking_number, status, \
                  latest_event_status, latest_event_time, latest_event_description, \
                  sender_name, sender_address, recipient_name, recipient_address, \
                  product_name, memo, events, completed_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                     $16::jsonb, $17, $18, $18) \
             ON CONFLICT (store_id, carrier_id, tracking_number) DO UPDATE SET \
                 carrier_name             = EXCLUDED.carrier_name, \
                 status                   = EXCLUDED.status, \
                 latest_event_status      = EXCLUDED.latest_event_status, \
                 latest_event_time        = EXCLUDED.latest_event_time, \
                 latest_event_description = EXCLUDED.latest_event_description, \
                 sender_name              = EXCLUDED.sender_name, \
                 sender_address           = EXCLUDED.sender_address, \
                 recipient_name           = EXCLUDED.recipient_name, \
                 recipient_address        = EXCLUDED.recipient_address, \
                 product_name             = EXCLUDED.product_name, \
                 memo                     = COALESCE(EXCLUDED.memo, delivery_trackings.memo), \
                 events                   = EXCLUDED.events, \
                 completed_at             = COALESCE(delivery_trackings.completed_at, EXCLUDED.completed_at), \
                 updated_at               = EXCLUDED.updated_at \
             RETURNING {COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&write.key.store_id)
        .bind(&write.key.carrier_id)
        .bind(write.carrier_name)
        .bind(&write.key.tracking_number)
        .bind(update.status.as_str())
        .bind(update.latest_event_status.map(TrackEventStatusCode::as_str))
        .bind(update.latest_event_time)
        .bind(&update.latest_event_description)
        .bind(&update.sender_name)
        .bind(&update.sender_address)
        .bind(&update.recipient_name)
        .bind(&update.recipient_address)
        .bind(&update.product_name)
        .bind(write.memo)
        .bind(events)
        .bind(write.completed_at)
        .bind(write.now)
        .fetch_one(&self.pool)
        .await?;

        DeliveryTracking::try_from(row)
    }

    async fn delete(&self, id: i64, store_id: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM delivery_trackings WHERE id = $1 AND store_id = $2")
            .bind(id)
            .bind(store_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        store_id: &str,
        status: Option<DeliveryStatus>,
    ) -> Result<Vec<DeliveryTracking>, DbError> {
        let rows = sqlx::query_as::<_, DeliveryTrackingRow>(&format!(
            "SELECT {COLUMNS} FROM delivery_trackings \
             WHERE store_id = $1 AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(store_id)
        .bind(status.map(DeliveryStatus::as_str))
        .fetch_all(&self.pool)
        .await?;

        into_trackings(rows)
    }

    async fn list_in_progress(&self, limit: usize) -> Result<Vec<DeliveryTracking>, DbError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, DeliveryTrackingRow>(&format!(
            "SELECT {COLUMNS} FROM delivery_trackings \
             WHERE status = 'IN_PROGRESS' \
             ORDER BY updated_at ASC, id ASC \
             LIMIT $1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        into_trackings(rows)
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// [`TrackingStore`] kept in process memory. Used when no database is
/// configured, and in tests.
#[derive(Debug, Default)]
pub struct MemoryTrackingStore {
    inner: Mutex<MemoryRows>,
}

#[derive(Debug, Default)]
struct MemoryRows {
    next_id: i64,
    rows: Vec<DeliveryTracking>,
}

impl MemoryTrackingStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_rows<T>(&self, f: impl FnOnce(&mut MemoryRows) -> T) -> T {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl TrackingStore for MemoryTrackingStore {
    async fn find(&self, key: &TrackingKey) -> Result<Option<DeliveryTracking>, DbError> {
        Ok(self.with_rows(|m| m.rows.iter().find(|r| r.key() == *key).cloned()))
    }

    async fn save(&self, write: TrackingWrite<'_>) -> Result<DeliveryTracking, DbError> {
        let update = write.update;
        Ok(self.with_rows(|m| {
            let position = m.rows.iter().position(|r| r.key() == *write.key);
            let row = match position {
                Some(i) => &mut m.rows[i],
                None => {
                    m.next_id += 1;
                    m.rows.push(DeliveryTracking {
                        id: m.next_id,
                        public_id: Uuid::new_v4(),
                        store_id: write.key.store_id.clone(),
                        carrier_id: write.key.carrier_id.clone(),
                        carrier_name: String::new(),
                        tracking_number: write.key.tracking_number.clone(),
                        status: DeliveryStatus::InProgress,
                        latest_event_status: None,
                        latest_event_time: None,
                        latest_event_description: None,
                        sender_name: None,
                        sender_address: None,
                        recipient_name: None,
                        recipient_address: None,
                        product_name: None,
                        memo: None,
                        events: Vec::new(),
                        completed_at: None,
                        created_at: write.now,
                        updated_at: write.now,
                    });
                    let last = m.rows.len() - 1;
                    &mut m.rows[last]
                }
            };

            row.carrier_name = write.carrier_name.to_string();
            row.status = update.status;
            row.latest_event_status = update.latest_event_status;
            row.latest_event_time = update.latest_event_time;
            row.latest_event_description.clone_from(&update.latest_event_description);
            row.sender_name.clone_from(&update.sender_name);
            row.sender_address.clone_from(&update.sender_address);
            row.recipient_name.clone_from(&update.recipient_name);
            row.recipient_address.clone_from(&update.recipient_address);
            row.product_name.clone_from(&update.product_name);
            if let Some(memo) = write.memo {
                row.memo = Some(memo.to_string());
            }
            row.events.clone_from(&update.events);
            row.completed_at = row.completed_at.or(write.completed_at);
            row.updated_at = write.now;
            row.clone()
        }))
    }

    async fn delete(&self, id: i64, store_id: &str) -> Result<bool, DbError> {
        Ok(self.with_rows(|m| {
            let before = m.rows.len();
            m.rows.retain(|r| !(r.id == id && r.store_id == store_id));
            m.rows.len() < before
        }))
    }

    async fn list(
        &self,
        store_id: &str,
        status: Option<DeliveryStatus>,
    ) -> Result<Vec<DeliveryTracking>, DbError> {
        Ok(self.with_rows(|m| {
            let mut rows: Vec<DeliveryTracking> = m
                .rows
                .iter()
                .filter(|r| r.store_id == store_id && status.is_none_or(|s| r.status == s))
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            rows
        }))
    }

    async fn list_in_progress(&self, limit: usize) -> Result<Vec<DeliveryTracking>, DbError> {
        Ok(self.with_rows(|m| {
            let mut rows: Vec<DeliveryTracking> = m
                .rows
                .iter()
                .filter(|r| r.status == DeliveryStatus::InProgress)
                .cloned()
                .collect();
            rows.sort_by(|a, b| a.updated_at.cmp(&b.updated_at).then(a.id.cmp(&b.id)));
            rows.truncate(limit);
            rows
        }))
    }
}

#[cfg(test)]
#[path = "trackings_test.rs"]
mod tests;
