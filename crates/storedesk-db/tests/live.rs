//! Live integration tests for `PgTrackingStore` using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness, so they need `DATABASE_URL` pointing at a server the
//! harness may create databases on. Run with `cargo test -- --ignored`.
//! The `migrations` path is relative to the crate root
//! (`crates/storedesk-db/`).

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use storedesk_core::{
    CarrierRef, DeliveryStatus, TrackEvent, TrackEventStatus, TrackEventStatusCode, TrackInfo,
};
use storedesk_db::{
    delete_tracking, list_in_progress, list_trackings, upsert_tracking, DbError, PgTrackingStore,
    TrackingKey,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn track_info(codes: &[TrackEventStatusCode]) -> TrackInfo {
    let kst = FixedOffset::east_opt(9 * 3600).unwrap();
    let events = codes
        .iter()
        .zip(1u32..)
        .map(|(code, day)| TrackEvent {
            status: TrackEventStatus::new(*code, code.as_str()),
            time: Some(kst.with_ymd_and_hms(2024, 3, day, 9, 0, 0).unwrap()),
            location: Some("옥천HUB".to_string()),
            description: None,
        })
        .collect();
    TrackInfo {
        success: true,
        carrier: CarrierRef {
            id: "CJ".to_string(),
            name: "CJ대한통운".to_string(),
        },
        tracking_number: "123456789012".to_string(),
        sender: None,
        recipient: None,
        product_name: Some("무선 이어폰".to_string()),
        events,
        error: None,
    }
}

fn key() -> TrackingKey {
    TrackingKey::new("store-1", "CJ", "123456789012")
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap()
}

use TrackEventStatusCode as Code;

// ---------------------------------------------------------------------------
// Upsert
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn delivered_history_round_trips(pool: sqlx::PgPool) {
    let store = PgTrackingStore::new(pool);
    let info = track_info(&[Code::InformationReceived, Code::InTransit, Code::Delivered]);

    let row = upsert_tracking(&store, &key(), "CJ대한통운", &info, Some("메모"), t0())
        .await
        .expect("upsert failed");

    assert_eq!(row.status, DeliveryStatus::Delivered);
    assert_eq!(row.latest_event_status, Some(Code::Delivered));
    assert_eq!(row.completed_at, Some(t0()));
    assert_eq!(row.events, info.events);
    assert_eq!(row.memo.as_deref(), Some("메모"));
    assert_eq!(row.product_name.as_deref(), Some("무선 이어폰"));
}

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn repeated_upsert_keeps_one_row_and_completion(pool: sqlx::PgPool) {
    let store = PgTrackingStore::new(pool.clone());
    let delivered = track_info(&[Code::InTransit, Code::Delivered]);

    let first = upsert_tracking(&store, &key(), "CJ대한통운", &delivered, None, t0())
        .await
        .expect("first upsert failed");
    let later = t0() + Duration::hours(2);
    let second = upsert_tracking(&store, &key(), "CJ대한통운", &delivered, None, later)
        .await
        .expect("second upsert failed");

    assert_eq!(first.id, second.id);
    assert_eq!(second.updated_at, later);
    assert_eq!(second.completed_at, Some(t0()));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM delivery_trackings")
        .fetch_one(&pool)
        .await
        .expect("count failed");
    assert_eq!(count, 1);

    let reverted = upsert_tracking(
        &store,
        &key(),
        "CJ대한통운",
        &track_info(&[Code::InTransit, Code::Delivered, Code::Exception]),
        None,
        later + Duration::hours(1),
    )
    .await
    .expect("third upsert failed");
    assert_eq!(reverted.status, DeliveryStatus::InProgress);
    assert_eq!(reverted.completed_at, Some(t0()));
}

// ---------------------------------------------------------------------------
// Listing and deletion
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
#[ignore = "requires DATABASE_URL"]
async fn list_and_delete_respect_store(pool: sqlx::PgPool) {
    let store = PgTrackingStore::new(pool);
    let in_transit = track_info(&[Code::InTransit]);
    let row = upsert_tracking(&store, &key(), "CJ대한통운", &in_transit, None, t0())
        .await
        .expect("upsert failed");

    let listed = list_trackings(&store, "store-1", Some(DeliveryStatus::InProgress))
        .await
        .expect("list failed");
    assert_eq!(listed.len(), 1);
    assert!(list_trackings(&store, "store-1", Some(DeliveryStatus::Delivered))
        .await
        .expect("list failed")
        .is_empty());
    assert_eq!(list_in_progress(&store, 10).await.expect("list failed").len(), 1);

    let err = delete_tracking(&store, row.id, "store-2")
        .await
        .expect_err("foreign store must not delete");
    assert!(matches!(err, DbError::NotFound));

    delete_tracking(&store, row.id, "store-1")
        .await
        .expect("delete failed");
    assert!(list_trackings(&store, "store-1", None)
        .await
        .expect("list failed")
        .is_empty());
}
