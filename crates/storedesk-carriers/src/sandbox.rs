//! Synthetic tracking for `TEST`-prefixed numbers.
//!
//! The history is anchored to a fixed date so repeated calls produce
//! identical output, which keeps downstream upserts and tests stable.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use storedesk_core::{CarrierRef, Party, TrackEvent, TrackEventStatusCode, TrackInfo};

use crate::adapters::{event, found};
use crate::registry::SANDBOX_PREFIX;
use crate::time::kst;

/// Numbers starting with this prefix get a delivered history.
pub const SANDBOX_DELIVERED_PREFIX: &str = "TESTDEL";

/// Day the synthetic parcel goes out for delivery.
const ANCHOR: (i32, u32, u32) = (2024, 1, 15);

struct Step {
    day_offset: i64,
    hour: u32,
    minute: u32,
    code: TrackEventStatusCode,
    name: &'static str,
    location: &'static str,
}

const IN_TRANSIT_STEPS: [Step; 4] = [
    Step {
        day_offset: -3,
        hour: 14,
        minute: 30,
        code: TrackEventStatusCode::InformationReceived,
        name: "접수",
        location: "발송지 (서울 강남)",
    },
    Step {
        day_offset: -2,
        hour: 9,
        minute: 15,
        code: TrackEventStatusCode::AtPickup,
        name: "집하",
        location: "서울 강남 영업소",
    },
    Step {
        day_offset: -1,
        hour: 20,
        minute: 0,
        code: TrackEventStatusCode::InTransit,
        name: "간선상차",
        location: "서울 물류센터",
    },
    Step {
        day_offset: 0,
        hour: 7,
        minute: 30,
        code: TrackEventStatusCode::OutForDelivery,
        name: "배송출발",
        location: "부산 해운대 영업소",
    },
];

const DELIVERED_STEP: Step = Step {
    day_offset: 0,
    hour: 15,
    minute: 45,
    code: TrackEventStatusCode::Delivered,
    name: "배송완료",
    location: "부산 해운대구",
};

/// Whether a cleaned sandbox number asks for a delivered history.
#[must_use]
pub fn is_delivered_sandbox(cleaned: &str) -> bool {
    cleaned
        .get(..SANDBOX_DELIVERED_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(SANDBOX_DELIVERED_PREFIX))
}

/// Build the synthetic snapshot for `carrier` without any network access.
#[must_use]
pub fn sandbox_track_info(carrier: CarrierRef, cleaned: &str) -> TrackInfo {
    debug_assert!(cleaned
        .get(..SANDBOX_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(SANDBOX_PREFIX)));

    let mut events: Vec<TrackEvent> = IN_TRANSIT_STEPS.iter().map(step_event).collect();
    if is_delivered_sandbox(cleaned) {
        events.push(step_event(&DELIVERED_STEP));
    }

    found(
        carrier,
        cleaned,
        events,
        Party::from_parts(
            Some("테스트 발송인".to_string()),
            Some("서울특별시 강남구 테헤란로 1".to_string()),
        ),
        Party::from_parts(
            Some("테스트 수령인".to_string()),
            Some("부산광역시 해운대구 해운대로 1".to_string()),
        ),
        Some("테스트 상품".to_string()),
    )
}

fn step_event(step: &Step) -> TrackEvent {
    event(
        step.code,
        Some(step.name.to_string()),
        step_time(step),
        Some(step.location.to_string()),
        Some(format!("{} - {}", step.name, step.location)),
    )
}

fn step_time(step: &Step) -> Option<DateTime<FixedOffset>> {
    let (year, month, day) = ANCHOR;
    let date = NaiveDate::from_ymd_opt(year, month, day)?
        .checked_add_signed(chrono::Duration::days(step.day_offset))?;
    let naive = date.and_hms_opt(step.hour, step.minute, 0)?;
    kst().from_local_datetime(&naive).single()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carrier() -> CarrierRef {
        CarrierRef {
            id: "HANJIN".to_string(),
            name: "한진택배".to_string(),
        }
    }

    #[test]
    fn test_number_ends_out_for_delivery() {
        let info = sandbox_track_info(carrier(), "TEST0001");
        assert!(info.success);
        assert_eq!(info.events.len(), 4);
        assert_eq!(
            info.latest_event().map(|e| e.status.code),
            Some(TrackEventStatusCode::OutForDelivery)
        );
        assert!(!info.is_delivered());
    }

    #[test]
    fn testdel_number_is_delivered() {
        let info = sandbox_track_info(carrier(), "TESTDEL01");
        assert_eq!(info.events.len(), 5);
        assert!(info.is_delivered());
        assert_eq!(
            info.latest_event()
                .and_then(|e| e.time)
                .map(|t| t.to_rfc3339())
                .as_deref(),
            Some("2024-01-15T15:45:00+09:00")
        );
    }

    #[test]
    fn output_is_deterministic_and_chronological() {
        let a = sandbox_track_info(carrier(), "TESTDEL01");
        let b = sandbox_track_info(carrier(), "TESTDEL01");
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
        let times: Vec<_> = a.events.iter().map(|e| e.time.unwrap()).collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(
            times[0].to_rfc3339(),
            "2024-01-12T14:30:00+09:00"
        );
    }

    #[test]
    fn delivered_prefix_is_case_insensitive() {
        assert!(is_delivered_sandbox("testdel1"));
        assert!(!is_delivered_sandbox("TEST1"));
    }
}
