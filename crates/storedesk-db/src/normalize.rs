//! Pure derivation of persisted tracking columns from a [`TrackInfo`].

use chrono::{DateTime, Utc};
use storedesk_core::{DeliveryStatus, TrackEvent, TrackEventStatusCode, TrackInfo};

/// Column values recomputed from a tracking snapshot on every upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackingUpdate {
    pub status: DeliveryStatus,
    pub latest_event_status: Option<TrackEventStatusCode>,
    pub latest_event_time: Option<DateTime<Utc>>,
    pub latest_event_description: Option<String>,
    pub sender_name: Option<String>,
    pub sender_address: Option<String>,
    pub recipient_name: Option<String>,
    pub recipient_address: Option<String>,
    pub product_name: Option<String>,
    pub events: Vec<TrackEvent>,
}

/// Derive the persisted columns from `info`.
///
/// The latest event is the last element of `events`. Status is `DELIVERED`
/// iff that event's code is `DELIVERED`; with no events it is `IN_PROGRESS`.
/// The description falls back to the carrier's status name.
#[must_use]
pub fn derive_tracking_update(info: &TrackInfo) -> TrackingUpdate {
    let latest = info.latest_event();
    let latest_code = latest.map(|e| e.status.code);

    TrackingUpdate {
        status: DeliveryStatus::from_latest(latest_code),
        latest_event_status: latest_code,
        latest_event_time: latest.and_then(|e| e.time).map(|t| t.with_timezone(&Utc)),
        latest_event_description: latest.and_then(|e| {
            e.description
                .clone()
                .filter(|d| !d.trim().is_empty())
                .or_else(|| e.status.name.clone())
        }),
        sender_name: info.sender.as_ref().and_then(|p| p.name.clone()),
        sender_address: info.sender.as_ref().and_then(|p| p.address.clone()),
        recipient_name: info.recipient.as_ref().and_then(|p| p.name.clone()),
        recipient_address: info.recipient.as_ref().and_then(|p| p.address.clone()),
        product_name: info.product_name.clone(),
        events: info.events.clone(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use storedesk_core::{CarrierRef, Party, TrackEventStatus};

    use super::*;

    fn event(code: TrackEventStatusCode, name: &str, hour: u32, description: Option<&str>) -> TrackEvent {
        let kst = FixedOffset::east_opt(9 * 3600).unwrap();
        TrackEvent {
            status: TrackEventStatus::new(code, name),
            time: Some(kst.with_ymd_and_hms(2024, 3, 2, hour, 0, 0).unwrap()),
            location: Some("서울".to_string()),
            description: description.map(str::to_string),
        }
    }

    fn info(events: Vec<TrackEvent>) -> TrackInfo {
        TrackInfo {
            success: true,
            carrier: CarrierRef {
                id: "CJ".to_string(),
                name: "CJ대한통운".to_string(),
            },
            tracking_number: "123456789012".to_string(),
            sender: Party::from_parts(Some("보내는이".to_string()), None),
            recipient: Party::from_parts(Some("홍*동".to_string()), Some("서울 강남구".to_string())),
            product_name: Some("이어폰".to_string()),
            events,
            error: None,
        }
    }

    #[test]
    fn delivered_latest_event_marks_delivered() {
        let update = derive_tracking_update(&info(vec![
            event(TrackEventStatusCode::InformationReceived, "접수", 9, None),
            event(TrackEventStatusCode::InTransit, "이동중", 12, Some("간선상차")),
            event(TrackEventStatusCode::Delivered, "배송완료", 15, Some("배송완료 - 고객 전달")),
        ]));

        assert_eq!(update.status, DeliveryStatus::Delivered);
        assert_eq!(update.latest_event_status, Some(TrackEventStatusCode::Delivered));
        assert_eq!(
            update.latest_event_time.unwrap().to_rfc3339(),
            "2024-03-02T06:00:00+00:00"
        );
        assert_eq!(
            update.latest_event_description.as_deref(),
            Some("배송완료 - 고객 전달")
        );
        assert_eq!(update.events.len(), 3);
    }

    #[test]
    fn delivered_earlier_in_history_is_not_delivered() {
        let update = derive_tracking_update(&info(vec![
            event(TrackEventStatusCode::Delivered, "배송완료", 9, None),
            event(TrackEventStatusCode::Exception, "반송", 12, None),
        ]));
        assert_eq!(update.status, DeliveryStatus::InProgress);
        assert_eq!(update.latest_event_status, Some(TrackEventStatusCode::Exception));
    }

    #[test]
    fn empty_history_is_in_progress_without_latest() {
        let update = derive_tracking_update(&info(Vec::new()));
        assert_eq!(update.status, DeliveryStatus::InProgress);
        assert_eq!(update.latest_event_status, None);
        assert_eq!(update.latest_event_time, None);
        assert_eq!(update.latest_event_description, None);
    }

    #[test]
    fn description_falls_back_to_status_name() {
        let update = derive_tracking_update(&info(vec![event(
            TrackEventStatusCode::OutForDelivery,
            "배송출발",
            8,
            Some("  "),
        )]));
        assert_eq!(update.latest_event_description.as_deref(), Some("배송출발"));
    }

    #[test]
    fn parties_are_flattened() {
        let update = derive_tracking_update(&info(Vec::new()));
        assert_eq!(update.sender_name.as_deref(), Some("보내는이"));
        assert_eq!(update.sender_address, None);
        assert_eq!(update.recipient_name.as_deref(), Some("홍*동"));
        assert_eq!(update.recipient_address.as_deref(), Some("서울 강남구"));
        assert_eq!(update.product_name.as_deref(), Some("이어폰"));
    }
}
