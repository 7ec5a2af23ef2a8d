//! Lotte Global Logistics: international parcels, statuses inferred from event text.

use serde::Deserialize;
use storedesk_core::{CarrierRef, TrackEventStatusCode, TrackInfo};

use super::{event, found, non_empty, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "https://www.lotteglogis.com";
const TRACK_PATH: &str = "/home/reservation/global/track_ajax";
const ERROR_RESULT: &str = "error";
/// The site's own spelling.
const MISSING_INVOICE: &str = "does't exists";

/// Description fragment to `(code, display name)`, first match wins.
const DESCRIPTION_STATUSES: &[(&str, TrackEventStatusCode, &str)] = &[
    ("상품을 발송", TrackEventStatusCode::InTransit, "상품 발송"),
    ("해외창고에 입고", TrackEventStatusCode::InTransit, "해외창고 입고"),
    ("발송주문 접수", TrackEventStatusCode::InTransit, "발송주문 접수"),
    ("수입신고", TrackEventStatusCode::InTransit, "수입신고"),
    ("통관처리", TrackEventStatusCode::InTransit, "통관처리"),
    ("입고", TrackEventStatusCode::InTransit, "입고"),
    ("출고", TrackEventStatusCode::InTransit, "출고"),
    ("접수", TrackEventStatusCode::InTransit, "접수"),
    ("로 물품을 보냈", TrackEventStatusCode::InTransit, "출고"),
    ("도착", TrackEventStatusCode::InTransit, "입고"),
    ("배달 준비중", TrackEventStatusCode::InTransit, "배달 준비중"),
    ("배달 완료", TrackEventStatusCode::Delivered, "배달 완료"),
];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrackResponse {
    #[serde(rename = "responseHeader")]
    header: ResponseHeader,
    #[serde(rename = "trackingEvents")]
    events: Option<EventList>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponseHeader {
    result: String,
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EventList {
    #[serde(rename = "trackingEvents")]
    events: Vec<GlobalEvent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GlobalEvent {
    description: String,
    /// `YYYYMMDD`.
    date: Option<String>,
    /// `HHMM`.
    time: Option<String>,
}

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    let response: TrackResponse = ctx
        .post_form_json(TRACK_PATH, &[("inv_no", tracking_number)])
        .await?;
    Ok(parse(ctx.carrier_ref(), tracking_number, response))
}

fn parse(carrier: CarrierRef, tracking_number: &str, response: TrackResponse) -> TrackInfo {
    let header = response.header;
    if header.result == ERROR_RESULT {
        let message = if header.message.contains(MISSING_INVOICE) {
            super::NOT_FOUND_MESSAGE.to_string()
        } else {
            header.message
        };
        return TrackInfo::not_found(carrier, tracking_number, message);
    }
    let Some(list) = response.events else {
        return TrackInfo::not_found(carrier, tracking_number, super::NOT_FOUND_MESSAGE);
    };

    let events = list
        .events
        .into_iter()
        .map(|e| {
            let (code, name) = status_from_description(&e.description);
            event(
                code,
                name.map(str::to_string),
                parse_carrier_datetime(e.date.as_deref(), e.time.as_deref(), DateFormat::Compact),
                None,
                non_empty(e.description),
            )
        })
        .collect();
    found(carrier, tracking_number, events, None, None, None)
}

fn status_from_description(description: &str) -> (TrackEventStatusCode, Option<&'static str>) {
    DESCRIPTION_STATUSES
        .iter()
        .find(|(fragment, _, _)| description.contains(fragment))
        .map_or((TrackEventStatusCode::Unknown, None), |&(_, code, name)| {
            (code, Some(name))
        })
}
