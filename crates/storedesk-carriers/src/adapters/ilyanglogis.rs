//! Ilyang Logis: form POST to a JSON API wrapped in `resultAPI`.

use serde::Deserialize;
use storedesk_core::{CarrierRef, TrackEventStatusCode, TrackInfo};

use super::{event, found, non_empty, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "https://www.ilyanglogis.co.kr";
const API_PATH: &str = "/include/getAPIResult.asp";
const OK_CODE: &str = "R0";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiResponse {
    #[serde(rename = "resultAPI")]
    result: ApiResult,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ApiResult {
    head: Head,
    body: Option<Body>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Head {
    #[serde(rename = "returnCode")]
    code: String,
    #[serde(rename = "returnDesc")]
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Body {
    #[serde(rename = "resultList")]
    results: Vec<Shipment>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Shipment {
    #[serde(rename = "lastTrackingDesc")]
    last_tracking: Option<String>,
    #[serde(rename = "resultDesc")]
    result: Option<String>,
    tracking: Option<Vec<Checkpoint>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Checkpoint {
    #[serde(rename = "chkPointDesc")]
    description: String,
    #[serde(rename = "actDate")]
    date: Option<String>,
    #[serde(rename = "actTime")]
    time: Option<String>,
    #[serde(rename = "stationName")]
    station: String,
}

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    let response: ApiResponse = ctx
        .post_form_json(
            API_PATH,
            &[
                ("req_type", "TRACKING"),
                ("tracking_type", "0"),
                ("blNum", tracking_number),
            ],
        )
        .await?;
    Ok(parse(ctx.carrier_ref(), tracking_number, response))
}

fn parse(carrier: CarrierRef, tracking_number: &str, response: ApiResponse) -> TrackInfo {
    let ApiResult { head, body } = response.result;
    if head.code != OK_CODE {
        let detail = head.description.unwrap_or_default();
        return TrackInfo::not_found(
            carrier,
            tracking_number,
            format!("[일양로지스 내부 에러] {detail}"),
        );
    }

    let Some(shipment) = body.and_then(|b| b.results.into_iter().next()) else {
        return TrackInfo::not_found(carrier, tracking_number, super::NOT_FOUND_MESSAGE);
    };
    let Some(checkpoints) = shipment.tracking else {
        let message = shipment
            .last_tracking
            .and_then(non_empty)
            .or_else(|| shipment.result.and_then(non_empty))
            .unwrap_or_else(|| super::NOT_FOUND_MESSAGE.to_string());
        return TrackInfo::not_found(carrier, tracking_number, message);
    };

    let events = checkpoints
        .into_iter()
        .map(|point| {
            event(
                status_code(&point.description),
                non_empty(point.description.clone()),
                parse_carrier_datetime(
                    point.date.as_deref(),
                    point.time.as_deref(),
                    DateFormat::Compact,
                ),
                non_empty(point.station.clone()),
                Some(format!("{} - {}", point.description, point.station)),
            )
        })
        .collect();
    found(carrier, tracking_number, events, None, None, None)
}

fn status_code(description: &str) -> TrackEventStatusCode {
    match description {
        "발송사무소 인수" => TrackEventStatusCode::AtPickup,
        "배송경유지 출고" | "배송경유지 도착" => TrackEventStatusCode::InTransit,
        "직원 배송중" => TrackEventStatusCode::OutForDelivery,
        "배달완료" => TrackEventStatusCode::Delivered,
        _ => TrackEventStatusCode::Unknown,
    }
}
