//! Lotte Global Logistics domestic parcels: JSON open API.

use serde::Deserialize;
use storedesk_core::{CarrierRef, Party, TrackEvent, TrackEventStatusCode, TrackInfo};

use super::{event, found, non_empty, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "https://ftr.alps.llogis.com:18260";
const TRACKING_PATH: &str = "/openapi/ftr/getCustomerInvTracking";

/// Status name Lotte uses when the recipient signature is recorded.
const RECIPIENT_REGISTERED: &str = "인수자등록";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrackingResponse {
    #[serde(rename = "errorCd")]
    error_code: Option<String>,
    tracking: Vec<Scan>,
    user: Option<Parcel>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Scan {
    #[serde(rename = "SCAN_YMD")]
    date: Option<String>,
    #[serde(rename = "SCAN_TME")]
    time: Option<String>,
    #[serde(rename = "BRNSHP_NM")]
    branch: Option<String>,
    #[serde(rename = "PTN_BRNSHP_NM")]
    partner_branch: Option<String>,
    #[serde(rename = "STATUS")]
    status: Option<String>,
    #[serde(rename = "GODS_STAT_CD")]
    status_code: Option<String>,
    #[serde(rename = "GODS_STAT_NM")]
    status_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Parcel {
    #[serde(rename = "NM1")]
    sender_name: Option<String>,
    #[serde(rename = "NM2")]
    recipient_name: Option<String>,
    #[serde(rename = "ITEM_NM")]
    item_name: Option<String>,
    #[serde(rename = "AD1")]
    sender_address: Option<String>,
    #[serde(rename = "AD2")]
    recipient_address: Option<String>,
}

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    if !is_valid(tracking_number) {
        return Err(ctx.invalid_number(tracking_number));
    }

    let response: TrackingResponse = ctx
        .get_json(TRACKING_PATH, &[("invNo", tracking_number)])
        .await?;
    Ok(parse(ctx.carrier_ref(), tracking_number, response))
}

/// Twelve digits whose last digit is the first eleven modulo 7.
fn is_valid(tracking_number: &str) -> bool {
    if tracking_number.len() != 12 || !tracking_number.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let (body, check) = tracking_number.split_at(11);
    match (body.parse::<u64>(), check.parse::<u64>()) {
        (Ok(body), Ok(check)) => body % 7 == check,
        _ => false,
    }
}

fn parse(carrier: CarrierRef, tracking_number: &str, response: TrackingResponse) -> TrackInfo {
    if response.tracking.is_empty() {
        let message = match response.error_code.as_deref() {
            Some(code) if code != "0" => format!("{} (errorCd {code})", super::NOT_FOUND_MESSAGE),
            _ => super::NOT_FOUND_MESSAGE.to_string(),
        };
        return TrackInfo::not_found(carrier, tracking_number, message);
    }

    let mut events: Vec<TrackEvent> = response
        .tracking
        .into_iter()
        .map(|scan| {
            let time = match scan.time.as_deref() {
                Some("------") => Some("235959"),
                other => other,
            };
            let description = format!(
                "{} - {}",
                scan.partner_branch.as_deref().unwrap_or_default(),
                scan.status.as_deref().unwrap_or_default()
            );
            event(
                status_code(scan.status_code.as_deref().unwrap_or_default()),
                scan.status_name.and_then(non_empty),
                parse_carrier_datetime(scan.date.as_deref(), time, DateFormat::Compact),
                scan.branch.and_then(non_empty),
                Some(description),
            )
        })
        .collect();

    if let Some(delivered) = inferred_delivery(&events) {
        events.push(delivered);
    }

    let parcel = response.user.unwrap_or_default();
    let sender = parcel
        .sender_name
        .and_then(non_empty)
        .and_then(|name| Party::from_parts(Some(name), parcel.sender_address));
    let recipient = parcel
        .recipient_name
        .and_then(non_empty)
        .and_then(|name| Party::from_parts(Some(name), parcel.recipient_address));

    found(
        carrier,
        tracking_number,
        events,
        sender,
        recipient,
        parcel.item_name.and_then(non_empty),
    )
}

/// Lotte sometimes stops at the recipient registration scan without ever
/// emitting a delivered code; that scan is treated as the delivery.
fn inferred_delivery(events: &[TrackEvent]) -> Option<TrackEvent> {
    if events
        .iter()
        .any(|e| e.status.code == TrackEventStatusCode::Delivered)
    {
        return None;
    }
    let registered = events
        .iter()
        .rev()
        .find(|e| e.status.name.as_deref() == Some(RECIPIENT_REGISTERED))?;
    Some(event(
        TrackEventStatusCode::Delivered,
        Some("배달 완료".to_string()),
        registered.time,
        registered.location.clone(),
        Some("배달 완료 (인수자등록)".to_string()),
    ))
}

fn status_code(code: &str) -> TrackEventStatusCode {
    match code {
        "09" => TrackEventStatusCode::Exception,
        "10" => TrackEventStatusCode::AtPickup,
        "12" => TrackEventStatusCode::InformationReceived,
        "20" | "21" | "24" | "25" => TrackEventStatusCode::InTransit,
        "40" => TrackEventStatusCode::OutForDelivery,
        "41" | "42" | "45" => TrackEventStatusCode::Delivered,
        _ => TrackEventStatusCode::Unknown,
    }
}
