//! Homepick: a universal inquiry resolves the order box, whose history is newest first.

use serde::Deserialize;
use storedesk_core::{CarrierRef, TrackEventStatusCode, TrackInfo};

use super::{event, found, non_empty, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "https://www.homepick.com";
const INQUIRY_PATH: &str = "/user/api/delivery/universalInquiry";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InquiryResponse {
    success: bool,
    message: Option<String>,
    /// Order box id.
    data: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DeliveryResponse {
    data: DeliveryData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DeliveryData {
    delivery: Delivery,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Delivery {
    #[serde(rename = "orderStatusHistoryList")]
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HistoryEntry {
    #[serde(rename = "trackingStatus")]
    status: String,
    #[serde(rename = "tmsStatusName")]
    tms_status_name: Option<String>,
    #[serde(rename = "trackingStatusName")]
    status_name: Option<String>,
    #[serde(rename = "statusDateTime")]
    time: Option<String>,
    location: Option<String>,
    contents: Option<String>,
}

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    let inquiry: InquiryResponse = ctx
        .get_json(INQUIRY_PATH, &[("keyword", tracking_number)])
        .await?;
    let order_box = match inquiry.data.and_then(non_empty) {
        Some(id) if inquiry.success => id,
        _ => {
            let message = inquiry
                .message
                .and_then(non_empty)
                .unwrap_or_else(|| super::NOT_FOUND_MESSAGE.to_string());
            return Ok(TrackInfo::not_found(ctx.carrier_ref(), tracking_number, message));
        }
    };

    let delivery: DeliveryResponse = ctx
        .get_json(&format!("/user/api/delivery/{order_box}"), &[])
        .await?;
    Ok(parse(ctx.carrier_ref(), tracking_number, delivery))
}

fn parse(carrier: CarrierRef, tracking_number: &str, response: DeliveryResponse) -> TrackInfo {
    let events = response
        .data
        .delivery
        .history
        .into_iter()
        .rev()
        .map(|entry| {
            event(
                status_code(&entry.status),
                entry
                    .tms_status_name
                    .and_then(non_empty)
                    .or_else(|| entry.status_name.and_then(non_empty)),
                parse_carrier_datetime(entry.time.as_deref(), None, DateFormat::Iso),
                entry.location.and_then(non_empty),
                entry.contents.and_then(non_empty),
            )
        })
        .collect();
    found(carrier, tracking_number, events, None, None, None)
}

fn status_code(status: &str) -> TrackEventStatusCode {
    match status {
        "RECEIVED" => TrackEventStatusCode::InformationReceived,
        "TERMINAL_IN" | "MOVING" => TrackEventStatusCode::InTransit,
        "DLV_START" => TrackEventStatusCode::OutForDelivery,
        "COMPLETED" => TrackEventStatusCode::Delivered,
        _ => TrackEventStatusCode::Unknown,
    }
}
