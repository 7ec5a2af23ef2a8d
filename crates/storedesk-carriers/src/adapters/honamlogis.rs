//! Honam Logistics: form POST returning scan details as JSON.

use serde::Deserialize;
use storedesk_core::{CarrierRef, TrackEventStatusCode, TrackInfo};

use super::{event, found, non_empty, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "http://inkoin.com";
const TRACKING_PATH: &str = "/tracking_number.php";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrackingResponse {
    #[serde(rename = "ODS0_TOTAL")]
    total: u32,
    #[serde(rename = "ODS0")]
    shipments: Vec<Shipment>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Shipment {
    #[serde(rename = "TRACKING_DTL")]
    scans: Vec<Scan>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Scan {
    #[serde(rename = "SCANGB_NM")]
    kind: String,
    /// `YYYYMMDDHHMMSS`.
    #[serde(rename = "SCAN_DM")]
    scanned_at: Option<String>,
    #[serde(rename = "SCAN_USER_NM")]
    scanned_by: Option<String>,
}

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    let response: TrackingResponse = ctx
        .post_form_json(TRACKING_PATH, &[("SLIP_BARCD", tracking_number)])
        .await?;
    Ok(parse(ctx.carrier_ref(), tracking_number, response))
}

fn parse(carrier: CarrierRef, tracking_number: &str, response: TrackingResponse) -> TrackInfo {
    let shipment = response.shipments.into_iter().next();
    let Some(shipment) = shipment.filter(|_| response.total > 0) else {
        return TrackInfo::not_found(carrier, tracking_number, super::NOT_FOUND_MESSAGE);
    };

    let events = shipment
        .scans
        .into_iter()
        .map(|scan| {
            let stamp = scan.scanned_at.as_deref();
            event(
                status_code(&scan.kind),
                non_empty(scan.kind.clone()),
                parse_carrier_datetime(stamp, stamp.and_then(|s| s.get(8..)), DateFormat::Compact),
                scan.scanned_by.and_then(non_empty),
                non_empty(scan.kind),
            )
        })
        .collect();
    found(carrier, tracking_number, events, None, None, None)
}

fn status_code(kind: &str) -> TrackEventStatusCode {
    match kind {
        "노선상차" | "집하입고" | "집하상차" | "HUB T/M도착" | "T/M출고" | "터미널출고"
        | "터미널입고" | "노선하차" | "영업소입고" => TrackEventStatusCode::InTransit,
        "배송출발" => TrackEventStatusCode::OutForDelivery,
        "배송완료" => TrackEventStatusCode::Delivered,
        _ => TrackEventStatusCode::Unknown,
    }
}
