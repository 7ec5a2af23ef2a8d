//! Kyungdong Express: JSON scan list, with the older endpoint as a fallback.

use serde::Deserialize;
use storedesk_core::{CarrierRef, TrackEventStatusCode, TrackInfo};

use super::{event, found, non_empty, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "https://kdexp.com";
const SCAN_PATH: &str = "/service/delivery/new/ajax_basic.do";
const LEGACY_PATH: &str = "/service/delivery/ajax_basic.do";
const OK_RESULT: &str = "suc";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScanResponse {
    result: String,
    data: Option<ScanData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScanData {
    #[serde(rename = "scanList")]
    scans: Vec<Scan>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Scan {
    #[serde(rename = "scanDt")]
    time: Option<String>,
    #[serde(rename = "scanType")]
    kind: Option<String>,
    #[serde(rename = "scanTypeNm")]
    kind_name: Option<String>,
    #[serde(rename = "strtPointNm")]
    location: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LegacyResponse {
    result: String,
    items: Option<Vec<LegacyItem>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LegacyItem {
    reg_date: Option<String>,
    stat: Option<String>,
    location: Option<String>,
}

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    let query = [("barcode", tracking_number)];

    match ctx.get_json::<ScanResponse>(SCAN_PATH, &query).await {
        Ok(response) if response.result == OK_RESULT && response.data.is_some() => {
            return Ok(parse_scans(ctx.carrier_ref(), tracking_number, response));
        }
        Ok(_) => {
            tracing::debug!(tracking_number, "kdexp scan endpoint had no data, trying legacy");
        }
        Err(e) => {
            tracing::debug!(tracking_number, error = %e, "kdexp scan endpoint failed, trying legacy");
        }
    }

    let legacy: LegacyResponse = ctx.get_json(LEGACY_PATH, &query).await?;
    Ok(parse_legacy(ctx.carrier_ref(), tracking_number, legacy))
}

fn parse_scans(carrier: CarrierRef, tracking_number: &str, response: ScanResponse) -> TrackInfo {
    let scans = response.data.unwrap_or_default().scans;
    let events = scans
        .into_iter()
        .map(|scan| {
            let name = scan.kind_name.unwrap_or_default();
            let location = scan.location.unwrap_or_default();
            event(
                scan_code(scan.kind.as_deref().unwrap_or_default()),
                non_empty(name.clone()),
                parse_carrier_datetime(scan.time.as_deref(), None, DateFormat::Iso),
                non_empty(location.clone()),
                Some(format!("{name} - {location}")),
            )
        })
        .collect();
    found(carrier, tracking_number, events, None, None, None)
}

fn parse_legacy(carrier: CarrierRef, tracking_number: &str, response: LegacyResponse) -> TrackInfo {
    let Some(items) = response.items.filter(|_| response.result == OK_RESULT) else {
        return TrackInfo::not_found(carrier, tracking_number, super::NOT_FOUND_MESSAGE);
    };

    let events = items
        .into_iter()
        .map(|item| {
            let stat = item.stat.unwrap_or_default();
            let location = item.location.unwrap_or_default();
            event(
                legacy_code(&stat),
                non_empty(stat.clone()),
                parse_carrier_datetime(item.reg_date.as_deref(), None, DateFormat::Iso),
                non_empty(location.clone()),
                Some(format!("{stat} - {location}")),
            )
        })
        .collect();
    found(carrier, tracking_number, events, None, None, None)
}

fn scan_code(kind: &str) -> TrackEventStatusCode {
    match kind {
        "0002" => TrackEventStatusCode::AtPickup,
        "0003" | "0006" | "0008" => TrackEventStatusCode::InTransit,
        "0007" => TrackEventStatusCode::Delivered,
        _ => TrackEventStatusCode::Unknown,
    }
}

fn legacy_code(stat: &str) -> TrackEventStatusCode {
    match stat {
        "접수완료" => TrackEventStatusCode::InformationReceived,
        "영업소집하" => TrackEventStatusCode::AtPickup,
        "노선상차" | "터미널입고" | "영업소도착" | "배달차량상차" => {
            TrackEventStatusCode::InTransit
        }
        "배송완료" => TrackEventStatusCode::Delivered,
        _ => TrackEventStatusCode::Unknown,
    }
}
