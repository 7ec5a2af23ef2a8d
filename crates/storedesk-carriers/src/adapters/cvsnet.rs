//! CVSnet convenience-store parcels: JSON embedded in the tracking page.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use storedesk_core::{CarrierRef, TrackEventStatusCode, TrackInfo};

use super::{event, found, named, non_empty, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "https://www.cvsnet.co.kr";
const TRACKING_PATH: &str = "/invoice/tracking.do";

static TRACKING_INFO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"var\s+trackingInfo\s*=\s*(\{[\s\S]*?\});\s*\n").expect("valid regex")
});

/// Result codes the page uses for "no such invoice".
const NOT_FOUND_CODES: [i64; 3] = [100, 400, 404];

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TrackingPayload {
    code: Option<i64>,
    msg: Option<String>,
    sender: Option<Contact>,
    receiver: Option<Contact>,
    #[serde(rename = "goodsName")]
    goods_name: Option<String>,
    #[serde(rename = "trackingDetails")]
    details: Vec<Detail>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Contact {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Detail {
    #[serde(rename = "transCode")]
    code: Option<String>,
    #[serde(rename = "transKind")]
    kind: Option<String>,
    #[serde(rename = "transTime")]
    time: Option<String>,
    #[serde(rename = "transWhere")]
    location: Option<String>,
}

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    let html = ctx
        .get_text(TRACKING_PATH, &[("invoice_no", tracking_number)])
        .await?;

    let Some(raw) = extract_payload(&html) else {
        return Ok(TrackInfo::not_found(
            ctx.carrier_ref(),
            tracking_number,
            super::NOT_FOUND_MESSAGE,
        ));
    };
    let payload: TrackingPayload = ctx.decode_json(raw)?;
    Ok(parse(ctx.carrier_ref(), tracking_number, payload))
}

fn extract_payload(html: &str) -> Option<&str> {
    TRACKING_INFO_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn parse(carrier: CarrierRef, tracking_number: &str, payload: TrackingPayload) -> TrackInfo {
    if payload.code.is_some_and(|c| NOT_FOUND_CODES.contains(&c)) {
        let message = payload
            .msg
            .and_then(non_empty)
            .unwrap_or_else(|| super::NOT_FOUND_MESSAGE.to_string());
        return TrackInfo::not_found(carrier, tracking_number, message);
    }

    let events = payload
        .details
        .into_iter()
        .map(|detail| {
            let kind = detail.kind.unwrap_or_default();
            let description = format!("{kind} 하였습니다.");
            event(
                status_code(detail.code.as_deref().unwrap_or_default()),
                non_empty(kind),
                parse_carrier_datetime(detail.time.as_deref(), None, DateFormat::Iso),
                detail.location.and_then(non_empty),
                Some(description),
            )
        })
        .collect();

    found(
        carrier,
        tracking_number,
        events,
        named(payload.sender.and_then(|c| c.name)),
        named(payload.receiver.and_then(|c| c.name)),
        payload.goods_name.and_then(non_empty),
    )
}

/// CVSnet mixes its own `Cxx` codes with CJ-style numeric ones.
fn status_code(code: &str) -> TrackEventStatusCode {
    match code {
        "C01" => TrackEventStatusCode::InformationReceived,
        "C015" | "11" => TrackEventStatusCode::AtPickup,
        "C02" | "C03" | "C04" | "C07" | "C08" | "C09" | "21" | "41" | "42" => {
            TrackEventStatusCode::InTransit
        }
        "C095" | "82" => TrackEventStatusCode::OutForDelivery,
        "C10" => TrackEventStatusCode::AvailableForPickup,
        "C11" | "91" => TrackEventStatusCode::Delivered,
        _ => TrackEventStatusCode::Unknown,
    }
}
