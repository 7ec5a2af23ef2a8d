//! Yongma Logis: the order lookup yields a consignment key for the status query.

use serde::Deserialize;
use storedesk_core::{CarrierRef, TrackEventStatusCode, TrackInfo};

use super::{event, found, non_empty, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "https://eis.yongmalogis.co.kr";
const ORDER_PATH: &str = "/dm/dmtrc060/selectDmTrc060";
const STATUS_PATH: &str = "/dm/dmtrc060/selectDmTrc060Status";
const NO_ORDER_MESSAGE: &str = "현재 접수번호에 대한 정보를 찾지 못했습니다";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Consignment {
    ymd: String,
    code: String,
    seqnum: i64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatusRow {
    state: String,
    /// `YYYY-MM-DD :`, date only.
    ymd: Option<String>,
    sendstatus: Option<String>,
}

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    let body = ctx
        .get_text(
            ORDER_PATH,
            &[("ymd", ""), ("conscd", ""), ("seq", ""), ("ordno", tracking_number)],
        )
        .await?;
    // Unknown order numbers come back as an empty body rather than JSON.
    if body.trim().is_empty() {
        return Ok(TrackInfo::not_found(ctx.carrier_ref(), tracking_number, NO_ORDER_MESSAGE));
    }
    let consignment: Consignment = ctx.decode_json(&body)?;

    let seq = consignment.seqnum.to_string();
    let rows: Vec<StatusRow> = ctx
        .get_json(
            STATUS_PATH,
            &[
                ("ymd", consignment.ymd.as_str()),
                ("conscd", consignment.code.as_str()),
                ("seq", seq.as_str()),
            ],
        )
        .await?;
    Ok(parse(ctx.carrier_ref(), tracking_number, rows))
}

/// Rows arrive newest first.
fn parse(carrier: CarrierRef, tracking_number: &str, rows: Vec<StatusRow>) -> TrackInfo {
    let events = rows
        .into_iter()
        .rev()
        .map(|row| {
            event(
                status_code(&row.state),
                non_empty(row.state.clone()),
                parse_carrier_datetime(row.ymd.as_deref(), None, DateFormat::Korean),
                None,
                row.sendstatus.and_then(non_empty),
            )
        })
        .collect();
    found(carrier, tracking_number, events, None, None, None)
}

fn status_code(state: &str) -> TrackEventStatusCode {
    match state {
        "인수" => TrackEventStatusCode::AtPickup,
        "Hub도착" | "배송DC" => TrackEventStatusCode::InTransit,
        "배송중" => TrackEventStatusCode::OutForDelivery,
        "배송완료" => TrackEventStatusCode::Delivered,
        _ => TrackEventStatusCode::Unknown,
    }
}
