//! Hapdong (CWAY): a detail lookup for the recipient, then the scan log.

use serde::Deserialize;
use storedesk_core::{CarrierRef, TrackEventStatusCode, TrackInfo};

use super::{event, found, named, non_empty, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "http://cway.hagoto.com";
const DETAIL_PATH: &str = "/where/details";
const LOG_PATH: &str = "/where/hbl/logList";
const SERVER_ERROR: i64 = 500;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DetailResponse {
    code: i64,
    data: Option<Detail>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Detail {
    receiver: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LogResponse {
    rows: Vec<LogRow>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LogRow {
    #[serde(rename = "logStatus")]
    status: String,
    #[serde(rename = "logTime")]
    time: Option<String>,
    #[serde(rename = "logDetail")]
    detail: String,
}

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    let detail: DetailResponse = ctx
        .post_form_json(DETAIL_PATH, &[("hblNo", tracking_number)])
        .await?;
    let Some(detail) = detail.data.filter(|_| detail.code != SERVER_ERROR) else {
        return Ok(TrackInfo::not_found(
            ctx.carrier_ref(),
            tracking_number,
            super::NOT_FOUND_MESSAGE,
        ));
    };

    let log: LogResponse = ctx
        .post_form_json(
            LOG_PATH,
            &[("hblNo", tracking_number), ("pageNum", "NaN"), ("isAsc", "asc")],
        )
        .await?;
    Ok(parse(ctx.carrier_ref(), tracking_number, detail, log))
}

fn parse(
    carrier: CarrierRef,
    tracking_number: &str,
    detail: Detail,
    log: LogResponse,
) -> TrackInfo {
    let events = log
        .rows
        .into_iter()
        .map(|row| {
            // The detail text opens with the branch name.
            let location = row.detail.split(' ').next().and_then(non_empty);
            let time = row.time.as_deref();
            event(
                status_code(&row.status),
                non_empty(row.status.clone()),
                parse_carrier_datetime(time, time, DateFormat::Korean),
                location,
                non_empty(row.detail),
            )
        })
        .collect();
    let recipient = named(detail.receiver.and_then(non_empty));
    found(carrier, tracking_number, events, None, recipient, None)
}

fn status_code(status: &str) -> TrackEventStatusCode {
    match status {
        "집하" | "선적" | "세관지정 장치장 반입" | "수입통관 진행중" | "세관지정 장치장 반출"
        | "수입통관 완료" | "집화처리" | "간선하차" | "간선상차" => {
            TrackEventStatusCode::InTransit
        }
        "배달출발" => TrackEventStatusCode::OutForDelivery,
        "배달완료" => TrackEventStatusCode::Delivered,
        _ => TrackEventStatusCode::Unknown,
    }
}
