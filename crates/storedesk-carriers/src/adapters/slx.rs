//! SLX: tracking page whose third table lists scans.

use scraper::{ElementRef, Html};
use storedesk_core::{CarrierRef, TrackEventStatusCode, TrackInfo};

use super::{event, found, non_empty, row_cells, selector, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "https://net.slx.co.kr";
const TRACKING_PATH: &str = "/info/tracking.jsp";

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    let html = ctx
        .get_text(TRACKING_PATH, &[("iv_no", tracking_number)])
        .await?;
    Ok(parse(ctx.carrier_ref(), tracking_number, &html))
}

pub(crate) fn parse(carrier: CarrierRef, tracking_number: &str, html: &str) -> TrackInfo {
    let doc = Html::parse_document(html);
    let tables: Vec<ElementRef<'_>> = doc.select(&selector("table")).collect();
    let Some(scans) = tables.get(2) else {
        return TrackInfo::not_found(carrier, tracking_number, super::NOT_FOUND_MESSAGE);
    };

    let rows: Vec<Vec<String>> = scans
        .select(&selector("tbody > tr"))
        .skip(1)
        .map(row_cells)
        .collect();
    // An unknown number renders a single empty row.
    let placeholder = rows.len() == 1 && rows[0].first().map_or("", String::as_str).is_empty();
    if rows.is_empty() || placeholder {
        return TrackInfo::not_found(carrier, tracking_number, super::NOT_FOUND_MESSAGE);
    }

    let events = rows
        .into_iter()
        .filter(|cells| cells.len() >= 4)
        .map(|cells| {
            let status = cells[0].clone();
            let location = cells[3].clone();
            event(
                status_code(&status),
                non_empty(status.clone()),
                parse_carrier_datetime(
                    Some(cells[1].as_str()),
                    Some(cells[2].as_str()),
                    DateFormat::KoreanDot,
                ),
                non_empty(location.clone()),
                Some(format!("{status} - {location}")),
            )
        })
        .collect();
    found(carrier, tracking_number, events, None, None, None)
}

fn status_code(status: &str) -> TrackEventStatusCode {
    match status {
        "상품집하" => TrackEventStatusCode::AtPickup,
        "터미널 입고" | "대리점 도착" => TrackEventStatusCode::InTransit,
        "미배송" => TrackEventStatusCode::AttemptFail,
        "배송출발" => TrackEventStatusCode::OutForDelivery,
        "배송완료" => TrackEventStatusCode::Delivered,
        _ => TrackEventStatusCode::Unknown,
    }
}
