//! Coupang Logistics Services: invoice modal HTML.

use scraper::Html;
use storedesk_core::{CarrierRef, TrackEventStatusCode, TrackInfo};

use super::{element_text, event, found, named, non_empty, row_cells, selector, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "https://www.coupangls.com";

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    if tracking_number.is_empty() || !tracking_number.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(ctx.invalid_number(tracking_number));
    }

    let path = format!("/web/modal/invoice/{tracking_number}");
    let html = ctx.get_text(&path, &[]).await?;
    Ok(parse(ctx.carrier_ref(), tracking_number, &html))
}

pub(crate) fn parse(carrier: CarrierRef, tracking_number: &str, html: &str) -> TrackInfo {
    let doc = Html::parse_document(html);

    let events: Vec<_> = doc
        .select(&selector(".tracking-detail > table > tbody > tr"))
        .map(row_cells)
        .filter(|cells| cells.len() >= 3)
        .map(|cells| {
            let description = format!("{} - {}", cells[2], cells[1]);
            event(
                status_code(&cells[2]),
                non_empty(cells[2].clone()),
                parse_carrier_datetime(Some(cells[0].as_str()), None, DateFormat::Iso),
                non_empty(cells[1].clone()),
                Some(description),
            )
        })
        .collect();

    if events.is_empty() {
        let message = doc
            .select(&selector(".modal-body"))
            .next()
            .map(element_text)
            .and_then(non_empty)
            .unwrap_or_else(|| super::NOT_FOUND_MESSAGE.to_string());
        return TrackInfo::not_found(carrier, tracking_number, message);
    }

    let recipient = doc
        .select(&selector(".recipient > div"))
        .next()
        .map(element_text)
        .map(|name| name.trim_end_matches(" 님").trim_end_matches('님').to_string());

    found(carrier, tracking_number, events, None, named(recipient), None)
}

fn status_code(status: &str) -> TrackEventStatusCode {
    match status {
        "운송장 등록" => TrackEventStatusCode::InformationReceived,
        "집하" | "택배접수" | "센터상차" | "센터도착" | "캠프상차" | "캠프도착" | "소터분류"
        | "통관시작" | "통관완료" | "공항출발" | "공항도착" | "항공기 출발" | "항공기 도착" => {
            TrackEventStatusCode::InTransit
        }
        "배송출발" => TrackEventStatusCode::OutForDelivery,
        "배송완료" => TrackEventStatusCode::Delivered,
        _ => TrackEventStatusCode::Unknown,
    }
}
