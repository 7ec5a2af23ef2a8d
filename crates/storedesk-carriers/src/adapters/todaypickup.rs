//! Today Pickup: HTML delivery list; statuses are inferred from the description text.

use scraper::{ElementRef, Html};
use storedesk_core::{CarrierRef, TrackEventStatusCode, TrackInfo};

use super::{element_text, event, found, non_empty, row_cells, selector, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "https://mall.todaypickup.com";

/// Description fragment to `(code, display name)`, first match wins.
const DESCRIPTION_STATUSES: &[(&str, TrackEventStatusCode, &str)] = &[
    ("접수", TrackEventStatusCode::InformationReceived, "상품 접수"),
    ("수거", TrackEventStatusCode::AtPickup, "상품 수거"),
    ("거점에 입고", TrackEventStatusCode::InTransit, "거점 입고"),
    ("배송 중", TrackEventStatusCode::OutForDelivery, "배송 중"),
    ("도착", TrackEventStatusCode::Delivered, "배송완료"),
];

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    let path = format!("/front/delivery/list/{tracking_number}");
    let html = ctx.get_text(&path, &[]).await?;
    Ok(parse(ctx.carrier_ref(), tracking_number, &html))
}

pub(crate) fn parse(carrier: CarrierRef, tracking_number: &str, html: &str) -> TrackInfo {
    let doc = Html::parse_document(html);
    let tables: Vec<ElementRef<'_>> = doc.select(&selector("table")).collect();
    if tables.len() < 3 {
        return TrackInfo::not_found(carrier, tracking_number, super::NOT_FOUND_MESSAGE);
    }

    let info: Vec<String> = tables[1]
        .select(&selector("tbody > tr > td"))
        .map(element_text)
        .collect();
    if info.first().map_or("", String::as_str).is_empty() {
        let message = info
            .get(1)
            .cloned()
            .and_then(non_empty)
            .filter(|m| !m.contains("정보가 없"))
            .unwrap_or_else(|| super::NOT_FOUND_MESSAGE.to_string());
        return TrackInfo::not_found(carrier, tracking_number, message);
    }

    let events = tables[2]
        .select(&selector("tbody > tr"))
        .map(row_cells)
        .filter(|cells| cells.len() >= 3)
        .map(|cells| {
            let (code, name) = status_from_description(&cells[2]);
            event(
                code,
                name.map(str::to_string),
                parse_carrier_datetime(
                    Some(cells[0].as_str()),
                    Some(cells[0].as_str()),
                    DateFormat::KoreanDot,
                ),
                non_empty(cells[1].clone()),
                non_empty(cells[2].clone()),
            )
        })
        .collect();
    found(carrier, tracking_number, events, None, None, None)
}

fn status_from_description(description: &str) -> (TrackEventStatusCode, Option<&'static str>) {
    DESCRIPTION_STATUSES
        .iter()
        .find(|(fragment, _, _)| description.contains(fragment))
        .map_or((TrackEventStatusCode::Unknown, None), |&(_, code, name)| {
            (code, Some(name))
        })
}
