//! Daesin: EUC-KR freight page with one row per branch visited.

use scraper::{ElementRef, Html};
use storedesk_core::{CarrierRef, TrackEvent, TrackEventStatusCode, TrackInfo};

use super::{element_text, event, found, named, non_empty, selector, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "https://www.ds3211.co.kr";
const FREIGHT_PATH: &str = "/freight/internalFreightSearch.ht";

const ORIGIN_BRANCH: &str = "발송취급점";
const OUT_FOR_DELIVERY: &str = "배달중";
const DELIVERED: &str = "배송완료";

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    let request = ctx
        .client
        .post(ctx.endpoint(FREIGHT_PATH))
        .form(&[("billno", tracking_number)]);
    let html = ctx.euc_kr_text(request).await?;
    Ok(parse(ctx.carrier_ref(), tracking_number, &html))
}

pub(crate) fn parse(carrier: CarrierRef, tracking_number: &str, html: &str) -> TrackInfo {
    let doc = Html::parse_document(html);

    let Some(area) = doc.select(&selector("#printarea")).next() else {
        return TrackInfo::not_found(carrier, tracking_number, super::NOT_FOUND_MESSAGE);
    };

    let tables: Vec<ElementRef<'_>> = area.select(&selector("table")).collect();
    if tables.is_empty() {
        let message = area
            .select(&selector("div.effect"))
            .map(element_text)
            .collect::<Vec<_>>()
            .join(" ");
        let message = non_empty(message).unwrap_or_else(|| super::NOT_FOUND_MESSAGE.to_string());
        return TrackInfo::not_found(carrier, tracking_number, message);
    }

    let td = selector("td");
    let info: Vec<String> = tables[0].select(&td).map(element_text).collect();

    let events = tables
        .get(1)
        .map(|table| {
            table
                .select(&selector("tr"))
                .skip(1)
                .flat_map(row_events)
                .collect()
        })
        .unwrap_or_default();

    let sender = named(info.first().cloned().and_then(non_empty));
    let recipient = named(info.get(2).cloned().and_then(non_empty));
    found(carrier, tracking_number, events, sender, recipient, None)
}

/// A branch row yields an arrival, an optional out-for-delivery scan, and a departure.
fn row_events(row: ElementRef<'_>) -> Vec<TrackEvent> {
    let cells: Vec<ElementRef<'_>> = row.select(&selector("td")).collect();
    if cells.get(3).and_then(|c| c.value().attr("colspan")) == Some("2") {
        return Vec::new();
    }
    let text = |i: usize| cells.get(i).copied().map(element_text).and_then(non_empty);

    let status = text(0).unwrap_or_default();
    let location = text(1).unwrap_or_default();
    let current = text(5);
    let current = current.as_deref();

    let mut events = Vec::new();
    if let Some(arrived) = text(3) {
        let time = parse_carrier_datetime(Some(&arrived), Some(&arrived), DateFormat::Korean);
        events.push(event(
            arrival_code(&status),
            Some(format!("{status} - 도착")),
            time,
            non_empty(location.clone()),
            Some(format!("{status} - {location} 도착")),
        ));
        if matches!(current, Some(OUT_FOR_DELIVERY | DELIVERED)) {
            events.push(event(
                TrackEventStatusCode::OutForDelivery,
                Some(OUT_FOR_DELIVERY.to_string()),
                time,
                non_empty(location.clone()),
                Some(format!("{OUT_FOR_DELIVERY} - {location}")),
            ));
        }
    }
    if let Some(left) = text(4) {
        events.push(event(
            departure_code(current),
            Some(format!("{status} - 출발")),
            parse_carrier_datetime(Some(&left), Some(&left), DateFormat::Korean),
            non_empty(location.clone()),
            Some(format!("{status} - {location} 출발")),
        ));
    }
    events
}

fn arrival_code(status: &str) -> TrackEventStatusCode {
    if status == ORIGIN_BRANCH {
        TrackEventStatusCode::InformationReceived
    } else {
        TrackEventStatusCode::InTransit
    }
}

fn departure_code(current: Option<&str>) -> TrackEventStatusCode {
    if current == Some(DELIVERED) {
        TrackEventStatusCode::Delivered
    } else {
        TrackEventStatusCode::InTransit
    }
}
