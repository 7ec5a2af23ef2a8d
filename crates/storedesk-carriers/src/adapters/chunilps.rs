//! Chunil: trace page built from `cellspacing="1"` tables.

use scraper::{ElementRef, Html};
use storedesk_core::{CarrierRef, TrackEvent, TrackEventStatusCode, TrackInfo};

use super::{element_text, event, found, named, non_empty, row_cells, selector, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "http://www.chunil.co.kr";
const TRACE_PATH: &str = "/HTrace/HTrace.jsp";
const NOT_REGISTERED_MESSAGE: &str =
    "운송장이 등록되지 않았거나 업체에서 상품을 준비중이니 업체로 문의해주시기 바랍니다.";

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    let html = ctx
        .get_text(TRACE_PATH, &[("transNo", tracking_number)])
        .await?;
    Ok(parse(ctx.carrier_ref(), tracking_number, &html))
}

pub(crate) fn parse(carrier: CarrierRef, tracking_number: &str, html: &str) -> TrackInfo {
    let doc = Html::parse_document(html);
    let tables: Vec<ElementRef<'_>> = doc.select(&selector(r#"table[cellspacing="1"]"#)).collect();
    if tables.is_empty() {
        return TrackInfo::not_found(carrier, tracking_number, NOT_REGISTERED_MESSAGE);
    }

    // Sender and recipient tables label each value in the preceding cell.
    let value_cell = selector("td:nth-child(2n)");
    let first_value = |table: Option<&ElementRef<'_>>| {
        table
            .and_then(|t| t.select(&value_cell).next())
            .map(element_text)
            .and_then(non_empty)
    };
    let sender = first_value(tables.first());
    let recipient = first_value(tables.get(1));

    let events: Vec<TrackEvent> = tables
        .get(4)
        .map(|table| {
            table
                .select(&selector("tr"))
                .skip(1)
                .map(row_cells)
                .filter(|cells| cells.len() >= 4)
                .map(|cells| {
                    let status = cells[3].clone();
                    let location = cells[1].clone();
                    event(
                        status_code(&status),
                        non_empty(status.clone()),
                        parse_carrier_datetime(Some(cells[0].as_str()), None, DateFormat::Iso),
                        non_empty(location.clone()),
                        Some(format!("{status} - {location}")),
                    )
                })
                .collect()
        })
        .unwrap_or_default();

    if events.is_empty() {
        return TrackInfo::not_found(carrier, tracking_number, NOT_REGISTERED_MESSAGE);
    }
    found(carrier, tracking_number, events, named(sender), named(recipient), None)
}

fn status_code(status: &str) -> TrackEventStatusCode {
    match status {
        "접수" => TrackEventStatusCode::InformationReceived,
        "발송" => TrackEventStatusCode::AtPickup,
        "간선상차" | "간선하차" | "중계도착" | "중계발송" | "발송터미널하차" | "발송터미널출발"
        | "도착터미널하차" | "영업소도착" | "도착" => TrackEventStatusCode::InTransit,
        "배송출발" => TrackEventStatusCode::OutForDelivery,
        "배송완료" => TrackEventStatusCode::Delivered,
        _ => TrackEventStatusCode::Unknown,
    }
}
