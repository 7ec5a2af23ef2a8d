//! Goods to Luck: form POST returning a summary table and a scan table.

use scraper::{ElementRef, Html};
use storedesk_core::{CarrierRef, TrackEventStatusCode, TrackInfo};

use super::{element_text, event, found, named, non_empty, row_cells, selector, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "http://www.goodstoluck.co.kr";
const TRACKING_PATH: &str = "/tracking/tracking_proc.php";

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    let html = ctx
        .post_form_text(
            TRACKING_PATH,
            &[("RetrieveFlag", "SEARCH"), ("Txt_word", tracking_number)],
        )
        .await?;
    Ok(parse(ctx.carrier_ref(), tracking_number, &html))
}

pub(crate) fn parse(carrier: CarrierRef, tracking_number: &str, html: &str) -> TrackInfo {
    let doc = Html::parse_document(html);

    if let Some(notice) = doc.select(&selector("table.result_none_tb")).next() {
        let message = non_empty(element_text(notice))
            .unwrap_or_else(|| super::NOT_FOUND_MESSAGE.to_string());
        return TrackInfo::not_found(carrier, tracking_number, message);
    }

    let tables: Vec<ElementRef<'_>> = doc.select(&selector("table")).collect();
    if tables.len() < 2 {
        return TrackInfo::not_found(carrier, tracking_number, super::NOT_FOUND_MESSAGE);
    }

    let summary: Vec<String> = tables[0]
        .select(&selector("tr:nth-child(2) > td"))
        .map(element_text)
        .collect();

    let events = tables[1]
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
                parse_carrier_datetime(
                    Some(cells[0].as_str()),
                    Some(cells[0].as_str()),
                    DateFormat::Korean,
                ),
                non_empty(location.clone()),
                Some(format!("{status} - {location}")),
            )
        })
        .collect();

    let sender = summary.get(1).cloned().and_then(non_empty);
    let recipient = summary.get(2).cloned().and_then(non_empty);
    found(carrier, tracking_number, events, named(sender), named(recipient), None)
}

fn status_code(status: &str) -> TrackEventStatusCode {
    match status {
        "간선하차" | "간선상차" => TrackEventStatusCode::InTransit,
        "배송출발" => TrackEventStatusCode::OutForDelivery,
        "배송완료" => TrackEventStatusCode::Delivered,
        _ => TrackEventStatusCode::Unknown,
    }
}
