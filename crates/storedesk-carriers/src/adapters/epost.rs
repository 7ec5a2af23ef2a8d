//! Korea Post domestic parcels.

use scraper::Html;
use storedesk_core::{CarrierRef, Party, TrackEventStatusCode, TrackInfo};

use super::{event, first_line, found, named, non_empty, row_cells, selector, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "https://service.epost.go.kr";
const TRACE_PATH: &str = "/trace.RetrieveDomRigiTraceList.comm";

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    let html = ctx
        .get_text(TRACE_PATH, &[("sid1", tracking_number)])
        .await?;
    Ok(parse(ctx.carrier_ref(), tracking_number, &html))
}

pub(crate) fn parse(carrier: CarrierRef, tracking_number: &str, html: &str) -> TrackInfo {
    let doc = Html::parse_document(html);

    let events: Vec<_> = doc
        .select(&selector("#processTable > tbody > tr"))
        .map(row_cells)
        .filter(|cells| cells.len() >= 4)
        .map(|cells| {
            let status = if cells[3].starts_with("접수 소포 물품 사진") {
                "접수".to_string()
            } else {
                cells[3].clone()
            };
            let description = format!("{status} - {}", cells[2]);
            event(
                status_code(&status),
                non_empty(status),
                parse_carrier_datetime(
                    Some(cells[0].as_str()),
                    Some(cells[1].as_str()),
                    DateFormat::KoreanDot,
                ),
                non_empty(cells[2].clone()),
                Some(description),
            )
        })
        .collect();

    if events.is_empty() {
        return TrackInfo::not_found(carrier, tracking_number, super::NOT_FOUND_MESSAGE);
    }

    let (sender, recipient) = sender_and_recipient(&doc);
    found(carrier, tracking_number, events, sender, recipient, None)
}

/// Names from the summary table shared by the domestic and EMS pages.
pub(crate) fn sender_and_recipient(doc: &Html) -> (Option<Party>, Option<Party>) {
    let cell_selector = selector("table.table_col > tbody td");
    let mut cells = doc.select(&cell_selector);
    let sender = cells.next().and_then(first_line);
    let recipient = cells.next().and_then(first_line);
    (named(sender), named(recipient))
}

fn status_code(status: &str) -> TrackEventStatusCode {
    if status == "운송장출력" || status.contains("접수") {
        TrackEventStatusCode::InformationReceived
    } else if status == "발송" || status == "도착" || status.contains("집하완료") {
        TrackEventStatusCode::InTransit
    } else if status.contains("배달준비") {
        TrackEventStatusCode::OutForDelivery
    } else if status.contains("미배달") {
        TrackEventStatusCode::AttemptFail
    } else if status.contains("배달완료") {
        TrackEventStatusCode::Delivered
    } else if status.contains("취소") {
        TrackEventStatusCode::Exception
    } else if status.contains("인수완료") {
        TrackEventStatusCode::AtPickup
    } else {
        TrackEventStatusCode::Unknown
    }
}
