//! Kunyoung: EUC-KR goods page; scan rows alternate with spacer rows.

use scraper::{ElementRef, Html};
use storedesk_core::{CarrierRef, TrackEvent, TrackEventStatusCode, TrackInfo};

use super::{element_text, event, found, non_empty, selector, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "https://www.kunyoung.com";
const GOODS_PATH: &str = "/goods/goods_02.php";

/// The site answers unknown numbers with this fixed sample history.
const PLACEHOLDER_HISTORY: [(&str, &str); 4] = [
    ("2022-11-23", "도착"),
    ("2022-11-23", "영덕도착"),
    ("2022-12-01", "도착"),
    ("2022-12-01", "도착"),
];

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    let request = ctx
        .client
        .get(ctx.endpoint(GOODS_PATH))
        .query(&[("mulno", tracking_number)]);
    let html = ctx.euc_kr_text(request).await?;
    Ok(parse(ctx.carrier_ref(), tracking_number, &html))
}

pub(crate) fn parse(carrier: CarrierRef, tracking_number: &str, html: &str) -> TrackInfo {
    let doc = Html::parse_document(html);
    let tables: Vec<ElementRef<'_>> = doc.select(&selector(r#"table[width="717"]"#)).collect();
    let Some(history) = tables.get(3) else {
        return TrackInfo::not_found(carrier, tracking_number, super::NOT_FOUND_MESSAGE);
    };

    let td = selector("td");
    let events: Vec<TrackEvent> = history
        .select(&selector("tr:nth-child(2n+4)"))
        .map(|row| {
            let cells: Vec<String> = row.select(&td).map(element_text).collect();
            let time = cells.first().map(String::as_str);
            let status = cells.get(2).cloned().unwrap_or_default();
            event(
                status_code(&status),
                non_empty(status.clone()),
                parse_carrier_datetime(time, time, DateFormat::Korean),
                None,
                non_empty(status),
            )
        })
        .collect();

    if is_placeholder(&events) {
        return TrackInfo::not_found(carrier, tracking_number, super::NOT_FOUND_MESSAGE);
    }
    found(carrier, tracking_number, events, None, None, None)
}

fn is_placeholder(events: &[TrackEvent]) -> bool {
    events.len() == PLACEHOLDER_HISTORY.len()
        && events
            .iter()
            .zip(PLACEHOLDER_HISTORY)
            .all(|(scan, (date, status))| {
                scan.time.map(|t| t.format("%Y-%m-%d").to_string()).as_deref() == Some(date)
                    && scan.status.name.as_deref() == Some(status)
            })
}

fn status_code(status: &str) -> TrackEventStatusCode {
    if status.ends_with("배송완료") {
        TrackEventStatusCode::Delivered
    } else if status.ends_with("발송") || status.ends_with("도착") {
        TrackEventStatusCode::InTransit
    } else {
        TrackEventStatusCode::Unknown
    }
}
