//! Logen: server-rendered trace page.

use scraper::Html;
use storedesk_core::{CarrierRef, Party, TrackEventStatusCode, TrackInfo};

use super::{element_text, event, found, non_empty, row_cells, selector, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "https://www.ilogen.com";
const INVALID_ACCESS_ALERT: &str = "잘못된 접근입니다";

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    if tracking_number.is_empty() || !tracking_number.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ctx.invalid_number(tracking_number));
    }

    let path = format!("/web/personal/trace/{tracking_number}");
    let html = ctx.get_text(&path, &[]).await?;

    if html.contains(INVALID_ACCESS_ALERT) {
        return Err(ctx.invalid_number(tracking_number));
    }

    Ok(parse(ctx.carrier_ref(), tracking_number, &html))
}

pub(crate) fn parse(carrier: CarrierRef, tracking_number: &str, html: &str) -> TrackInfo {
    let doc = Html::parse_document(html);

    if let Some(empty) = doc.select(&selector("tr.empty")).next() {
        let message = non_empty(element_text(empty))
            .unwrap_or_else(|| super::NOT_FOUND_MESSAGE.to_string());
        return TrackInfo::not_found(carrier, tracking_number, message);
    }

    let Some(table) = doc.select(&selector("table.data")).next() else {
        return TrackInfo::not_found(carrier, tracking_number, super::NOT_FOUND_MESSAGE);
    };

    let events = table
        .select(&selector("tbody > tr"))
        .map(row_cells)
        .filter(|cells| cells.len() >= 4)
        .map(|cells| {
            let status = if cells[2] == "배송완료 사진확인" {
                "배송완료".to_string()
            } else {
                cells[2].clone()
            };
            event(
                status_code(&status),
                non_empty(status),
                parse_carrier_datetime(
                    Some(cells[0].as_str()),
                    Some(cells[0].as_str()),
                    DateFormat::KoreanDot,
                ),
                non_empty(cells[1].clone()),
                non_empty(cells[3].clone()),
            )
        })
        .collect();

    let info = ProductInfo::from_document(&doc);
    found(
        carrier,
        tracking_number,
        events,
        Party::from_parts(info.sender, None),
        Party::from_parts(info.recipient, info.address),
        info.product_name,
    )
}

#[derive(Debug, Default)]
struct ProductInfo {
    sender: Option<String>,
    recipient: Option<String>,
    product_name: Option<String>,
    address: Option<String>,
}

impl ProductInfo {
    /// Reads the label/value pairs of the parcel summary table.
    fn from_document(doc: &Html) -> Self {
        let mut info = Self::default();
        let label_cell = selector("td.tit");

        for row in doc.select(&selector("table.horizon.pdInfo tbody tr")) {
            for label in row.select(&label_cell) {
                let value = label
                    .next_siblings()
                    .filter_map(scraper::ElementRef::wrap)
                    .find(|el| el.value().name() == "td")
                    .map(element_text)
                    .and_then(non_empty);
                let slot = match element_text(label).as_str() {
                    "보내시는 분" => &mut info.sender,
                    "받으시는 분" => &mut info.recipient,
                    "상품명" => &mut info.product_name,
                    "주소" => &mut info.address,
                    _ => continue,
                };
                if value.is_some() {
                    *slot = value;
                }
            }
        }

        info
    }
}

fn status_code(status: &str) -> TrackEventStatusCode {
    match status {
        "터미널입고" | "터미널출고" | "집하출고" | "집하완료" | "행낭적입" | "배송입고" => {
            TrackEventStatusCode::InTransit
        }
        "배송출고" => TrackEventStatusCode::OutForDelivery,
        "배송완료" => TrackEventStatusCode::Delivered,
        _ => TrackEventStatusCode::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carrier() -> CarrierRef {
        CarrierRef {
            id: "LOGEN".to_string(),
            name: "로젠택배".to_string(),
        }
    }

    const PAGE: &str = r#"
        <table class="horizon pdInfo"><tbody>
          <tr><td class="tit">상품명</td><td>의류</td><td class="tit">보내시는 분</td><td>박*영</td></tr>
          <tr><td class="tit">받으시는 분</td><td>최*진</td><td class="tit">주소</td><td colspan="3">경기 성남시</td></tr>
        </tbody></table>
        <table class="data"><tbody>
          <tr><td>2024.03.05 10:11</td><td>성남지점</td><td>집하완료</td><td>집하 처리</td></tr>
          <tr><td>2024.03.05 23:40</td><td>군포터미널</td><td>터미널입고</td><td>터미널 도착</td></tr>
          <tr><td>2024.03.06 08:02</td><td>분당지점</td><td>배송출고</td><td>배송 출발</td></tr>
          <tr><td>2024.03.06 13:20</td><td>분당지점</td><td>배송완료 사진확인</td><td>문 앞</td></tr>
        </tbody></table>"#;

    #[test]
    fn parses_trace_page() {
        let info = parse(carrier(), "12345678901", PAGE);
        assert!(info.success);
        assert_eq!(info.product_name.as_deref(), Some("의류"));
        assert_eq!(info.sender.unwrap().name.as_deref(), Some("박*영"));
        let recipient = info.recipient.unwrap();
        assert_eq!(recipient.name.as_deref(), Some("최*진"));
        assert_eq!(recipient.address.as_deref(), Some("경기 성남시"));

        let last = info.events.last().unwrap();
        assert_eq!(last.status.code, TrackEventStatusCode::Delivered);
        assert_eq!(last.status.name.as_deref(), Some("배송완료"));
        assert_eq!(
            last.time.map(|t| t.to_rfc3339()).as_deref(),
            Some("2024-03-06T13:20:00+09:00")
        );
    }

    #[test]
    fn empty_row_message_is_not_found() {
        let html = r#"<table class="data"><tbody><tr class="empty"><td>조회된 데이터가 없습니다.</td></tr></tbody></table>"#;
        let info = parse(carrier(), "12345678901", html);
        assert!(!info.success);
        assert_eq!(info.error.as_deref(), Some("조회된 데이터가 없습니다."));
    }

    #[test]
    fn unmapped_status_is_unknown() {
        assert_eq!(status_code("반품접수"), TrackEventStatusCode::Unknown);
    }
}
