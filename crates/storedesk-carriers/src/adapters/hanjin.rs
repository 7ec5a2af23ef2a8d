//! Hanjin: HTML waybill page fetched with a form POST.

use scraper::Html;
use storedesk_core::{CarrierRef, Party, TrackEvent, TrackEventStatusCode, TrackInfo};

use super::{element_text, event, found, non_empty, row_cells, selector, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "https://www.hanjin.com";
const WAYBILL_PATH: &str = "/kor/CMS/DeliveryMgr/WaybillResult.do";
const NOT_REGISTERED: &str = "운송장이 등록되지 않";

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    if !is_valid(tracking_number) {
        return Err(ctx.invalid_number(tracking_number));
    }

    let request = ctx.client.post(ctx.endpoint(WAYBILL_PATH)).form(&[
        ("wblnum", tracking_number),
        ("mCode", "MN038"),
        ("schLang", "KR"),
    ]);
    let html = ctx
        .send(request)
        .await?
        .text()
        .await
        .map_err(|e| ctx.upstream(e))?;

    Ok(parse(ctx.carrier_ref(), tracking_number, &html))
}

fn is_valid(tracking_number: &str) -> bool {
    tracking_number.bytes().all(|b| b.is_ascii_digit())
        && matches!(tracking_number.len(), 12 | 14)
}

pub(crate) fn parse(carrier: CarrierRef, tracking_number: &str, html: &str) -> TrackInfo {
    let doc = Html::parse_document(html);

    if let Some(notice) = doc.select(&selector(".comm-sec")).next().map(element_text) {
        if notice.contains(NOT_REGISTERED) || notice.contains("잘못된 운송장") {
            return TrackInfo::not_found(carrier, tracking_number, notice);
        }
    }
    if html.len() < 2000 && html.contains(NOT_REGISTERED) {
        return TrackInfo::not_found(carrier, tracking_number, "운송장이 등록되지 않았습니다.");
    }

    let tables: Vec<_> = doc.select(&selector("table")).collect();
    let [info_table, events_table, ..] = tables.as_slice() else {
        return TrackInfo::not_found(carrier, tracking_number, super::NOT_FOUND_MESSAGE);
    };

    let tr = selector("tr");
    let info = info_table
        .select(&tr)
        .nth(1)
        .map(row_cells)
        .unwrap_or_default();
    let cell = |i: usize| info.get(i).cloned().and_then(non_empty);

    let events: Vec<TrackEvent> = events_table
        .select(&tr)
        .map(row_cells)
        .filter(|cells| cells.len() >= 4)
        .map(|cells| {
            let code = status_code(&cells[3]);
            event(
                code,
                Some(status_name(code).to_string()),
                parse_carrier_datetime(
                    Some(cells[0].as_str()),
                    Some(cells[1].as_str()),
                    DateFormat::Korean,
                ),
                non_empty(cells[2].clone()),
                non_empty(cells[3].clone()),
            )
        })
        .collect();

    found(
        carrier,
        tracking_number,
        events,
        Party::from_parts(cell(1), None),
        Party::from_parts(cell(2), cell(3)),
        cell(0),
    )
}

/// Hanjin only publishes free-text descriptions; the first matching phrase wins.
fn status_code(description: &str) -> TrackEventStatusCode {
    const RULES: &[(&str, TrackEventStatusCode)] = &[
        ("접수", TrackEventStatusCode::InformationReceived),
        ("운송장 정보가 등록", TrackEventStatusCode::InformationReceived),
        ("집하", TrackEventStatusCode::AtPickup),
        ("로 이동중", TrackEventStatusCode::InTransit),
        ("에 도착", TrackEventStatusCode::InTransit),
        ("에 입고", TrackEventStatusCode::InTransit),
        ("배송을 준비중", TrackEventStatusCode::InTransit),
        ("배송준비중", TrackEventStatusCode::InTransit),
        ("배송출발", TrackEventStatusCode::OutForDelivery),
        ("배송완료", TrackEventStatusCode::Delivered),
        ("통관", TrackEventStatusCode::InTransit),
        ("항공편", TrackEventStatusCode::InTransit),
        ("선편", TrackEventStatusCode::InTransit),
        ("수입신고", TrackEventStatusCode::InTransit),
        ("관부가세", TrackEventStatusCode::Exception),
    ];

    RULES
        .iter()
        .find(|(phrase, _)| description.contains(phrase))
        .map_or(TrackEventStatusCode::Unknown, |(_, code)| *code)
}

fn status_name(code: TrackEventStatusCode) -> &'static str {
    match code {
        TrackEventStatusCode::InformationReceived => "접수",
        TrackEventStatusCode::AtPickup => "집하",
        TrackEventStatusCode::InTransit => "이동중",
        TrackEventStatusCode::OutForDelivery => "배송출발",
        TrackEventStatusCode::Delivered => "배송완료",
        TrackEventStatusCode::AttemptFail => "배송실패",
        TrackEventStatusCode::Exception => "이상",
        _ => "알 수 없음",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carrier() -> CarrierRef {
        CarrierRef {
            id: "HANJIN".to_string(),
            name: "한진택배".to_string(),
        }
    }

    const PAGE: &str = r"
        <html><body>
        <table>
          <tr><th>상품명</th><th>보내는 분</th><th>받는 분</th><th>받는 주소</th></tr>
          <tr><td>유기농 현미 5kg</td><td>김*수</td><td>이*희</td><td>부산 해운대구</td></tr>
        </table>
        <table>
          <tr><th>날짜</th><th>시간</th><th>상품위치</th><th>배송 진행상황</th></tr>
          <tr><td>2024-03-04</td><td>14:30</td><td>서울 강남</td><td>고객님의 상품이 접수되었습니다.</td></tr>
          <tr><td>2024-03-05</td><td>09:15</td><td>서울 강남 영업소</td><td>상품을 집하하였습니다.</td></tr>
          <tr><td>2024-03-05</td><td>21:00</td><td>대전 허브</td><td>대전 허브에 도착하였습니다.</td></tr>
          <tr><td>2024-03-06</td><td>07:30</td><td>부산 해운대</td><td>배송출발 하였습니다.</td></tr>
          <tr><td>2024-03-06</td><td>15:45</td><td>부산 해운대</td><td>배송완료 하였습니다.</td></tr>
        </table>
        </body></html>";

    #[test]
    fn parses_waybill_page() {
        let info = parse(carrier(), "123456789012", PAGE);
        assert!(info.success);
        assert_eq!(info.product_name.as_deref(), Some("유기농 현미 5kg"));
        assert_eq!(
            info.sender.as_ref().and_then(|p| p.name.as_deref()),
            Some("김*수")
        );
        let recipient = info.recipient.as_ref().unwrap();
        assert_eq!(recipient.address.as_deref(), Some("부산 해운대구"));

        let codes: Vec<_> = info.events.iter().map(|e| e.status.code).collect();
        assert_eq!(
            codes,
            vec![
                TrackEventStatusCode::InformationReceived,
                TrackEventStatusCode::AtPickup,
                TrackEventStatusCode::InTransit,
                TrackEventStatusCode::OutForDelivery,
                TrackEventStatusCode::Delivered,
            ]
        );
        let last = info.latest_event().unwrap();
        assert_eq!(last.status.name.as_deref(), Some("배송완료"));
        assert_eq!(
            last.time.map(|t| t.to_rfc3339()).as_deref(),
            Some("2024-03-06T15:45:00+09:00")
        );
    }

    #[test]
    fn unregistered_notice_is_not_found() {
        let html = r#"<div class="comm-sec">운송장이 등록되지 않았거나 확인할 수 없습니다.</div>"#;
        let info = parse(carrier(), "123456789012", html);
        assert!(!info.success);
        assert!(info.error.unwrap().contains("운송장이 등록되지 않"));
    }

    #[test]
    fn page_without_tables_is_not_found() {
        let info = parse(carrier(), "123456789012", "<html><body><p>점검중</p></body></html>");
        assert!(!info.success);
        assert!(info.events.is_empty());
    }

    #[test]
    fn unmapped_description_is_unknown() {
        assert_eq!(status_code("기타 안내"), TrackEventStatusCode::Unknown);
        assert_eq!(status_code("관부가세 납부 필요"), TrackEventStatusCode::Exception);
    }

    #[test]
    fn validates_length_and_digits() {
        assert!(is_valid("123456789012"));
        assert!(is_valid("12345678901234"));
        assert!(!is_valid("1234567890123"));
        assert!(!is_valid("12345678901A"));
    }
}
