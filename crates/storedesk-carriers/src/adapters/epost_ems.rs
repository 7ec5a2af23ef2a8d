//! Korea Post EMS (international).

use scraper::Html;
use storedesk_core::{CarrierRef, TrackEventStatusCode, TrackInfo};

use super::epost::sender_and_recipient;
use super::{event, found, non_empty, row_cells, selector, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "https://service.epost.go.kr";
const TRACE_PATH: &str = "/trace.RetrieveEmsRigiTraceList.comm";

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    let html = ctx
        .get_text(
            TRACE_PATH,
            &[("POST_CODE", tracking_number), ("displayHeader", "N")],
        )
        .await?;
    Ok(parse(ctx.carrier_ref(), tracking_number, &html))
}

pub(crate) fn parse(carrier: CarrierRef, tracking_number: &str, html: &str) -> TrackInfo {
    let doc = Html::parse_document(html);

    let events: Vec<_> = doc
        .select(&selector("table.detail_off > tbody > tr"))
        .map(row_cells)
        .filter(|cells| cells.len() >= 3)
        .map(|cells| {
            let status = cells[1].as_str();
            let location = cells[2].as_str();
            let description = cells
                .get(3)
                .cloned()
                .and_then(non_empty)
                .unwrap_or_else(|| format!("{status} - {location}"));
            let (code, name) = status_code(status);
            event(
                code,
                name,
                parse_carrier_datetime(
                    Some(cells[0].as_str()),
                    Some(cells[0].as_str()),
                    DateFormat::KoreanDot,
                ),
                non_empty(location),
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

/// Delivery phases are reported with trailing detail, so they are matched by
/// substring and normalized to a short name.
fn status_code(status: &str) -> (TrackEventStatusCode, Option<String>) {
    let code = match status {
        "" => return (TrackEventStatusCode::Unknown, None),
        "접수" => TrackEventStatusCode::InformationReceived,
        "발송준비" | "교환국 도착" | "발송" | "도착" => TrackEventStatusCode::InTransit,
        s if s.contains("배달준비") => {
            return (TrackEventStatusCode::OutForDelivery, Some("배달준비".to_string()))
        }
        s if s.contains("배달완료") => {
            return (TrackEventStatusCode::Delivered, Some("배달완료".to_string()))
        }
        _ => TrackEventStatusCode::Unknown,
    };
    (code, Some(status.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carrier() -> CarrierRef {
        CarrierRef {
            id: "EPOST_EMS".to_string(),
            name: "우체국 EMS".to_string(),
        }
    }

    #[test]
    fn parses_ems_rows() {
        let html = r#"
            <table class="detail_off"><tbody>
              <tr><td>2024.03.01 10:00</td><td>접수</td><td>KOREA</td><td></td></tr>
              <tr><td>2024.03.02 03:20</td><td>교환국 도착</td><td>INCHEON</td><td>Arrival at outward office</td></tr>
              <tr><td>2024.03.08 09:00</td><td>배달준비 (Out for delivery)</td><td>TOKYO</td><td></td></tr>
              <tr><td>2024.03.08 15:30</td><td>배달완료 (Delivered)</td><td>TOKYO</td><td></td></tr>
            </tbody></table>"#;
        let info = parse(carrier(), "EE123456789KR", html);
        assert!(info.success);
        assert_eq!(info.events[0].description.as_deref(), Some("접수 - KOREA"));
        assert_eq!(
            info.events[1].description.as_deref(),
            Some("Arrival at outward office")
        );
        assert_eq!(info.events[2].status.name.as_deref(), Some("배달준비"));
        assert!(info.is_delivered());
        assert_eq!(
            info.events[3].time.map(|t| t.to_rfc3339()).as_deref(),
            Some("2024-03-08T15:30:00+09:00")
        );
    }

    #[test]
    fn no_rows_is_not_found() {
        let info = parse(carrier(), "EE123456789KR", "<table class=\"detail_off\"></table>");
        assert!(!info.success);
    }

    #[test]
    fn unknown_phase_keeps_raw_name() {
        assert_eq!(
            status_code("통관검사대기"),
            (TrackEventStatusCode::Unknown, Some("통관검사대기".to_string()))
        );
    }
}
