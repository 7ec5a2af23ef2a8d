//! CJ Logistics: CSRF token from the tracking page, then a JSON detail call.
//!
//! The session cookie set by the first request is carried by the client's
//! cookie store.

use scraper::Html;
use serde::Deserialize;
use storedesk_core::{CarrierRef, TrackEventStatusCode, TrackInfo};

use super::{event, found, named, non_empty, selector, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "https://www.cjlogistics.com";
const TRACKING_PAGE_PATH: &str = "/ko/tool/parcel/tracking";
const TRACKING_DETAIL_PATH: &str = "/ko/tool/parcel/tracking-detail";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct DetailResponse {
    parcel_result_map: ResultList<Parcel>,
    parcel_detail_result_map: ResultList<Scan>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultList<T> {
    #[serde(default = "Vec::new")]
    result_list: Vec<T>,
}

impl<T> Default for ResultList<T> {
    fn default() -> Self {
        Self {
            result_list: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Parcel {
    #[serde(rename = "sendrNm")]
    sender_name: Option<String>,
    #[serde(rename = "rcvrNm")]
    recipient_name: Option<String>,
    #[serde(rename = "itemNm")]
    item_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Scan {
    #[serde(rename = "dTime")]
    time: Option<String>,
    #[serde(rename = "regBranNm")]
    branch: Option<String>,
    #[serde(rename = "scanNm")]
    scan_name: Option<String>,
    #[serde(rename = "crgNm")]
    description: Option<String>,
    #[serde(rename = "crgSt")]
    status: Option<String>,
}

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    if !is_valid(tracking_number) {
        return Err(ctx.invalid_number(tracking_number));
    }

    let page = ctx.get_text(TRACKING_PAGE_PATH, &[]).await?;
    let csrf = extract_csrf(&page).ok_or_else(|| ctx.upstream("CSRF token not found"))?;

    let request = ctx
        .client
        .post(ctx.endpoint(TRACKING_DETAIL_PATH))
        .query(&[("paramInvcNo", tracking_number), ("_csrf", csrf.as_str())]);
    let body = ctx
        .send(request)
        .await?
        .text()
        .await
        .map_err(|e| ctx.upstream(e))?;
    let detail: DetailResponse = ctx.decode_json(&body)?;

    Ok(parse(ctx.carrier_ref(), tracking_number, detail))
}

fn is_valid(tracking_number: &str) -> bool {
    tracking_number.bytes().all(|b| b.is_ascii_digit())
        && matches!(tracking_number.len(), 10 | 12)
}

fn extract_csrf(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let input = selector("input[name=_csrf]");
    let token = doc
        .select(&input)
        .next()
        .and_then(|el| el.value().attr("value"))
        .and_then(non_empty);
    token
}

fn parse(carrier: CarrierRef, tracking_number: &str, detail: DetailResponse) -> TrackInfo {
    let parcel = detail.parcel_result_map.result_list.into_iter().next();
    let scans = detail.parcel_detail_result_map.result_list;

    if parcel.is_none() && scans.is_empty() {
        return TrackInfo::not_found(carrier, tracking_number, super::NOT_FOUND_MESSAGE);
    }

    let events = scans
        .into_iter()
        .map(|scan| {
            event(
                status_code(scan.status.as_deref().unwrap_or_default()),
                scan.scan_name.and_then(non_empty),
                parse_carrier_datetime(scan.time.as_deref(), None, DateFormat::Iso),
                scan.branch.and_then(non_empty),
                scan.description.and_then(non_empty),
            )
        })
        .collect();

    let parcel = parcel.unwrap_or_default();
    found(
        carrier,
        tracking_number,
        events,
        named(parcel.sender_name),
        named(parcel.recipient_name),
        parcel.item_name.and_then(non_empty),
    )
}

fn status_code(code: &str) -> TrackEventStatusCode {
    match code {
        "11" => TrackEventStatusCode::AtPickup,
        "21" | "41" | "42" | "44" => TrackEventStatusCode::InTransit,
        "82" => TrackEventStatusCode::OutForDelivery,
        "91" => TrackEventStatusCode::Delivered,
        _ => TrackEventStatusCode::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carrier() -> CarrierRef {
        CarrierRef {
            id: "CJ".to_string(),
            name: "CJ대한통운".to_string(),
        }
    }

    #[test]
    fn extracts_csrf_token() {
        let html = r#"<form><input type="hidden" name="_csrf" value="abc-123"></form>"#;
        assert_eq!(extract_csrf(html).as_deref(), Some("abc-123"));
        assert!(extract_csrf("<form></form>").is_none());
    }

    #[test]
    fn parses_detail_payload() {
        let detail: DetailResponse = serde_json::from_str(
            r#"{
                "parcelResultMap": {"resultList": [{"sendrNm": "김*수", "rcvrNm": "이*희", "itemNm": "도서"}]},
                "parcelDetailResultMap": {"resultList": [
                    {"dTime": "2024-03-05 09:10:11.0", "regBranNm": "강남", "scanNm": "집화처리", "crgNm": "집화", "crgSt": "11"},
                    {"dTime": "2024-03-05 22:01:00.0", "regBranNm": "곤지암Hub", "scanNm": "간선상차", "crgNm": "이동중", "crgSt": "41"},
                    {"dTime": "2024-03-06 15:00:00.0", "regBranNm": "해운대", "scanNm": "배달완료", "crgNm": "배송완료", "crgSt": "91"}
                ]}
            }"#,
        )
        .unwrap();

        let info = parse(carrier(), "1234567890", detail);
        assert!(info.success);
        assert_eq!(info.product_name.as_deref(), Some("도서"));
        assert_eq!(info.events.len(), 3);
        assert_eq!(info.events[0].status.code, TrackEventStatusCode::AtPickup);
        assert!(info.is_delivered());
        assert_eq!(
            info.events[1].time.map(|t| t.to_rfc3339()).as_deref(),
            Some("2024-03-05T22:01:00+09:00")
        );
    }

    #[test]
    fn empty_payload_is_not_found() {
        let info = parse(carrier(), "1234567890", DetailResponse::default());
        assert!(!info.success);
        assert!(info.error.is_some());
    }

    #[test]
    fn unmapped_code_is_unknown() {
        assert_eq!(status_code("99"), TrackEventStatusCode::Unknown);
    }
}
