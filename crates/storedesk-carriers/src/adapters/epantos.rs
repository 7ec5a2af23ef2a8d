//! Pantos: JSON POSTs, first resolving the house bill, then its events newest first.

use serde::{Deserialize, Serialize};
use storedesk_core::{CarrierRef, TrackEventStatusCode, TrackInfo};

use super::{event, found, non_empty, AdapterContext};
use crate::error::TrackingError;
use crate::time::{parse_carrier_datetime, DateFormat};

pub(crate) const BASE_URL: &str = "https://www.epantos.com";
const LIST_PATH: &str = "/eCommerce/action/portal.TrackingPopup.retreiveTrackingList";
const DETAIL_PATH: &str = "/eCommerce/action/portal.TrackingPopup.retreiveTrackingListDtl";
const LOCALE: &str = "ko";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListRequest<'a> {
    quick_no: &'a str,
    locale: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListResponse {
    body: ListBody,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListBody {
    list: Vec<HouseBill>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
struct HouseBill {
    hbl_no: String,
    mbl_no: String,
    exps_biz_type_cd: String,
}

#[derive(Debug, Serialize)]
struct DetailRequest<'a> {
    #[serde(flatten)]
    bill: &'a HouseBill,
    locale: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DetailResponse {
    body: Vec<PantosEvent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PantosEvent {
    #[serde(rename = "evntCd")]
    code: String,
    /// `YYYY.MM.DD HH:MM`.
    #[serde(rename = "evntDt2")]
    time: Option<String>,
    #[serde(rename = "evntDesc")]
    description: Option<String>,
}

pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    let list: ListResponse = ctx
        .post_json(
            LIST_PATH,
            &ListRequest {
                quick_no: tracking_number,
                locale: LOCALE,
            },
        )
        .await?;
    let Some(bill) = list.body.list.into_iter().next() else {
        return Ok(TrackInfo::not_found(
            ctx.carrier_ref(),
            tracking_number,
            super::NOT_FOUND_MESSAGE,
        ));
    };

    let detail: DetailResponse = ctx
        .post_json(
            DETAIL_PATH,
            &DetailRequest {
                bill: &bill,
                locale: LOCALE,
            },
        )
        .await?;
    Ok(parse(ctx.carrier_ref(), tracking_number, detail))
}

fn parse(carrier: CarrierRef, tracking_number: &str, response: DetailResponse) -> TrackInfo {
    let events = response
        .body
        .into_iter()
        .rev()
        .map(|e| {
            let time = e.time.as_deref();
            let (code, name) = status(&e.code);
            event(
                code,
                non_empty(name.map_or_else(|| e.code.clone(), str::to_string)),
                parse_carrier_datetime(time, time, DateFormat::KoreanDot),
                None,
                e.description.and_then(non_empty),
            )
        })
        .collect();
    found(carrier, tracking_number, events, None, None, None)
}

/// Event code to status and English display name; unknown codes keep their code as the name.
fn status(code: &str) -> (TrackEventStatusCode, Option<&'static str>) {
    match code {
        "DLI" => (TrackEventStatusCode::Delivered, Some("Delivered")),
        "FST" => (TrackEventStatusCode::OutForDelivery, Some("Out for delivery")),
        "PKU" => (TrackEventStatusCode::AtPickup, Some("Pick Up")),
        "DCCC" | "DWHO" | "DWHI" | "ARR" | "DEP" | "LWHO" | "LWHI" => {
            (TrackEventStatusCode::InTransit, Some("In Transit"))
        }
        _ => (TrackEventStatusCode::Unknown, None),
    }
}
