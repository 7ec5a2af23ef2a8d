//! Per-carrier protocol adapters.
//!
//! Each adapter builds the carrier-specific request, parses the carrier's
//! response shape, and maps native status tokens into
//! [`TrackEventStatusCode`]. Parsing lives in plain functions over the
//! response body so it can be tested without a server.

pub(crate) mod chunilps;
pub(crate) mod cj;
pub(crate) mod coupang;
pub(crate) mod cvsnet;
pub(crate) mod cway;
pub(crate) mod daesin;
pub(crate) mod epantos;
pub(crate) mod epost;
pub(crate) mod epost_ems;
pub(crate) mod goodstoluck;
pub(crate) mod hanjin;
pub(crate) mod homepick;
pub(crate) mod honamlogis;
pub(crate) mod ilyanglogis;
pub(crate) mod kdexp;
pub(crate) mod kunyoung;
pub(crate) mod logen;
pub(crate) mod lotte;
pub(crate) mod lotte_global;
pub(crate) mod slx;
pub(crate) mod todaypickup;
pub(crate) mod yongmalogis;

use reqwest::{Client, RequestBuilder};
use scraper::{ElementRef, Selector};
use serde::de::DeserializeOwned;
use serde::Serialize;
use storedesk_core::{
    CarrierRef, Party, TrackEvent, TrackEventStatus, TrackEventStatusCode, TrackInfo,
};

use crate::error::TrackingError;
use crate::registry::CarrierInfo;

/// Carriers with a tracking adapter, in registry order.
pub const SUPPORTED_CARRIERS: &[&str] = &[
    "HANJIN",
    "CJ",
    "LOGEN",
    "EPOST",
    "LOTTE",
    "COUPANG",
    "KDEXP",
    "CVSNET",
    "EPOST_EMS",
    "DAESIN",
    "CHUNILPS",
    "KUNYOUNG",
    "ILYANGLOGIS",
    "HONAMLOGIS",
    "CWAY",
    "HOMEPICK",
    "EPANTOS",
    "SLX",
    "TODAYPICKUP",
    "YONGMALOGIS",
    "LOTTE_GLOBAL",
    "GOODSTOLUCK",
];

pub(crate) const NOT_FOUND_MESSAGE: &str = "배송 정보를 찾을 수 없습니다.";

/// Production origin for a carrier's tracking endpoints.
#[must_use]
pub fn default_base_url(carrier_id: &str) -> Option<&'static str> {
    let url = match carrier_id {
        "HANJIN" => hanjin::BASE_URL,
        "CJ" => cj::BASE_URL,
        "LOGEN" => logen::BASE_URL,
        "EPOST" => epost::BASE_URL,
        "LOTTE" => lotte::BASE_URL,
        "COUPANG" => coupang::BASE_URL,
        "KDEXP" => kdexp::BASE_URL,
        "CVSNET" => cvsnet::BASE_URL,
        "EPOST_EMS" => epost_ems::BASE_URL,
        "DAESIN" => daesin::BASE_URL,
        "CHUNILPS" => chunilps::BASE_URL,
        "KUNYOUNG" => kunyoung::BASE_URL,
        "ILYANGLOGIS" => ilyanglogis::BASE_URL,
        "HONAMLOGIS" => honamlogis::BASE_URL,
        "CWAY" => cway::BASE_URL,
        "HOMEPICK" => homepick::BASE_URL,
        "EPANTOS" => epantos::BASE_URL,
        "SLX" => slx::BASE_URL,
        "TODAYPICKUP" => todaypickup::BASE_URL,
        "YONGMALOGIS" => yongmalogis::BASE_URL,
        "LOTTE_GLOBAL" => lotte_global::BASE_URL,
        "GOODSTOLUCK" => goodstoluck::BASE_URL,
        _ => return None,
    };
    Some(url)
}

/// Run the adapter for `ctx.carrier` against a cleaned tracking number.
pub(crate) async fn track(
    ctx: &AdapterContext<'_>,
    tracking_number: &str,
) -> Result<TrackInfo, TrackingError> {
    match ctx.carrier.id {
        "HANJIN" => hanjin::track(ctx, tracking_number).await,
        "CJ" => cj::track(ctx, tracking_number).await,
        "LOGEN" => logen::track(ctx, tracking_number).await,
        "EPOST" => epost::track(ctx, tracking_number).await,
        "LOTTE" => lotte::track(ctx, tracking_number).await,
        "COUPANG" => coupang::track(ctx, tracking_number).await,
        "KDEXP" => kdexp::track(ctx, tracking_number).await,
        "CVSNET" => cvsnet::track(ctx, tracking_number).await,
        "EPOST_EMS" => epost_ems::track(ctx, tracking_number).await,
        "DAESIN" => daesin::track(ctx, tracking_number).await,
        "CHUNILPS" => chunilps::track(ctx, tracking_number).await,
        "KUNYOUNG" => kunyoung::track(ctx, tracking_number).await,
        "ILYANGLOGIS" => ilyanglogis::track(ctx, tracking_number).await,
        "HONAMLOGIS" => honamlogis::track(ctx, tracking_number).await,
        "CWAY" => cway::track(ctx, tracking_number).await,
        "HOMEPICK" => homepick::track(ctx, tracking_number).await,
        "EPANTOS" => epantos::track(ctx, tracking_number).await,
        "SLX" => slx::track(ctx, tracking_number).await,
        "TODAYPICKUP" => todaypickup::track(ctx, tracking_number).await,
        "YONGMALOGIS" => yongmalogis::track(ctx, tracking_number).await,
        "LOTTE_GLOBAL" => lotte_global::track(ctx, tracking_number).await,
        "GOODSTOLUCK" => goodstoluck::track(ctx, tracking_number).await,
        other => Err(TrackingError::UnknownCarrier(other.to_string())),
    }
}

/// Everything an adapter needs for one call.
pub(crate) struct AdapterContext<'a> {
    pub(crate) client: &'a Client,
    pub(crate) base_url: &'a str,
    pub(crate) carrier: &'static CarrierInfo,
}

impl AdapterContext<'_> {
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    pub(crate) fn upstream(&self, message: impl std::fmt::Display) -> TrackingError {
        TrackingError::upstream(self.carrier.id, message)
    }

    pub(crate) fn invalid_number(&self, tracking_number: &str) -> TrackingError {
        TrackingError::invalid_number(self.carrier.id, tracking_number)
    }

    /// Send a request and reject non-2xx responses.
    pub(crate) async fn send(
        &self,
        request: RequestBuilder,
    ) -> Result<reqwest::Response, TrackingError> {
        let response = request.send().await.map_err(|e| self.upstream(e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(self.upstream(format!("HTTP {status}")));
        }
        Ok(response)
    }

    pub(crate) async fn get_text(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<String, TrackingError> {
        let request = self.client.get(self.endpoint(path)).query(query);
        self.send(request)
            .await?
            .text()
            .await
            .map_err(|e| self.upstream(e))
    }

    /// Body of a form POST as text.
    pub(crate) async fn post_form_text(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<String, TrackingError> {
        let request = self.client.post(self.endpoint(path)).form(form);
        self.send(request)
            .await?
            .text()
            .await
            .map_err(|e| self.upstream(e))
    }

    pub(crate) async fn post_form_json<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, TrackingError> {
        let body = self.post_form_text(path, form).await?;
        self.decode_json(&body)
    }

    pub(crate) async fn post_json<B, T>(&self, path: &str, payload: &B) -> Result<T, TrackingError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.client.post(self.endpoint(path)).json(payload);
        let body = self
            .send(request)
            .await?
            .text()
            .await
            .map_err(|e| self.upstream(e))?;
        self.decode_json(&body)
    }

    /// Send a request whose response body is EUC-KR encoded.
    pub(crate) async fn euc_kr_text(
        &self,
        request: RequestBuilder,
    ) -> Result<String, TrackingError> {
        let bytes = self
            .send(request)
            .await?
            .bytes()
            .await
            .map_err(|e| self.upstream(e))?;
        Ok(decode_euc_kr(&bytes))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, TrackingError> {
        let body = self.get_text(path, query).await?;
        self.decode_json(&body)
    }

    pub(crate) fn decode_json<T: DeserializeOwned>(&self, body: &str) -> Result<T, TrackingError> {
        serde_json::from_str(body).map_err(|e| self.upstream(format!("malformed payload: {e}")))
    }

    pub(crate) fn carrier_ref(&self) -> CarrierRef {
        self.carrier.carrier_ref()
    }
}

/// Builder-free constructor for a successful snapshot.
pub(crate) fn found(
    carrier: CarrierRef,
    tracking_number: &str,
    events: Vec<TrackEvent>,
    sender: Option<Party>,
    recipient: Option<Party>,
    product_name: Option<String>,
) -> TrackInfo {
    TrackInfo {
        success: true,
        carrier,
        tracking_number: tracking_number.to_string(),
        sender,
        recipient,
        product_name,
        events,
        error: None,
    }
}

pub(crate) fn event(
    code: TrackEventStatusCode,
    name: Option<String>,
    time: Option<chrono::DateTime<chrono::FixedOffset>>,
    location: Option<String>,
    description: Option<String>,
) -> TrackEvent {
    TrackEvent {
        status: TrackEventStatus { code, name },
        time,
        location,
        description,
    }
}

/// Legacy carrier pages are served as EUC-KR; malformed bytes become U+FFFD.
pub(crate) fn decode_euc_kr(bytes: &[u8]) -> String {
    let (text, _, had_errors) = encoding_rs::EUC_KR.decode(bytes);
    if had_errors {
        tracing::debug!("EUC-KR body contained malformed sequences");
    }
    text.into_owned()
}

/// Parse a selector known at compile time.
pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("valid CSS selector")
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

pub(crate) fn non_empty(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Name-only party, `None` for blank names.
pub(crate) fn named(name: Option<String>) -> Option<Party> {
    Party::from_parts(name, None)
}

/// Direct `<td>` cells of a row.
pub(crate) fn row_cells(row: ElementRef<'_>) -> Vec<String> {
    let td = selector("td");
    row.select(&td).map(element_text).collect()
}

/// First line of a cell whose lines are separated by `<br>`.
pub(crate) fn first_line(cell: ElementRef<'_>) -> Option<String> {
    let html = cell.inner_html();
    let head = html.split("<br>").next().unwrap_or_default();
    let text = scraper::Html::parse_fragment(head)
        .root_element()
        .text()
        .collect::<String>();
    non_empty(collapse_whitespace(&text))
}
