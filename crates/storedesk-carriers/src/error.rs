use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackingError {
    /// The carrier id is not registered, or has no tracking adapter.
    #[error("unsupported carrier: {0}")]
    UnknownCarrier(String),

    #[error("invalid tracking number \"{tracking_number}\" for {carrier_id}")]
    InvalidTrackingNumber {
        carrier_id: String,
        tracking_number: String,
    },

    /// Transport failure, non-2xx status, or a payload the adapter cannot read.
    #[error("{carrier_id} tracking endpoint failed: {message}")]
    Upstream { carrier_id: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl TrackingError {
    pub(crate) fn upstream(carrier_id: &str, message: impl std::fmt::Display) -> Self {
        Self::Upstream {
            carrier_id: carrier_id.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn invalid_number(carrier_id: &str, tracking_number: &str) -> Self {
        Self::InvalidTrackingNumber {
            carrier_id: carrier_id.to_string(),
            tracking_number: tracking_number.to_string(),
        }
    }

    /// Only upstream failures are worth retrying; the other variants are
    /// caller bugs or bad input.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }
}
