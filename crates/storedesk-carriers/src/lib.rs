pub mod adapters;
pub mod batch;
pub mod error;
pub mod registry;
pub mod sandbox;
pub mod time;
pub mod tracker;

pub use adapters::{default_base_url, SUPPORTED_CARRIERS};
pub use batch::{PacedTracker, TrackRequest};
pub use error::TrackingError;
pub use registry::{
    all_carriers, carrier_by_id, carrier_by_name, clean_tracking_number, is_sandbox_number,
    predict_carriers, CarrierInfo, TrackingPattern, SANDBOX_CARRIER_ID, SANDBOX_PREFIX,
};
pub use sandbox::{sandbox_track_info, SANDBOX_DELIVERED_PREFIX};
pub use tracker::{CarrierTracker, PackageTracker};
