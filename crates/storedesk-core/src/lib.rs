pub mod app_config;
pub mod block_indicators;
pub mod config;
pub mod tracking;

pub use app_config::{AppConfig, Environment};
pub use block_indicators::{
    load_block_indicators, parse_block_indicators, BlockIndicatorsFile, DEFAULT_BLOCK_INDICATORS,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use tracking::{
    CarrierRef, DeliveryStatus, Party, TrackEvent, TrackEventStatus, TrackEventStatusCode,
    TrackInfo,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read block indicators file {path}: {source}")]
    BlockIndicatorsIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse block indicators file: {0}")]
    BlockIndicatorsParse(#[from] serde_yaml::Error),

    #[error("config validation failed: {0}")]
    Validation(String),
}
