use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Markers that show up on Naver's error, rate-limit and captcha pages.
///
/// Matching is case-insensitive substring search, so `robot` also trips on
/// text such as "robots"; the broader net is accepted in exchange for recall.
pub const DEFAULT_BLOCK_INDICATORS: &[&str] = &[
    "에러페이지",
    "시스템오류",
    "접속이 불가",
    "captcha",
    "robot",
    "비정상적인 접근",
    "잠시 후 다시",
    "보안 확인을 완료해 주세요",
    "캡차이미지",
    "정답을 입력해주세요",
    "보안 확인",
    "캡차",
    "정답을 입력",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockIndicatorsFile {
    pub indicators: Vec<String>,
}

impl Default for BlockIndicatorsFile {
    fn default() -> Self {
        Self {
            indicators: DEFAULT_BLOCK_INDICATORS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

/// Parse and validate a block indicator list from YAML text.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or the list is invalid.
pub fn parse_block_indicators(yaml: &str) -> Result<BlockIndicatorsFile, ConfigError> {
    let file: BlockIndicatorsFile = serde_yaml::from_str(yaml)?;
    validate_block_indicators(&file)?;
    Ok(file)
}

/// Load and validate a block indicator list from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_block_indicators(path: &Path) -> Result<BlockIndicatorsFile, ConfigError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::BlockIndicatorsIo {
            path: path.display().to_string(),
            source: e,
        })?;

    parse_block_indicators(&content)
}

fn validate_block_indicators(file: &BlockIndicatorsFile) -> Result<(), ConfigError> {
    if file.indicators.is_empty() {
        return Err(ConfigError::Validation(
            "block indicator list must not be empty".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for indicator in &file.indicators {
        if indicator.trim().is_empty() {
            return Err(ConfigError::Validation(
                "block indicators must be non-empty strings".to_string(),
            ));
        }
        if !seen.insert(indicator.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate block indicator: '{indicator}'"
            )));
        }
    }

    Ok(())
}
