use std::path::Path;

use serde::Deserialize;

use crate::error::AlignmentError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AlignerConfig {
    pub language: String,
    pub model_path: String,
    pub vocab_path: String,
    pub device: String,
    pub expected_sample_rate_hz: u32,
    pub blank_id: usize,
    pub word_separator: char,
}

impl AlignerConfig {
    pub const DEFAULT_SAMPLE_RATE_HZ: u32 = 16_000;
    pub const DEFAULT_WORD_SEPARATOR: char = '|';

    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| AlignmentError::io("read aligner config", e))?;
        serde_json::from_str(&data).map_err(|e| AlignmentError::json("parse aligner config", e))
    }
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            model_path: String::new(),
            vocab_path: String::new(),
            device: "cpu".to_string(),
            expected_sample_rate_hz: Self::DEFAULT_SAMPLE_RATE_HZ,
            blank_id: 0,
            word_separator: Self::DEFAULT_WORD_SEPARATOR,
        }
    }
}

/// One aligner per supported language, built once at startup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryConfig {
    pub languages: Vec<AlignerConfig>,
}

impl RegistryConfig {
    pub fn load(path: &Path) -> Result<Self, AlignmentError> {
        let data = std::fs::read_to_string(path)
            .map_err(|e| AlignmentError::io("read registry config", e))?;
        serde_json::from_str(&data).map_err(|e| AlignmentError::json("parse registry config", e))
    }
}
