//! Configuration structures for the registration pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::receipt::rules::ExtractionRules;

/// Main configuration for recibo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReciboConfig {
    /// Image decoding configuration.
    pub image: ImageConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Field extraction rules.
    pub extraction: ExtractionRules,

    /// Duplicate index configuration.
    pub store: StoreConfig,
}

/// Image decoding limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageConfig {
    /// Maximum accepted width or height, in pixels.
    pub max_dimension: u32,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_dimension: 12_000,
        }
    }
}

/// Which OCR engine backs the text extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrBackendKind {
    /// Pure Rust ONNX models.
    Onnx,
    /// Tesseract through leptess.
    Tesseract,
    /// No OCR; every receipt registers with empty fields.
    Disabled,
}

/// OCR engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Engine selection.
    pub backend: OcrBackendKind,

    /// Recognition language (Tesseract language code).
    pub language: String,

    /// Directory containing `det.onnx`, `latin_rec.onnx` and `latin_dict.txt`.
    pub model_dir: PathBuf,

    /// Tesseract data directory; `None` uses the system default.
    pub tessdata_dir: Option<PathBuf>,

    /// Keep `[UNK]` tokens emitted by the ONNX recognizer.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            backend: if cfg!(feature = "native") {
                OcrBackendKind::Onnx
            } else if cfg!(feature = "tesseract") {
                OcrBackendKind::Tesseract
            } else {
                OcrBackendKind::Disabled
            },
            language: "spa".to_string(),
            model_dir: PathBuf::from("models"),
            tessdata_dir: None,
            keep_unk: false,
        }
    }
}

/// Duplicate index configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite connection URL.
    pub database_url: String,

    /// Connection pool size.
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://recibo.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

impl ReciboConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check settings that serde cannot.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.image.max_dimension == 0 {
            return Err(ConfigError::Invalid("image.max_dimension must be positive".into()));
        }
        if self.store.max_connections == 0 {
            return Err(ConfigError::Invalid("store.max_connections must be positive".into()));
        }
        if self.ocr.language.trim().is_empty() {
            return Err(ConfigError::Invalid("ocr.language must not be empty".into()));
        }
        self.extraction.compile()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = ReciboConfig::default();
        config.save(&path).unwrap();

        let loaded = ReciboConfig::from_file(&path).unwrap();
        assert_eq!(loaded.ocr.language, "spa");
        assert_eq!(loaded.store.database_url, config.store.database_url);
        assert_eq!(loaded.extraction.banks, config.extraction.banks);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"ocr": {"backend": "disabled"}}"#).unwrap();

        let loaded = ReciboConfig::from_file(&path).unwrap();
        assert_eq!(loaded.ocr.backend, OcrBackendKind::Disabled);
        assert_eq!(loaded.ocr.language, "spa");
        assert_eq!(loaded.image.max_dimension, 12_000);
    }

    #[test]
    fn test_invalid_pattern_is_rejected_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"extraction": {"date_pattern": "(\\d{2}"}}"#).unwrap();

        let err = ReciboConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { rule: "date", .. }));
    }
}
