//! Best-effort OCR over decoded receipts.

#[cfg(feature = "native")]
mod onnx;
#[cfg(feature = "tesseract")]
mod tesseract;

#[cfg(feature = "native")]
pub use onnx::OnnxRecognizer;
#[cfg(feature = "tesseract")]
pub use tesseract::TesseractRecognizer;

use std::sync::Arc;

use image::DynamicImage;
use tracing::{debug, warn};

use crate::error::OcrError;
use crate::models::config::{OcrBackendKind, OcrConfig};

/// An OCR engine.
pub trait TextRecognizer: Send + Sync {
    /// Recognize text in `image` using the given language hint.
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String, OcrError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Recognizer used when OCR is turned off.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledRecognizer;

impl TextRecognizer for DisabledRecognizer {
    fn recognize(&self, _image: &DynamicImage, _language: &str) -> Result<String, OcrError> {
        Err(OcrError::Disabled)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Build the recognizer selected in `config`.
pub fn create_recognizer(config: &OcrConfig) -> Result<Box<dyn TextRecognizer>, OcrError> {
    match config.backend {
        OcrBackendKind::Disabled => Ok(Box::new(DisabledRecognizer)),
        #[cfg(feature = "native")]
        OcrBackendKind::Onnx => Ok(Box::new(OnnxRecognizer::from_dir(&config.model_dir, config.keep_unk)?)),
        #[cfg(not(feature = "native"))]
        OcrBackendKind::Onnx => Err(OcrError::ModelLoad(
            "ONNX backend not compiled in; build with the `native` feature".into(),
        )),
        #[cfg(feature = "tesseract")]
        OcrBackendKind::Tesseract => Ok(Box::new(TesseractRecognizer::new(config.tessdata_dir.clone()))),
        #[cfg(not(feature = "tesseract"))]
        OcrBackendKind::Tesseract => Err(OcrError::ModelLoad(
            "Tesseract backend not compiled in; build with the `tesseract` feature".into(),
        )),
    }
}

/// Runs a recognizer and lowercases its output. Never fails.
///
/// Cloning shares the underlying recognizer.
#[derive(Clone)]
pub struct TextExtractor {
    recognizer: Arc<dyn TextRecognizer>,
    language: String,
}

impl TextExtractor {
    pub fn new(recognizer: Box<dyn TextRecognizer>, language: impl Into<String>) -> Self {
        Self {
            recognizer: Arc::from(recognizer),
            language: language.into(),
        }
    }

    /// Extractor that always yields empty text.
    pub fn disabled() -> Self {
        Self::new(Box::new(DisabledRecognizer), "spa")
    }

    /// Build from config, falling back to [`DisabledRecognizer`] when the
    /// configured backend cannot be initialised.
    pub fn from_config(config: &OcrConfig) -> Self {
        let recognizer = create_recognizer(config).unwrap_or_else(|e| {
            warn!(backend = ?config.backend, error = %e, "OCR backend unavailable, continuing without OCR");
            Box::new(DisabledRecognizer)
        });
        Self::new(recognizer, config.language.clone())
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn backend_name(&self) -> &'static str {
        self.recognizer.name()
    }

    /// Extract lowercase text, or an empty string if recognition fails.
    pub fn extract(&self, image: &DynamicImage) -> String {
        match self.recognizer.recognize(image, &self.language) {
            Ok(text) => {
                debug!(backend = self.recognizer.name(), chars = text.len(), "OCR complete");
                text.to_lowercase()
            }
            Err(OcrError::Disabled) => String::new(),
            Err(e) => {
                warn!(backend = self.recognizer.name(), error = %e, "OCR failed, continuing with empty text");
                String::new()
            }
        }
    }
}

impl std::fmt::Debug for TextExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextExtractor")
            .field("backend", &self.recognizer.name())
            .field("language", &self.language)
            .finish()
    }
}
