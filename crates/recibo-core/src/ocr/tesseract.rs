//! Tesseract backend via `leptess`.

use std::io::Cursor;
use std::path::PathBuf;

use image::{DynamicImage, ImageFormat};
use leptess::LepTess;
use tracing::debug;

use crate::error::OcrError;

use super::TextRecognizer;

/// Tesseract works best at 300 DPI.
const SOURCE_RESOLUTION: i32 = 300;

/// OCR backed by a system Tesseract install.
///
/// `LepTess` is not `Sync`, so a fresh instance is created per call.
pub struct TesseractRecognizer {
    tessdata_dir: Option<PathBuf>,
}

impl TesseractRecognizer {
    pub fn new(tessdata_dir: Option<PathBuf>) -> Self {
        Self { tessdata_dir }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &DynamicImage, language: &str) -> Result<String, OcrError> {
        let data_path = self
            .tessdata_dir
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());

        let mut tess = LepTess::new(data_path.as_deref(), language)
            .map_err(|e| OcrError::ModelLoad(format!("tesseract init ({}): {}", language, e)))?;

        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, ImageFormat::Png)
            .map_err(|e| OcrError::Encode(e.to_string()))?;

        tess.set_image_from_mem(png.get_ref())
            .map_err(|e| OcrError::Recognition(format!("tesseract set image: {}", e)))?;
        tess.set_source_resolution(SOURCE_RESOLUTION);

        let text = tess
            .get_utf8_text()
            .map_err(|e| OcrError::Recognition(format!("tesseract run: {}", e)))?;

        debug!(language, chars = text.len(), "Tesseract recognition finished");
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "tesseract"
    }
}
