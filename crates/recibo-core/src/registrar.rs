//! Receipt registration: decode, fingerprint, duplicate check, commit.
//!
//! The duplicate check and the insert are two separate calls against the
//! index. Two concurrent registrations of the same image can both pass the
//! check; the index's primary key on the visual fingerprint lets only one
//! insert through and the loser gets [`RegistrationError::RaceDuplicate`].
//! There is no such backstop for the metadata fingerprint.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, TimeZone};
use tracing::{debug, error, info};

use crate::error::{ConfigError, RegistrationError, StoreError};
use crate::imaging::{ImageDecoder, PerceptualHasher};
use crate::models::config::ReciboConfig;
use crate::models::receipt::{Analysis, NewReceipt, ReceiptRecord};
use crate::ocr::TextExtractor;
use crate::receipt::{FieldParser, MetadataFingerprinter};
use crate::store::DuplicateIndex;

/// The CPU-bound half of registration: decode, hash, OCR, parse, fingerprint.
#[derive(Debug, Clone)]
struct Analyzer {
    decoder: ImageDecoder,
    hasher: PerceptualHasher,
    extractor: TextExtractor,
    parser: FieldParser,
    fingerprinter: MetadataFingerprinter,
}

impl Analyzer {
    fn analyze(&self, bytes: &[u8], filename: &str) -> Result<Analysis, RegistrationError> {
        let image = self.decoder.decode(bytes)?;
        let visual = self.hasher.hash(&image)?;
        let text = self.extractor.extract(&image);
        let fields = self.parser.parse(&text);
        let metadata_fingerprint = self.fingerprinter.fingerprint(&fields, filename);

        debug!(
            visual_fingerprint = %visual,
            metadata_fingerprint = %metadata_fingerprint,
            text_length = text.len(),
            "Analyzed receipt"
        );

        Ok(Analysis {
            visual_fingerprint: visual.to_hex(),
            metadata_fingerprint,
            fields,
            source_filename: filename.to_string(),
            text_length: text.len(),
        })
    }
}

/// Registers receipts against a duplicate index.
///
/// Holds no per-request state; share it behind an `Arc` to register
/// concurrently.
pub struct ReceiptRegistrar<I: ?Sized> {
    analyzer: Arc<Analyzer>,
    index: Arc<I>,
}

impl<I: DuplicateIndex + ?Sized> ReceiptRegistrar<I> {
    /// Registrar with default decoder, parser and the given OCR extractor.
    pub fn new(index: Arc<I>, extractor: TextExtractor) -> Self {
        Self {
            analyzer: Arc::new(Analyzer {
                decoder: ImageDecoder::new(),
                hasher: PerceptualHasher::new(),
                extractor,
                parser: FieldParser::new(),
                fingerprinter: MetadataFingerprinter::new(),
            }),
            index,
        }
    }

    /// Registrar configured from `config`. OCR backend failures degrade to
    /// a disabled extractor.
    pub fn from_config(index: Arc<I>, config: &ReciboConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            analyzer: Arc::new(Analyzer {
                decoder: ImageDecoder::from_config(&config.image),
                hasher: PerceptualHasher::new(),
                extractor: TextExtractor::from_config(&config.ocr),
                parser: FieldParser::with_rules(&config.extraction)?,
                fingerprinter: MetadataFingerprinter::new(),
            }),
            index,
        })
    }

    /// Replace the field parser.
    pub fn with_parser(mut self, parser: FieldParser) -> Self {
        Arc::make_mut(&mut self.analyzer).parser = parser;
        self
    }

    /// Replace the image decoder.
    pub fn with_decoder(mut self, decoder: ImageDecoder) -> Self {
        Arc::make_mut(&mut self.analyzer).decoder = decoder;
        self
    }

    pub fn index(&self) -> &Arc<I> {
        &self.index
    }

    /// Run decode, hash, OCR, parse and fingerprint without touching the index.
    ///
    /// Runs on the calling thread.
    pub fn fingerprint_only(
        &self,
        bytes: &[u8],
        filename: &str,
    ) -> Result<Analysis, RegistrationError> {
        self.analyzer.analyze(bytes, filename)
    }

    /// Register a receipt, rejecting it if an equivalent one already exists.
    ///
    /// Analysis runs on tokio's blocking pool so OCR does not stall the
    /// async workers.
    pub async fn register_receipt(
        &self,
        bytes: &[u8],
        filename: &str,
    ) -> Result<ReceiptRecord, RegistrationError> {
        let start = Instant::now();

        let analyzer = Arc::clone(&self.analyzer);
        let owned_bytes = bytes.to_vec();
        let owned_name = filename.to_string();
        let analysis = tokio::task::spawn_blocking(move || analyzer.analyze(&owned_bytes, &owned_name))
            .await
            .map_err(|e| {
                error!(filename, error = %e, "Receipt analysis task failed");
                RegistrationError::Aborted(e.to_string())
            })??;
        let receipt: NewReceipt = analysis.into();

        match self
            .index
            .find_duplicate(&receipt.visual_fingerprint, &receipt.metadata_fingerprint)
            .await
        {
            Ok(Some(found)) => {
                info!(
                    filename,
                    visual_fingerprint = %receipt.visual_fingerprint,
                    existing = %found.record.visual_fingerprint,
                    matched_on = %found.matched_on,
                    "Rejected duplicate receipt"
                );
                return Err(RegistrationError::Duplicate {
                    matched_on: found.matched_on,
                    existing: Box::new(found.record),
                });
            }
            Ok(None) => {}
            Err(e) => return Err(unexpected(e, filename)),
        }

        let visual_fingerprint = receipt.visual_fingerprint.clone();
        match self.index.insert(receipt).await {
            Ok(record) => {
                info!(
                    filename,
                    visual_fingerprint = %record.visual_fingerprint,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Registered receipt"
                );
                Ok(record)
            }
            Err(StoreError::UniqueViolation(_)) => {
                info!(filename, %visual_fingerprint, "Concurrent registration won the insert race");
                Err(RegistrationError::RaceDuplicate { visual_fingerprint })
            }
            Err(e) => Err(unexpected(e, filename)),
        }
    }
}

/// Name used for submissions that arrive without one, e.g.
/// `comp_20240615093012.jpg`.
pub fn default_filename<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    now.format("comp_%Y%m%d%H%M%S.jpg").to_string()
}

fn unexpected(e: StoreError, filename: &str) -> RegistrationError {
    error!(filename, error = ?e, "Unexpected duplicate index failure");
    RegistrationError::Unexpected(e)
}
