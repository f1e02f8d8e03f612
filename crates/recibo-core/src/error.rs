//! Error types for the recibo-core library.

use thiserror::Error;

use crate::models::receipt::ReceiptRecord;

/// Main error type for the recibo library.
#[derive(Error, Debug)]
pub enum ReciboError {
    /// Image decoding error.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Perceptual hashing error.
    #[error("hash error: {0}")]
    Hash(#[from] HashError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Duplicate index error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Receipt registration error.
    #[error("registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while turning raw bytes into an image.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The payload was empty.
    #[error("empty payload")]
    Empty,

    /// The bytes are not a recognised image container.
    #[error("unsupported or unrecognised image format")]
    UnsupportedFormat,

    /// The container was recognised but the data is truncated or corrupt.
    #[error("corrupt image data: {0}")]
    Corrupt(String),

    /// The image exceeds the configured dimension limits.
    #[error("image exceeds limits: {0}")]
    TooLarge(String),
}

/// Errors raised while computing the visual fingerprint.
#[derive(Error, Debug)]
pub enum HashError {
    /// The decoded image has a zero dimension.
    #[error("degenerate image dimensions: {width}x{height}")]
    DegenerateImage { width: u32, height: u32 },

    /// The frequency transform produced NaN or infinite coefficients.
    #[error("frequency transform produced non-finite coefficients")]
    NonFiniteTransform,
}

/// Errors related to OCR processing.
///
/// These never escape [`crate::ocr::TextExtractor`]; they are logged and
/// degrade to empty text.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load OCR models or initialise the engine.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// The image could not be re-encoded for the engine.
    #[error("failed to encode image for OCR: {0}")]
    Encode(String),

    /// OCR is turned off in configuration.
    #[error("OCR is disabled")]
    Disabled,
}

/// Errors raised by a [`crate::store::DuplicateIndex`] implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database connection failed.
    #[error("database connection error: {0}")]
    Connection(String),

    /// Migration execution failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// SQL query execution failed.
    #[error("query error: {0}")]
    Query(String),

    /// A record with the same visual fingerprint already exists.
    #[error("visual fingerprint already registered: {0}")]
    UniqueViolation(String),

    /// A stored row could not be mapped back into a record.
    #[error("corrupt stored record: {0}")]
    Corrupt(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::Query(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        Self::Migration(e.to_string())
    }
}

/// Errors related to configuration and rule tables.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading or writing the config file failed.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid JSON for [`crate::models::config::ReciboConfig`].
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// An extraction pattern failed to compile.
    #[error("invalid pattern for {rule}: {reason}")]
    InvalidPattern { rule: &'static str, reason: String },

    /// The bank rule has no tokens to match.
    #[error("bank list is empty")]
    EmptyBankList,

    /// Any other invalid setting.
    #[error("invalid setting: {0}")]
    Invalid(String),
}

/// Which fingerprint matched an existing record during the duplicate check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchedOn {
    /// The visual fingerprints are equal.
    Visual,
    /// Only the metadata fingerprints are equal.
    Metadata,
}

impl std::fmt::Display for MatchedOn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchedOn::Visual => write!(f, "visual fingerprint"),
            MatchedOn::Metadata => write!(f, "metadata fingerprint"),
        }
    }
}

/// Outcome of a failed `register_receipt` call.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// The payload is not a valid or complete image.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Fingerprinting failed on an otherwise decoded image.
    #[error(transparent)]
    Hash(#[from] HashError),

    /// A previously registered receipt matches this submission.
    #[error("duplicate receipt: matches {} on {matched_on}", .existing.visual_fingerprint)]
    Duplicate {
        matched_on: MatchedOn,
        existing: Box<ReceiptRecord>,
    },

    /// The insert lost a race against a concurrent registration of the same image.
    #[error("duplicate receipt registered concurrently: {visual_fingerprint}")]
    RaceDuplicate { visual_fingerprint: String },

    /// Any other internal fault.
    #[error("unexpected error: {0}")]
    Unexpected(#[from] StoreError),

    /// The analysis task panicked or was cancelled before finishing.
    #[error("receipt analysis aborted: {0}")]
    Aborted(String),
}

impl RegistrationError {
    /// True for both ordinary and race duplicates.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. } | Self::RaceDuplicate { .. })
    }

    /// Caller-facing message. Races read the same as ordinary duplicates and
    /// internal faults carry no diagnostics.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Decode(_) => "The file is not a valid image.",
            Self::Hash(_) => "The image could not be fingerprinted.",
            Self::Duplicate { .. } | Self::RaceDuplicate { .. } => {
                "Duplicate receipt: this payment has already been registered."
            }
            Self::Unexpected(_) | Self::Aborted(_) => {
                "Unexpected error while registering the receipt. Please try again."
            }
        }
    }
}

/// Result type for the recibo library.
pub type Result<T> = std::result::Result<T, ReciboError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_race_and_duplicate_share_user_message() {
        let race = RegistrationError::RaceDuplicate {
            visual_fingerprint: "ffff000000000000".to_string(),
        };
        assert!(race.is_duplicate());

        let unexpected = RegistrationError::Unexpected(StoreError::Connection("refused".into()));
        assert!(!unexpected.is_duplicate());
        assert!(!unexpected.user_message().contains("refused"));
        assert_ne!(race.user_message(), unexpected.user_message());
    }

    fn width_of(decoded: std::result::Result<u32, DecodeError>) -> Result<u32> {
        Ok(decoded?)
    }

    #[test]
    fn test_errors_convert_into_crate_error() {
        assert_eq!(width_of(Ok(64)).unwrap(), 64);
        let err = width_of(Err(DecodeError::Empty)).unwrap_err();
        assert!(matches!(err, ReciboError::Decode(DecodeError::Empty)));

        let registration: ReciboError = RegistrationError::Aborted("worker panicked".into()).into();
        assert!(registration.to_string().starts_with("registration error:"));
    }
}
