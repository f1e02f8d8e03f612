//! Image decoding and visual fingerprinting.

mod decoder;
mod phash;

pub use decoder::ImageDecoder;
pub use phash::{FINGERPRINT_HEX_LEN, HASH_SIZE, HIGHFREQ_FACTOR, PerceptualHasher, VisualFingerprint};
