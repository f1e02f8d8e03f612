//! DCT perceptual hash.
//!
//! The image is reduced to a 32x32 grayscale grid, transformed with a 2-D
//! type-II DCT, and the top-left 8x8 block of low-frequency coefficients is
//! binarized against its median. The 64 bits are packed row-major, most
//! significant bit first, and rendered as 16 lowercase hex characters.
//!
//! Fingerprints are compared by exact equality only. Two images that differ
//! after the transform are distinct receipts even when they look alike.

use std::f64::consts::PI;
use std::fmt;

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::HashError;

/// Side of the low-frequency block kept from the transform.
pub const HASH_SIZE: usize = 8;

/// Oversampling factor between the grid and the kept block.
pub const HIGHFREQ_FACTOR: usize = 4;

/// Hex length of a rendered fingerprint.
pub const FINGERPRINT_HEX_LEN: usize = HASH_SIZE * HASH_SIZE / 4;

const GRID_SIZE: usize = HASH_SIZE * HIGHFREQ_FACTOR;

/// 64-bit visual fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisualFingerprint(u64);

impl VisualFingerprint {
    pub fn bits(&self) -> u64 {
        self.0
    }

    /// Fixed-width lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        format!("{:0width$x}", self.0, width = FINGERPRINT_HEX_LEN)
    }

    /// Parse a rendered fingerprint.
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != FINGERPRINT_HEX_LEN {
            return None;
        }
        u64::from_str_radix(s, 16).ok().map(Self)
    }
}

impl fmt::Display for VisualFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Computes visual fingerprints.
#[derive(Debug, Clone)]
pub struct PerceptualHasher {
    /// DCT-II basis, `basis[[k, n]] = cos(pi * (2n + 1) * k / 2N)`.
    basis: Array2<f64>,
}

impl PerceptualHasher {
    pub fn new() -> Self {
        let n = GRID_SIZE as f64;
        let basis = Array2::from_shape_fn((GRID_SIZE, GRID_SIZE), |(k, i)| {
            (PI * (2.0 * i as f64 + 1.0) * k as f64 / (2.0 * n)).cos()
        });
        Self { basis }
    }

    /// Fingerprint a decoded image.
    pub fn hash(&self, image: &DynamicImage) -> Result<VisualFingerprint, HashError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(HashError::DegenerateImage { width, height });
        }

        let gray = image.to_luma8();
        let small = imageops::resize(&gray, GRID_SIZE as u32, GRID_SIZE as u32, FilterType::Lanczos3);

        let pixels = Array2::from_shape_fn((GRID_SIZE, GRID_SIZE), |(y, x)| {
            f64::from(small.get_pixel(x as u32, y as u32)[0])
        });

        // Columns first, then rows: C * X * C^T.
        let dct = self.basis.dot(&pixels).dot(&self.basis.t());

        let low: Vec<f64> = dct
            .slice(ndarray::s![..HASH_SIZE, ..HASH_SIZE])
            .iter()
            .copied()
            .collect();

        if low.iter().any(|c| !c.is_finite()) {
            return Err(HashError::NonFiniteTransform);
        }

        let median = median(&low);
        let bits = low
            .iter()
            .fold(0u64, |acc, &c| (acc << 1) | u64::from(c > median));

        Ok(VisualFingerprint(bits))
    }
}

impl Default for PerceptualHasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Median of a non-empty slice, averaging the two middle values for even lengths.
fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 128])
        }))
    }

    fn checkerboard(size: u32, cell: u32) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_fn(size, size, |x, y| {
            if (x / cell + y / cell) % 2 == 0 { Luma([255]) } else { Luma([0]) }
        }))
    }

    #[test]
    fn test_hash_is_deterministic() {
        let hasher = PerceptualHasher::new();
        let image = gradient(120, 80);
        assert_eq!(hasher.hash(&image).unwrap(), hasher.hash(&image).unwrap());
    }

    #[test]
    fn test_hex_is_fixed_length() {
        let hasher = PerceptualHasher::new();
        let fp = hasher.hash(&gradient(50, 50)).unwrap();
        let hex = fp.to_hex();
        assert_eq!(hex.len(), FINGERPRINT_HEX_LEN);
        assert_eq!(VisualFingerprint::from_hex(&hex), Some(fp));
    }

    #[test]
    fn test_hex_rendering_preserves_bits() {
        let fp = PerceptualHasher::new().hash(&gradient(120, 80)).unwrap();
        let parsed = VisualFingerprint::from_hex(&fp.to_hex()).unwrap();
        assert_eq!(parsed.bits(), fp.bits());
        assert_eq!(VisualFingerprint::from_hex("00ff").map(|f| f.bits()), None);
    }

    #[test]
    fn test_different_content_differs() {
        let hasher = PerceptualHasher::new();
        let a = hasher.hash(&gradient(64, 64)).unwrap();
        let b = hasher.hash(&checkerboard(64, 16)).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_sized_image_is_degenerate() {
        let hasher = PerceptualHasher::new();
        let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 10));
        assert!(matches!(
            hasher.hash(&empty),
            Err(HashError::DegenerateImage { width: 0, height: 10 })
        ));
    }

    #[test]
    fn test_median_even_length() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }
}
