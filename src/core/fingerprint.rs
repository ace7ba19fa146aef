use image::{imageops::FilterType, DynamicImage};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FingerprintError {
    #[error("Failed to decode image bytes: {0}")]
    Decode(#[from] image::ImageError),
}

/// Content fingerprints for one photo. Computed once per scan, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFingerprint {
    /// Coarse luminance structure, lowercase hex, `hash_size² / 4` characters.
    pub average_hash: String,

    /// Horizontal gradient structure, same length and encoding. More robust
    /// to uniform brightness and contrast shifts than the average hash.
    pub difference_hash: String,

    /// SHA-256 of the raw byte stream; equal values imply byte-identical
    /// files. Used for file identity, not as a security primitive.
    pub exact_hash: String,

    /// Length of the raw byte stream.
    pub byte_size: u64,
}

/// Computes exact and perceptual hashes for encoded images.
pub struct FingerprintService {
    hash_size: u32,
}

impl FingerprintService {
    pub fn new(hash_size: u32) -> Self {
        Self { hash_size }
    }

    /// Compute all fingerprints for one encoded image. Bytes that do not
    /// decode as an image yield a `FingerprintError::Decode`; callers exclude
    /// such photos from the scan and continue.
    pub fn compute(&self, bytes: &[u8]) -> Result<ImageFingerprint, FingerprintError> {
        let image = image::load_from_memory(bytes)?;
        Ok(ImageFingerprint {
            average_hash: self.average_hash(&image),
            difference_hash: self.difference_hash(&image),
            exact_hash: Self::exact_hash(bytes),
            byte_size: bytes.len() as u64,
        })
    }

    /// Average hash (aHash): resize to `hash_size x hash_size`, convert to
    /// luminance, then set a bit wherever the pixel is at or above the mean.
    ///
    /// Lanczos resampling smooths aliasing so small re-encodes of the same
    /// visual content land on the same or a very close hash. Nearest-neighbor
    /// is not acceptable here; it inflates false negatives.
    pub fn average_hash(&self, image: &DynamicImage) -> String {
        let n = self.hash_size;
        let gray = image.resize_exact(n, n, FilterType::Lanczos3).to_luma8();

        let pixels: Vec<u8> = gray.pixels().map(|p| p.0[0]).collect();
        let mean = pixels.iter().map(|&p| p as f64).sum::<f64>() / pixels.len() as f64;

        let bits: Vec<bool> = pixels.iter().map(|&p| p as f64 >= mean).collect();
        bits_to_hex(&bits)
    }

    /// Difference hash (dHash): resize to `(hash_size + 1) x hash_size`,
    /// convert to luminance, then set a bit wherever a pixel is brighter than
    /// its right-hand neighbor. Rows top to bottom, columns left to right.
    pub fn difference_hash(&self, image: &DynamicImage) -> String {
        let n = self.hash_size;
        let gray = image.resize_exact(n + 1, n, FilterType::Lanczos3).to_luma8();

        let mut bits = Vec::with_capacity((n * n) as usize);
        for row in 0..n {
            for col in 0..n {
                let left = gray.get_pixel(col, row).0[0];
                let right = gray.get_pixel(col + 1, row).0[0];
                bits.push(left > right);
            }
        }
        bits_to_hex(&bits)
    }

    /// SHA-256 digest of the undecoded byte stream, for exact-match detection.
    pub fn exact_hash(bytes: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        format!("{:x}", hasher.finalize())
    }
}

/// Encode a bit string as lowercase hex, most significant bit first,
/// left-zero-padded so the first bit lands in the high bit of the first
/// hex digit.
fn bits_to_hex(bits: &[bool]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";

    let pad = (4 - bits.len() % 4) % 4;
    let mut out = String::with_capacity((bits.len() + pad) / 4);
    let mut nibble = 0u8;
    let mut filled = pad;
    for &bit in bits {
        nibble = (nibble << 1) | bit as u8;
        filled += 1;
        if filled == 4 {
            out.push(DIGITS[nibble as usize] as char);
            nibble = 0;
            filled = 0;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::similarity::hamming_distance;
    use image::{ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    type TestImage = ImageBuffer<Rgb<u8>, Vec<u8>>;

    fn encode(image: &TestImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), format)
            .unwrap();
        bytes
    }

    /// Left half black, right half white.
    fn split_image(width: u32, height: u32) -> TestImage {
        ImageBuffer::from_fn(width, height, |x, _| {
            if x < width / 2 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        })
    }

    /// Luminance ramp, dark on the left, bright on the right.
    fn ramp_image(width: u32, height: u32) -> TestImage {
        ImageBuffer::from_fn(width, height, |x, _| {
            let value = (x * 255 / (width - 1)) as u8;
            Rgb([value, value, value])
        })
    }

    /// Luminance ramp, bright on the left, dark on the right.
    fn reverse_ramp_image(width: u32, height: u32) -> TestImage {
        ImageBuffer::from_fn(width, height, |x, _| {
            let value = 255 - (x * 255 / (width - 1)) as u8;
            Rgb([value, value, value])
        })
    }

    #[test]
    fn identical_bytes_produce_identical_fingerprints() {
        let bytes = encode(&ramp_image(90, 80), ImageFormat::Png);
        let service = FingerprintService::new(8);

        let first = service.compute(&bytes).unwrap();
        let second = service.compute(&bytes).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.byte_size, bytes.len() as u64);
    }

    #[test]
    fn perceptual_hashes_have_16_lowercase_hex_chars_at_size_8() {
        let service = FingerprintService::new(8);
        let images = [
            encode(&split_image(80, 80), ImageFormat::Png),
            encode(&ramp_image(90, 80), ImageFormat::Png),
            encode(&reverse_ramp_image(123, 77), ImageFormat::Png),
        ];

        for bytes in &images {
            let fingerprint = service.compute(bytes).unwrap();
            for hash in [&fingerprint.average_hash, &fingerprint.difference_hash] {
                assert_eq!(hash.len(), 16);
                assert!(hash
                    .chars()
                    .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
            }
        }
    }

    #[test]
    fn average_hash_marks_pixels_above_the_mean() {
        let service = FingerprintService::new(8);
        let image = DynamicImage::ImageRgb8(split_image(80, 80));

        // Each row is four dark pixels then four bright ones: 0000 1111.
        assert_eq!(service.average_hash(&image), "0f0f0f0f0f0f0f0f");
    }

    #[test]
    fn difference_hash_tracks_horizontal_gradient_direction() {
        let service = FingerprintService::new(8);

        let rising = DynamicImage::ImageRgb8(ramp_image(90, 80));
        assert_eq!(service.difference_hash(&rising), "0000000000000000");

        let falling = DynamicImage::ImageRgb8(reverse_ramp_image(90, 80));
        assert_eq!(service.difference_hash(&falling), "ffffffffffffffff");
    }

    #[test]
    fn reencoded_image_keeps_perceptual_hashes_but_not_exact_hash() {
        let image = split_image(80, 80);
        let png = encode(&image, ImageFormat::Png);
        let bmp = encode(&image, ImageFormat::Bmp);
        assert_ne!(png, bmp);

        let service = FingerprintService::new(8);
        let from_png = service.compute(&png).unwrap();
        let from_bmp = service.compute(&bmp).unwrap();

        // Same decoded pixels, so the perceptual hashes agree exactly.
        assert_eq!(from_png.average_hash, from_bmp.average_hash);
        assert_eq!(from_png.difference_hash, from_bmp.difference_hash);
        assert_eq!(
            hamming_distance(&from_png.difference_hash, &from_bmp.difference_hash).unwrap(),
            0
        );

        assert_ne!(from_png.exact_hash, from_bmp.exact_hash);
    }

    #[test]
    fn exact_hash_is_a_64_char_sha256_digest() {
        let hash = FingerprintService::exact_hash(b"not even an image");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(hash, FingerprintService::exact_hash(b"different bytes"));
    }

    #[test]
    fn undecodable_bytes_report_a_decode_error() {
        let service = FingerprintService::new(8);
        let result = service.compute(b"definitely not an image");
        assert!(matches!(result, Err(FingerprintError::Decode(_))));
    }

    #[test]
    fn bits_encode_msb_first_with_left_padding() {
        assert_eq!(bits_to_hex(&[false, false, false, false]), "0");
        assert_eq!(bits_to_hex(&[true, true, true, true]), "f");
        assert_eq!(bits_to_hex(&[false, false, false, true]), "1");
        assert_eq!(
            bits_to_hex(&[true, false, false, false, false, false, false, true]),
            "81"
        );
    }
}
