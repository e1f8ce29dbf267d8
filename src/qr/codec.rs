//! QR encode/decode with a staged fallback chain for noisy photographs.
//!
//! Encoding renders the identifier verbatim at medium error correction with
//! a wide quiet border. Decoding runs an ordered list of transform stages,
//! attempting a decode after each one and short-circuiting on the first
//! success: contrast boosting fixes the common case (poor lighting, busy
//! background); edge sharpening can amplify noise, so it runs only after the
//! cheaper transform fails. At most two decode attempts per image.

use image::{GrayImage, Luma};
use qrcode::{Color, EcLevel, QrCode};
use tracing::debug;

use super::QrError;

/// Pixels per QR module. Large enough that the card's 150x150 resize stays
/// above the minimum reliable module size.
pub const MODULE_PIXELS: u32 = 10;

/// Quiet border around the code, in modules.
pub const QUIET_BORDER_MODULES: u32 = 4;

/// Fixed contrast multiplier applied around the grayscale midpoint.
const CONTRAST_FACTOR: f32 = 2.0;

/// 3x3 edge-sharpening kernel.
const SHARPEN_KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];

/// Encode an identifier into a square scannable image.
///
/// Payload is the identifier string verbatim, no additional encoding layer.
pub fn encode_identifier(identifier: &str) -> Result<GrayImage, QrError> {
    let code = QrCode::with_error_correction_level(identifier.as_bytes(), EcLevel::M)
        .map_err(|e| QrError::Encode(e.to_string()))?;

    let modules = code.width() as u32;
    let colors = code.to_colors();
    let total = (modules + 2 * QUIET_BORDER_MODULES) * MODULE_PIXELS;

    let mut img = GrayImage::from_pixel(total, total, Luma([255]));
    for my in 0..modules {
        for mx in 0..modules {
            if colors[(my * modules + mx) as usize] == Color::Dark {
                let px = (mx + QUIET_BORDER_MODULES) * MODULE_PIXELS;
                let py = (my + QUIET_BORDER_MODULES) * MODULE_PIXELS;
                for dy in 0..MODULE_PIXELS {
                    for dx in 0..MODULE_PIXELS {
                        img.put_pixel(px + dx, py + dy, Luma([0]));
                    }
                }
            }
        }
    }

    debug!(identifier_len = identifier.len(), size = total, "QR code rendered");
    Ok(img)
}

// ═══════════════════════════════════════════════════════════
// Decode fallback chain
// ═══════════════════════════════════════════════════════════

/// One named transform stage in the decode chain. Each stage receives the
/// previous stage's output, so later stages stack on earlier ones.
pub trait ScanTransform: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, img: &GrayImage) -> GrayImage;
}

/// Boost contrast by a fixed multiplier around the midpoint. Makes dark
/// modules pop out of messy or dimly lit backgrounds.
pub struct ContrastBoost {
    factor: f32,
}

impl Default for ContrastBoost {
    fn default() -> Self {
        Self {
            factor: CONTRAST_FACTOR,
        }
    }
}

impl ScanTransform for ContrastBoost {
    fn name(&self) -> &'static str {
        "contrast"
    }

    fn apply(&self, img: &GrayImage) -> GrayImage {
        let mut out = img.clone();
        for pixel in out.pixels_mut() {
            let v = pixel.0[0] as f32;
            pixel.0[0] = ((v - 128.0) * self.factor + 128.0).clamp(0.0, 255.0) as u8;
        }
        out
    }
}

/// Edge-sharpening convolution. Amplifies noise, so it runs last.
pub struct Sharpen;

impl ScanTransform for Sharpen {
    fn name(&self) -> &'static str {
        "sharpen"
    }

    fn apply(&self, img: &GrayImage) -> GrayImage {
        image::imageops::filter3x3(img, &SHARPEN_KERNEL)
    }
}

/// Ordered decode chain. Stage count and order are data, not inline logic.
pub struct DecodePipeline {
    stages: Vec<Box<dyn ScanTransform>>,
}

impl Default for DecodePipeline {
    fn default() -> Self {
        Self {
            stages: vec![Box::new(ContrastBoost::default()), Box::new(Sharpen)],
        }
    }
}

impl DecodePipeline {
    pub fn new(stages: Vec<Box<dyn ScanTransform>>) -> Self {
        Self { stages }
    }

    /// Decode an identifier from raw image bytes.
    ///
    /// Normalizes to single-channel grayscale, then applies each stage in
    /// order with one decode attempt after each. When more than one code is
    /// present, only the first detected grid is read.
    pub fn decode(&self, image_bytes: &[u8]) -> Result<String, QrError> {
        let gray = image::load_from_memory(image_bytes)
            .map_err(|e| QrError::InvalidImage(e.to_string()))?
            .to_luma8();

        let mut current = gray;
        for stage in &self.stages {
            current = stage.apply(&current);
            if let Some(identifier) = try_decode(&current) {
                debug!(stage = stage.name(), "QR decoded");
                return Ok(identifier);
            }
            debug!(stage = stage.name(), "Stage yielded no result");
        }

        Err(QrError::Undecodable)
    }
}

/// Single decode attempt. First detected grid wins; a grid that fails to
/// read counts as no result for this attempt.
fn try_decode(img: &GrayImage) -> Option<String> {
    let mut prepared = rqrr::PreparedImage::prepare(img.clone());
    let grids = prepared.detect_grids();
    let grid = grids.into_iter().next()?;
    grid.decode().ok().map(|(_meta, content)| content)
}

/// Decode with the default two-stage chain.
pub fn decode_identifier(image_bytes: &[u8]) -> Result<String, QrError> {
    DecodePipeline::default().decode(image_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat};
    use std::io::Cursor;

    fn png_bytes(img: &GrayImage) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageLuma8(img.clone())
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    #[test]
    fn encode_produces_square_with_quiet_border() {
        let img = encode_identifier("patient-token").unwrap();
        assert_eq!(img.width(), img.height());
        // Border corner must be white
        assert_eq!(img.get_pixel(0, 0).0[0], 255);
        assert_eq!(
            img.get_pixel(img.width() - 1, img.height() - 1).0[0],
            255
        );
        // Finder pattern corner module must be dark
        let corner = QUIET_BORDER_MODULES * MODULE_PIXELS;
        assert_eq!(img.get_pixel(corner, corner).0[0], 0);
    }

    #[test]
    fn decode_recovers_encoded_identifier() {
        for identifier in [
            "3f2b8c1e-9d4a-4f6b-a1c2-7e8d9f0a1b2c",
            "short",
            "MIXED-Case_token.01",
        ] {
            let img = encode_identifier(identifier).unwrap();
            let decoded = decode_identifier(&png_bytes(&img)).unwrap();
            assert_eq!(decoded, identifier);
        }
    }

    #[test]
    fn decode_survives_low_contrast_rendering() {
        let img = encode_identifier("washed-out-token").unwrap();
        // Wash the image out: dark modules to mid-gray, background to light gray
        let mut washed = img.clone();
        for pixel in washed.pixels_mut() {
            pixel.0[0] = if pixel.0[0] < 128 { 95 } else { 165 };
        }
        let decoded = decode_identifier(&png_bytes(&washed)).unwrap();
        assert_eq!(decoded, "washed-out-token");
    }

    #[test]
    fn image_without_code_is_undecodable() {
        let blank = GrayImage::from_pixel(200, 200, Luma([200]));
        let err = decode_identifier(&png_bytes(&blank)).unwrap_err();
        assert!(matches!(err, QrError::Undecodable));
    }

    #[test]
    fn garbage_bytes_are_invalid_image_not_a_panic() {
        let err = decode_identifier(&[0xDE, 0xAD, 0xBE, 0xEF]).unwrap_err();
        assert!(matches!(err, QrError::InvalidImage(_)));
    }

    #[test]
    fn contrast_boost_spreads_midtones() {
        let mut img = GrayImage::new(2, 1);
        img.put_pixel(0, 0, Luma([100]));
        img.put_pixel(1, 0, Luma([160]));
        let boosted = ContrastBoost::default().apply(&img);
        assert_eq!(boosted.get_pixel(0, 0).0[0], 72);
        assert_eq!(boosted.get_pixel(1, 0).0[0], 192);
    }

    #[test]
    fn pipeline_stage_order_is_contrast_then_sharpen() {
        let pipeline = DecodePipeline::default();
        let names: Vec<_> = pipeline.stages.iter().map(|s| s.name()).collect();
        assert_eq!(names, ["contrast", "sharpen"]);
    }

    #[test]
    fn empty_pipeline_always_undecodable() {
        let img = encode_identifier("x").unwrap();
        let pipeline = DecodePipeline::new(vec![]);
        assert!(matches!(
            pipeline.decode(&png_bytes(&img)),
            Err(QrError::Undecodable)
        ));
    }
}
