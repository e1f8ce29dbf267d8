//! Printable identity card composition.
//!
//! Fixed 600x400 layout: branded header band with a centered title, five
//! profile lines down the left, and the patient's QR code resized into the
//! lower-right corner. The geometry is deliberately constant so printed
//! cards are interchangeable across versions.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageOutputFormat, Rgb, RgbImage};
use tracing::debug;

use super::font;
use super::QrError;
use crate::models::Patient;

pub const CARD_WIDTH: u32 = 600;
pub const CARD_HEIGHT: u32 = 400;
pub const HEADER_HEIGHT: u32 = 60;

/// Header band color.
const HEADER_COLOR: Rgb<u8> = Rgb([46, 134, 171]);
const BODY_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
const TEXT_COLOR: Rgb<u8> = Rgb([33, 33, 33]);
const TITLE_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

const TITLE: &str = "CareTag Medical Card";
const TITLE_SCALE: u32 = 3;
const TITLE_Y: u32 = 18;

const LINE_SCALE: u32 = 2;
const LINE_X: u32 = 20;
const FIRST_LINE_Y: u32 = 80;
const LINE_STRIDE: u32 = 30;

pub const QR_SIZE: u32 = 150;
pub const QR_POS: (u32, u32) = (420, 150);

/// Compose the patient's identity card around an already-encoded QR image.
/// Returns the finished card as PNG bytes.
pub fn compose_identity_card(patient: &Patient, qr: &GrayImage) -> Result<Vec<u8>, QrError> {
    let mut card = RgbImage::from_pixel(CARD_WIDTH, CARD_HEIGHT, BODY_COLOR);

    for y in 0..HEADER_HEIGHT {
        for x in 0..CARD_WIDTH {
            card.put_pixel(x, y, HEADER_COLOR);
        }
    }
    let title_x = (CARD_WIDTH - font::text_width(TITLE, TITLE_SCALE)) / 2;
    font::draw_text(&mut card, TITLE, title_x, TITLE_Y, TITLE_SCALE, TITLE_COLOR);

    for (i, line) in profile_lines(patient).iter().enumerate() {
        let y = FIRST_LINE_Y + (i as u32) * LINE_STRIDE;
        font::draw_text(&mut card, line, LINE_X, y, LINE_SCALE, TEXT_COLOR);
    }

    let resized = image::imageops::resize(qr, QR_SIZE, QR_SIZE, FilterType::Nearest);
    for (x, y, pixel) in resized.enumerate_pixels() {
        let v = pixel.0[0];
        card.put_pixel(QR_POS.0 + x, QR_POS.1 + y, Rgb([v, v, v]));
    }

    let mut cursor = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(card)
        .write_to(&mut cursor, ImageOutputFormat::Png)
        .map_err(|e| QrError::Render(e.to_string()))?;

    debug!(patient_id = %patient.id, "Identity card composed");
    Ok(cursor.into_inner())
}

fn profile_lines(patient: &Patient) -> [String; 5] {
    [
        format!("Name: {}", patient.display_name()),
        format!("ID: {}", patient.card_token),
        format!("Email: {}", patient.email),
        format!(
            "Phone: {}",
            patient.phone.as_deref().unwrap_or("N/A")
        ),
        format!(
            "Date of Birth: {}",
            patient
                .date_of_birth
                .map(|d| d.to_string())
                .unwrap_or_else(|| "N/A".into())
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr::codec::encode_identifier;
    use crate::qr::decode_identifier;
    use chrono::NaiveDate;

    fn test_patient() -> Patient {
        let mut p = Patient::new(
            "ada@example.org".into(),
            "hash".into(),
            "Ada".into(),
            "Lovelace".into(),
        );
        p.phone = Some("+44 20 7946 0999".into());
        p.date_of_birth = NaiveDate::from_ymd_opt(1815, 12, 10);
        p
    }

    fn compose(patient: &Patient) -> RgbImage {
        let qr = encode_identifier(&patient.card_token).unwrap();
        let bytes = compose_identity_card(patient, &qr).unwrap();
        image::load_from_memory(&bytes).unwrap().to_rgb8()
    }

    #[test]
    fn card_has_fixed_dimensions_and_header_band() {
        let card = compose(&test_patient());
        assert_eq!(card.width(), CARD_WIDTH);
        assert_eq!(card.height(), CARD_HEIGHT);
        // Header color above the band edge, white body just below it
        assert_eq!(card.get_pixel(0, HEADER_HEIGHT - 1), &HEADER_COLOR);
        assert_eq!(card.get_pixel(0, HEADER_HEIGHT), &BODY_COLOR);
    }

    #[test]
    fn title_is_horizontally_centered_in_header() {
        let card = compose(&test_patient());
        let title_w = font::text_width(TITLE, TITLE_SCALE);
        let left = (CARD_WIDTH - title_w) / 2;
        // Title glyphs are the only white pixels inside the header band
        let white = Rgb([255u8, 255, 255]);
        let inked: Vec<u32> = (0..CARD_WIDTH)
            .filter(|&x| (0..HEADER_HEIGHT).any(|y| card.get_pixel(x, y) == &white))
            .collect();
        assert!(!inked.is_empty());
        assert!(*inked.first().unwrap() >= left);
        assert!(*inked.last().unwrap() < left + title_w);
    }

    #[test]
    fn missing_optional_fields_render_as_na() {
        let patient = Patient::new("x@y.z".into(), "h".into(), "No".into(), "Phone".into());
        let lines = profile_lines(&patient);
        assert_eq!(lines[3], "Phone: N/A");
        assert_eq!(lines[4], "Date of Birth: N/A");
    }

    #[test]
    fn profile_lines_carry_card_token() {
        let patient = test_patient();
        let lines = profile_lines(&patient);
        assert_eq!(lines[1], format!("ID: {}", patient.card_token));
        assert_eq!(lines[0], "Name: Ada Lovelace");
    }

    #[test]
    fn embedded_qr_region_decodes_back_to_card_token() {
        let patient = test_patient();
        let card = compose(&patient);
        let region =
            image::imageops::crop_imm(&card, QR_POS.0, QR_POS.1, QR_SIZE, QR_SIZE).to_image();
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(region)
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .unwrap();
        let decoded = decode_identifier(&cursor.into_inner()).unwrap();
        assert_eq!(decoded, patient.card_token);
    }

    #[test]
    fn whole_card_scan_finds_the_code() {
        let patient = test_patient();
        let card = compose(&patient);
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(card)
            .write_to(&mut cursor, ImageOutputFormat::Png)
            .unwrap();
        let decoded = decode_identifier(&cursor.into_inner()).unwrap();
        assert_eq!(decoded, patient.card_token);
    }
}
