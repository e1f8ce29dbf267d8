//! Identifier codec and identity card rendering.
//!
//! `codec` turns a patient identifier into a scannable QR image and recovers
//! it from real-world photographs through a staged fallback chain. `card`
//! composes the fixed-layout printable identity card around the QR.

pub mod card;
pub mod codec;
pub mod font;

pub use card::compose_identity_card;
pub use codec::{decode_identifier, encode_identifier, DecodePipeline};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QrError {
    #[error("QR encoding failed: {0}")]
    Encode(String),

    #[error("Image could not be read: {0}")]
    InvalidImage(String),

    #[error("No QR code could be decoded from the image")]
    Undecodable,

    #[error("Image rendering failed: {0}")]
    Render(String),
}
