//! Credential issuance and validation for the two principal kinds.
//!
//! Stateless: any instance holding the signing key can validate a credential
//! independently; there is no server-side session store.

pub mod claims;
pub mod guard;
pub mod password;
pub mod token;

pub use claims::{Identity, IdentityClaims};
pub use guard::RoleGuard;
pub use token::TokenSigner;

use thiserror::Error;

use crate::models::Role;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Credential signature or format invalid")]
    InvalidToken,

    #[error("Credential expired")]
    Expired,

    #[error("Role not permitted, required one of {required:?}")]
    Forbidden { required: &'static [Role] },

    #[error("Password hashing failed: {0}")]
    Hash(String),
}
