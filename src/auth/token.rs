//! Signed, time-limited bearer credentials.
//!
//! Wire format: `base64url(payload_json) . base64url(hmac_sha256_tag)`, the
//! tag computed over the encoded payload. Long fixed lifetime, no refresh,
//! no revocation list.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::claims::{Identity, IdentityClaims};
use super::AuthError;
use crate::config::TOKEN_LIFETIME;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    /// Subject slot: single string holding the claims JSON (or a legacy
    /// opaque identity in tokens issued by older deployments).
    sub: String,
    iat: i64,
    exp: i64,
}

/// Issues and validates credentials. Cheap to clone; holding the key is the
/// only requirement to validate, so any number of instances work in parallel.
#[derive(Clone)]
pub struct TokenSigner {
    key: Vec<u8>,
}

impl TokenSigner {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }

    /// Generate a random ephemeral signing key. Tokens stop validating
    /// across restarts; development fallback only.
    pub fn ephemeral() -> Self {
        let key: [u8; 32] = rand::random();
        Self { key: key.to_vec() }
    }

    /// Issue a credential for the given claims, expiring a fixed duration
    /// from now.
    pub fn issue(&self, claims: &IdentityClaims) -> String {
        let iat = Utc::now().timestamp();
        let payload = TokenPayload {
            sub: claims.to_subject(),
            iat,
            exp: iat + TOKEN_LIFETIME.as_secs() as i64,
        };
        self.sign_payload(&payload)
    }

    fn sign_payload(&self, payload: &TokenPayload) -> String {
        // TokenPayload is a plain struct, serialization cannot fail
        let json = serde_json::to_vec(payload).unwrap_or_default();
        let encoded = URL_SAFE_NO_PAD.encode(&json);
        let tag = self.tag_for(encoded.as_bytes());
        format!("{encoded}.{}", URL_SAFE_NO_PAD.encode(tag))
    }

    fn tag_for(&self, data: &[u8]) -> [u8; 32] {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .expect("HMAC accepts keys of any length");
        mac.update(data);
        mac.finalize().into_bytes().into()
    }

    /// Verify signature and expiry, then recover the identity.
    ///
    /// Bad format, bad signature or expiry → error (Unauthorized at the API
    /// boundary). Subject deserialization never errors: non-claims subjects
    /// come back as [`Identity::Legacy`].
    pub fn validate(&self, token: &str) -> Result<Identity, AuthError> {
        let (encoded_payload, encoded_tag) =
            token.split_once('.').ok_or(AuthError::InvalidToken)?;

        let given_tag = URL_SAFE_NO_PAD
            .decode(encoded_tag)
            .map_err(|_| AuthError::InvalidToken)?;
        let expected_tag = self.tag_for(encoded_payload.as_bytes());
        let signature_ok: bool = expected_tag.ct_eq(given_tag.as_slice()).into();
        if !signature_ok {
            return Err(AuthError::InvalidToken);
        }

        let payload_json = URL_SAFE_NO_PAD
            .decode(encoded_payload)
            .map_err(|_| AuthError::InvalidToken)?;
        let payload: TokenPayload =
            serde_json::from_slice(&payload_json).map_err(|_| AuthError::InvalidToken)?;

        if Utc::now().timestamp() >= payload.exp {
            return Err(AuthError::Expired);
        }

        Ok(Identity::from_subject(&payload.sub))
    }

    /// Issue a token whose subject is a raw opaque string, as older
    /// deployments did. Exists to exercise the legacy validation branch.
    #[cfg(test)]
    pub fn issue_legacy(&self, subject: &str) -> String {
        let iat = Utc::now().timestamp();
        self.sign_payload(&TokenPayload {
            sub: subject.to_string(),
            iat,
            exp: iat + TOKEN_LIFETIME.as_secs() as i64,
        })
    }

    #[cfg(test)]
    fn issue_expired(&self, claims: &IdentityClaims) -> String {
        let iat = Utc::now().timestamp() - 120;
        self.sign_payload(&TokenPayload {
            sub: claims.to_subject(),
            iat,
            exp: iat + 60,
        })
    }
}
