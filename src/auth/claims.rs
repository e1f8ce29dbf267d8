//! Structured identity carried inside a credential's subject slot.
//!
//! The token format constrains the subject to a single string, but the system
//! needs several fields in it (principal id, role, human-readable tag), so the
//! subject holds the JSON serialization of [`IdentityClaims`]. Subjects that do
//! not parse as JSON are treated as legacy opaque identities, an explicit
//! backward-compatibility branch, never an error.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::Role;

/// Claims packed into the credential subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub principal_id: Uuid,
    pub role: Role,
    /// Human-readable tag for logs and support (email at issuance time).
    pub label: String,
}

impl IdentityClaims {
    pub fn new(principal_id: Uuid, role: Role, label: impl Into<String>) -> Self {
        Self {
            principal_id,
            role,
            label: label.into(),
        }
    }

    /// Serialize into the single-string subject slot.
    pub fn to_subject(&self) -> String {
        // IdentityClaims has no non-string map keys, serialization cannot fail
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Identity recovered from a validated credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// Structured claims (current token format).
    Claims(IdentityClaims),
    /// Raw opaque subject from a pre-structured token. Carries no role, so
    /// every role-gated operation rejects it with Forbidden.
    Legacy(String),
}

impl Identity {
    /// Parse a subject string. Never fails: subjects that are not valid
    /// claims JSON fall back to the legacy opaque form.
    pub fn from_subject(subject: &str) -> Self {
        match serde_json::from_str::<IdentityClaims>(subject) {
            Ok(claims) => Self::Claims(claims),
            Err(_) => Self::Legacy(subject.to_string()),
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Self::Claims(claims) => Some(claims.role),
            Self::Legacy(_) => None,
        }
    }
}
