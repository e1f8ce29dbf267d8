//! Required-role guard consumed by the API auth middleware.
//!
//! A guard is a plain value holding the allowed-role set; handlers never do
//! their own role dispatch.

use super::claims::{Identity, IdentityClaims};
use super::AuthError;
use crate::models::Role;

#[derive(Debug, Clone, Copy)]
pub struct RoleGuard {
    allowed: &'static [Role],
}

pub const PATIENT_ONLY: RoleGuard = RoleGuard::new(&[Role::Patient]);
pub const CLINICIAN_ONLY: RoleGuard = RoleGuard::new(&[Role::Clinician]);
pub const ANY_PRINCIPAL: RoleGuard = RoleGuard::new(&[Role::Patient, Role::Clinician]);

impl RoleGuard {
    pub const fn new(allowed: &'static [Role]) -> Self {
        Self { allowed }
    }

    /// Authorize an already-authenticated identity against the allowed set.
    ///
    /// Legacy opaque identities carry no role and are rejected: they remain
    /// valid credentials but cannot pass any role gate.
    pub fn authorize<'a>(&self, identity: &'a Identity) -> Result<&'a IdentityClaims, AuthError> {
        match identity {
            Identity::Claims(claims) if self.allowed.contains(&claims.role) => Ok(claims),
            _ => Err(AuthError::Forbidden {
                required: self.allowed,
            }),
        }
    }
}
