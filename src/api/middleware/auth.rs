//! Bearer credential middleware.
//!
//! Extracts `Authorization: Bearer <token>`, validates the signature and
//! expiry, checks the recovered identity against a role guard, and injects
//! `IdentityClaims` into request extensions for downstream handlers.
//!
//! Legacy opaque-subject tokens pass validation but carry no role, so every
//! guard rejects them with Forbidden.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::guard::{self, RoleGuard};

/// Require a valid patient credential.
pub async fn require_patient(req: Request<axum::body::Body>, next: Next) -> Response {
    require_role(guard::PATIENT_ONLY, req, next).await
}

/// Require a valid clinician credential.
pub async fn require_clinician(req: Request<axum::body::Body>, next: Next) -> Response {
    require_role(guard::CLINICIAN_ONLY, req, next).await
}

async fn require_role(
    guard: RoleGuard,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    match require_role_inner(guard, req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_role_inner(
    guard: RoleGuard,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let identity = ctx.signer.validate(token).map_err(|err| {
        tracing::warn!(error = %err, "Credential rejected");
        ApiError::from(err)
    })?;
    let claims = guard.authorize(&identity)?.clone();

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
