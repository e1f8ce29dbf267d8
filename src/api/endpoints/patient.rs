//! Patient-facing endpoints: record history, identity card download, and
//! profile.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use tracing::info;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::auth::IdentityClaims;
use crate::db;
use crate::models::{HistoryFilter, MedicalEntry, Patient};
use crate::qr;
use crate::records;

/// `GET /api/patient/history` — the caller's entries, filtered and ordered
/// per query parameters (default: entry date, newest first).
pub async fn history(
    State(ctx): State<ApiContext>,
    Extension(claims): Extension<IdentityClaims>,
    Query(filter): Query<HistoryFilter>,
) -> Result<Json<Vec<MedicalEntry>>, ApiError> {
    let conn = ctx.lock_db()?;
    Ok(Json(records::patient_history(
        &conn,
        &claims.principal_id,
        &filter,
    )?))
}

/// `GET /api/patient/card` — the caller's printable identity card as PNG.
///
/// Rendering is pixel work, so it runs on the blocking pool.
pub async fn card(
    State(ctx): State<ApiContext>,
    Extension(claims): Extension<IdentityClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let patient = {
        let conn = ctx.lock_db()?;
        db::get_patient(&conn, &claims.principal_id)?
            .ok_or_else(|| ApiError::NotFound("Patient profile not found".into()))?
    };

    let png = tokio::task::spawn_blocking(move || {
        let qr_image = qr::encode_identifier(&patient.card_token)?;
        qr::compose_identity_card(&patient, &qr_image)
    })
    .await
    .map_err(|_| ApiError::Unavailable)??;

    info!(patient_id = %claims.principal_id, "Identity card rendered");
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}

/// `GET /api/patient/profile`
pub async fn profile(
    State(ctx): State<ApiContext>,
    Extension(claims): Extension<IdentityClaims>,
) -> Result<Json<Patient>, ApiError> {
    let conn = ctx.lock_db()?;
    db::get_patient(&conn, &claims.principal_id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Patient profile not found".into()))
}
