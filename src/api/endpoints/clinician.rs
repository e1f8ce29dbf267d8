//! Clinician-facing endpoints: entry creation, amendment, patient lookup,
//! and QR card scanning.

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Extension;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::error::ApiError;
use crate::api::extract::Json;
use crate::api::types::ApiContext;
use crate::auth::IdentityClaims;
use crate::db;
use crate::models::{Amendment, Clinician, EntryPatch, MedicalEntry, Patient};
use crate::qr;
use crate::records::{self, NewEntry};

#[derive(Deserialize)]
pub struct CreateEntryRequest {
    pub card_token: String,
    #[serde(flatten)]
    pub fields: NewEntry,
}

/// `POST /api/clinician/entries` — create an entry for the patient named by
/// their card token.
pub async fn create_entry(
    State(ctx): State<ApiContext>,
    Extension(claims): Extension<IdentityClaims>,
    Json(body): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<MedicalEntry>), ApiError> {
    let conn = ctx.lock_db()?;
    let entry = records::create_entry(&conn, &claims.principal_id, &body.card_token, body.fields)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[derive(Deserialize)]
pub struct AmendRequest {
    pub test_type: Option<String>,
    pub test_results: Option<Option<String>>,
    pub diagnosis: Option<Option<String>>,
    pub prescription: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub reason: Option<String>,
}

#[derive(Serialize)]
pub struct AmendResponse {
    pub entry: MedicalEntry,
    pub amendment: Amendment,
}

/// `POST /api/clinician/entries/:id/amend` — partial amend with a ledger
/// append, atomically.
pub async fn amend_entry(
    State(ctx): State<ApiContext>,
    Extension(claims): Extension<IdentityClaims>,
    axum::extract::Path(entry_id): axum::extract::Path<uuid::Uuid>,
    Json(body): Json<AmendRequest>,
) -> Result<Json<AmendResponse>, ApiError> {
    let patch = EntryPatch {
        test_type: body.test_type,
        test_results: body.test_results,
        diagnosis: body.diagnosis,
        prescription: body.prescription,
        notes: body.notes,
    };

    let mut conn = ctx.lock_db()?;
    let (entry, amendment) = records::amend_entry(
        &mut conn,
        &claims.principal_id,
        &entry_id,
        &patch,
        body.reason,
    )?;
    Ok(Json(AmendResponse { entry, amendment }))
}

/// `GET /api/clinician/entries/:id/history` — the entry's full amendment
/// ledger, oldest first.
pub async fn entry_history(
    State(ctx): State<ApiContext>,
    axum::extract::Path(entry_id): axum::extract::Path<uuid::Uuid>,
) -> Result<Json<Vec<Amendment>>, ApiError> {
    let conn = ctx.lock_db()?;
    Ok(Json(records::entry_history(&conn, &entry_id)?))
}

#[derive(Deserialize)]
pub struct PatientQuery {
    pub card_token: String,
}

/// `POST /api/clinician/patients/query` — resolve a scanned card token to a
/// patient profile.
pub async fn query_patient(
    State(ctx): State<ApiContext>,
    Json(body): Json<PatientQuery>,
) -> Result<Json<Patient>, ApiError> {
    let conn = ctx.lock_db()?;
    db::find_patient_by_card_token(&conn, &body.card_token)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("No patient matches that card".into()))
}

#[derive(Serialize)]
pub struct ScanResponse {
    pub card_token: String,
}

/// `POST /api/clinician/scan` — decode a card token from an uploaded photo.
///
/// The decode chain is CPU-bound pixel work, so it runs on the blocking pool
/// rather than the async executor.
pub async fn scan_card(
    Extension(claims): Extension<IdentityClaims>,
    mut multipart: Multipart,
) -> Result<Json<ScanResponse>, ApiError> {
    let mut image_bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.to_string()))?
    {
        if field.name() == Some("image") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(e.to_string()))?;
            image_bytes = Some(bytes);
            break;
        }
    }
    let bytes = image_bytes
        .ok_or_else(|| ApiError::Validation("Multipart field 'image' is required".into()))?;

    let card_token = tokio::task::spawn_blocking(move || qr::decode_identifier(&bytes))
        .await
        .map_err(|_| ApiError::Unavailable)??;

    info!(clinician_id = %claims.principal_id, "Card scanned");
    Ok(Json(ScanResponse { card_token }))
}

/// `GET /api/clinician/profile`
pub async fn profile(
    State(ctx): State<ApiContext>,
    Extension(claims): Extension<IdentityClaims>,
) -> Result<Json<Clinician>, ApiError> {
    let conn = ctx.lock_db()?;
    db::get_clinician(&conn, &claims.principal_id)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Clinician profile not found".into()))
}
