//! Signup and login endpoints for both principal kinds.
//!
//! Duplicate email (and, for clinicians, duplicate license number) is
//! rejected with Conflict before any insert. The two email spaces are
//! independent: a patient and a clinician may share an address.

use axum::extract::State;
use axum::http::StatusCode;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::ApiError;
use crate::api::extract::Json;
use crate::api::types::ApiContext;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::IdentityClaims;
use crate::db;
use crate::models::{Clinician, Patient, Role};

#[derive(Deserialize)]
pub struct PatientSignup {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
}

#[derive(Deserialize)]
pub struct ClinicianSignup {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
    pub hospital: String,
    pub specialization: Option<String>,
    pub phone: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse<T: Serialize> {
    pub token: String,
    pub profile: T,
}

fn validate_credentials_shape(email: &str, password: &str) -> Result<(), ApiError> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(ApiError::Validation("A valid email is required".into()));
    }
    if password.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    Ok(())
}

fn require_field(value: &str, name: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{name} is required")));
    }
    Ok(())
}

/// `POST /api/auth/patient/signup`
pub async fn patient_signup(
    State(ctx): State<ApiContext>,
    Json(body): Json<PatientSignup>,
) -> Result<(StatusCode, Json<Patient>), ApiError> {
    validate_credentials_shape(&body.email, &body.password)?;
    require_field(&body.first_name, "first_name")?;
    require_field(&body.last_name, "last_name")?;

    let password_hash = hash_password(&body.password)?;
    let conn = ctx.lock_db()?;

    if db::find_patient_by_email(&conn, &body.email)?.is_some() {
        warn!(email = %body.email, "Duplicate patient signup");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let mut patient = Patient::new(
        body.email,
        password_hash,
        body.first_name,
        body.last_name,
    );
    patient.phone = body.phone;
    patient.date_of_birth = body.date_of_birth;
    patient.gender = body.gender;
    patient.address = body.address;
    db::insert_patient(&conn, &patient)?;

    info!(patient_id = %patient.id, "Patient registered");
    Ok((StatusCode::CREATED, Json(patient)))
}

/// `POST /api/auth/patient/login`
pub async fn patient_login(
    State(ctx): State<ApiContext>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse<Patient>>, ApiError> {
    let patient = {
        let conn = ctx.lock_db()?;
        db::find_patient_by_email(&conn, &body.email)?
    };
    let patient = match patient {
        Some(p) if verify_password(&p.password_hash, &body.password) => p,
        _ => {
            warn!(email = %body.email, "Patient login failed");
            return Err(ApiError::Unauthorized);
        }
    };

    let claims = IdentityClaims::new(patient.id, Role::Patient, &patient.email);
    let token = ctx.signer.issue(&claims);
    info!(patient_id = %patient.id, "Patient logged in");
    Ok(Json(LoginResponse {
        token,
        profile: patient,
    }))
}

/// `POST /api/auth/clinician/signup`
pub async fn clinician_signup(
    State(ctx): State<ApiContext>,
    Json(body): Json<ClinicianSignup>,
) -> Result<(StatusCode, Json<Clinician>), ApiError> {
    validate_credentials_shape(&body.email, &body.password)?;
    require_field(&body.first_name, "first_name")?;
    require_field(&body.last_name, "last_name")?;
    require_field(&body.license_number, "license_number")?;
    require_field(&body.hospital, "hospital")?;

    let password_hash = hash_password(&body.password)?;
    let conn = ctx.lock_db()?;

    if db::find_clinician_by_email(&conn, &body.email)?.is_some() {
        warn!(email = %body.email, "Duplicate clinician signup");
        return Err(ApiError::Conflict("Email already registered".into()));
    }
    if db::find_clinician_by_license(&conn, &body.license_number)?.is_some() {
        warn!(license = %body.license_number, "Duplicate license number");
        return Err(ApiError::Conflict("License number already registered".into()));
    }

    let mut clinician = Clinician::new(
        body.email,
        password_hash,
        body.first_name,
        body.last_name,
        body.license_number,
        body.hospital,
    );
    clinician.specialization = body.specialization;
    clinician.phone = body.phone;
    db::insert_clinician(&conn, &clinician)?;

    info!(clinician_id = %clinician.id, "Clinician registered");
    Ok((StatusCode::CREATED, Json(clinician)))
}

/// `POST /api/auth/clinician/login`
pub async fn clinician_login(
    State(ctx): State<ApiContext>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse<Clinician>>, ApiError> {
    let clinician = {
        let conn = ctx.lock_db()?;
        db::find_clinician_by_email(&conn, &body.email)?
    };
    let clinician = match clinician {
        Some(c) if verify_password(&c.password_hash, &body.password) => c,
        _ => {
            warn!(email = %body.email, "Clinician login failed");
            return Err(ApiError::Unauthorized);
        }
    };

    let claims = IdentityClaims::new(clinician.id, Role::Clinician, &clinician.email);
    let token = ctx.signer.issue(&claims);
    info!(clinician_id = %clinician.id, "Clinician logged in");
    Ok(Json(LoginResponse {
        token,
        profile: clinician,
    }))
}
