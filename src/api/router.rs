//! API router.
//!
//! Returns a composable `Router` nested under `/api/`. Three route groups:
//! open auth routes, clinician routes behind the clinician guard, and patient
//! routes behind the patient guard.
//!
//! Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
//! Endpoint handlers use `State<ApiContext>` (provided via `with_state`).

use axum::routing::{get, post};
use axum::Router;
use rusqlite::Connection;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::auth::TokenSigner;

/// Build the API router over an open database connection.
pub fn api_router(conn: Connection, signer: TokenSigner) -> Router {
    build_router(ApiContext::new(conn, signer))
}

fn build_router(ctx: ApiContext) -> Router {
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let open = Router::new()
        .route("/auth/patient/signup", post(endpoints::auth::patient_signup))
        .route("/auth/patient/login", post(endpoints::auth::patient_login))
        .route(
            "/auth/clinician/signup",
            post(endpoints::auth::clinician_signup),
        )
        .route(
            "/auth/clinician/login",
            post(endpoints::auth::clinician_login),
        )
        .with_state(ctx.clone());

    let clinician = Router::new()
        .route("/entries", post(endpoints::clinician::create_entry))
        .route(
            "/entries/:id/amend",
            post(endpoints::clinician::amend_entry),
        )
        .route(
            "/entries/:id/history",
            get(endpoints::clinician::entry_history),
        )
        .route("/patients/query", post(endpoints::clinician::query_patient))
        .route("/scan", post(endpoints::clinician::scan_card))
        .route("/profile", get(endpoints::clinician::profile))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(
            middleware::auth::require_clinician,
        ));

    let patient = Router::new()
        .route("/history", get(endpoints::patient::history))
        .route("/card", get(endpoints::patient::card))
        .route("/profile", get(endpoints::patient::profile))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::auth::require_patient));

    Router::new()
        .nest("/api", open)
        .nest("/api/clinician", clinician)
        .nest("/api/patient", patient)
        // Extension must be outermost so the auth middleware can read it
        .layer(axum::Extension(ctx))
}
