//! Shared types for the API layer.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::api::error::ApiError;
use crate::auth::TokenSigner;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    db: Arc<Mutex<Connection>>,
    pub signer: TokenSigner,
}

impl ApiContext {
    pub fn new(conn: Connection, signer: TokenSigner) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            signer,
        }
    }

    /// Lock the shared connection for one operation. The guard must not be
    /// held across an await point.
    pub fn lock_db(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::Internal("database lock poisoned".into()))
    }
}
