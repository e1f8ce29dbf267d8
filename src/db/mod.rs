pub mod repository;
pub mod sqlite;

pub use repository::*;
pub use sqlite::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Invalid stored timestamp: {value}")]
    InvalidTimestamp { value: String },

    #[error("Invalid stored identifier: {value}")]
    InvalidUuid { value: String },

    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
