pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod models;
pub mod qr;
pub mod records;

use tracing_subscriber::EnvFilter;

/// Initialize tracing. Call once from the binary.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}
