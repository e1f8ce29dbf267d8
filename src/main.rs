use std::env;

use tracing::{info, warn};

use caretag::api::api_router;
use caretag::auth::TokenSigner;
use caretag::{config, db, init_tracing};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    std::fs::create_dir_all(config::app_data_dir())?;
    let conn = db::open_database(&config::database_path())?;

    let signer = match env::var(config::TOKEN_SECRET_ENV) {
        Ok(secret) if !secret.is_empty() => TokenSigner::new(secret.into_bytes()),
        _ => {
            warn!(
                "{} unset, using an ephemeral signing key; tokens will not \
                 survive a restart",
                config::TOKEN_SECRET_ENV
            );
            TokenSigner::ephemeral()
        }
    };

    let app = api_router(conn, signer);
    let listener = tokio::net::TcpListener::bind(config::BIND_ADDR).await?;
    info!(addr = config::BIND_ADDR, "API server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
