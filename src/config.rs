use std::path::PathBuf;
use std::time::Duration;

/// Application-level constants
pub const APP_NAME: &str = "CareTag";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset
pub fn default_log_filter() -> String {
    "info,caretag=debug".to_string()
}

/// Credential lifetime: long-lived, no refresh mechanism.
pub const TOKEN_LIFETIME: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Environment variable holding the credential signing secret.
/// When unset the server generates an ephemeral key and logs a warning
/// (tokens stop validating across restarts).
pub const TOKEN_SECRET_ENV: &str = "CARETAG_TOKEN_SECRET";

/// Address the API server binds to.
pub const BIND_ADDR: &str = "0.0.0.0:5000";

/// Get the application data directory
/// ~/CareTag/ on all platforms (user-visible)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("CareTag")
}

/// Path of the SQLite database file
pub fn database_path() -> PathBuf {
    app_data_dir().join("caretag.db")
}
