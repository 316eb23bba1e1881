// Defaults for the Mistral endpoint and local paths, overridable from the environment.

use std::env;

// Use lazy_static to initialize static variables safely.
lazy_static::lazy_static! {
    pub static ref MISTRAL_API_BASE: String = env::var("MISTRAL_API_BASE").unwrap_or_else(|_| "https://api.mistral.ai".to_string());
    pub static ref MISTRAL_MODEL: String = env::var("MISTRAL_MODEL").unwrap_or_else(|_| "mistral-small-latest".to_string());
    pub static ref SECRETS_FILE: String = env::var("SUPPORTBOT_SECRETS").unwrap_or_else(|_| "secrets.toml".to_string());
    pub static ref SESSION_IDLE_SECS: u64 = env::var("SUPPORTBOT_SESSION_IDLE_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(3600);
    pub static ref ASSETS_DIR: String = env::var("SUPPORTBOT_ASSETS").unwrap_or_else(|_| ".".to_string()); // Holds templates/ and static/
}

/// Name of the credential key, both in the secrets file and the environment.
pub const API_KEY_VAR: &str = "MISTRAL_API_KEY";
