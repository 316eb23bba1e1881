use std::{fmt, fs, io, path::Path};

use serde::Deserialize;
use tracing::{debug, warn};

use crate::constants::API_KEY_VAR;
use crate::error::{BotError, Result};

/// Bearer credential for the Mistral API. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Trims the raw value; an empty key is no key.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub(crate) fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Deserialize)]
struct SecretsFile {
    #[serde(rename = "MISTRAL_API_KEY")]
    mistral_api_key: Option<String>,
}

/// Reads `MISTRAL_API_KEY` from a TOML secrets file. A missing file is not an error.
pub fn read_secrets_file(path: &Path) -> Result<Option<ApiKey>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(BotError::SecretsFile {
                path: path.display().to_string(),
                reason: e.to_string(),
            })
        }
    };
    let parsed: SecretsFile = toml::from_str(&content).map_err(|e| BotError::SecretsFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    Ok(parsed.mistral_api_key.and_then(ApiKey::new))
}

/// Secrets file first, then the environment value.
pub fn resolve_api_key(secrets_path: &Path, env_value: Option<String>) -> Option<ApiKey> {
    match read_secrets_file(secrets_path) {
        Ok(Some(key)) => {
            debug!(path = %secrets_path.display(), "Using API key from secrets file");
            return Some(key);
        }
        Ok(None) => {}
        Err(e) => warn!("{}", e),
    }
    let key = env_value.and_then(ApiKey::new);
    if key.is_some() {
        debug!("Using API key from {}", API_KEY_VAR);
    }
    key
}

/// Resolves the credential against the process environment.
pub fn load_api_key(secrets_path: &Path) -> Option<ApiKey> {
    resolve_api_key(secrets_path, std::env::var(API_KEY_VAR).ok())
}
