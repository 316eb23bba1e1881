use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised while talking to the Mistral API or loading its credential.
#[derive(Error, Debug)]
pub enum BotError {
    #[error(
        "Missing API key.\n\n\
         Add it in one of these ways:\n\
         1) Create secrets.toml with: MISTRAL_API_KEY = \"your_key\"\n\
         2) Set environment variable MISTRAL_API_KEY"
    )]
    MissingApiKey,

    #[error("Failed to reach the Mistral API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Mistral API request failed with status {status}: {body}")]
    Api { status: StatusCode, body: String },

    #[error("Mistral API returned no message content")]
    EmptyResponse,

    #[error("Failed to decode Mistral API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to read secrets file {path}: {reason}")]
    SecretsFile { path: String, reason: String },
}

pub type Result<T> = std::result::Result<T, BotError>;

impl BotError {
    /// Short, user-facing text for the chat and tool panels.
    pub fn user_message(&self) -> String {
        match self {
            BotError::MissingApiKey => self.to_string(),
            BotError::Api { status, .. } => format!("The model request failed ({}).", status),
            _ => format!("The model request failed: {}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_message_explains_both_sources() {
        let msg = BotError::MissingApiKey.to_string();
        assert!(msg.contains("secrets.toml"));
        assert!(msg.contains("MISTRAL_API_KEY"));
    }

    #[test]
    fn api_error_user_message_hides_body() {
        let err = BotError::Api {
            status: StatusCode::UNAUTHORIZED,
            body: "{\"detail\":\"bad key\"}".to_string(),
        };
        let msg = err.user_message();
        assert!(msg.contains("401"));
        assert!(!msg.contains("bad key"));
    }
}
