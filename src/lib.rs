pub mod chat;
pub mod constants;
pub mod error;
pub mod knowledge;
pub mod mistral;
pub mod prompts;
pub mod secrets;
pub mod session;
pub mod tools;
pub mod web_server;

pub use error::{BotError, Result};
pub use mistral::{MistralClient, MistralSettings};
