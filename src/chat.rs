// Chat transcript and the answer pipeline shared by the web UI and the terminal chat.

use anyhow::Result as AnyResult;
use chrono::Local;
use serde::Serialize;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, instrument, warn};

use crate::error::{BotError, Result};
use crate::knowledge::Intent;
use crate::mistral::MistralClient;
use crate::{prompts, tools};

pub const EXAMPLE_QUESTIONS: [&str; 6] = [
    "My card didn't arrive. What should I do?",
    "I want to change my PIN.",
    "Does your card work in Germany?",
    "I need to cancel a transfer I just made.",
    "I was charged twice by a merchant.",
    "What exchange rate will I get for EUR to QAR?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
    pub category: Option<Intent>,
    pub timestamp: String,
}

impl ChatTurn {
    fn new(role: Role, text: String, category: Option<Intent>) -> Self {
        Self {
            role,
            text,
            category,
            timestamp: Local::now().format("%H:%M:%S").to_string(),
        }
    }
}

/// Ordered, append-only list of turns for one session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the user's inquiry followed by the assistant's reply.
    pub fn push_exchange(&mut self, inquiry: &str, reply: &Reply) {
        self.turns
            .push(ChatTurn::new(Role::User, inquiry.to_string(), None));
        self.turns.push(ChatTurn::new(
            Role::Assistant,
            reply.text.clone(),
            Some(reply.category),
        ));
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub category: Intent,
    pub text: String,
}

/// Classifies the inquiry, grounds the prompt in the matching guidance and asks
/// the model. A failed call answers with the guidance itself; a missing key is
/// an error.
#[instrument(skip_all)]
pub async fn answer(client: &MistralClient, inquiry: &str) -> Result<Reply> {
    if !client.is_configured() {
        return Err(BotError::MissingApiKey);
    }
    let inquiry = inquiry.trim();
    let category = tools::try_classify_intent(client, inquiry).await?;
    let guidance = category.guidance();

    let text = match client
        .complete(&prompts::answer_prompt(guidance, inquiry))
        .await
    {
        Ok(text) => text.trim().to_string(),
        Err(BotError::MissingApiKey) => return Err(BotError::MissingApiKey),
        Err(e) => {
            warn!("Answer request failed, replying with guidance: {}", e);
            guidance.to_string()
        }
    };

    info!(category = %category, "Answered inquiry");
    Ok(Reply { category, text })
}

/// Interactive chat on stdin/stdout. `/clear` resets, `/quit` or EOF exits.
pub async fn run_terminal_chat(client: &MistralClient) -> AnyResult<Transcript> {
    info!("Starting terminal chat...");
    let mut transcript = Transcript::new();
    let mut stdout = io::stdout();
    let mut lines = BufReader::new(io::stdin()).lines();

    stdout
        .write_all(b"Customer Support Chatbot. Type /clear to reset, /quit to exit.\n")
        .await?;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        match message {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                transcript.clear();
                stdout.write_all(b"(cleared)\n").await?;
                continue;
            }
            _ => {}
        }

        match answer(client, message).await {
            Ok(reply) => {
                let out = format!("[Category: {}]\n{}\n", reply.category, reply.text);
                stdout.write_all(out.as_bytes()).await?;
                transcript.push_exchange(message, &reply);
            }
            Err(e) => {
                stdout
                    .write_all(format!("Error: {}\n", e.user_message()).as_bytes())
                    .await?;
            }
        }
    }

    info!(turns = transcript.len(), "Terminal chat finished");
    Ok(transcript)
}
