//! Sidebar lab tools. Each tool is a single templated prompt sent to Mistral.

use std::{fmt, str::FromStr};

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::error::{BotError, Result};
use crate::knowledge::{self, Intent, EMAIL_FACTS};
use crate::mistral::MistralClient;
use crate::prompts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    Classify,
    Extract,
    Email,
    Summarize,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::Classify, Tool::Extract, Tool::Email, Tool::Summarize];

    pub fn slug(self) -> &'static str {
        match self {
            Tool::Classify => "classify",
            Tool::Extract => "extract",
            Tool::Email => "email",
            Tool::Summarize => "summarize",
        }
    }

    /// Sample input shown in the tool's text area.
    pub fn default_input(self) -> &'static str {
        match self {
            Tool::Classify => "Does your card work in Germany?",
            Tool::Extract => "60 year old male smoker diagnosed with diabetes weight 210 lbs",
            Tool::Email => "What is your 30-year APR and how is it compared to 15-year?",
            Tool::Summarize => "Mistral partnered with Microsoft...",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Tool {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Tool::ALL
            .into_iter()
            .find(|tool| tool.slug() == s)
            .ok_or_else(|| format!("unknown tool: {}", s))
    }
}

/// Result of a JSON extraction: the raw model text plus a pretty-printed copy
/// when it parsed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub raw: String,
    pub pretty: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolOutcome {
    Category { label: Intent },
    Extraction(Extraction),
    Text { text: String },
    Failed { message: String },
}

/// Strips markdown code fences the model sometimes wraps JSON in.
pub fn clean_json(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Classifies an inquiry, surfacing a missing credential but absorbing any
/// other failure as customer service.
#[instrument(skip_all)]
pub async fn try_classify_intent(client: &MistralClient, inquiry: &str) -> Result<Intent> {
    if knowledge::is_small_talk(inquiry) {
        return Ok(Intent::CustomerService);
    }
    match client.complete(&prompts::classify_prompt(inquiry)).await {
        Ok(raw) => {
            let intent = knowledge::parse_category(&raw);
            info!(category = %intent, "Classified inquiry");
            Ok(intent)
        }
        Err(BotError::MissingApiKey) => Err(BotError::MissingApiKey),
        Err(e) => {
            warn!("Classification failed, defaulting to customer service: {}", e);
            Ok(Intent::CustomerService)
        }
    }
}

/// Never fails; anything that goes wrong lands in customer service.
pub async fn classify_intent(client: &MistralClient, inquiry: &str) -> Intent {
    try_classify_intent(client, inquiry)
        .await
        .unwrap_or(Intent::CustomerService)
}

#[instrument(skip_all)]
pub async fn extract_json(client: &MistralClient, notes: &str) -> Result<Extraction> {
    let raw = client
        .complete_json(&prompts::extraction_prompt(notes))
        .await?;
    let pretty = serde_json::from_str::<serde_json::Value>(&clean_json(&raw))
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok());
    if pretty.is_none() {
        warn!("Model returned invalid JSON");
    }
    Ok(Extraction { raw, pretty })
}

#[instrument(skip_all)]
pub async fn reply_email(client: &MistralClient, email: &str) -> Result<String> {
    client
        .complete(&prompts::email_prompt(EMAIL_FACTS, email))
        .await
}

#[instrument(skip_all)]
pub async fn summarize(client: &MistralClient, text: &str) -> Result<String> {
    client.complete(&prompts::summary_prompt(text)).await
}

/// Runs one tool and folds any error into [`ToolOutcome::Failed`].
pub async fn run_tool(client: &MistralClient, tool: Tool, input: &str) -> ToolOutcome {
    let outcome = match tool {
        Tool::Classify => try_classify_intent(client, input)
            .await
            .map(|label| ToolOutcome::Category { label }),
        Tool::Extract => extract_json(client, input)
            .await
            .map(ToolOutcome::Extraction),
        Tool::Email => reply_email(client, input)
            .await
            .map(|text| ToolOutcome::Text { text }),
        Tool::Summarize => summarize(client, input)
            .await
            .map(|text| ToolOutcome::Text { text }),
    };
    outcome.unwrap_or_else(|e| ToolOutcome::Failed {
        message: e.user_message(),
    })
}
