//! Static knowledge base for the bank support bot and helpers for mapping model
//! output back onto a known intent.

use std::{fmt, str::FromStr};

use serde::Serialize;

/// Inquiry categories the classifier may answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "&'static str")]
pub enum Intent {
    CardArrival,
    ChangePin,
    ExchangeRate,
    CountrySupport,
    CancelTransfer,
    ChargeDispute,
    CustomerService,
}

impl Intent {
    pub const ALL: [Intent; 7] = [
        Intent::CardArrival,
        Intent::ChangePin,
        Intent::ExchangeRate,
        Intent::CountrySupport,
        Intent::CancelTransfer,
        Intent::ChargeDispute,
        Intent::CustomerService,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Intent::CardArrival => "card arrival",
            Intent::ChangePin => "change pin",
            Intent::ExchangeRate => "exchange rate",
            Intent::CountrySupport => "country support",
            Intent::CancelTransfer => "cancel transfer",
            Intent::ChargeDispute => "charge dispute",
            Intent::CustomerService => "customer service",
        }
    }

    /// Knowledge-base guidance injected into the answer prompt.
    pub fn guidance(self) -> &'static str {
        match self {
            Intent::CardArrival => {
                "Track delivery in Cards > Track delivery. Request replacement if overdue."
            }
            Intent::ChangePin => "Go to Cards > Manage card > Change PIN.",
            Intent::ExchangeRate => {
                "Exchange rate depends on network rate plus bank fee. Tell me the currencies."
            }
            Intent::CountrySupport => "Most countries are supported. Tell me your destination.",
            Intent::CancelTransfer => "If pending, cancel in Transfers > Activity.",
            Intent::ChargeDispute => {
                "Open transaction > Dispute charge. Provide date, merchant, and reason."
            }
            Intent::CustomerService => "Tell me your issue and I will guide you.",
        }
    }
}

impl From<Intent> for &'static str {
    fn from(intent: Intent) -> Self {
        intent.label()
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_text(s);
        Intent::ALL
            .into_iter()
            .find(|intent| intent.label() == wanted)
            .ok_or_else(|| format!("unknown category: {}", s))
    }
}

pub const EMAIL_FACTS: &str = "
30-year fixed-rate: interest rate 6.403%, APR 6.484%
15-year fixed-rate: interest rate 5.705%, APR 5.848%
";

pub const GREETINGS: [&str; 7] = [
    "hi",
    "hello",
    "hey",
    "yo",
    "good morning",
    "good afternoon",
    "good evening",
];

/// Trim, lowercase, and collapse whitespace runs into single spaces.
pub fn normalize_text(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Maps raw classifier output onto an intent: exact label first, then the first
/// label mentioned anywhere, else customer service.
pub fn parse_category(raw: &str) -> Intent {
    let normalized = normalize_text(raw);

    if let Ok(intent) = normalized.parse::<Intent>() {
        return intent;
    }

    Intent::ALL
        .into_iter()
        .find(|intent| normalized.contains(intent.label()))
        .unwrap_or(Intent::CustomerService)
}

/// Greetings and one- or two-word messages skip classification.
pub fn is_small_talk(text: &str) -> bool {
    let normalized = normalize_text(text);
    normalized.split(' ').filter(|w| !w.is_empty()).count() <= 2
        || GREETINGS.contains(&normalized.as_str())
}
