//! Domain models for FinGenie

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::str::FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            // Older front-ends called the assistant "bot"
            "assistant" | "bot" => Ok(Self::Assistant),
            _ => Err(format!("Unknown sender: {}", s)),
        }
    }
}

impl std::fmt::Display for Sender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single chat message. Immutable once appended to a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

impl Message {
    pub fn new(
        id: impl Into<String>,
        sender: Sender,
        content: impl Into<String>,
        metadata: Option<ResponseMetadata>,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            sender,
            timestamp: Utc::now(),
            metadata,
        }
    }
}

/// Expense categories offered by the expense form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Food,
    Travel,
    Utilities,
    Healthcare,
    Education,
    Entertainment,
    Other,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Travel => "Travel",
            Self::Utilities => "Utilities",
            Self::Healthcare => "Healthcare",
            Self::Education => "Education",
            Self::Entertainment => "Entertainment",
            Self::Other => "Other",
        }
    }

    /// All categories, in the order they are scanned during extraction
    pub fn all() -> &'static [ExpenseCategory] {
        &[
            Self::Food,
            Self::Travel,
            Self::Utilities,
            Self::Healthcare,
            Self::Education,
            Self::Entertainment,
            Self::Other,
        ]
    }
}

impl std::str::FromStr for ExpenseCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "food" => Ok(Self::Food),
            "travel" => Ok(Self::Travel),
            "utilities" => Ok(Self::Utilities),
            "healthcare" => Ok(Self::Healthcare),
            "education" => Ok(Self::Education),
            "entertainment" => Ok(Self::Entertainment),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown expense category: {}", s)),
        }
    }
}

impl std::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An expense pulled out of a chat message or submitted through the form.
/// `amount` is whole rupees and always > 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub amount: u64,
    pub category: ExpenseCategory,
    pub description: String,
}

/// Scheme IDs suggested alongside a canned answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeSuggestion {
    pub names: Vec<String>,
}

/// Caution attached to answers about borrowing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertNotice {
    pub term: String,
    pub note: String,
}

/// Structured data rendered next to an assistant reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum ResponseMetadata {
    Expense(ExpenseRecord),
    Scheme(SchemeSuggestion),
    Alert(AlertNotice),
}

impl ResponseMetadata {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Expense(_) => "expense",
            Self::Scheme(_) => "scheme",
            Self::Alert(_) => "alert",
        }
    }
}

/// Output of the response resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedResponse {
    pub response_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

impl ResolvedResponse {
    pub fn text(response_text: impl Into<String>) -> Self {
        Self {
            response_text: response_text.into(),
            metadata: None,
        }
    }

    pub fn with_metadata(response_text: impl Into<String>, metadata: ResponseMetadata) -> Self {
        Self {
            response_text: response_text.into(),
            metadata: Some(metadata),
        }
    }
}

/// A financial term and its explanation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermEntry {
    pub term: String,
    /// Other spellings matched the same way as `term`
    #[serde(default)]
    pub aliases: Vec<String>,
    pub explanation: String,
    /// Explanations keyed by language code ("hi", "ta", ...)
    #[serde(default)]
    pub translations: HashMap<String, String>,
    /// Answers about sensitive terms carry an alert
    #[serde(default)]
    pub sensitive: bool,
    #[serde(default)]
    pub alert_note: Option<String>,
}

impl TermEntry {
    /// Explanation in the given language, falling back to English
    pub fn explanation_in(&self, language: Language) -> &str {
        self.translations
            .get(language.code())
            .map(String::as_str)
            .unwrap_or(&self.explanation)
    }
}

/// Beneficiary groups from the scheme lookup dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemeGroup {
    #[serde(rename = "women")]
    Women,
    #[serde(rename = "pwd")]
    Pwd,
    #[serde(rename = "sc-st")]
    ScSt,
    #[serde(rename = "minority")]
    Minority,
    #[serde(rename = "farmer")]
    Farmer,
    #[serde(rename = "senior")]
    Senior,
}

impl SchemeGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Women => "women",
            Self::Pwd => "pwd",
            Self::ScSt => "sc-st",
            Self::Minority => "minority",
            Self::Farmer => "farmer",
            Self::Senior => "senior",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Women => "Women Schemes",
            Self::Pwd => "PWD Schemes",
            Self::ScSt => "SC/ST Schemes",
            Self::Minority => "Minority Schemes",
            Self::Farmer => "Farmer Schemes",
            Self::Senior => "Senior Citizen Schemes",
        }
    }

    pub fn all() -> &'static [SchemeGroup] {
        &[
            Self::Women,
            Self::Pwd,
            Self::ScSt,
            Self::Minority,
            Self::Farmer,
            Self::Senior,
        ]
    }
}

impl std::str::FromStr for SchemeGroup {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "women" => Ok(Self::Women),
            "pwd" => Ok(Self::Pwd),
            "sc-st" | "sc/st" | "scst" => Ok(Self::ScSt),
            "minority" => Ok(Self::Minority),
            "farmer" | "farmers" => Ok(Self::Farmer),
            "senior" | "senior-citizen" => Ok(Self::Senior),
            _ => Err(format!("Unknown scheme group: {}", s)),
        }
    }
}

impl std::fmt::Display for SchemeGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A government scheme in the static catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeEntry {
    pub id: String,
    pub name: String,
    pub group: SchemeGroup,
    pub summary: String,
}

/// Languages offered in the language dropdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Hindi,
    Tamil,
    Bengali,
    Marathi,
}

impl Language {
    /// ISO 639-1 code, used as the translation key
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Tamil => "ta",
            Self::Bengali => "bn",
            Self::Marathi => "mr",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Tamil => "Tamil",
            Self::Bengali => "Bengali",
            Self::Marathi => "Marathi",
        }
    }

    pub fn all() -> &'static [Language] {
        &[
            Self::English,
            Self::Hindi,
            Self::Tamil,
            Self::Bengali,
            Self::Marathi,
        ]
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|l| l.code() == lower || l.label().to_lowercase() == lower)
            .ok_or_else(|| format!("Unknown language: {}", s))
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}
