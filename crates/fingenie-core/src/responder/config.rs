//! Responder rule table configuration
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/fingenie/config/responder.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{SchemeEntry, TermEntry};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../../config/responder.toml");

fn default_monthly_baseline() -> u64 {
    2500
}

/// The full rule table as written in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ResponderConfig {
    /// Spending already recorded this month, added to form-logged expenses
    #[serde(default = "default_monthly_baseline")]
    pub monthly_baseline: u64,
    pub fallback: String,
    #[serde(default)]
    pub fallback_translations: HashMap<String, String>,
    #[serde(default)]
    pub terms: Vec<TermEntry>,
    pub expense: ExpenseConfig,
    #[serde(default)]
    pub topics: Vec<TopicConfig>,
    #[serde(default)]
    pub schemes: Vec<SchemeEntry>,
}

/// Expense-intent detection and reply templates
#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseConfig {
    /// Marker words, matched as case-insensitive substrings
    pub markers: Vec<String>,
    /// Reply for expenses typed into chat. Placeholders: {amount}, {category}
    pub confirmation: String,
    /// Reply for expenses logged through the form. Adds {total}
    pub form_confirmation: String,
}

/// Metadata attached to a topic answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicMetadata {
    Scheme,
    Alert,
}

/// A keyword set with its canned answer
#[derive(Debug, Clone, Deserialize)]
pub struct TopicConfig {
    pub name: String,
    pub keywords: Vec<String>,
    pub response: String,
    #[serde(default)]
    pub metadata: Option<TopicMetadata>,
    /// Catalog IDs, required when metadata = "scheme"
    #[serde(default)]
    pub suggested_schemes: Vec<String>,
    /// Required when metadata = "alert"
    #[serde(default)]
    pub alert_note: Option<String>,
}

impl ResponderConfig {
    /// Parse a config from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// The defaults compiled into the binary
    pub fn embedded() -> Result<Self> {
        Self::from_toml_str(DEFAULT_CONFIG)
    }

    /// Check the table for mistakes that would otherwise surface as silent misses
    pub fn validate(&self) -> Result<()> {
        if self.fallback.trim().is_empty() {
            return Err(Error::Config("fallback response is empty".into()));
        }

        let mut seen_terms = Vec::new();
        for entry in &self.terms {
            let key = entry.term.trim().to_lowercase();
            if key.is_empty() {
                return Err(Error::Config("term with empty key".into()));
            }
            if entry.aliases.iter().any(|a| a.trim().is_empty()) {
                return Err(Error::Config(format!("term '{}' has an empty alias", entry.term)));
            }
            if seen_terms.contains(&key) {
                return Err(Error::Config(format!("duplicate term '{}'", entry.term)));
            }
            seen_terms.push(key);
        }

        if self.expense.markers.is_empty() || self.expense.markers.iter().any(|m| m.trim().is_empty())
        {
            return Err(Error::Config("expense markers must be non-empty".into()));
        }

        let mut seen_schemes = Vec::new();
        for scheme in &self.schemes {
            if seen_schemes.contains(&scheme.id.as_str()) {
                return Err(Error::Config(format!("duplicate scheme id '{}'", scheme.id)));
            }
            seen_schemes.push(scheme.id.as_str());
        }

        for topic in &self.topics {
            if topic.keywords.is_empty() || topic.keywords.iter().any(|k| k.trim().is_empty()) {
                return Err(Error::Config(format!(
                    "topic '{}' needs non-empty keywords",
                    topic.name
                )));
            }
            match topic.metadata {
                Some(TopicMetadata::Scheme) => {
                    if topic.suggested_schemes.is_empty() {
                        return Err(Error::Config(format!(
                            "topic '{}' suggests schemes but lists none",
                            topic.name
                        )));
                    }
                    if let Some(missing) = topic
                        .suggested_schemes
                        .iter()
                        .find(|id| !seen_schemes.contains(&id.as_str()))
                    {
                        return Err(Error::Config(format!(
                            "topic '{}' suggests unknown scheme '{}'",
                            topic.name, missing
                        )));
                    }
                }
                Some(TopicMetadata::Alert) => {
                    if topic.alert_note.is_none() {
                        return Err(Error::Config(format!(
                            "topic '{}' raises an alert without alert_note",
                            topic.name
                        )));
                    }
                }
                None => {}
            }
        }

        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("fingenie").join("config").join("responder.toml"))
}

/// Load configuration (override first, then default)
pub fn load_config(override_path: Option<&Path>) -> Result<ResponderConfig> {
    let path = override_path
        .map(Path::to_path_buf)
        .or_else(default_config_path)
        .filter(|p| p.exists());

    match path {
        Some(path) => {
            debug!(path = %path.display(), "Loading responder config override");
            let content = fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
            ResponderConfig::from_toml_str(&content)
        }
        None => ResponderConfig::embedded(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_embedded_config_is_valid() {
        let config = ResponderConfig::embedded().unwrap();
        config.validate().unwrap();
        assert_eq!(config.monthly_baseline, 2500);
        assert!(config.terms.iter().any(|t| t.term == "FD"));
        assert!(config.terms.iter().any(|t| t.term == "loan" && t.sensitive));
    }

    #[test]
    fn test_embedded_topic_order() {
        let config = ResponderConfig::embedded().unwrap();
        let names: Vec<&str> = config.topics.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["tax", "investment", "schemes", "debt"]);
    }

    #[test]
    fn test_load_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
fallback = "custom fallback"

[expense]
markers = ["paid"]
confirmation = "ok {{amount}}"
form_confirmation = "ok {{amount}} {{total}}"
"#
        )
        .unwrap();

        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.fallback, "custom fallback");
        assert_eq!(config.expense.markers, vec!["paid"]);
        assert!(config.terms.is_empty());
        assert_eq!(config.monthly_baseline, 2500);
    }

    #[test]
    fn test_missing_override_uses_embedded() {
        let config = load_config(Some(Path::new("/nonexistent/responder.toml"))).unwrap();
        assert!(!config.terms.is_empty());
    }

    #[test]
    fn test_unknown_suggested_scheme_rejected() {
        let mut config = ResponderConfig::embedded().unwrap();
        config.topics[2].suggested_schemes.push("no-such-scheme".into());
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("no-such-scheme")));
    }

    #[test]
    fn test_duplicate_term_rejected() {
        let mut config = ResponderConfig::embedded().unwrap();
        let mut dup = config.terms[0].clone();
        dup.term = dup.term.to_lowercase();
        config.terms.push(dup);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_markers_rejected() {
        let mut config = ResponderConfig::embedded().unwrap();
        config.expense.markers.clear();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_malformed_toml_is_error() {
        assert!(matches!(
            ResponderConfig::from_toml_str("fallback = "),
            Err(Error::Toml(_))
        ));
    }
}
