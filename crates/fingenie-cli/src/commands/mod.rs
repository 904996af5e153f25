//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `ask` - One-off questions (resolver or LLM)
//! - `catalog` - Terms, schemes and resolver rules
//! - `chat` - Interactive terminal session
//! - `llm` - LLM backend check
//! - `serve` - Web server command

pub mod ask;
pub mod catalog;
pub mod chat;
pub mod llm;
pub mod serve;

// Re-export command functions for main.rs
pub use ask::*;
pub use catalog::*;
pub use chat::*;
pub use llm::*;
pub use serve::*;

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use fingenie_core::{Language, ResponseResolver};

/// Build the resolver from an explicit rule table, or the default lookup
pub fn load_resolver(config: Option<&Path>) -> Result<ResponseResolver> {
    match config {
        Some(path) if !path.exists() => bail!("Rule table not found: {}", path.display()),
        Some(path) => ResponseResolver::with_config_path(path)
            .with_context(|| format!("Failed to load rule table from {}", path.display())),
        None => ResponseResolver::new().context("Failed to load rule table"),
    }
}

pub fn parse_language(raw: &str) -> Result<Language> {
    raw.parse::<Language>().map_err(|e| anyhow!(e))
}
