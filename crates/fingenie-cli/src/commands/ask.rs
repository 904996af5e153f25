//! One-off question commands

use anyhow::{Context, Result};
use fingenie_core::{LlmBackend, LlmClient, ResolvedResponse, ResponseMetadata, ResponseResolver};

use super::parse_language;

/// Answer one question with the rule-based resolver
pub fn cmd_ask(resolver: &ResponseResolver, text: &str, language: &str, json: bool) -> Result<()> {
    let language = parse_language(language)?;
    let resolved = resolver.resolve_localized(text, language);

    if json {
        println!("{}", serde_json::to_string_pretty(&resolved)?);
    } else {
        println!("{}", format_reply(resolver, &resolved));
    }
    Ok(())
}

/// Answer one question with the configured LLM
pub async fn cmd_ask_llm(text: &str) -> Result<()> {
    let client = LlmClient::from_env()
        .context("No LLM configured. Set GROQ_API_KEY (or LLM_BACKEND=mock)")?;

    let reply = client
        .complete(text)
        .await
        .with_context(|| format!("LLM request to {} failed", client.host()))?;
    println!("{}", reply);
    Ok(())
}

/// Render a resolved response for the terminal
pub fn format_reply(resolver: &ResponseResolver, resolved: &ResolvedResponse) -> String {
    let mut out = resolved.response_text.clone();
    match &resolved.metadata {
        Some(ResponseMetadata::Expense(record)) => {
            out.push_str(&format!(
                "\n\n💰 Logged ₹{} under {}",
                record.amount, record.category
            ));
        }
        Some(ResponseMetadata::Scheme(suggestion)) => {
            out.push_str("\n\n🏛️  Suggested schemes:");
            for id in &suggestion.names {
                let name = resolver.scheme(id).map(|s| s.name.as_str()).unwrap_or(id.as_str());
                out.push_str(&format!("\n   • {}", name));
            }
        }
        Some(ResponseMetadata::Alert(alert)) => {
            out.push_str(&format!("\n\n⚠️  {}", alert.note));
        }
        None => {}
    }
    out
}
