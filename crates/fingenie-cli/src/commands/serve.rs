//! Server command implementation

use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use fingenie_core::{LlmBackend, LlmClient};
use fingenie_server::{ReplyMode, ServerConfig};

use super::load_resolver;

#[allow(clippy::too_many_arguments)]
pub async fn cmd_serve(
    config_path: Option<&Path>,
    host: &str,
    port: u16,
    static_dir: Option<&Path>,
    reply_mode: &str,
    reply_delay_ms: u64,
    cors_origins: Vec<String>,
    no_llm: bool,
) -> Result<()> {
    let reply_mode: ReplyMode = reply_mode.parse().map_err(|e: String| anyhow!(e))?;
    let resolver = load_resolver(config_path)?;
    let llm = select_llm(no_llm, reply_mode)?;

    println!("🧞 Starting FinGenie web server...");
    println!("   Listening: http://{}:{}", host, port);
    match &llm {
        Some(client) => println!("   LLM: {} (model: {})", client.host(), client.model()),
        None => println!("   LLM: disabled (--no-llm)"),
    }
    println!(
        "   Session replies: {} ({} ms delay)",
        reply_mode, reply_delay_ms
    );
    println!("   Rules: {}", resolver.rule_names().len());
    if let Some(dir) = static_dir {
        println!("   Static files: {}", dir.display());
    }
    if cors_origins.iter().any(|o| o == "*") {
        println!("   ⚠️  CORS open to any origin");
    }
    println!();
    println!("   Press Ctrl+C to stop");

    let config = ServerConfig {
        allowed_origins: cors_origins,
        reply_mode,
        reply_delay: Duration::from_millis(reply_delay_ms),
    };

    let static_dir_str = match static_dir {
        Some(dir) => Some(
            dir.to_str()
                .context("static_dir path must be valid UTF-8")?,
        ),
        None => None,
    };
    fingenie_server::serve(host, port, resolver, llm, static_dir_str, config).await?;

    Ok(())
}

/// Resolve the LLM backend for the server from the environment
pub fn select_llm(no_llm: bool, reply_mode: ReplyMode) -> Result<Option<LlmClient>> {
    if no_llm {
        if reply_mode == ReplyMode::Llm {
            bail!("--reply-mode llm needs an LLM backend; drop --no-llm");
        }
        return Ok(None);
    }

    match LlmClient::from_env() {
        Some(client) => Ok(Some(client)),
        None => bail!(
            "GROQ_API_KEY is not set. Add it to .env, set LLM_BACKEND=mock, or pass --no-llm"
        ),
    }
}
