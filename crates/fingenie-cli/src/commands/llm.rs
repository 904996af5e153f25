//! LLM backend commands

use anyhow::Result;
use fingenie_core::{LlmBackend, LlmClient};

/// Check the configured LLM backend and optionally send a prompt
pub async fn cmd_llm_check(prompt: Option<&str>) -> Result<()> {
    println!("🔍 Checking LLM backend...\n");

    let backend = std::env::var("LLM_BACKEND").unwrap_or_else(|_| "groq".to_string());
    println!("  LLM_BACKEND: {}", backend);
    match std::env::var("GROQ_API_KEY") {
        Ok(key) if !key.trim().is_empty() => println!("  GROQ_API_KEY: set"),
        _ => println!("  ⚠️  GROQ_API_KEY not set"),
    }

    let Some(client) = LlmClient::from_env() else {
        println!("\n❌ No LLM backend configured");
        println!("\nTo set up Groq:");
        println!("  1. Create an API key at https://console.groq.com");
        println!("  2. Add GROQ_API_KEY=<key> to .env");
        return Ok(());
    };

    println!("  Host: {}", client.host());
    println!("  Model: {}\n", client.model());

    print!("Checking availability... ");
    if client.health_check().await {
        println!("✅ Connected");
    } else {
        println!("❌ Failed");
        return Ok(());
    }

    if let Some(prompt) = prompt {
        println!("\n💬 \"{}\"", prompt);
        match client.complete(prompt).await {
            Ok(reply) => println!("→ {}", reply),
            Err(e) => println!("❌ Error: {}", e),
        }
    }

    Ok(())
}
