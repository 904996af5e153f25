//! FinGenie CLI - financial literacy chat assistant
//!
//! Usage:
//!   fingenie serve --port 5000      Start web server
//!   fingenie ask "What is an FD?"   One-off question
//!   fingenie chat                   Interactive session
//!   fingenie schemes --group farmer List government schemes

mod cli;
mod commands;


use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    // .env first so clap sees PORT and friends
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Serve {
            port,
            host,
            static_dir,
            reply_mode,
            reply_delay_ms,
            cors_origins,
            no_llm,
        } => {
            commands::cmd_serve(
                config,
                &host,
                port,
                static_dir.as_deref(),
                &reply_mode,
                reply_delay_ms,
                cors_origins,
                no_llm,
            )
            .await
        }
        Commands::Ask {
            text,
            llm,
            language,
            json,
        } => {
            if llm {
                commands::cmd_ask_llm(&text).await
            } else {
                let resolver = commands::load_resolver(config)?;
                commands::cmd_ask(&resolver, &text, &language, json)
            }
        }
        Commands::Chat { language } => {
            let resolver = commands::load_resolver(config)?;
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            commands::cmd_chat(&resolver, &language, stdin.lock(), stdout.lock()).map(|_| ())
        }
        Commands::Terms => commands::cmd_terms(&commands::load_resolver(config)?),
        Commands::Schemes { group } => {
            commands::cmd_schemes(&commands::load_resolver(config)?, group.as_deref())
        }
        Commands::Rules => commands::cmd_rules(&commands::load_resolver(config)?),
        Commands::LlmCheck { prompt } => commands::cmd_llm_check(prompt.as_deref()).await,
    }
}
