//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// FinGenie Bharat - your financial assistant
#[derive(Parser)]
#[command(name = "fingenie")]
#[command(about = "Financial literacy chat assistant for India", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Responder rule table (defaults to the user data dir override, then the built-in table)
    #[arg(long, env = "FINGENIE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value = "5000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Directory with the front-end build to serve
        #[arg(long)]
        static_dir: Option<PathBuf>,

        /// Session reply source: canned, llm
        #[arg(long, default_value = "canned")]
        reply_mode: String,

        /// Artificial delay before canned session replies (milliseconds)
        #[arg(long, default_value = "1500")]
        reply_delay_ms: u64,

        /// Allowed CORS origin (repeatable, "*" allows any)
        #[arg(long = "cors-origin", default_value = "*")]
        cors_origins: Vec<String>,

        /// Run without an LLM backend (POST /chat returns 500)
        #[arg(long)]
        no_llm: bool,
    },

    /// Ask a single question
    Ask {
        /// The question
        text: String,

        /// Send the question to the LLM instead of the rule-based resolver
        #[arg(long)]
        llm: bool,

        /// Reply language (code or name, e.g. hi, Hindi)
        #[arg(short, long, default_value = "en")]
        language: String,

        /// Print the resolved response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive chat session in the terminal
    Chat {
        /// Reply language (code or name, e.g. hi, Hindi)
        #[arg(short, long, default_value = "en")]
        language: String,
    },

    /// List glossary terms the resolver explains
    Terms,

    /// List government schemes
    Schemes {
        /// Beneficiary group: women, pwd, sc-st, minority, farmer, senior
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Show resolver rules in evaluation order
    Rules,

    /// Check the configured LLM backend
    LlmCheck {
        /// Prompt to send after the health check
        #[arg(short, long)]
        prompt: Option<String>,
    },
}
