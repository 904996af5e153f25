//! Error types for FinGenie

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Upstream LLM error: {0}")]
    Upstream(String),

    #[error("Message is empty")]
    EmptyInput,

    #[error("A reply is already pending for this session")]
    ReplyPending,

    #[error("No reply is pending for this session")]
    NoPendingTurn,
}

pub type Result<T> = std::result::Result<T, Error>;
