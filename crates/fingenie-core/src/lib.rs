//! FinGenie Core Library
//!
//! Shared functionality for the FinGenie Bharat financial assistant:
//! - Rule-based response resolver (terms, expenses, topics, fallback)
//! - Responder rule table and government scheme catalog
//! - In-memory chat sessions with a single in-flight reply
//! - Pluggable hosted LLM backends (Groq, OpenAI-compatible, mock)

pub mod ai;
pub mod error;
pub mod models;
pub mod responder;
pub mod session;

/// Test utilities including mock LLM server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{LlmBackend, LlmClient, MockBackend, OpenAICompatibleBackend};
pub use error::{Error, Result};
pub use models::{
    AlertNotice, ExpenseCategory, ExpenseRecord, Language, Message, ResolvedResponse,
    ResponseMetadata, SchemeEntry, SchemeGroup, SchemeSuggestion, Sender, TermEntry,
};
pub use responder::{ResponderConfig, ResponseResolver};
pub use session::{ChatSession, Transcript};
