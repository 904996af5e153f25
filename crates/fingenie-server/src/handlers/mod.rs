//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod catalog;
pub mod chat;
pub mod sessions;

// Re-export all handlers for use in router
pub use catalog::*;
pub use chat::*;
pub use sessions::*;
