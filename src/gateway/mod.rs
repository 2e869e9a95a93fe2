//! Gateway API access
//!
//! Thin collaborator calls against the ML Agent gateway plus the chat
//! service that streams answers into the renderer.

pub mod chat;
pub mod client;
pub mod history;

use thiserror::Error;

pub use chat::{ask, ChatOutcome, ChatTransport};
pub use client::GatewayClient;
pub use history::replay_history;

/// Gateway errors
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Not authorized (status {0})")]
    Unauthorized(u16),
    #[error("Already exists: {0}")]
    Conflict(String),
    #[error("Gateway returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Stream error: {0}")]
    Stream(String),
}

impl GatewayError {
    /// 401/403: the session is no longer valid and must be re-authenticated
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, GatewayError::Unauthorized(_))
    }
}
