//! Gateway resource types
//!
//! Sessions, dataset files and chat history entries as returned by the gateway.

use serde::{Deserialize, Serialize};

/// A chat session owned by the signed-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub created_at: String,
}

/// A dataset file known to the gateway
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FileItem {
    pub file_name: String,
    #[serde(default)]
    pub storage_uri: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default, rename = "type")]
    pub file_type: Option<String>,
    #[serde(default)]
    pub upload_time: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl FileItem {
    pub fn is_active(&self) -> bool {
        self.is_active.unwrap_or(false)
    }
}

/// One question/answer pair from the chat-history endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub question: String,
    pub answer: String,
}

/// The session the client last worked in, persisted across restarts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSession {
    pub id: String,
    pub title: String,
}

impl From<&Session> for ActiveSession {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            title: session.title.clone(),
        }
    }
}
