//! Persistent storage
//!
//! Local persistence for client settings and the last active session.

pub mod settings;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Could not determine the application data directory")]
    NoDataDir,
}

/// Application data directory
///
/// Linux: ~/.local/share/mlagent
/// macOS: ~/Library/Application Support/com.MLAgent.mlagent
/// Windows: %APPDATA%/MLAgent/mlagent/data
pub fn get_data_dir() -> Result<PathBuf, StorageError> {
    directories::ProjectDirs::from("com", "MLAgent", "mlagent")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or(StorageError::NoDataDir)
}
