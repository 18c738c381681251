//! Usage statistics, persisted as JSON.
//!
//! The store is a plain value: load it, record images, save it. Nothing is
//! global; callers that want statistics pass a file path explicitly.
//!
//! ```json
//! {
//!   "total_images": 12,
//!   "last_processed": "2024-05-01 14:03:27",
//!   "processing_history": [
//!     { "filename": "IMG_0001.jpg", "code": "3f9a1c", "timestamp": "2024-05-01 14:03:27" }
//!   ]
//! }
//! ```
//!
//! History keeps the [`HISTORY_LIMIT`] most recent entries, oldest first.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

pub const HISTORY_LIMIT: usize = 10;
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum StatsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub filename: String,
    pub code: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageStats {
    pub total_images: u64,
    pub last_processed: Option<String>,
    pub processing_history: Vec<HistoryEntry>,
}

impl UsageStats {
    /// Load from `path`. Returns empty stats if the file doesn't exist or
    /// can't be parsed.
    pub fn load(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> Result<(), StatsError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Count one image processed at `timestamp`.
    pub fn record(&mut self, filename: &str, code: &str, timestamp: &str) {
        self.total_images += 1;
        self.last_processed = Some(timestamp.to_string());
        self.processing_history.push(HistoryEntry {
            filename: filename.to_string(),
            code: code.to_string(),
            timestamp: timestamp.to_string(),
        });
        let excess = self.processing_history.len().saturating_sub(HISTORY_LIMIT);
        self.processing_history.drain(..excess);
    }

    /// [`record`](Self::record) with the current local time.
    pub fn record_now(&mut self, filename: &str, code: &str) {
        let now = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
        self.record(filename, code, &now);
    }
}
