//! JSON batch files: an array of `{author, body, timestamp}` records.

use std::path::PathBuf;

use tracing::{info, instrument};

use chatblog_shared::{ChatBlogError, Message, Result};

use crate::MessageSource;

/// Reads one message batch from a JSON file on every fetch.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MessageSource for JsonFileSource {
    #[instrument(skip_all, fields(path = %self.path.display()))]
    async fn fetch(&self) -> Result<Vec<Message>> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| ChatBlogError::io(&self.path, e))?;

        let messages: Vec<Message> = serde_json::from_str(&content).map_err(|e| {
            ChatBlogError::parse(format!("{}: invalid message batch: {e}", self.path.display()))
        })?;

        info!(count = messages.len(), "loaded message batch");
        Ok(messages)
    }
}
