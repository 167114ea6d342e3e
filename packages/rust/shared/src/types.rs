//! Core domain types for chatblog.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ChatBlogError, Result};

/// Longest silence (in milliseconds) allowed between two adjacent messages of
/// the same conversation. A gap exactly equal to this does not split.
pub const INACTIVITY_GAP_MS: i64 = 30 * 60 * 1000;

/// Conversations shorter than this are discarded.
pub const MIN_CONVERSATION_LEN: usize = 3;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// A single chat message as delivered by a message source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Display name of the sender.
    pub author: String,
    /// Raw message text, platform markup included.
    pub body: String,
    /// Creation time in epoch milliseconds.
    pub timestamp: i64,
}

impl Message {
    pub fn new(author: impl Into<String>, body: impl Into<String>, timestamp: i64) -> Self {
        Self {
            author: author.into(),
            body: body.into(),
            timestamp,
        }
    }

    /// Creation time as a UTC datetime. `None` when the timestamp is out of range.
    pub fn datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp)
    }
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// A run of messages in ascending timestamp order, at least
/// [`MIN_CONVERSATION_LEN`] long, with no adjacent gap above [`INACTIVITY_GAP_MS`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Wrap a message run, checking the conversation invariants.
    pub fn new(messages: Vec<Message>) -> Result<Self> {
        if messages.len() < MIN_CONVERSATION_LEN {
            return Err(ChatBlogError::validation(format!(
                "conversation needs at least {MIN_CONVERSATION_LEN} messages, got {}",
                messages.len()
            )));
        }

        for pair in messages.windows(2) {
            let gap = pair[1].timestamp - pair[0].timestamp;
            if gap < 0 {
                return Err(ChatBlogError::validation(
                    "conversation messages are not in timestamp order",
                ));
            }
            if gap > INACTIVITY_GAP_MS {
                return Err(ChatBlogError::validation(format!(
                    "conversation contains a {gap} ms gap (limit {INACTIVITY_GAP_MS} ms)"
                )));
            }
        }

        Ok(Self { messages })
    }

    /// The opening message. Always present.
    pub fn first(&self) -> &Message {
        &self.messages[0]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always `false`; provided for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }
}

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// A blog post derived from exactly one conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    pub title: String,
    pub author: String,
    /// Hashtags in first-seen order, without duplicates.
    pub tags: Vec<String>,
    /// Timestamp of the conversation's first message.
    pub date: DateTime<Utc>,
    /// Markdown body (without front matter).
    pub content: String,
}

// ---------------------------------------------------------------------------
// Post index
// ---------------------------------------------------------------------------

/// One row of the post index consumed by the site renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostIndexEntry {
    pub title: String,
    /// Site path of the rendered post (e.g. `/blog/2024-03-01-hello`).
    pub path: String,
    /// ISO-8601 post date from front matter.
    pub date: String,
    /// ISO-8601 modification time of the post file.
    pub last_modified: String,
    pub author: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Short plain-text excerpt of the body.
    pub description: String,
}

/// Root structure of the index file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostIndex {
    pub total: usize,
    pub data: Vec<PostIndexEntry>,
}
