//! Message sources for the post pipeline.
//!
//! The pipeline only needs a bounded batch of timestamped, authored text
//! messages. Where they come from is hidden behind [`MessageSource`]:
//! a Discord channel over REST, or a JSON batch file for offline runs.

mod discord;
mod file;

use chatblog_shared::{Message, Result};

pub use discord::{DiscordSource, MAX_FETCH_LIMIT};
pub use file::JsonFileSource;

/// Something that yields one batch of chat messages per call.
///
/// Order is irrelevant; the grouper sorts by timestamp.
pub trait MessageSource {
    fn fetch(&self) -> impl Future<Output = Result<Vec<Message>>> + Send;
}

/// A fixed in-memory batch. Handy for replays and tests.
impl MessageSource for Vec<Message> {
    async fn fetch(&self) -> Result<Vec<Message>> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn vec_source_returns_its_batch() {
        let batch = vec![Message::new("ana", "hi", 1), Message::new("bo", "yo", 2)];
        let fetched = batch.fetch().await.unwrap();
        assert_eq!(fetched, batch);
    }
}
