//! Post metadata extraction: title, author, tags and date.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use tracing::debug;

use chatblog_markdown::sanitize;
use chatblog_shared::{ChatBlogError, Conversation, Result};

/// Titles longer than this many characters are truncated.
const MAX_TITLE_CHARS: usize = 50;

/// A message must sanitize to more than this many characters to supply the title.
const MIN_TITLE_SOURCE_CHARS: usize = 3;

const ELLIPSIS: &str = "...";

/// Metadata derived from one conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct PostMeta {
    pub title: String,
    pub author: String,
    pub tags: Vec<String>,
    pub date: DateTime<Utc>,
}

/// Derive all metadata for a conversation.
///
/// Fails only when the first message's timestamp is outside the datetime range.
pub fn extract_metadata(conversation: &Conversation) -> Result<PostMeta> {
    let first = conversation.first();
    let date = first.datetime().ok_or_else(|| {
        ChatBlogError::validation(format!("timestamp {} is out of range", first.timestamp))
    })?;

    let meta = PostMeta {
        title: extract_title(conversation, &date),
        author: first.author.clone(),
        tags: extract_tags(conversation),
        date,
    };

    debug!(title = %meta.title, tags = meta.tags.len(), "metadata extracted");
    Ok(meta)
}

/// First line of the first message with meaningful text, capped at 50 characters.
///
/// Falls back to `Conversation on M/D/YYYY` (UTC) when no message qualifies.
pub fn extract_title(conversation: &Conversation, date: &DateTime<Utc>) -> String {
    for message in conversation.messages() {
        let cleaned = sanitize(&message.body);
        if cleaned.chars().count() <= MIN_TITLE_SOURCE_CHARS {
            continue;
        }

        let first_line = cleaned.lines().next().unwrap_or_default();
        if first_line.chars().count() > MAX_TITLE_CHARS {
            let head: String = first_line.chars().take(MAX_TITLE_CHARS).collect();
            return format!("{head}{ELLIPSIS}");
        }
        return first_line.to_string();
    }

    format!("Conversation on {}", date.format("%-m/%-d/%Y"))
}

/// Hashtags from the raw message bodies, first-seen order, no duplicates.
pub fn extract_tags(conversation: &Conversation) -> Vec<String> {
    static HASHTAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"#([A-Za-z0-9_-]+)").expect("valid regex"));

    let mut seen = HashSet::new();
    let mut tags = Vec::new();

    for message in conversation.messages() {
        for caps in HASHTAG_RE.captures_iter(&message.body) {
            let tag = &caps[1];
            if seen.insert(tag.to_string()) {
                tags.push(tag.to_string());
            }
        }
    }

    tags
}

#[cfg(test)]
mod tests {
    use chatblog_shared::Message;

    use super::*;

    const T0: i64 = 1_709_287_200_000; // 2024-03-01T10:00:00Z

    fn conversation(messages: &[(&str, &str)]) -> Conversation {
        let messages = messages
            .iter()
            .enumerate()
            .map(|(i, (author, body))| Message::new(*author, *body, T0 + i as i64 * 60_000))
            .collect();
        Conversation::new(messages).expect("valid conversation")
    }

    fn date() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(T0).unwrap()
    }

    #[test]
    fn title_from_first_meaningful_message() {
        let conv = conversation(&[("a", "ok"), ("b", "How do lifetimes work?\nmore"), ("c", "x")]);
        assert_eq!(extract_title(&conv, &date()), "How do lifetimes work?");
    }

    #[test]
    fn title_skips_commands_and_truncates() {
        let long = "a".repeat(60);
        let conv = conversation(&[("a", "!help"), ("b", "<:e:1>"), ("c", long.as_str())]);
        let title = extract_title(&conv, &date());
        assert_eq!(title, format!("{}...", "a".repeat(50)));
    }

    #[test]
    fn title_of_exactly_fifty_chars_is_not_truncated() {
        let exact = "b".repeat(50);
        let conv = conversation(&[("a", exact.as_str()), ("b", "x"), ("c", "y")]);
        assert_eq!(extract_title(&conv, &date()), exact);
    }

    #[test]
    fn four_char_message_qualifies_three_does_not() {
        let conv = conversation(&[("a", "hey"), ("b", "heya"), ("c", "z")]);
        assert_eq!(extract_title(&conv, &date()), "heya");
    }

    #[test]
    fn title_counts_characters_not_bytes() {
        let accented = "é".repeat(55);
        let conv = conversation(&[("a", accented.as_str()), ("b", "x"), ("c", "y")]);
        let title = extract_title(&conv, &date());
        assert_eq!(title.chars().count(), 53);
    }

    #[test]
    fn title_falls_back_to_date() {
        let conv = conversation(&[("a", "!x"), ("b", "ok"), ("c", "lol")]);
        assert_eq!(extract_title(&conv, &date()), "Conversation on 3/1/2024");
    }

    #[test]
    fn tags_are_deduplicated_in_first_seen_order() {
        let conv = conversation(&[("a", "hello #foo"), ("b", "bar #foo #baz"), ("c", "none")]);
        assert_eq!(extract_tags(&conv), vec!["foo".to_string(), "baz".to_string()]);
    }

    #[test]
    fn tags_read_raw_bodies_including_commands() {
        let conv = conversation(&[("a", "!tag #ops"), ("b", "#with-hyphen_and_123"), ("c", "#")]);
        assert_eq!(
            extract_tags(&conv),
            vec!["ops".to_string(), "with-hyphen_and_123".to_string()]
        );
    }

    #[test]
    fn metadata_uses_first_message() {
        let conv = conversation(&[("kim", "first message"), ("lee", "reply"), ("lee", "again")]);
        let meta = extract_metadata(&conv).unwrap();
        assert_eq!(meta.author, "kim");
        assert_eq!(meta.date, date());
        assert_eq!(meta.title, "first message");
    }

    #[test]
    fn metadata_rejects_out_of_range_timestamp() {
        let conv = Conversation::new(vec![
            Message::new("a", "x", i64::MAX - 2),
            Message::new("a", "y", i64::MAX - 1),
            Message::new("a", "z", i64::MAX),
        ])
        .unwrap();
        assert!(extract_metadata(&conv).is_err());
    }
}
