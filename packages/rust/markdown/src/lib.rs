//! Chat-to-Markdown rendering.
//!
//! Cleans raw chat message bodies, renders a conversation as a single
//! Markdown document, and reads/writes the YAML front matter that heads
//! every generated post.

mod frontmatter;
mod sanitize;

use tracing::{debug, instrument};

use chatblog_shared::Conversation;

pub use frontmatter::{FrontMatter, parse_document, render_document, split_document};
pub use sanitize::{is_command, sanitize};

/// Render a conversation as Markdown.
///
/// Each message with non-empty sanitized text becomes `**<author>:** <text>`
/// followed by a blank line. Messages that sanitize to nothing (bot commands,
/// emote-only lines) leave no trace, spacing included.
#[instrument(skip_all, fields(messages = conversation.len()))]
pub fn format_conversation(conversation: &Conversation) -> String {
    let mut markdown = String::new();
    let mut omitted = 0usize;

    for message in conversation.messages() {
        let cleaned = sanitize(&message.body);
        if cleaned.is_empty() {
            omitted += 1;
            continue;
        }
        markdown.push_str(&format!("**{}:** {cleaned}\n\n", message.author));
    }

    debug!(omitted, len = markdown.len(), "conversation formatted");
    markdown
}
