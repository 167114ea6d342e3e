//! Chat message cleanup passes.
//!
//! Each pass is a function `&str -> String` applied in sequence. Platform
//! markup (mentions, channel references, custom emotes) is rewritten or
//! removed; ordinary markdown, code fences and inline code pass through
//! untouched.

use std::sync::LazyLock;

use regex::Regex;

/// Prefix marking a bot command. Commands are dropped from post content.
const COMMAND_PREFIX: char = '!';

/// Placeholder substituted for a user mention.
const USER_PLACEHOLDER: &str = "@user";

/// Placeholder substituted for a channel reference.
const CHANNEL_PLACEHOLDER: &str = "#channel";

/// Clean a raw message body for publication.
///
/// Returns an empty string for bot commands. Commands still count as
/// conversation members; only their text is excluded.
pub fn sanitize(body: &str) -> String {
    if is_command(body) {
        return String::new();
    }

    // Removing an emote can splice a new token together (`<@<:x:1>2>`),
    // so run the passes until nothing changes.
    let mut current = body.to_string();
    loop {
        let next = run_passes(&current);
        if next == current {
            break;
        }
        current = next;
    }

    current.trim().to_string()
}

/// Whether the raw body is a bot command.
pub fn is_command(body: &str) -> bool {
    body.starts_with(COMMAND_PREFIX)
}

fn run_passes(body: &str) -> String {
    let mut result = replace_user_mentions(body);
    result = replace_channel_refs(&result);
    result = strip_emotes(&result);
    result
}

// ---------------------------------------------------------------------------
// Pass 1: User mentions
// ---------------------------------------------------------------------------

/// `<@123>` and `<@!123>` become `@user`. The id is discarded.
fn replace_user_mentions(body: &str) -> String {
    static MENTION_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<@!?\d+>").expect("valid regex"));

    MENTION_RE.replace_all(body, USER_PLACEHOLDER).to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Channel references
// ---------------------------------------------------------------------------

/// `<#123>` becomes `#channel`.
fn replace_channel_refs(body: &str) -> String {
    static CHANNEL_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<#\d+>").expect("valid regex"));

    CHANNEL_RE.replace_all(body, CHANNEL_PLACEHOLDER).to_string()
}

// ---------------------------------------------------------------------------
// Pass 3: Custom emotes
// ---------------------------------------------------------------------------

/// Remove static (`<:name:id>`) and animated (`<a:name:id>`) emotes.
fn strip_emotes(body: &str) -> String {
    static EMOTE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<a?:\w+:\d+>").expect("valid regex"));

    EMOTE_RE.replace_all(body, "").to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
