//! YAML front matter rendering and parsing.
//!
//! A post document is `---\n<yaml>---\n<body>`. Parsing is lenient about
//! surrounding whitespace so hand-edited files still round-trip.

use serde::{Deserialize, Serialize};

use chatblog_shared::{ChatBlogError, Result};

const DELIMITER: &str = "---";

/// Metadata block at the top of every post file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontMatter {
    pub title: String,
    pub author: String,
    /// ISO-8601 timestamp.
    pub date: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Render front matter and body into one document, ending with a newline.
pub fn render_document(front_matter: &FrontMatter, body: &str) -> Result<String> {
    let yaml = serde_yaml::to_string(front_matter)
        .map_err(|e| ChatBlogError::Render(format!("front matter serialization failed: {e}")))?;

    let mut doc = format!("{DELIMITER}\n{yaml}");
    if !doc.ends_with('\n') {
        doc.push('\n');
    }
    doc.push_str(DELIMITER);
    doc.push('\n');
    doc.push_str(body);
    if !doc.ends_with('\n') {
        doc.push('\n');
    }
    Ok(doc)
}

/// Split a document into its raw YAML block (if any) and body.
///
/// Without a leading `---` block the whole input is the body.
pub fn split_document(doc: &str) -> (Option<&str>, &str) {
    let trimmed = doc.trim_start();
    let Some(after_open) = trimmed.strip_prefix(DELIMITER) else {
        return (None, doc);
    };

    // Find the closing delimiter at the start of a line
    let Some(close_idx) = after_open.find("\n---") else {
        return (None, doc);
    };

    let yaml = after_open[..close_idx].trim_start_matches(['\r', '\n']);
    let rest = &after_open[close_idx + 1 + DELIMITER.len()..];

    // Body starts on the line after the closing delimiter
    let body = match rest.find('\n') {
        Some(nl) => &rest[nl + 1..],
        None => "",
    };

    (Some(yaml), body)
}

/// Parse a document into typed front matter and body.
pub fn parse_document(doc: &str) -> Result<(FrontMatter, String)> {
    let (yaml, body) = split_document(doc);
    let yaml = yaml.ok_or_else(|| ChatBlogError::parse("document has no front matter block"))?;

    let front_matter: FrontMatter = serde_yaml::from_str(yaml)
        .map_err(|e| ChatBlogError::parse(format!("invalid front matter: {e}")))?;

    Ok((front_matter, body.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FrontMatter {
        FrontMatter {
            title: "Question: why borrowck?".into(),
            author: "ana".into(),
            date: "2024-03-01T10:00:00.000Z".into(),
            tags: vec!["rust".into(), "help-wanted".into()],
        }
    }

    #[test]
    fn render_has_delimiters_and_body() {
        let doc = render_document(&sample(), "**ana:** hi\n\n").expect("render");
        assert!(doc.starts_with("---\n"));
        assert!(doc.contains("\n---\n**ana:** hi"));
        assert!(doc.ends_with('\n'));
    }

    #[test]
    fn render_then_parse_preserves_fields() {
        let doc = render_document(&sample(), "body text").expect("render");
        let (fm, body) = parse_document(&doc).expect("parse");
        assert_eq!(fm, sample());
        assert_eq!(body.trim(), "body text");
    }

    #[test]
    fn split_without_front_matter_returns_whole_doc() {
        let (yaml, body) = split_document("just text\n");
        assert!(yaml.is_none());
        assert_eq!(body, "just text\n");
    }

    #[test]
    fn split_unterminated_block_is_body() {
        let (yaml, body) = split_document("---\ntitle: x\nno close");
        assert!(yaml.is_none());
        assert_eq!(body, "---\ntitle: x\nno close");
    }

    #[test]
    fn split_handles_hand_written_file() {
        let doc = "---\ntitle: Hello\nauthor: bo\ndate: '2024-01-01T00:00:00.000Z'\ntags:\n  - a\n---\n\nBody here\n";
        let (fm, body) = parse_document(doc).expect("parse");
        assert_eq!(fm.title, "Hello");
        assert_eq!(fm.tags, vec!["a".to_string()]);
        assert_eq!(body.trim(), "Body here");
    }

    #[test]
    fn missing_tags_default_to_empty() {
        let doc = "---\ntitle: T\nauthor: A\ndate: D\n---\nx\n";
        let (fm, _) = parse_document(doc).expect("parse");
        assert!(fm.tags.is_empty());
    }

    #[test]
    fn parse_rejects_missing_block() {
        let err = parse_document("no front matter").unwrap_err();
        assert!(err.to_string().contains("no front matter"));
    }
}
