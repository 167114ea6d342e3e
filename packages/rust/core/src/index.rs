//! Post index: the JSON listing a static-site renderer reads to show posts.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use tracing::{debug, info, instrument, warn};

use chatblog_markdown::parse_document;
use chatblog_shared::{ChatBlogError, PostIndex, PostIndexEntry, Result};

use crate::writer::write_atomic;

/// Descriptions longer than this many characters are truncated.
const MAX_DESCRIPTION_CHARS: usize = 160;

/// Scan `content_dir` for posts and build the index.
///
/// A missing directory yields an empty index. Entries follow file-name order.
#[instrument(skip_all, fields(dir = %content_dir.display()))]
pub fn build_index(content_dir: &Path, path_prefix: &str) -> Result<PostIndex> {
    let entries = match std::fs::read_dir(content_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("content directory does not exist, index is empty");
            return Ok(PostIndex::default());
        }
        Err(e) => return Err(ChatBlogError::io(content_dir, e)),
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();

    let prefix = path_prefix.trim_end_matches('/');
    let mut data = Vec::with_capacity(files.len());

    for file in &files {
        let content = std::fs::read_to_string(file).map_err(|e| ChatBlogError::io(file, e))?;

        let (front_matter, body) = match parse_document(&content) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(path = %file.display(), error = %e, "skipping file without valid front matter");
                continue;
            }
        };

        let stem = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        let last_modified = std::fs::metadata(file)
            .and_then(|m| m.modified())
            .map(|t| DateTime::<Utc>::from(t).to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_else(|_| front_matter.date.clone());

        data.push(PostIndexEntry {
            title: front_matter.title,
            path: format!("{prefix}/{stem}"),
            date: front_matter.date,
            last_modified,
            author: front_matter.author,
            tags: front_matter.tags,
            description: describe(&body),
        });
    }

    info!(posts = data.len(), "post index built");
    Ok(PostIndex {
        total: data.len(),
        data,
    })
}

/// Write the index as pretty JSON to `content_dir/index_file`.
pub fn write_index(content_dir: &Path, index_file: &str, index: &PostIndex) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(index)
        .map_err(|e| ChatBlogError::Render(format!("index serialization failed: {e}")))?;

    std::fs::create_dir_all(content_dir).map_err(|e| ChatBlogError::io(content_dir, e))?;
    let path = content_dir.join(index_file);
    write_atomic(&path, &json)?;

    info!(path = %path.display(), posts = index.total, "wrote post index");
    Ok(path)
}

/// First non-empty paragraph as plain text, capped at 160 characters.
fn describe(body: &str) -> String {
    static EMPHASIS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\*\*|__|~~|\*|`").expect("valid regex"));

    let paragraph = body
        .split("\n\n")
        .map(str::trim)
        .find(|p| !p.is_empty())
        .unwrap_or_default();

    let plain = EMPHASIS_RE.replace_all(paragraph, "");
    let plain = plain.split_whitespace().collect::<Vec<_>>().join(" ");

    if plain.chars().count() > MAX_DESCRIPTION_CHARS {
        let head: String = plain.chars().take(MAX_DESCRIPTION_CHARS).collect();
        format!("{head}...")
    } else {
        plain
    }
}
