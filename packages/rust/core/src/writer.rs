//! Idempotent post persistence.
//!
//! Each post lands at `<content_dir>/<YYYY-MM-DD>-<slug>.md`. When a file
//! already exists there, its body (front matter stripped) is compared to the
//! new content after trimming: equal bodies skip the write, different bodies
//! replace the file. Callers writing several posts in one run claim distinct
//! keys first (see `pipeline`), so replacement only happens across runs.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::SecondsFormat;
use regex::Regex;
use tracing::{debug, info, instrument};

use chatblog_markdown::{FrontMatter, render_document, split_document};
use chatblog_shared::{ChatBlogError, Post, Result};

/// Slug used when a title has no ASCII letters or digits.
pub const FALLBACK_SLUG: &str = "conversation";

/// What a write did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// No file existed; a new post was written.
    Created(PathBuf),
    /// A file with a different body existed and was replaced.
    Updated(PathBuf),
    /// A file with the same body existed; nothing was written.
    DuplicateSkipped(PathBuf),
}

impl WriteOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Created(p) | Self::Updated(p) | Self::DuplicateSkipped(p) => p,
        }
    }
}

/// Lowercase, collapse every run of non-alphanumerics into `-`, trim hyphens.
pub fn slugify(title: &str) -> String {
    static NON_ALNUM_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));

    let lowered = title.to_lowercase();
    let slug = NON_ALNUM_RE.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// `YYYY-MM-DD-<slug>`, date in UTC.
pub fn file_key(post: &Post) -> String {
    format!("{}-{}", post.date.format("%Y-%m-%d"), slugify(&post.title))
}

/// Writes posts into one content directory.
#[derive(Debug, Clone)]
pub struct PostWriter {
    content_dir: PathBuf,
}

impl PostWriter {
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
        }
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    /// Target file for a post.
    pub fn path_for(&self, post: &Post) -> PathBuf {
        self.path_for_key(&file_key(post))
    }

    /// Target file for an explicit file key.
    pub fn path_for_key(&self, key: &str) -> PathBuf {
        self.content_dir.join(format!("{key}.md"))
    }

    /// Persist a post under its derived file key.
    pub fn write(&self, post: &Post) -> Result<WriteOutcome> {
        self.write_as(post, &file_key(post))
    }

    /// Persist a post under `key`, skipping the write when an identical body
    /// already exists there.
    ///
    /// Writes go to a hidden temp file followed by a rename, so a failure
    /// never leaves a partial post behind.
    #[instrument(skip_all, fields(title = %post.title, key = %key))]
    pub fn write_as(&self, post: &Post, key: &str) -> Result<WriteOutcome> {
        let path = self.path_for_key(key);

        let existed = match std::fs::read_to_string(&path) {
            Ok(existing) => {
                let (_, body) = split_document(&existing);
                if body.trim() == post.content.trim() {
                    info!(path = %path.display(), "skipping duplicate post");
                    return Ok(WriteOutcome::DuplicateSkipped(path));
                }
                info!(path = %path.display(), "existing post differs, replacing");
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => return Err(ChatBlogError::io(&path, e)),
        };

        std::fs::create_dir_all(&self.content_dir)
            .map_err(|e| ChatBlogError::io(&self.content_dir, e))?;

        let front_matter = FrontMatter {
            title: post.title.clone(),
            author: post.author.clone(),
            date: post.date.to_rfc3339_opts(SecondsFormat::Millis, true),
            tags: post.tags.clone(),
        };
        let document = render_document(&front_matter, &post.content)?;

        write_atomic(&path, &document)?;
        info!(path = %path.display(), updated = existed, "saved blog post");

        Ok(if existed {
            WriteOutcome::Updated(path)
        } else {
            WriteOutcome::Created(path)
        })
    }
}

/// Write to `.<name>.tmp` beside the target, then rename over it.
pub(crate) fn write_atomic(target: &Path, content: &str) -> Result<()> {
    let dir = target.parent().unwrap_or_else(|| Path::new("."));
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = dir.join(format!(".{name}.tmp"));

    std::fs::write(&temp, content).map_err(|e| ChatBlogError::io(&temp, e))?;

    if let Err(e) = std::fs::rename(&temp, target) {
        let _ = std::fs::remove_file(&temp);
        return Err(ChatBlogError::io(target, e));
    }

    debug!(path = %target.display(), size = content.len(), "wrote file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};

    use super::*;

    fn post(title: &str, content: &str) -> Post {
        Post {
            title: title.into(),
            author: "ana".into(),
            tags: vec!["rust".into(), "async".into()],
            date: DateTime::<Utc>::from_timestamp_millis(1_709_287_200_123).unwrap(),
            content: content.into(),
        }
    }

    #[test]
    fn slugify_collapses_and_trims() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  --Rust   2024 -- "), "rust-2024");
        assert_eq!(slugify("a...b___c"), "a-b-c");
    }

    #[test]
    fn slugify_drops_non_ascii() {
        assert_eq!(slugify("Café déjà vu"), "caf-d-j-vu");
    }

    #[test]
    fn slugify_falls_back_when_empty() {
        assert_eq!(slugify("!!! ???"), FALLBACK_SLUG);
    }

    #[test]
    fn file_key_uses_utc_date() {
        assert_eq!(file_key(&post("Hello World", "")), "2024-03-01-hello-world");
    }

    #[test]
    fn write_creates_file_with_front_matter() {
        let dir = tempfile::tempdir().unwrap();
        let writer = PostWriter::new(dir.path().join("content/blog"));

        let outcome = writer.write(&post("Hello", "**ana:** hi\n\n")).unwrap();
        let WriteOutcome::Created(path) = outcome else {
            panic!("expected Created, got {outcome:?}");
        };
        assert!(path.ends_with("2024-03-01-hello.md"));

        let doc = std::fs::read_to_string(&path).unwrap();
        let (fm, body) = chatblog_markdown::parse_document(&doc).unwrap();
        assert_eq!(fm.title, "Hello");
        assert_eq!(fm.author, "ana");
        assert_eq!(fm.date, "2024-03-01T10:00:00.123Z");
        assert_eq!(fm.tags, vec!["rust".to_string(), "async".to_string()]);
        assert_eq!(body.trim(), "**ana:** hi");
    }

    #[test]
    fn second_identical_write_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let writer = PostWriter::new(dir.path());
        let p = post("Hello", "**ana:** hi\n\n");

        assert!(matches!(writer.write(&p).unwrap(), WriteOutcome::Created(_)));
        let first = std::fs::read_to_string(writer.path_for(&p)).unwrap();

        let outcome = writer.write(&p).unwrap();
        assert!(matches!(outcome, WriteOutcome::DuplicateSkipped(_)));
        assert_eq!(std::fs::read_to_string(writer.path_for(&p)).unwrap(), first);

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn whitespace_only_difference_is_a_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let writer = PostWriter::new(dir.path());
        writer.write(&post("Hello", "body")).unwrap();

        let outcome = writer.write(&post("Hello", "\n  body \n\n")).unwrap();
        assert!(matches!(outcome, WriteOutcome::DuplicateSkipped(_)));
    }

    #[test]
    fn different_body_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let writer = PostWriter::new(dir.path());
        writer.write(&post("Hello", "old body")).unwrap();

        let outcome = writer.write(&post("Hello", "new body")).unwrap();
        assert!(matches!(outcome, WriteOutcome::Updated(_)));

        let doc = std::fs::read_to_string(outcome.path()).unwrap();
        assert!(doc.contains("new body"));
        assert!(!doc.contains("old body"));
    }

    #[test]
    fn existing_file_without_front_matter_is_compared_whole() {
        let dir = tempfile::tempdir().unwrap();
        let writer = PostWriter::new(dir.path());
        let p = post("Hello", "plain body");
        std::fs::write(writer.path_for(&p), "plain body\n").unwrap();

        assert!(matches!(writer.write(&p).unwrap(), WriteOutcome::DuplicateSkipped(_)));
    }

    #[test]
    fn write_as_uses_explicit_key() {
        let dir = tempfile::tempdir().unwrap();
        let writer = PostWriter::new(dir.path());
        let p = post("Hello", "body");

        let outcome = writer.write_as(&p, "2024-03-01-hello-2").unwrap();
        assert!(matches!(outcome, WriteOutcome::Created(_)));
        assert!(outcome.path().ends_with("2024-03-01-hello-2.md"));
        assert!(!writer.path_for(&p).exists());
    }

    #[test]
    fn unreadable_target_is_io_error_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let writer = PostWriter::new(dir.path());
        let p = post("Hello", "body");
        std::fs::create_dir_all(writer.path_for(&p)).unwrap();

        let err = writer.write(&p).unwrap_err();
        assert!(matches!(err, ChatBlogError::Io { .. }));

        let temps = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(temps, 0);
    }
}
