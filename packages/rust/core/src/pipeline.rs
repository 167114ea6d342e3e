//! End-to-end generation run: fetch → group → extract → format → polish → write.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use tracing::{info, instrument, warn};

use chatblog_markdown::format_conversation;
use chatblog_shared::{Conversation, Post, Result, RunId};
use chatblog_source::MessageSource;

use crate::grouper::group_conversations;
use crate::metadata::extract_metadata;
use crate::polish::TextPolisher;
use crate::writer::{PostWriter, WriteOutcome, file_key};

/// Configuration for one generation run.
#[derive(Debug, Clone)]
pub struct GenerateConfig {
    /// Directory posts are written into.
    pub content_dir: PathBuf,
}

/// Summary of a generation run.
#[derive(Debug)]
pub struct RunReport {
    pub run_id: RunId,
    /// Messages returned by the source.
    pub messages_fetched: usize,
    /// Conversations that survived grouping.
    pub conversations: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    /// Conversations that could not be turned into a post.
    pub failed: usize,
    pub outcomes: Vec<WriteOutcome>,
    pub elapsed: Duration,
}

impl RunReport {
    fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            messages_fetched: 0,
            conversations: 0,
            created: 0,
            updated: 0,
            skipped: 0,
            failed: 0,
            outcomes: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    fn record(&mut self, outcome: WriteOutcome) {
        match outcome {
            WriteOutcome::Created(_) => self.created += 1,
            WriteOutcome::Updated(_) => self.updated += 1,
            WriteOutcome::DuplicateSkipped(_) => self.skipped += 1,
        }
        self.outcomes.push(outcome);
    }
}

/// Progress callback for long-running operations.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called after each conversation, whatever its outcome.
    fn conversation_done(&self, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, report: &RunReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn conversation_done(&self, _current: usize, _total: usize) {}
    fn done(&self, _report: &RunReport) {}
}

/// Run the generation pipeline once.
///
/// A failed fetch aborts the run. Failures inside one conversation are
/// logged and counted; the remaining conversations are still processed.
/// Conversations are handled one at a time, in chronological order.
#[instrument(skip_all, fields(dir = %config.content_dir.display()))]
pub async fn generate<S, P>(
    config: &GenerateConfig,
    source: &S,
    polisher: &P,
    progress: &dyn ProgressReporter,
) -> Result<RunReport>
where
    S: MessageSource,
    P: TextPolisher,
{
    let start = Instant::now();
    let mut report = RunReport::new(RunId::new());
    info!(run_id = %report.run_id, "starting generation run");

    // --- Phase 1: Fetch ---
    progress.phase("Fetching messages");
    let messages = source.fetch().await?;
    report.messages_fetched = messages.len();

    // --- Phase 2: Group ---
    progress.phase("Grouping conversations");
    let conversations = group_conversations(messages);
    report.conversations = conversations.len();
    info!(
        messages = report.messages_fetched,
        conversations = report.conversations,
        "found conversations"
    );

    // --- Phase 3: Posts ---
    progress.phase("Writing posts");
    let writer = PostWriter::new(&config.content_dir);
    let total = conversations.len();
    let mut claimed_keys = HashSet::new();

    for (i, conversation) in conversations.iter().enumerate() {
        match process_conversation(conversation, polisher, &writer, &mut claimed_keys).await {
            Ok(outcome) => report.record(outcome),
            Err(e) => {
                warn!(
                    first_message = conversation.first().timestamp,
                    error = %e,
                    "failed to generate post, continuing"
                );
                report.failed += 1;
            }
        }
        progress.conversation_done(i + 1, total);
    }

    report.elapsed = start.elapsed();
    info!(
        run_id = %report.run_id,
        created = report.created,
        updated = report.updated,
        skipped = report.skipped,
        failed = report.failed,
        elapsed_ms = report.elapsed.as_millis() as u64,
        "generation run complete"
    );
    progress.done(&report);

    Ok(report)
}

async fn process_conversation<P: TextPolisher>(
    conversation: &Conversation,
    polisher: &P,
    writer: &PostWriter,
    claimed_keys: &mut HashSet<String>,
) -> Result<WriteOutcome> {
    let meta = extract_metadata(conversation)?;
    let formatted = format_conversation(conversation);
    let content = polisher.polish(&formatted).await;

    let post = Post {
        title: meta.title,
        author: meta.author,
        tags: meta.tags,
        date: meta.date,
        content,
    };

    let key = claim_key(file_key(&post), claimed_keys);
    writer.write_as(&post, &key)
}

/// Reserve a file key for this run.
///
/// Two conversations of one run that derive the same key (same day, same
/// first line) get `-2`, `-3`, ... suffixes in chronological order, so the
/// later one never replaces the earlier one. Reruns over the same batch
/// assign the same suffixes.
fn claim_key(base: String, claimed: &mut HashSet<String>) -> String {
    if claimed.insert(base.clone()) {
        return base;
    }

    let mut n = 2usize;
    loop {
        let candidate = format!("{base}-{n}");
        if claimed.insert(candidate.clone()) {
            warn!(key = %base, assigned = %candidate, "file key already used in this run");
            return candidate;
        }
        n += 1;
    }
}
