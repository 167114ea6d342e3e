//! Conversation grouping by inactivity gap.

use tracing::{debug, instrument, warn};

use chatblog_shared::{Conversation, INACTIVITY_GAP_MS, MIN_CONVERSATION_LEN, Message};

/// Partition a message batch into conversations.
///
/// Messages are sorted by timestamp, split wherever the gap to the previous
/// message exceeds [`INACTIVITY_GAP_MS`] (a gap exactly equal to it does not
/// split), and runs shorter than [`MIN_CONVERSATION_LEN`] are dropped.
#[instrument(skip_all, fields(messages = messages.len()))]
pub fn group_conversations(mut messages: Vec<Message>) -> Vec<Conversation> {
    messages.sort_by_key(|m| m.timestamp);

    let mut runs: Vec<Vec<Message>> = Vec::new();
    let mut current: Vec<Message> = Vec::new();
    let mut last_timestamp: Option<i64> = None;

    for message in messages {
        let breaks = match last_timestamp {
            None => true,
            Some(prev) => message.timestamp.saturating_sub(prev) > INACTIVITY_GAP_MS,
        };

        if breaks && !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }

        last_timestamp = Some(message.timestamp);
        current.push(message);
    }

    if !current.is_empty() {
        runs.push(current);
    }

    let run_count = runs.len();
    let conversations: Vec<Conversation> = runs
        .into_iter()
        .filter(|run| run.len() >= MIN_CONVERSATION_LEN)
        .filter_map(into_conversation)
        .collect();

    debug!(
        runs = run_count,
        kept = conversations.len(),
        "messages grouped"
    );

    conversations
}

/// Validate a run the splitter produced. A rejection means the splitter broke
/// an invariant, so it is logged rather than dropped quietly.
fn into_conversation(run: Vec<Message>) -> Option<Conversation> {
    let len = run.len();
    let first = run.first().map(|m| m.timestamp);
    match Conversation::new(run) {
        Ok(conversation) => Some(conversation),
        Err(e) => {
            warn!(len, first_message = ?first, error = %e, "dropping run that failed validation");
            None
        }
    }
}
