use std::sync::Arc;
use std::time::Duration;

use tokio::{
    select,
    sync::mpsc,
    task::JoinHandle,
    time::sleep,
};

use crate::settings::{MIN_SUGGEST_CHARS, MIN_SUGGEST_DEBOUNCE_MS};
use crate::sources::SuggestionSource;
use crate::state::FilterCategory;

/// Typeahead input sent to the suggestion worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SuggestQuery {
    /// Monotonic identifier used to correlate responses.
    pub id: u64,
    /// Category the user is typing into.
    pub category: FilterCategory,
    /// Raw input text.
    pub text: String,
}

/// Suggestions corresponding to a prior [`SuggestQuery`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Suggestions {
    /// Echoed identifier from the originating query.
    pub id: u64,
    /// Echoed category.
    pub category: FilterCategory,
    /// Suggested values; empty when the lookup failed.
    pub items: Vec<String>,
}

/// Sender side of a suggestion worker.
///
/// Dropping the handle (or calling [`SuggestHandle::cancel`]) aborts the worker
/// together with any debounce timer it is waiting on.
#[derive(Debug)]
pub struct SuggestHandle {
    /// Channel to the worker.
    tx: mpsc::UnboundedSender<SuggestQuery>,
    /// Worker task.
    task: JoinHandle<()>,
    /// Id the next query will carry.
    next_id: u64,
}

impl SuggestHandle {
    /// What: Queue typeahead input for a debounced lookup.
    ///
    /// Output:
    /// - Id of the queued query; only the newest id can produce suggestions.
    pub fn query(&mut self, category: FilterCategory, text: &str) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let _ = self.tx.send(SuggestQuery {
            id,
            category,
            text: text.to_string(),
        });
        id
    }

    /// Abort the worker and any pending lookup timer.
    pub fn cancel(&self) {
        self.task.abort();
    }
}

impl Drop for SuggestHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// What: Spawn background worker for typeahead suggestion lookups.
///
/// Inputs:
/// - `source`: Read-only lookup collaborator
/// - `output`: Channel receiving suggestions
/// - `debounce`: Quiet period before a lookup fires (floored at 300ms)
/// - `min_chars`: Shortest trimmed input that triggers a lookup (floored at 2)
///
/// Output:
/// - Handle used to feed input and to cancel the worker
///
/// Details:
/// - New input during the quiet period restarts it; only the newest input is looked up
/// - Lookups never mutate filter state
/// - A failed lookup is logged and reported as an empty suggestion list
pub fn spawn_suggest_worker<S>(
    source: Arc<S>,
    output: mpsc::UnboundedSender<Suggestions>,
    debounce: Duration,
    min_chars: usize,
) -> SuggestHandle
where
    S: SuggestionSource + 'static,
{
    let debounce = debounce.max(Duration::from_millis(MIN_SUGGEST_DEBOUNCE_MS));
    let min_chars = min_chars.max(MIN_SUGGEST_CHARS);
    let (tx, mut rx) = mpsc::unbounded_channel::<SuggestQuery>();
    let task = tokio::spawn(async move {
        loop {
            let Some(mut latest) = rx.recv().await else {
                break;
            };
            loop {
                select! {
                    next = rx.recv() => match next {
                        Some(q) => latest = q,
                        None => return,
                    },
                    () = sleep(debounce) => break,
                }
            }
            let text = latest.text.trim();
            if text.chars().count() < min_chars {
                tracing::trace!(id = latest.id, "[Suggest] Input below threshold; skipping lookup");
                continue;
            }
            let items = match source.suggest(latest.category, text).await {
                Ok(items) => items,
                Err(e) => {
                    tracing::warn!(
                        category = latest.category.as_config_key(),
                        error = %e,
                        "[Suggest] Lookup failed"
                    );
                    Vec::new()
                }
            };
            if output
                .send(Suggestions {
                    id: latest.id,
                    category: latest.category,
                    items,
                })
                .is_err()
            {
                break;
            }
        }
    });
    SuggestHandle {
        tx,
        task,
        next_id: 1,
    }
}
