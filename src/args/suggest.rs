//! Command-line typeahead lookup.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::app::spawn_suggest_worker;
use crate::error::{GalaxyError, Result};
use crate::settings::Settings;
use crate::sources::SuggestionSource;
use crate::state::FilterCategory;

/// Upper bound on how long a one-shot lookup may take, debounce included.
const LOOKUP_DEADLINE: Duration = Duration::from_secs(60);

/// What: Print suggestions for `text` in the category named by `category`.
///
/// Inputs:
/// - `source`: Lookup backend.
/// - `category`: Category key as typed on the command line.
/// - `text`: Partial input.
/// - `settings`: Debounce and threshold settings.
///
/// Output:
/// - Suggested values, one per line.
///
/// Details:
/// - Goes through the same debounced worker an interactive view uses, so the
///   two-character threshold applies here too.
///
/// # Errors
/// - Returns `Err(Validation)` for an unknown category or too-short input.
pub async fn handle_suggest<S>(
    source: Arc<S>,
    category: &str,
    text: &str,
    settings: &Settings,
) -> Result<Vec<String>>
where
    S: SuggestionSource + 'static,
{
    let category = FilterCategory::from_config_key(category).ok_or_else(|| {
        GalaxyError::Validation(format!("unknown suggestion category '{category}'"))
    })?;
    if text.trim().chars().count() < settings.suggest_min_chars {
        return Err(GalaxyError::Validation(format!(
            "type at least {} characters to get suggestions",
            settings.suggest_min_chars
        )));
    }
    tracing::info!(category = category.as_config_key(), text = %text, "Suggestion lookup requested from CLI");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut handle = spawn_suggest_worker(
        source,
        tx,
        settings.suggest_debounce(),
        settings.suggest_min_chars,
    );
    let id = handle.query(category, text);
    let reply = tokio::time::timeout(LOOKUP_DEADLINE, async {
        while let Some(suggestions) = rx.recv().await {
            if suggestions.id == id {
                return Some(suggestions.items);
            }
        }
        None
    })
    .await;
    handle.cancel();
    match reply {
        Ok(Some(items)) => Ok(items),
        Ok(None) => Ok(Vec::new()),
        Err(_) => Err(GalaxyError::Http("suggestion lookup timed out".to_string())),
    }
}
