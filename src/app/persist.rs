//! Durable stores for list-view filter/page state.
//!
//! Shareable views keep their state in a URL query string; simple views keep
//! it in a per-user JSON file. Reading never fails: a missing or corrupt store
//! degrades to the view defaults. Two processes writing the same file race and
//! the last write wins.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::logic::codec::{self, CodecDefaults, QueryMap};
use crate::state::{FilterState, PageState};

/// Backing store for one list view's encoded state.
pub trait StateStore: Send + Sync {
    /// Last saved map, or `None` when nothing usable is stored.
    fn load(&self) -> Option<QueryMap>;

    /// Replace the stored map.
    ///
    /// # Errors
    /// - Returns `Err` when the underlying medium cannot be written.
    fn save(&self, map: &QueryMap) -> Result<()>;
}

/// Query-string store for shareable list views.
#[derive(Debug, Default)]
pub struct UrlQueryStore {
    /// URL without its query part.
    base: String,
    /// Current query string, without the leading `?`.
    query: Mutex<String>,
}

impl UrlQueryStore {
    /// What: Seed a store from a full URL such as a bookmark.
    ///
    /// Details:
    /// - Everything after `?` becomes the stored query; a fragment is dropped.
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        let without_fragment = url.split_once('#').map_or(url, |(u, _)| u);
        let (base, query) = without_fragment
            .split_once('?')
            .unwrap_or((without_fragment, ""));
        Self {
            base: base.to_string(),
            query: Mutex::new(query.to_string()),
        }
    }

    /// Current query string.
    #[must_use]
    pub fn query_string(&self) -> String {
        match self.query.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Shareable URL for the current state.
    #[must_use]
    pub fn url(&self) -> String {
        let query = self.query_string();
        if query.is_empty() {
            self.base.clone()
        } else {
            format!("{}?{query}", self.base)
        }
    }
}

impl StateStore for UrlQueryStore {
    fn load(&self) -> Option<QueryMap> {
        let query = self.query_string();
        if query.trim().is_empty() {
            return None;
        }
        Some(codec::parse_query_string(&query))
    }

    fn save(&self, map: &QueryMap) -> Result<()> {
        let rendered = codec::to_query_string(map);
        let mut guard = match self.query.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = rendered;
        Ok(())
    }
}

/// JSON file store for simple list views.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    /// File holding the encoded map.
    path: PathBuf,
}

impl LocalFileStore {
    /// Store backed by `path`.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// What: Store for a named view under the views directory.
    ///
    /// Inputs:
    /// - `view`: View name, e.g. `"roles"`; path separators are replaced.
    #[must_use]
    pub fn for_view(view: &str) -> Self {
        let name: String = view
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        Self::new(crate::settings::views_dir().join(format!("{name}.json")))
    }

    /// File this store reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for LocalFileStore {
    fn load(&self) -> Option<QueryMap> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                tracing::debug!(
                    path = %self.path.display(),
                    error = %e,
                    "[Persist] No stored list state"
                );
                return None;
            }
        };
        match serde_json::from_str::<QueryMap>(&content) {
            Ok(map) => Some(map),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "[Persist] Ignoring corrupt list state"
                );
                None
            }
        }
    }

    fn save(&self, map: &QueryMap) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let s = serde_json::to_string(map)?;
        tracing::trace!(
            path = %self.path.display(),
            bytes = s.len(),
            "[Persist] Writing list state to disk"
        );
        fs::write(&self.path, s)?;
        Ok(())
    }
}

/// Codec plus store for one list view.
#[derive(Clone)]
pub struct ListPersistence {
    /// Durable store.
    store: Arc<dyn StateStore>,
    /// Values used when the store is empty or unusable.
    defaults: CodecDefaults,
}

impl std::fmt::Debug for ListPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListPersistence")
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl ListPersistence {
    /// Persist through `store`, falling back to `defaults`.
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>, defaults: CodecDefaults) -> Self {
        Self { store, defaults }
    }

    /// View defaults used by the codec.
    #[must_use]
    pub const fn defaults(&self) -> &CodecDefaults {
        &self.defaults
    }

    /// What: Restore the view's state from its store.
    ///
    /// Output:
    /// - Decoded state, or the defaults when nothing usable is stored.
    #[must_use]
    pub fn restore(&self) -> (FilterState, PageState) {
        self.store.load().map_or_else(
            || self.defaults.initial_state(),
            |map| codec::decode(&map, &self.defaults),
        )
    }

    /// What: Encode and save the view's state.
    ///
    /// Details:
    /// - Write failures are logged and swallowed; the view keeps working with
    ///   its in-memory state.
    pub fn persist(&self, filters: &FilterState, page: &PageState) {
        let map = codec::encode(filters, page, &self.defaults);
        if let Err(e) = self.store.save(&map) {
            tracing::warn!(error = %e, "[Persist] Failed to save list state");
        }
    }
}
