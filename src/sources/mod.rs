//! Network data retrieval: the Galaxy REST client and the seams the list core
//! depends on.
//!
//! The core only talks to these traits, so views can be driven by the real
//! client or by in-memory fakes in tests.

use std::future::Future;

use crate::error::Result;
use crate::state::{FilterCategory, FilterState, ImportState, Page, PageState, PollTarget};

mod galaxy;

pub use galaxy::{GalaxyClient, ROLE_TYPES, role_sort_options};

/// Fetches one page of a list endpoint.
pub trait ListFetcher<T>: Send + Sync {
    /// Fetch the page described by `page` for `filters`.
    ///
    /// # Errors
    /// - Returns `Err` on transport failure, non-2xx status or undecodable body.
    fn fetch_page(
        &self,
        filters: &FilterState,
        page: &PageState,
    ) -> impl Future<Output = Result<Page<T>>> + Send;
}

/// Read-only typeahead lookup.
pub trait SuggestionSource: Send + Sync {
    /// Suggestions for `text` in `category`.
    ///
    /// # Errors
    /// - Returns `Err` when the lookup endpoint fails.
    fn suggest(
        &self,
        category: FilterCategory,
        text: &str,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// Current state of a tracked import job.
pub trait ImportStatusSource: Send + Sync {
    /// Latest state of `target`'s most recent import.
    ///
    /// # Errors
    /// - Returns `Err` when the imports endpoint fails.
    fn import_state(&self, target: &PollTarget) -> impl Future<Output = Result<ImportState>> + Send;
}
