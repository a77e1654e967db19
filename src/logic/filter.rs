//! Search/filter state machine for list views.
//!
//! Holds the canonical filters, sort and page of one view and turns user
//! actions into exactly one refresh request each. Requests carry monotonic ids
//! so the consumer can drop responses that a newer request superseded.

use tokio::sync::mpsc;

use crate::error::{GalaxyError, Result};
use crate::state::{
    FilterCategory, FilterState, MAX_PAGE_SIZE, PageState, RefreshRequest, SortDirection,
    SortOption,
};

/// Canonical filter state of one list view plus its refresh trigger.
#[derive(Debug)]
pub struct FilterMachine {
    /// Active filters and sort.
    filters: FilterState,
    /// Page to request next.
    page: PageState,
    /// Sort options the view declared; never empty.
    sort_options: Vec<SortOption>,
    /// Channel to the refresh loop.
    trigger: mpsc::UnboundedSender<RefreshRequest>,
    /// Id the next request will carry.
    next_request_id: u64,
    /// Id of the most recent request sent.
    latest_request_id: u64,
}

impl FilterMachine {
    /// What: Create a state machine from restored (or default) state.
    ///
    /// Inputs:
    /// - `sort_options`: Enumerated sort keys of the view; the first is the fallback.
    /// - `filters`: Initial filters, e.g. from `ListPersistence::restore`.
    /// - `page`: Initial page.
    /// - `trigger`: Channel the refresh loop listens on.
    ///
    /// Output:
    /// - The machine, or `Err(Validation)` when no sort option was declared.
    ///
    /// Details:
    /// - An initial sort key that is not declared is replaced by the first option.
    /// - No refresh is sent; call [`Self::refresh`] for the initial load.
    ///
    /// # Errors
    /// - Returns `Err` when `sort_options` is empty.
    pub fn new(
        sort_options: Vec<SortOption>,
        mut filters: FilterState,
        page: PageState,
        trigger: mpsc::UnboundedSender<RefreshRequest>,
    ) -> Result<Self> {
        let Some(first) = sort_options.first() else {
            return Err(GalaxyError::Validation(
                "a list view needs at least one sort option".to_string(),
            ));
        };
        if !sort_options.iter().any(|o| o.key == filters.sort_key) {
            tracing::debug!(
                requested = %filters.sort_key,
                fallback = %first.key,
                "[Filter] Restored sort key is not offered; using first option"
            );
            filters.sort_key.clone_from(&first.key);
        }
        Ok(Self {
            filters,
            page,
            sort_options,
            trigger,
            next_request_id: 1,
            latest_request_id: 0,
        })
    }

    /// Current canonical filters.
    #[must_use]
    pub const fn canonical_filters(&self) -> &FilterState {
        &self.filters
    }

    /// Page the next refresh will request.
    #[must_use]
    pub const fn page(&self) -> &PageState {
        &self.page
    }

    /// Sort options declared by the view.
    #[must_use]
    pub fn sort_options(&self) -> &[SortOption] {
        &self.sort_options
    }

    /// Id of the most recently issued refresh request (`0` before the first).
    #[must_use]
    pub const fn latest_request_id(&self) -> u64 {
        self.latest_request_id
    }

    /// What: Add filter values for a category.
    ///
    /// Inputs:
    /// - `category`: Filter category.
    /// - `value`: Value typed or picked by the user; whitespace separates several values.
    ///
    /// Output:
    /// - `Ok(true)` when something was added and a refresh was sent,
    ///   `Ok(false)` when every value was already active (no refresh).
    ///
    /// # Errors
    /// - Returns `Err(Validation)` for a blank value; nothing is sent.
    pub fn apply_keyword(&mut self, category: FilterCategory, value: &str) -> Result<bool> {
        let mut tokens = value.split_whitespace().peekable();
        if tokens.peek().is_none() {
            return Err(GalaxyError::Validation(format!(
                "empty {} filter",
                category.as_config_key()
            )));
        }
        let mut changed = false;
        for token in tokens {
            changed |= self.filters.insert(category, token);
        }
        if changed {
            self.page = self.page.first_page();
            self.refresh();
        }
        Ok(changed)
    }

    /// What: Remove filter values from a category.
    ///
    /// Inputs:
    /// - `category`: Filter category.
    /// - `value`: Value to drop; whitespace separates several values, as in
    ///   [`Self::apply_keyword`].
    ///
    /// Output:
    /// - `true` when at least one value was removed and a single refresh was
    ///   sent; `false` when nothing matched (no refresh).
    pub fn remove_keyword(&mut self, category: FilterCategory, value: &str) -> bool {
        let mut changed = false;
        for token in value.split_whitespace() {
            changed |= self.filters.remove(category, token);
        }
        if !changed {
            return false;
        }
        self.page = self.page.first_page();
        self.refresh();
        true
    }

    /// What: Drop every filter value, return to page 1 and refresh.
    ///
    /// Details:
    /// - The sort order is kept.
    pub fn clear_all(&mut self) {
        self.filters.clear_filters();
        self.page = self.page.first_page();
        self.refresh();
    }

    /// What: Change the sort order and refresh from page 1.
    ///
    /// Inputs:
    /// - `key`: Requested sort key.
    /// - `direction`: Requested direction.
    ///
    /// Details:
    /// - An undeclared key is replaced by the first declared option; the
    ///   refresh is still sent with that fallback.
    ///
    /// # Errors
    /// - Returns `Err(Validation)` when `key` was not declared.
    pub fn set_sort(&mut self, key: &str, direction: SortDirection) -> Result<()> {
        let declared = self.sort_options.iter().any(|o| o.key == key);
        let effective = if declared {
            key.to_string()
        } else {
            self.sort_options
                .first()
                .map(|o| o.key.clone())
                .unwrap_or_default()
        };
        self.filters.sort_key = effective;
        self.filters.direction = direction;
        self.page = self.page.first_page();
        self.refresh();
        if declared {
            Ok(())
        } else {
            tracing::debug!(requested = %key, "[Filter] Rejected unknown sort key");
            Err(GalaxyError::Validation(format!("unknown sort key '{key}'")))
        }
    }

    /// Jump to `page` (at least 1) keeping filters, and refresh.
    pub fn set_page(&mut self, page: u32) {
        self.page.page = page.max(1);
        self.refresh();
    }

    /// Change the page size (clamped), go back to page 1 and refresh.
    pub fn set_page_size(&mut self, page_size: u32) {
        self.page = PageState::new(page_size.clamp(1, MAX_PAGE_SIZE));
        self.refresh();
    }

    /// What: Adopt totals from an applied refresh result.
    ///
    /// Details:
    /// - Keeps the machine's page bookkeeping in step with what the view shows,
    ///   without issuing a request.
    pub fn sync_page(&mut self, page: &PageState) {
        self.page.clone_from(page);
    }

    /// What: Send one refresh request for the current state.
    ///
    /// Details:
    /// - Used directly for the initial load and retries; every mutating method
    ///   calls it exactly once.
    /// - A closed channel (view torn down) is logged and ignored.
    pub fn refresh(&mut self) {
        let id = self.next_request_id;
        self.next_request_id += 1;
        self.latest_request_id = id;
        let request = RefreshRequest {
            id,
            filters: self.filters.clone(),
            page: self.page.clone(),
        };
        if self.trigger.send(request).is_err() {
            tracing::debug!(id, "[Filter] Refresh loop is gone; dropping request");
        }
    }
}
