//! A list view: persisted state, filter machine and refresh controller wired
//! together.

use tokio::sync::mpsc;

use super::persist::ListPersistence;
use super::refresh::ListController;
use crate::error::Result;
use crate::logic::FilterMachine;
use crate::sources::ListFetcher;
use crate::state::{ListResult, ListStatus, RefreshRequest, SortOption};

/// One list view driven step by step by its caller.
pub struct ListView<T, F> {
    /// Filter/sort/page state machine.
    machine: FilterMachine,
    /// Refresh requests emitted by `machine`.
    requests: mpsc::UnboundedReceiver<RefreshRequest>,
    /// Applies responses and persists successful state.
    controller: ListController<T, F>,
}

impl<T, F> std::fmt::Debug for ListView<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListView")
            .field("machine", &self.machine)
            .finish_non_exhaustive()
    }
}

impl<T, F> ListView<T, F>
where
    T: Clone + Send,
    F: ListFetcher<T>,
{
    /// What: Open a view on its persisted state.
    ///
    /// Inputs:
    /// - `fetcher`: Page source.
    /// - `persistence`: Store and defaults of this view.
    /// - `sort_options`: Sort keys the view offers.
    ///
    /// Output:
    /// - The view; nothing has been fetched yet.
    ///
    /// # Errors
    /// - Returns `Err` when `sort_options` is empty.
    pub fn open(
        fetcher: F,
        persistence: ListPersistence,
        sort_options: Vec<SortOption>,
    ) -> Result<Self> {
        let (filters, page) = persistence.restore();
        tracing::debug!(page = page.page, page_size = page.page_size, "[View] Restored list state");
        let (trigger, requests) = mpsc::unbounded_channel();
        let machine = FilterMachine::new(sort_options, filters, page, trigger)?;
        Ok(Self {
            machine,
            requests,
            controller: ListController::new(fetcher, Some(persistence)),
        })
    }

    /// Filter machine of this view.
    #[must_use]
    pub const fn machine(&self) -> &FilterMachine {
        &self.machine
    }

    /// Mutable filter machine; its operations queue refreshes for [`Self::settle`].
    pub const fn machine_mut(&mut self) -> &mut FilterMachine {
        &mut self.machine
    }

    /// Controller of this view.
    #[must_use]
    pub const fn controller(&self) -> &ListController<T, F> {
        &self.controller
    }

    /// What: Run the newest queued refresh.
    ///
    /// Output:
    /// - The applied result, or `None` when no refresh was queued.
    ///
    /// Details:
    /// - Older queued requests are skipped without a fetch.
    /// - After a successful fetch the machine adopts the page the server
    ///   reported, so follow-up page moves start from it.
    pub async fn settle(&mut self) -> Option<ListResult<T>> {
        let mut latest = None;
        while let Ok(request) = self.requests.try_recv() {
            if let Some(skipped) = latest.replace(request) {
                tracing::trace!(id = skipped.id, "[View] Skipping superseded request");
            }
        }
        let request = latest?;
        let result = self.controller.refresh(request.filters, request.page).await;
        if result.status != ListStatus::Error {
            self.machine.sync_page(&result.page);
        }
        Some(result)
    }
}
