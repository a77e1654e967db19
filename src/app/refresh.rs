//! List refresh controller: one fetch-and-apply cycle per request, newest
//! request wins.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use super::persist::ListPersistence;
use crate::sources::ListFetcher;
use crate::state::{FilterState, ListResult, ListStatus, Page, PageState, RefreshRequest};

/// Mutable controller state guarded by one lock.
#[derive(Debug)]
struct Inner<T> {
    /// Ticket of the most recently issued request.
    latest_ticket: u64,
    /// What the view currently shows.
    result: ListResult<T>,
}

/// Result of one refresh call.
#[derive(Debug, Clone)]
pub struct RefreshOutcome<T> {
    /// Whether this call's response was applied (it was still the newest).
    pub applied: bool,
    /// Controller state after the call.
    pub result: ListResult<T>,
}

/// Owns the rendered list of one view and applies fetch responses to it.
pub struct ListController<T, F> {
    /// Source of pages.
    fetcher: F,
    /// Where successful state is persisted; `None` for ephemeral views.
    persistence: Option<ListPersistence>,
    /// Guarded state.
    inner: Mutex<Inner<T>>,
}

impl<T, F> std::fmt::Debug for ListController<T, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListController")
            .field("persistence", &self.persistence)
            .finish_non_exhaustive()
    }
}

impl<T, F> ListController<T, F>
where
    T: Clone + Send,
    F: ListFetcher<T>,
{
    /// Controller in the `Idle` state with an empty result.
    #[must_use]
    pub fn new(fetcher: F, persistence: Option<ListPersistence>) -> Self {
        Self {
            fetcher,
            persistence,
            inner: Mutex::new(Inner {
                latest_ticket: 0,
                result: ListResult::default(),
            }),
        }
    }

    /// Lock the inner state, recovering from a poisoned lock.
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Copy of what the view currently shows.
    #[must_use]
    pub fn snapshot(&self) -> ListResult<T> {
        self.lock().result.clone()
    }

    /// Current fetch status.
    #[must_use]
    pub fn status(&self) -> ListStatus {
        self.lock().result.status
    }

    /// What: Fetch `page` for `filters` and apply the response if still newest.
    ///
    /// Inputs:
    /// - `filters`: Canonical filters to fetch.
    /// - `page`: Page and page size to fetch.
    ///
    /// Output:
    /// - The controller's `ListResult` after this call.
    ///
    /// Details:
    /// - Calls may overlap; a response whose request was superseded is dropped.
    /// - On success items are replaced, totals updated from the envelope, the
    ///   page window recomputed and the state persisted.
    /// - On error items are cleared, the status becomes `Error` with a message,
    ///   and persisted state is left alone.
    pub async fn refresh(&self, filters: FilterState, page: PageState) -> ListResult<T> {
        self.refresh_tracked(filters, page).await.result
    }

    /// Same as [`Self::refresh`], also reporting whether the response was applied.
    pub async fn refresh_tracked(&self, filters: FilterState, page: PageState) -> RefreshOutcome<T> {
        let ticket = self.reserve_ticket();
        self.refresh_with_ticket(ticket, filters, page).await
    }

    /// What: Claim the next ticket and mark the view as loading.
    ///
    /// Output:
    /// - The ticket; any ticket reserved earlier is now superseded.
    ///
    /// Details:
    /// - Reserving is synchronous so callers fix request order before the
    ///   fetch is scheduled.
    #[must_use]
    pub fn reserve_ticket(&self) -> u64 {
        let mut inner = self.lock();
        inner.latest_ticket += 1;
        inner.result.status = ListStatus::Loading;
        inner.latest_ticket
    }

    /// What: Fetch and apply under a ticket from [`Self::reserve_ticket`].
    ///
    /// Inputs:
    /// - `ticket`: Ticket reserved for this request.
    /// - `filters`, `page`: What to fetch.
    ///
    /// Output:
    /// - Whether the response was applied, and the controller state after it.
    pub async fn refresh_with_ticket(
        &self,
        ticket: u64,
        filters: FilterState,
        page: PageState,
    ) -> RefreshOutcome<T> {
        tracing::debug!(ticket, page = page.page, "[Refresh] Fetching list page");

        let response = self.fetcher.fetch_page(&filters, &page).await;

        let (outcome, persist) = {
            let mut inner = self.lock();
            if ticket != inner.latest_ticket {
                tracing::debug!(
                    ticket,
                    latest = inner.latest_ticket,
                    "[Refresh] Dropping superseded response"
                );
                return RefreshOutcome {
                    applied: false,
                    result: inner.result.clone(),
                };
            }
            let persist = match response {
                Ok(envelope) => {
                    inner.result = apply_page(envelope, filters, page);
                    tracing::debug!(
                        ticket,
                        items = inner.result.items.len(),
                        total = inner.result.page.total_count,
                        "[Refresh] Applied list page"
                    );
                    true
                }
                Err(e) => {
                    tracing::warn!(ticket, error = %e, "[Refresh] List fetch failed");
                    inner.result = ListResult {
                        items: Vec::new(),
                        status: ListStatus::Error,
                        error: Some(e.to_string()),
                        filters,
                        page,
                    };
                    false
                }
            };
            (
                RefreshOutcome {
                    applied: true,
                    result: inner.result.clone(),
                },
                persist,
            )
        };

        if persist && let Some(persistence) = &self.persistence {
            persistence.persist(&outcome.result.filters, &outcome.result.page);
        }
        outcome
    }
}

/// What: Build the applied result from a response envelope.
///
/// Details:
/// - Missing `cur_page`/`num_pages` default to 1 and a missing `count` to 0,
///   so an empty result set never leaves a corrupt page state behind.
fn apply_page<T>(envelope: Page<T>, filters: FilterState, mut page: PageState) -> ListResult<T> {
    let current = envelope.cur_page.filter(|p| *p >= 1).unwrap_or(1);
    let total_pages = envelope.num_pages.unwrap_or(1);
    let total_count = envelope.count.unwrap_or(0);
    page.apply_totals(current, total_count, total_pages);
    ListResult {
        items: envelope.results,
        status: ListStatus::Idle,
        error: None,
        filters,
        page,
    }
}

/// What: Drive a controller from the filter machine's refresh channel.
///
/// Inputs:
/// - `controller`: Shared controller.
/// - `requests`: Receiver paired with a `FilterMachine`'s trigger.
/// - `applied`: Receives `(request id, result)` for every applied response.
///
/// Details:
/// - Tickets are reserved in receive order before each task is spawned, so
///   the newest request wins whichever task the runtime polls first.
/// - Each request runs in its own task so a newer request never waits for an
///   older one; the controller drops superseded responses.
/// - Returns once the request channel closes and every spawned fetch ended.
pub async fn run_refresh_loop<T, F>(
    controller: Arc<ListController<T, F>>,
    mut requests: mpsc::UnboundedReceiver<RefreshRequest>,
    applied: mpsc::UnboundedSender<(u64, ListResult<T>)>,
) where
    T: Clone + Send + Sync + 'static,
    F: ListFetcher<T> + 'static,
{
    let mut tasks = Vec::new();
    while let Some(request) = requests.recv().await {
        let controller = Arc::clone(&controller);
        let applied = applied.clone();
        let ticket = controller.reserve_ticket();
        tasks.push(tokio::spawn(async move {
            let outcome = controller
                .refresh_with_ticket(ticket, request.filters, request.page)
                .await;
            if outcome.applied {
                let _ = applied.send((request.id, outcome.result));
            }
        }));
        tasks.retain(|t| !t.is_finished());
    }
    for task in tasks {
        let _ = task.await;
    }
    tracing::debug!("[Refresh] Request channel closed; refresh loop finished");
}
