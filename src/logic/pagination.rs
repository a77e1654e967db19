//! Page-link window for paginated list views.
//!
//! Links are shown in decades: pages 1..=10, 11..=20 and so on. A page that
//! is a multiple of ten is the last link of its own decade, so page 20 shows
//! 11..=20 rather than 20..=29. Bookmarked list URLs depend on this.

/// Number of page links shown at once.
pub const WINDOW_SIZE: u32 = 10;

/// Visible page links plus the pages the "next"/"previous" controls jump to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageWindow {
    /// Ascending, contiguous page numbers.
    pub window: Vec<u32>,
    /// First page after the window; may exceed the page count.
    pub next_page: u32,
    /// Last page before the window; `0` when the window starts at page 1.
    pub previous_page: u32,
}

impl PageWindow {
    /// Whether `next_page` points at a real page.
    #[must_use]
    pub fn has_next(&self, total_pages: u32) -> bool {
        !self.window.is_empty() && self.next_page <= total_pages
    }

    /// Whether `previous_page` points at a real page.
    #[must_use]
    pub fn has_previous(&self) -> bool {
        !self.window.is_empty() && self.previous_page >= 1
    }
}

/// What: Compute the decade of page links that contains `page`.
///
/// Inputs:
/// - `page`: Current page (a `0` is treated as page 1).
/// - `total_pages`: Page count from the last response.
///
/// Output:
/// - `PageWindow` with at most [`WINDOW_SIZE`] pages clipped to `1..=total_pages`.
///
/// Details:
/// - Start is `floor((page-1)/10)*10 + 1`, end is `min(ceil(page/10)*10, total_pages)`.
/// - `next_page`/`previous_page` are `end + 1`/`start - 1` and are not range
///   checked; callers disable navigation with [`PageWindow::has_next`] and
///   [`PageWindow::has_previous`].
/// - `total_pages == 0` yields an empty window.
#[must_use]
pub fn compute_window(page: u32, total_pages: u32) -> PageWindow {
    let page = page.max(1);
    let start = ((page - 1) / WINDOW_SIZE) * WINDOW_SIZE + 1;
    let decade_end = page.div_ceil(WINDOW_SIZE).saturating_mul(WINDOW_SIZE);
    let end = decade_end.min(total_pages);
    let window = if start <= end {
        (start..=end).collect()
    } else {
        Vec::new()
    };
    PageWindow {
        window,
        next_page: end.saturating_add(1),
        previous_page: start - 1,
    }
}
