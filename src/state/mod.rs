//! State types shared by list views, the refresh controller and the poller.

pub mod types;

pub use types::{
    DEFAULT_PAGE_SIZE, FilterCategory, FilterState, ImportState, ListResult, ListStatus,
    MAX_PAGE_SIZE, Page, PageState, PollTarget, RefreshRequest, Role, SortDirection, SortOption,
};
