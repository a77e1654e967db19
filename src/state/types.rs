//! Core value types shared by Galaxy list views.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Largest page size the list endpoints accept.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Page size used when neither the view nor the persisted state supplies one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Filter categories a list view can narrow results by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FilterCategory {
    /// Free-text keyword matched against names and descriptions.
    Keyword,
    /// Galaxy tag.
    Tag,
    /// Supported OS platform.
    Platform,
    /// Supported cloud platform.
    CloudPlatform,
    /// Role author (namespace owner).
    Author,
    /// Role type (`ANS`, `CON`, `APP`, `DEM`).
    RoleType,
}

impl FilterCategory {
    /// Every category in persisted-key order.
    pub const ALL: [Self; 6] = [
        Self::Keyword,
        Self::Tag,
        Self::Platform,
        Self::CloudPlatform,
        Self::Author,
        Self::RoleType,
    ];

    /// Short key used when the category is persisted in a URL or local store.
    #[must_use]
    pub const fn query_key(self) -> &'static str {
        match self {
            Self::Keyword => "autocomplete",
            Self::Tag => "tags",
            Self::Platform => "platform",
            Self::CloudPlatform => "cats",
            Self::Author => "users",
            Self::RoleType => "role_type",
        }
    }

    /// Query parameter understood by the role search endpoint.
    #[must_use]
    pub const fn api_param(self) -> &'static str {
        match self {
            Self::Keyword => "autocomplete",
            Self::Tag => "tags_autocomplete",
            Self::Platform => "platforms_autocomplete",
            Self::CloudPlatform => "cloud_platforms_autocomplete",
            Self::Author => "username_autocomplete",
            Self::RoleType => "role_type",
        }
    }

    /// Return the name used for this category in settings and on the command line.
    ///
    /// Inputs: none
    ///
    /// Output: Static config key string.
    #[must_use]
    pub const fn as_config_key(self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Tag => "tag",
            Self::Platform => "platform",
            Self::CloudPlatform => "cloud_platform",
            Self::Author => "author",
            Self::RoleType => "role_type",
        }
    }

    /// Parse a category from its config name or common aliases.
    ///
    /// Inputs: `s` config string (case-insensitive).
    ///
    /// Output: `Some(FilterCategory)` on recognized value; `None` otherwise.
    #[must_use]
    pub fn from_config_key(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "keyword" | "keywords" | "autocomplete" => Some(Self::Keyword),
            "tag" | "tags" => Some(Self::Tag),
            "platform" | "platforms" => Some(Self::Platform),
            "cloud_platform" | "cloud_platforms" | "cats" => Some(Self::CloudPlatform),
            "author" | "authors" | "user" | "users" => Some(Self::Author),
            "role_type" | "type" => Some(Self::RoleType),
            _ => None,
        }
    }
}

/// Direction of the active sort.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first; rendered as a `-` prefix on `order_by`.
    Descending,
}

/// One entry of the enumerated sort options a view declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortOption {
    /// Backend field name passed through `order_by`.
    pub key: String,
    /// Label for display.
    pub label: String,
}

impl SortOption {
    /// Build a sort option from a key and a display label.
    #[must_use]
    pub fn new(key: &str, label: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
        }
    }
}

/// Active filters and sort order for one list view.
///
/// Values inside a category are unique and keep insertion order. Categories
/// without values are not stored, so two states with the same visible filters
/// compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    /// Values per category; never holds an empty vector.
    filters: BTreeMap<FilterCategory, Vec<String>>,
    /// Active sort key.
    pub sort_key: String,
    /// Active sort direction.
    pub direction: SortDirection,
}

impl FilterState {
    /// Create an empty filter set sorted by `sort_key` ascending.
    #[must_use]
    pub fn new(sort_key: &str) -> Self {
        Self {
            filters: BTreeMap::new(),
            sort_key: sort_key.to_string(),
            direction: SortDirection::Ascending,
        }
    }

    /// Values currently active for `category`.
    #[must_use]
    pub fn values(&self, category: FilterCategory) -> &[String] {
        self.filters.get(&category).map_or(&[][..], Vec::as_slice)
    }

    /// Whether `(category, value)` is already active.
    #[must_use]
    pub fn contains(&self, category: FilterCategory, value: &str) -> bool {
        self.values(category).iter().any(|v| v == value)
    }

    /// What: Add a value to a category unless it is already present.
    ///
    /// Output:
    /// - `true` when the value was added, `false` for a duplicate.
    pub fn insert(&mut self, category: FilterCategory, value: &str) -> bool {
        if self.contains(category, value) {
            return false;
        }
        self.filters
            .entry(category)
            .or_default()
            .push(value.to_string());
        true
    }

    /// What: Remove the first matching value from a category.
    ///
    /// Output:
    /// - `true` when a value was removed, `false` when nothing matched.
    ///
    /// Details:
    /// - Drops the category entry once its last value is gone.
    pub fn remove(&mut self, category: FilterCategory, value: &str) -> bool {
        let Some(values) = self.filters.get_mut(&category) else {
            return false;
        };
        let Some(pos) = values.iter().position(|v| v == value) else {
            return false;
        };
        values.remove(pos);
        if values.is_empty() {
            self.filters.remove(&category);
        }
        true
    }

    /// Drop every filter value while keeping the sort order.
    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    /// Whether no filter value is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Iterate over categories that carry at least one value.
    pub fn iter(&self) -> impl Iterator<Item = (FilterCategory, &[String])> {
        self.filters.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// What: Return the canonical form of this filter set.
    ///
    /// Output:
    /// - A copy where every value is split on whitespace, empty tokens are
    ///   dropped and duplicates within a category are removed (first wins).
    #[must_use]
    pub fn normalized(&self) -> Self {
        let mut out = Self {
            filters: BTreeMap::new(),
            sort_key: self.sort_key.clone(),
            direction: self.direction,
        };
        for (category, values) in &self.filters {
            for token in values.iter().flat_map(|v| v.split_whitespace()) {
                out.insert(*category, token);
            }
        }
        out
    }
}

/// Pagination bookkeeping for a list view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    /// Current page, starting at 1.
    pub page: u32,
    /// Items per page, between 1 and [`MAX_PAGE_SIZE`].
    pub page_size: u32,
    /// Total matching items reported by the server.
    pub total_count: u64,
    /// Total pages reported by the server.
    pub total_pages: u32,
    /// Page links to render, at most ten, containing `page`.
    pub visible_window: Vec<u32>,
}

impl Default for PageState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl PageState {
    /// Page 1 with no totals yet; `page_size` is clamped into range.
    #[must_use]
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            total_count: 0,
            total_pages: 0,
            visible_window: Vec::new(),
        }
    }

    /// Same page size, back on page 1, totals cleared.
    #[must_use]
    pub fn first_page(&self) -> Self {
        Self::new(self.page_size)
    }

    /// What: Apply totals from a server response and recompute the visible window.
    ///
    /// Inputs:
    /// - `page`: Page the server says it returned.
    /// - `total_count`: Matching item count.
    /// - `total_pages`: Page count.
    pub fn apply_totals(&mut self, page: u32, total_count: u64, total_pages: u32) {
        self.page = page.max(1);
        self.total_count = total_count;
        self.total_pages = total_pages;
        self.visible_window = crate::logic::compute_window(self.page, total_pages).window;
    }
}

/// Lifecycle of a list fetch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListStatus {
    /// Nothing in flight.
    #[default]
    Idle,
    /// A request is outstanding.
    Loading,
    /// The last applied request failed.
    Error,
}

/// Rendered collection for one filter/page pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult<T> {
    /// Items of the current page.
    pub items: Vec<T>,
    /// Fetch status.
    pub status: ListStatus,
    /// Message for the user when `status` is `Error`.
    pub error: Option<String>,
    /// Filters the items were fetched for.
    pub filters: FilterState,
    /// Page bookkeeping the items belong to.
    pub page: PageState,
}

impl<T> Default for ListResult<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            status: ListStatus::Idle,
            error: None,
            filters: FilterState::default(),
            page: PageState::default(),
        }
    }
}

/// Refresh request emitted by the filter state machine.
#[derive(Clone, Debug, PartialEq)]
pub struct RefreshRequest {
    /// Monotonic identifier used to correlate responses.
    pub id: u64,
    /// Canonical filters at the time of the request.
    pub filters: FilterState,
    /// Page to fetch.
    pub page: PageState,
}

/// Server response envelope for paginated list endpoints.
///
/// Empty result sets have been seen without `cur_page`/`num_pages`, so every
/// pagination field is optional.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Page<T> {
    /// Total matching items.
    #[serde(default)]
    pub count: Option<u64>,
    /// Page the server returned.
    #[serde(default)]
    pub cur_page: Option<u32>,
    /// Total pages.
    #[serde(default)]
    pub num_pages: Option<u32>,
    /// Items of this page.
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

/// Summary of a role as returned by the search endpoint.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Role {
    /// Server-side identifier.
    #[serde(default)]
    pub id: u64,
    /// Role name.
    #[serde(default)]
    pub name: String,
    /// Owning namespace (older servers call it `username`).
    #[serde(default, alias = "username")]
    pub namespace: String,
    /// One-line description.
    #[serde(default)]
    pub description: String,
    /// Role type code.
    #[serde(default)]
    pub role_type: String,
    /// Download counter.
    #[serde(default)]
    pub download_count: u64,
    /// GitHub stargazers.
    #[serde(default)]
    pub stargazers_count: u64,
    /// Community score between 0 and 5.
    #[serde(default)]
    pub average_score: Option<f64>,
    /// Star glyphs derived from `average_score`; display only.
    #[serde(skip)]
    pub stars: String,
}

impl Role {
    /// What: Derive the star glyphs shown next to a role.
    ///
    /// Details:
    /// - Rounds the score to the nearest whole star and pads to five glyphs.
    /// - Roles without a score get an empty string.
    pub fn decorate(&mut self) {
        self.stars = match self.average_score {
            Some(score) if score.is_finite() => {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let filled = score.clamp(0.0, 5.0).round() as usize;
                format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
            }
            _ => String::new(),
        };
    }

    /// `namespace.name`, the identifier users type on the command line.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }
}

/// State of a repository import job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImportState {
    /// Queued, not started.
    #[default]
    Pending,
    /// Being processed.
    Running,
    /// Finished successfully.
    Success,
    /// Finished with errors.
    Failed,
}

impl ImportState {
    /// Whether no further state change is expected.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    /// Parse the state string reported by the imports endpoint.
    ///
    /// Inputs: `s` state string (case-insensitive).
    ///
    /// Output: `Some(ImportState)` on recognized value; `None` otherwise.
    #[must_use]
    pub fn from_api(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "RUNNING" => Some(Self::Running),
            "SUCCESS" => Some(Self::Success),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    /// State string as the imports endpoint spells it.
    #[must_use]
    pub const fn as_api_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        }
    }
}

/// One import job tracked by the polling refresher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollTarget {
    /// GitHub user or organization.
    pub owner: String,
    /// Source repository name.
    pub repo: String,
    /// Last observed state.
    pub state: ImportState,
}

impl PollTarget {
    /// A freshly requested import, `Pending` until the first tick.
    #[must_use]
    pub fn new(owner: &str, repo: &str) -> Self {
        Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
            state: ImportState::Pending,
        }
    }

    /// What: Parse an `owner/repo` pair.
    ///
    /// Output:
    /// - `None` unless both halves are non-empty.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let (owner, repo) = s.trim().split_once('/')?;
        let (owner, repo) = (owner.trim(), repo.trim());
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some(Self::new(owner, repo))
    }

    /// Composite key identifying the job.
    #[must_use]
    pub fn key(&self) -> (&str, &str) {
        (&self.owner, &self.repo)
    }
}
