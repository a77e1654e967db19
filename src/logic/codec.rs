//! Mapping between list-view state and its persisted flat key/value form.
//!
//! The same map is written to a URL query string for shareable views and to a
//! local JSON blob for simple views, so key names stay short and stable:
//! `autocomplete`, `page`, `per_page`, `order`, `reverse`, `tags`, `platform`,
//! `cats`, `users`, `role_type`. Older bookmarks used `f` for the keyword and
//! `sort_order` for the sort key; both are still read.

use std::collections::BTreeMap;

use crate::state::{
    DEFAULT_PAGE_SIZE, FilterCategory, FilterState, MAX_PAGE_SIZE, PageState, SortDirection,
};
use crate::util::{percent_decode, percent_encode};

/// Flat, string-keyed persisted form of a list view.
pub type QueryMap = BTreeMap<String, String>;

/// Key for the current page.
pub const KEY_PAGE: &str = "page";
/// Key for the page size.
pub const KEY_PER_PAGE: &str = "per_page";
/// Key for the sort field.
pub const KEY_ORDER: &str = "order";
/// Legacy key for the sort field.
pub const KEY_SORT_ORDER: &str = "sort_order";
/// Key for the descending flag.
pub const KEY_REVERSE: &str = "reverse";
/// Legacy key for the keyword filter.
pub const KEY_KEYWORD_LEGACY: &str = "f";

/// Separator between values of one multi-value category.
const VALUE_DELIMITER: &str = " ";

/// Values a view falls back to when nothing is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecDefaults {
    /// Sort key when none is stored.
    pub sort_key: String,
    /// Sort direction when none is stored.
    pub direction: SortDirection,
    /// Page size when none is stored.
    pub page_size: u32,
}

impl CodecDefaults {
    /// Defaults sorting ascending by `sort_key` with the standard page size.
    #[must_use]
    pub fn new(sort_key: &str) -> Self {
        Self {
            sort_key: sort_key.to_string(),
            direction: SortDirection::Ascending,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Filter and page state a view starts from when nothing is stored.
    #[must_use]
    pub fn initial_state(&self) -> (FilterState, PageState) {
        let mut filters = FilterState::new(&self.sort_key);
        filters.direction = self.direction;
        (filters, PageState::new(self.page_size))
    }
}

/// What: Encode filters and page into the persisted key/value form.
///
/// Inputs:
/// - `filters`: Active filters and sort.
/// - `page`: Current page bookkeeping.
/// - `defaults`: View defaults; values equal to them are omitted.
///
/// Output:
/// - `QueryMap` holding only the keys that differ from defaults.
///
/// Details:
/// - Multi-value categories are joined with a single space.
/// - Totals and the visible window are not persisted; they come from the server.
#[must_use]
pub fn encode(filters: &FilterState, page: &PageState, defaults: &CodecDefaults) -> QueryMap {
    let mut map = QueryMap::new();
    for (category, values) in filters.iter() {
        let joined = values
            .iter()
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .collect::<Vec<_>>()
            .join(VALUE_DELIMITER);
        if !joined.is_empty() {
            map.insert(category.query_key().to_string(), joined);
        }
    }
    if page.page > 1 {
        map.insert(KEY_PAGE.to_string(), page.page.to_string());
    }
    if page.page_size != defaults.page_size {
        map.insert(KEY_PER_PAGE.to_string(), page.page_size.to_string());
    }
    if !filters.sort_key.is_empty() && filters.sort_key != defaults.sort_key {
        map.insert(KEY_ORDER.to_string(), filters.sort_key.clone());
    }
    if filters.direction != defaults.direction {
        let reverse = filters.direction == SortDirection::Descending;
        map.insert(KEY_REVERSE.to_string(), reverse.to_string());
    }
    map
}

/// What: Decode a persisted key/value map back into filters and page.
///
/// Inputs:
/// - `map`: Persisted form, possibly hand-edited or truncated.
/// - `defaults`: Values to use for missing or unusable keys.
///
/// Output:
/// - `(FilterState, PageState)`; never fails.
///
/// Details:
/// - A non-numeric or zero page decodes as page 1.
/// - A non-numeric page size falls back to the default; numbers are clamped
///   to `1..=MAX_PAGE_SIZE`.
/// - Duplicate values inside a category are dropped.
#[must_use]
pub fn decode(map: &QueryMap, defaults: &CodecDefaults) -> (FilterState, PageState) {
    let (mut filters, mut page) = defaults.initial_state();

    for category in FilterCategory::ALL {
        let raw = map.get(category.query_key()).or_else(|| {
            (category == FilterCategory::Keyword)
                .then(|| map.get(KEY_KEYWORD_LEGACY))
                .flatten()
        });
        if let Some(raw) = raw {
            for value in raw.split_whitespace() {
                filters.insert(category, value);
            }
        }
    }

    if let Some(order) = map
        .get(KEY_ORDER)
        .or_else(|| map.get(KEY_SORT_ORDER))
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
    {
        order.clone_into(&mut filters.sort_key);
    }
    if let Some(reverse) = map.get(KEY_REVERSE).and_then(|s| parse_flag(s)) {
        filters.direction = if reverse {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
    }

    page.page = map
        .get(KEY_PAGE)
        .and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1);
    page.page_size = map
        .get(KEY_PER_PAGE)
        .and_then(|s| s.trim().parse::<u32>().ok())
        .map_or(defaults.page_size, |n| n.clamp(1, MAX_PAGE_SIZE));

    (filters, page)
}

/// Parse a boolean flag written by this codec or typed by hand.
fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// What: Render a persisted map as a URL query string (without the leading `?`).
///
/// Details:
/// - Keys are emitted in sorted order so identical state yields identical URLs.
#[must_use]
pub fn to_query_string(map: &QueryMap) -> String {
    map.iter()
        .map(|(k, v)| format!("{}={}", percent_encode(k), percent_encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// What: Parse a URL query string into a persisted map.
///
/// Inputs:
/// - `query`: Query part of a URL, with or without a leading `?`; a full URL
///   is accepted too.
///
/// Output:
/// - Decoded map; pairs without a key are skipped and later duplicates win.
#[must_use]
pub fn parse_query_string(query: &str) -> QueryMap {
    let query = query.split_once('?').map_or(query, |(_, q)| q);
    let query = query.split_once('#').map_or(query, |(q, _)| q);
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            let key = percent_decode(k);
            (!key.is_empty()).then(|| (key, percent_decode(v)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> CodecDefaults {
        CodecDefaults::new("name")
    }

    fn sample() -> (FilterState, PageState) {
        let mut filters = FilterState::new("download_count");
        filters.direction = SortDirection::Descending;
        filters.insert(FilterCategory::Keyword, "nginx");
        filters.insert(FilterCategory::Keyword, "proxy");
        filters.insert(FilterCategory::Tag, "web");
        filters.insert(FilterCategory::Platform, "EL");
        filters.insert(FilterCategory::CloudPlatform, "aws");
        filters.insert(FilterCategory::Author, "geerlingguy");
        filters.insert(FilterCategory::RoleType, "ANS");
        let mut page = PageState::new(25);
        page.page = 3;
        (filters, page)
    }

    #[test]
    /// What: Default state encodes to an empty map.
    ///
    /// Inputs:
    /// - The initial state of a view
    ///
    /// Output:
    /// - No keys at all, keeping URLs short
    fn encode_omits_defaults() {
        let (filters, page) = defaults().initial_state();
        assert!(encode(&filters, &page, &defaults()).is_empty());
    }

    #[test]
    /// What: Every non-default field is written under its short key.
    fn encode_writes_short_keys() {
        let (filters, page) = sample();
        let map = encode(&filters, &page, &defaults());
        assert_eq!(map.get("autocomplete").map(String::as_str), Some("nginx proxy"));
        assert_eq!(map.get("tags").map(String::as_str), Some("web"));
        assert_eq!(map.get("platform").map(String::as_str), Some("EL"));
        assert_eq!(map.get("cats").map(String::as_str), Some("aws"));
        assert_eq!(map.get("users").map(String::as_str), Some("geerlingguy"));
        assert_eq!(map.get("role_type").map(String::as_str), Some("ANS"));
        assert_eq!(map.get("page").map(String::as_str), Some("3"));
        assert_eq!(map.get("per_page").map(String::as_str), Some("25"));
        assert_eq!(map.get("order").map(String::as_str), Some("download_count"));
        assert_eq!(map.get("reverse").map(String::as_str), Some("true"));
    }

    /// Filters sorted by `sort_key` with `direction`, holding `values`.
    fn state(
        sort_key: &str,
        direction: SortDirection,
        values: &[(FilterCategory, &str)],
        page: u32,
        page_size: u32,
    ) -> (FilterState, PageState) {
        let mut filters = FilterState::new(sort_key);
        filters.direction = direction;
        for (category, value) in values {
            filters.insert(*category, value);
        }
        let mut page_state = PageState::new(page_size);
        page_state.page = page;
        (filters, page_state)
    }

    #[test]
    /// What: Decoding an encoded state gives back the normalized state.
    ///
    /// Inputs:
    /// - States that differ from the defaults in one field at a time, each
    ///   category on its own, the full sample with a multi-word duplicate, and
    ///   values holding `+`, `%`, `&`, `=` and non-ASCII text
    ///
    /// Output:
    /// - Through the map and through the query string: filters equal to
    ///   `normalized()`, same page and page size
    fn round_trip_matches_normalized_state() {
        use FilterCategory::{Author, CloudPlatform, Keyword, Platform, RoleType, Tag};
        use SortDirection::{Ascending, Descending};

        let (mut full, full_page) = sample();
        full.insert(Keyword, "nginx web");
        let mut cases = vec![
            ("default direction, custom page size", state("name", Ascending, &[], 1, 25)),
            ("descending, default sort", state("name", Descending, &[], 1, DEFAULT_PAGE_SIZE)),
            ("custom sort only", state("created", Ascending, &[], 1, DEFAULT_PAGE_SIZE)),
            ("later page only", state("name", Ascending, &[], 7, DEFAULT_PAGE_SIZE)),
            ("full sample", (full, full_page)),
            (
                "reserved and non-ASCII characters",
                state(
                    "name",
                    Ascending,
                    &[(Keyword, "c++ 100%"), (Tag, "a&b=c"), (Author, "café"), (Platform, "π")],
                    2,
                    DEFAULT_PAGE_SIZE,
                ),
            ),
        ];
        for (category, value) in [
            (Keyword, "nginx"),
            (Tag, "web"),
            (Platform, "EL"),
            (CloudPlatform, "aws"),
            (Author, "geerlingguy"),
            (RoleType, "ANS"),
        ] {
            cases.push((
                category.as_config_key(),
                state("name", Ascending, &[(category, value)], 1, DEFAULT_PAGE_SIZE),
            ));
        }

        for (label, (filters, page)) in cases {
            let map = encode(&filters, &page, &defaults());
            let via_query = parse_query_string(&to_query_string(&map));
            assert_eq!(via_query, map, "{label}: query string");
            for source in [&map, &via_query] {
                let (decoded_filters, decoded_page) = decode(source, &defaults());
                assert_eq!(decoded_filters, filters.normalized(), "{label}: filters");
                assert_eq!(decoded_page.page, page.page, "{label}: page");
                assert_eq!(decoded_page.page_size, page.page_size, "{label}: page size");
            }
        }
    }

    #[test]
    /// What: Missing and malformed keys fall back to defaults.
    ///
    /// Inputs:
    /// - Non-numeric page, zero page, oversized page size, unknown reverse flag
    ///
    /// Output:
    /// - Page 1, clamped page size, default direction
    fn decode_tolerates_malformed_values() {
        let mut map = QueryMap::new();
        map.insert("page".into(), "abc".into());
        map.insert("per_page".into(), "5000".into());
        map.insert("reverse".into(), "maybe".into());
        let (filters, page) = decode(&map, &defaults());
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, MAX_PAGE_SIZE);
        assert_eq!(filters.direction, SortDirection::Ascending);
        assert_eq!(filters.sort_key, "name");

        map.insert("page".into(), "0".into());
        map.insert("per_page".into(), "lots".into());
        let (_, page) = decode(&map, &defaults());
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, DEFAULT_PAGE_SIZE);

        let (filters, page) = decode(&QueryMap::new(), &defaults());
        assert_eq!((filters, page), defaults().initial_state());
    }

    #[test]
    /// What: Legacy `f` and `sort_order` keys are still understood.
    fn decode_accepts_legacy_keys() {
        let map = parse_query_string("?f=mysql+backup&sort_order=created&reverse=1");
        let (filters, _) = decode(&map, &defaults());
        assert_eq!(
            filters.values(FilterCategory::Keyword),
            ["mysql".to_string(), "backup".to_string()]
        );
        assert_eq!(filters.sort_key, "created");
        assert_eq!(filters.direction, SortDirection::Descending);
    }

    #[test]
    /// What: Query strings render deterministically and parse back to the same map.
    fn query_string_render_and_parse() {
        let (filters, page) = sample();
        let map = encode(&filters, &page, &defaults());
        let qs = to_query_string(&map);
        assert!(qs.contains("autocomplete=nginx%20proxy"));
        assert!(qs.starts_with("autocomplete="));
        assert_eq!(parse_query_string(&qs), map);
        assert_eq!(
            parse_query_string("https://galaxy.example/list?page=2#top")
                .get("page")
                .map(String::as_str),
            Some("2")
        );
        assert!(parse_query_string("&&=x&").is_empty());
    }
}
