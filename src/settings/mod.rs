//! User settings loaded from `settings.conf`.
//!
//! The file uses `key = value` lines with `#`/`//` comments. Unknown keys are
//! ignored and malformed values keep their defaults, so a broken file never
//! stops the client from starting.

pub mod paths;

use std::path::Path;
use std::time::Duration;

use crate::state::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::util::config::{parse_key_value, skip_comment_or_empty};

pub use paths::{logs_dir, state_dir, views_dir};

/// Server used when no `server_url` is configured.
pub const DEFAULT_SERVER_URL: &str = "https://galaxy.ansible.com";

/// Shortest quiet period before a suggestion lookup fires.
pub const MIN_SUGGEST_DEBOUNCE_MS: u64 = 300;

/// Shortest input that triggers a suggestion lookup.
pub const MIN_SUGGEST_CHARS: usize = 2;

/// Where a list view keeps its filter/page state between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PersistMode {
    /// Shareable query string.
    Url,
    /// Per-user JSON file.
    #[default]
    Local,
}

impl PersistMode {
    /// Parse a persist mode from its settings key.
    ///
    /// Inputs: `s` config string (case-insensitive).
    ///
    /// Output: `Some(PersistMode)` on recognized value; `None` otherwise.
    #[must_use]
    pub fn from_config_key(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "url" | "query" | "query_string" => Some(Self::Url),
            "local" | "file" | "storage" => Some(Self::Local),
            _ => None,
        }
    }
}

/// Effective client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Galaxy server base URL, without a trailing slash.
    pub server_url: String,
    /// Default page size for list views.
    pub page_size: u32,
    /// Interval between import-status polls.
    pub poll_interval_ms: u64,
    /// Quiet period before a suggestion lookup fires.
    pub suggest_debounce_ms: u64,
    /// Minimum input length for suggestion lookups.
    pub suggest_min_chars: usize,
    /// How list state is persisted.
    pub persist_mode: PersistMode,
    /// Whole-request timeout for HTTP calls.
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            poll_interval_ms: 5_000,
            suggest_debounce_ms: MIN_SUGGEST_DEBOUNCE_MS,
            suggest_min_chars: MIN_SUGGEST_CHARS,
            persist_mode: PersistMode::Local,
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Poll interval as a `Duration`.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Suggestion debounce as a `Duration`.
    #[must_use]
    pub const fn suggest_debounce(&self) -> Duration {
        Duration::from_millis(self.suggest_debounce_ms)
    }
}

/// What: Load settings from the resolved `settings.conf`, or defaults.
///
/// Output:
/// - Effective `Settings`.
///
/// Details:
/// - A missing file is normal and logged at debug level.
/// - An unreadable file is logged as a warning and ignored.
#[must_use]
pub fn settings() -> Settings {
    let mut out = Settings::default();
    let Some(path) = paths::resolve_settings_config_path() else {
        tracing::debug!("[Settings] No settings.conf found; using defaults");
        return out;
    };
    load_into(&path, &mut out);
    out
}

/// Read `path` and apply its entries onto `settings`.
fn load_into(path: &Path, settings: &mut Settings) {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            parse_settings(&content, settings);
            tracing::debug!(path = %path.display(), "[Settings] Loaded settings.conf");
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "[Settings] Failed to read settings.conf; using defaults"
            );
        }
    }
}

/// What: Parse settings.conf content onto an existing `Settings`.
///
/// Inputs:
/// - `content`: Content of the settings file.
/// - `settings`: Mutable reference to populate.
///
/// Details:
/// - Page size is clamped to `1..=MAX_PAGE_SIZE`.
/// - Debounce and minimum input length cannot go below their floors.
/// - A zero poll interval is rejected.
pub fn parse_settings(content: &str, settings: &mut Settings) {
    for line in content.lines() {
        if skip_comment_or_empty(line) {
            continue;
        }
        let Some((key, val)) = parse_key_value(line) else {
            continue;
        };
        match key.as_str() {
            "server_url" | "server" | "galaxy_url" => {
                let url = val.trim_end_matches('/');
                if url.starts_with("http://") || url.starts_with("https://") {
                    settings.server_url = url.to_string();
                } else {
                    tracing::warn!(value = %val, "[Settings] Ignoring server_url without http(s) scheme");
                }
            }
            "page_size" | "per_page" => {
                if let Ok(v) = val.parse::<u32>() {
                    settings.page_size = v.clamp(1, MAX_PAGE_SIZE);
                }
            }
            "poll_interval_ms" => {
                if let Ok(v) = val.parse::<u64>()
                    && v > 0
                {
                    settings.poll_interval_ms = v;
                }
            }
            "suggest_debounce_ms" => {
                if let Ok(v) = val.parse::<u64>() {
                    settings.suggest_debounce_ms = v.max(MIN_SUGGEST_DEBOUNCE_MS);
                }
            }
            "suggest_min_chars" => {
                if let Ok(v) = val.parse::<usize>() {
                    settings.suggest_min_chars = v.max(MIN_SUGGEST_CHARS);
                }
            }
            "persist_mode" | "persist" => {
                if let Some(mode) = PersistMode::from_config_key(&val) {
                    settings.persist_mode = mode;
                }
            }
            "request_timeout_secs" => {
                if let Ok(v) = val.parse::<u64>()
                    && v > 0
                {
                    settings.request_timeout_secs = v;
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    /// What: Recognized keys override defaults and floors are enforced.
    ///
    /// Inputs:
    /// - A settings file with every key, some below their floors
    ///
    /// Output:
    /// - Parsed values with floors and clamps applied
    fn parse_settings_applies_values_and_floors() {
        let content = "\
# galaxy-lists settings
server_url = https://galaxy.example.com/  # staging
page_size = 500
poll_interval_ms = 2000
suggest_debounce_ms = 50
suggest_min_chars = 1
persist_mode = url
request_timeout_secs = 10
unknown_key = whatever
";
        let mut settings = Settings::default();
        parse_settings(content, &mut settings);
        assert_eq!(settings.server_url, "https://galaxy.example.com");
        assert_eq!(settings.page_size, MAX_PAGE_SIZE);
        assert_eq!(settings.poll_interval(), Duration::from_secs(2));
        assert_eq!(settings.suggest_debounce_ms, MIN_SUGGEST_DEBOUNCE_MS);
        assert_eq!(settings.suggest_min_chars, MIN_SUGGEST_CHARS);
        assert_eq!(settings.persist_mode, PersistMode::Url);
        assert_eq!(settings.request_timeout_secs, 10);
    }

    #[test]
    /// What: Malformed values keep defaults.
    fn parse_settings_ignores_malformed_values() {
        let content = "page_size = many\npoll_interval_ms = 0\nserver_url = ftp://nope\npersist_mode = cloud\n";
        let mut settings = Settings::default();
        parse_settings(content, &mut settings);
        assert_eq!(settings, Settings::default());
    }

    #[test]
    /// What: Loading a settings file from disk applies its entries.
    fn load_into_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.conf");
        std::fs::write(&path, "page_size = 42\n").expect("write settings");
        let mut settings = Settings::default();
        load_into(&path, &mut settings);
        assert_eq!(settings.page_size, 42);

        let mut untouched = Settings::default();
        load_into(&dir.path().join("missing.conf"), &mut untouched);
        assert_eq!(untouched, Settings::default());
    }
}
