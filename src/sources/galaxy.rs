//! HTTP client for the Galaxy `/api/v1/` endpoints.

use std::time::Duration;

use reqwest::{Response, Url};
use serde::Deserialize;
use serde_json::Value;

use super::{ImportStatusSource, ListFetcher, SuggestionSource};
use crate::error::{GalaxyError, Result};
use crate::settings::Settings;
use crate::state::{
    FilterCategory, FilterState, ImportState, Page, PageState, PollTarget, Role, SortDirection,
    SortOption,
};

/// Role type codes the server knows; suggested without a network call.
pub const ROLE_TYPES: [&str; 4] = ["ANS", "CON", "APP", "DEM"];

/// What: Sort keys offered by the role list.
///
/// Output:
/// - Options in display order; the first one is the default sort.
#[must_use]
pub fn role_sort_options() -> Vec<SortOption> {
    vec![
        SortOption::new("name", "Name"),
        SortOption::new("download_count", "Downloads"),
        SortOption::new("stargazers_count", "Stars"),
        SortOption::new("created", "Created"),
        SortOption::new("modified", "Last updated"),
    ]
}

/// Number of suggestions requested per lookup.
const SUGGESTION_PAGE_SIZE: u32 = 10;

/// One record of the imports endpoint; only the state matters here.
#[derive(Debug, Deserialize)]
struct ImportRecord {
    /// Import state string such as `RUNNING`.
    #[serde(default)]
    state: String,
}

/// Client for one Galaxy server.
#[derive(Debug, Clone)]
pub struct GalaxyClient {
    /// Pooled HTTP client.
    http: reqwest::Client,
    /// Server root, always ending in `/`.
    base: Url,
    /// API token sent with mutating calls.
    token: Option<String>,
}

impl GalaxyClient {
    /// What: Build a client for `server_url`.
    ///
    /// Inputs:
    /// - `server_url`: Server root such as `https://galaxy.ansible.com`.
    /// - `timeout`: Whole-request timeout.
    ///
    /// Output:
    /// - The client, or `Err(Config)` for an unusable URL.
    ///
    /// # Errors
    /// - Returns `Err` when the URL does not parse or the HTTP client cannot be built.
    pub fn new(server_url: &str, timeout: Duration) -> Result<Self> {
        let base = Url::parse(&format!("{}/", server_url.trim().trim_end_matches('/')))
            .map_err(|e| GalaxyError::Config(format!("invalid server url '{server_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(GalaxyError::Config(format!(
                "server url '{server_url}' cannot carry API paths"
            )));
        }
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .user_agent(format!("galaxy-lists/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GalaxyError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base,
            token: None,
        })
    }

    /// Client configured from user settings.
    ///
    /// # Errors
    /// - Returns `Err` when `settings.server_url` is unusable.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(
            &settings.server_url,
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    /// Attach an API token for mutating calls.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Server root this client talks to.
    #[must_use]
    pub const fn server_url(&self) -> &Url {
        &self.base
    }

    /// Resolve an API path against the server root.
    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| GalaxyError::Config(format!("invalid endpoint '{path}': {e}")))
    }

    /// Attach the `Authorization` header when a token is configured.
    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, format!("Token {token}")),
            None => request,
        }
    }

    /// What: Build the role search URL for a filter/page pair.
    ///
    /// Details:
    /// - Descending sorts prefix every comma-separated sort field with `-`.
    /// - Multi-value categories are sent space-joined in one parameter.
    ///
    /// # Errors
    /// - Returns `Err` only when the server URL cannot carry the path.
    pub fn role_search_url(&self, filters: &FilterState, page: &PageState) -> Result<Url> {
        let mut url = self.endpoint("api/v1/search/roles/")?;
        {
            let mut q = url.query_pairs_mut();
            q.append_pair("page", &page.page.max(1).to_string());
            q.append_pair("page_size", &page.page_size.to_string());
            let order_by = order_by(&filters.sort_key, filters.direction);
            if !order_by.is_empty() {
                q.append_pair("order_by", &order_by);
            }
            for (category, values) in filters.iter() {
                q.append_pair(category.api_param(), &values.join(" "));
            }
        }
        Ok(url)
    }

    /// What: Search roles for a filter/page pair.
    ///
    /// Output:
    /// - Response envelope with star glyphs derived on every role.
    ///
    /// # Errors
    /// - Returns `Err` on transport failure, non-2xx status or undecodable body.
    pub async fn search_roles(&self, filters: &FilterState, page: &PageState) -> Result<Page<Role>> {
        let url = self.role_search_url(filters, page)?;
        tracing::debug!(url = %url, "[Galaxy] Searching roles");
        let resp = check(self.http.get(url).send().await?).await?;
        let mut envelope: Page<Role> = resp.json().await?;
        for role in &mut envelope.results {
            role.decorate();
        }
        Ok(envelope)
    }

    /// What: Typeahead suggestions for one filter category.
    ///
    /// Details:
    /// - Role types come from a fixed list; other categories query their
    ///   `/api/v1/search/<kind>/` endpoint with `autocomplete=<text>`.
    ///
    /// # Errors
    /// - Returns `Err` when the lookup endpoint fails.
    pub async fn suggestions(&self, category: FilterCategory, text: &str) -> Result<Vec<String>> {
        let text = text.trim();
        let (path, field) = match category {
            FilterCategory::RoleType => {
                let upper = text.to_ascii_uppercase();
                return Ok(ROLE_TYPES
                    .iter()
                    .filter(|t| t.starts_with(&upper))
                    .map(|t| (*t).to_string())
                    .collect());
            }
            FilterCategory::Keyword => ("api/v1/search/roles/", "name"),
            FilterCategory::Tag => ("api/v1/search/tags/", "tag"),
            FilterCategory::Platform => ("api/v1/search/platforms/", "name"),
            FilterCategory::CloudPlatform => ("api/v1/search/cloud_platforms/", "name"),
            FilterCategory::Author => ("api/v1/search/users/", "username"),
        };
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut()
            .append_pair("autocomplete", text)
            .append_pair("page_size", &SUGGESTION_PAGE_SIZE.to_string());
        let resp = check(self.http.get(url).send().await?).await?;
        let envelope: Page<Value> = resp.json().await?;
        let mut out: Vec<String> = Vec::new();
        for item in &envelope.results {
            if let Some(v) = item.get(field).and_then(Value::as_str)
                && !out.iter().any(|s| s == v)
            {
                out.push(v.to_string());
            }
        }
        Ok(out)
    }

    /// What: State of the most recent import of `owner/repo`.
    ///
    /// Output:
    /// - `Pending` when the server has no import record yet.
    ///
    /// # Errors
    /// - Returns `Err` on transport failure or an unknown state string.
    pub async fn latest_import_state(&self, owner: &str, repo: &str) -> Result<ImportState> {
        let mut url = self.endpoint("api/v1/imports/")?;
        url.query_pairs_mut()
            .append_pair("github_user", owner)
            .append_pair("github_repo", repo)
            .append_pair("order_by", "-id")
            .append_pair("page_size", "1");
        let resp = check(self.http.get(url).send().await?).await?;
        let envelope: Page<ImportRecord> = resp.json().await?;
        match envelope.results.first() {
            None => Ok(ImportState::Pending),
            Some(record) => ImportState::from_api(&record.state).ok_or_else(|| {
                GalaxyError::Decode(format!("unknown import state '{}'", record.state))
            }),
        }
    }

    /// What: Ask the server to import `owner/repo`.
    ///
    /// Output:
    /// - A `Pending` poll target for the new job.
    ///
    /// # Errors
    /// - Returns `Err(Validation)` for blank names before any request.
    /// - Returns `Err(Server)` with the server's message on a non-2xx reply.
    pub async fn request_import(&self, owner: &str, repo: &str) -> Result<PollTarget> {
        let target = validated_target(owner, repo)?;
        let url = self.endpoint("api/v1/imports/")?;
        let body = serde_json::json!({
            "github_user": target.owner,
            "github_repo": target.repo,
        });
        tracing::info!(owner = %target.owner, repo = %target.repo, "[Galaxy] Requesting import");
        check(self.authorize(self.http.post(url).json(&body)).send().await?).await?;
        Ok(target)
    }

    /// What: Remove the role imported from `owner/repo`.
    ///
    /// # Errors
    /// - Returns `Err(Validation)` for blank names before any request.
    /// - Returns `Err(Server)` with the server's message on a non-2xx reply.
    pub async fn delete_role(&self, owner: &str, repo: &str) -> Result<()> {
        let target = validated_target(owner, repo)?;
        let mut url = self.endpoint("api/v1/removerole/")?;
        url.query_pairs_mut()
            .append_pair("github_user", &target.owner)
            .append_pair("github_repo", &target.repo);
        tracing::info!(owner = %target.owner, repo = %target.repo, "[Galaxy] Deleting role");
        check(self.authorize(self.http.delete(url)).send().await?).await?;
        Ok(())
    }
}

impl ListFetcher<Role> for GalaxyClient {
    async fn fetch_page(&self, filters: &FilterState, page: &PageState) -> Result<Page<Role>> {
        self.search_roles(filters, page).await
    }
}

impl SuggestionSource for GalaxyClient {
    async fn suggest(&self, category: FilterCategory, text: &str) -> Result<Vec<String>> {
        self.suggestions(category, text).await
    }
}

impl ImportStatusSource for GalaxyClient {
    async fn import_state(&self, target: &PollTarget) -> Result<ImportState> {
        self.latest_import_state(&target.owner, &target.repo).await
    }
}

/// Validate owner/repo before a mutating call.
fn validated_target(owner: &str, repo: &str) -> Result<PollTarget> {
    let (owner, repo) = (owner.trim(), repo.trim());
    if owner.is_empty() || repo.is_empty() {
        return Err(GalaxyError::Validation(
            "owner and repository are required".to_string(),
        ));
    }
    Ok(PollTarget::new(owner, repo))
}

/// What: Render `order_by` for a sort key and direction.
///
/// Details:
/// - `"namespace,name"` descending becomes `"-namespace,-name"`.
#[must_use]
fn order_by(sort_key: &str, direction: SortDirection) -> String {
    sort_key
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| match direction {
            SortDirection::Ascending => k.to_string(),
            SortDirection::Descending => format!("-{}", k.trim_start_matches('-')),
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// What: Turn a non-2xx response into `GalaxyError::Server`.
///
/// Details:
/// - The message is the JSON `detail` field, else the first field-level
///   error, else the raw body, else the status reason.
async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = server_message(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
    tracing::debug!(status = status.as_u16(), message = %message, "[Galaxy] Request rejected");
    Err(GalaxyError::Server {
        status: status.as_u16(),
        message,
    })
}

/// Extract a readable message from an error body.
fn server_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Ok(v) = serde_json::from_str::<Value>(trimmed) else {
        return Some(trimmed.chars().take(200).collect());
    };
    if let Some(detail) = v.get("detail").and_then(Value::as_str) {
        return Some(detail.to_string());
    }
    let obj = v.as_object()?;
    obj.iter().find_map(|(field, errors)| {
        let first = match errors {
            Value::Array(items) => items.first().and_then(Value::as_str),
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }?;
        Some(if field == "non_field_errors" || field == "__all__" {
            first.to_string()
        } else {
            format!("{field}: {first}")
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GalaxyClient {
        GalaxyClient::new("https://galaxy.example.com/", Duration::from_secs(5)).expect("valid url")
    }

    #[test]
    /// What: Role search URLs carry paging, sort and every active filter.
    ///
    /// Inputs:
    /// - Descending multi-key sort, keyword and tag filters, page 3 of size 20
    ///
    /// Output:
    /// - Query parameters the search endpoint understands
    fn role_search_url_encodes_state() {
        let mut filters = FilterState::new("namespace,name");
        filters.direction = SortDirection::Descending;
        filters.insert(FilterCategory::Keyword, "nginx");
        filters.insert(FilterCategory::Keyword, "proxy");
        filters.insert(FilterCategory::Tag, "web");
        let mut page = PageState::new(20);
        page.page = 3;
        let url = client().role_search_url(&filters, &page).expect("url");
        assert_eq!(url.path(), "/api/v1/search/roles/");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("page".into(), "3".into())));
        assert!(pairs.contains(&("page_size".into(), "20".into())));
        assert!(pairs.contains(&("order_by".into(), "-namespace,-name".into())));
        assert!(pairs.contains(&("autocomplete".into(), "nginx proxy".into())));
        assert!(pairs.contains(&("tags_autocomplete".into(), "web".into())));
    }

    #[test]
    /// What: `order_by` rendering handles directions and stray separators.
    fn order_by_rendering() {
        assert_eq!(order_by("name", SortDirection::Ascending), "name");
        assert_eq!(order_by("name", SortDirection::Descending), "-name");
        assert_eq!(order_by("a, ,b", SortDirection::Descending), "-a,-b");
        assert_eq!(order_by("", SortDirection::Descending), "");
    }

    #[test]
    /// What: Error bodies become readable messages.
    fn server_message_extraction() {
        assert_eq!(
            server_message(r#"{"detail": "Not found."}"#).as_deref(),
            Some("Not found.")
        );
        assert_eq!(
            server_message(r#"{"github_repo": ["This field is required."]}"#).as_deref(),
            Some("github_repo: This field is required.")
        );
        assert_eq!(
            server_message(r#"{"non_field_errors": ["Already rated."]}"#).as_deref(),
            Some("Already rated.")
        );
        assert_eq!(server_message("  ").as_deref(), None);
        assert_eq!(server_message("Bad Gateway").as_deref(), Some("Bad Gateway"));
    }

    #[test]
    /// What: Invalid server URLs are configuration errors.
    fn new_rejects_invalid_urls() {
        assert!(matches!(
            GalaxyClient::new("not a url", Duration::from_secs(1)),
            Err(GalaxyError::Config(_))
        ));
    }

    #[tokio::test]
    /// What: Role type suggestions are served locally.
    async fn role_type_suggestions_are_local() {
        let out = client()
            .suggestions(FilterCategory::RoleType, "a")
            .await
            .expect("local lookup");
        assert_eq!(out, vec!["ANS".to_string(), "APP".to_string()]);
    }

    #[tokio::test]
    /// What: Blank owner/repo is rejected before any request.
    async fn mutations_validate_locally() {
        let c = client();
        assert!(matches!(
            c.request_import(" ", "repo").await,
            Err(GalaxyError::Validation(_))
        ));
        assert!(matches!(
            c.delete_role("owner", "").await,
            Err(GalaxyError::Validation(_))
        ));
    }
}
