//! Command-line role listing.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::app::{ListPersistence, ListView, LocalFileStore, StateStore, UrlQueryStore};
use crate::args::Args;
use crate::error::{GalaxyError, Result};
use crate::logic::{CodecDefaults, codec, compute_window};
use crate::settings::{PersistMode, Settings};
use crate::sources::{GalaxyClient, role_sort_options};
use crate::state::{FilterCategory, ListResult, ListStatus, Role, SortDirection};

/// Name of the role view's local state file.
const ROLE_VIEW: &str = "roles";

/// What: List roles matching the command-line filters.
///
/// Inputs:
/// - `args`: Parsed command line.
/// - `settings`: Effective settings.
/// - `client`: Galaxy client to fetch from.
///
/// Output:
/// - `Ok(())` after printing one page of roles.
///
/// Details:
/// - Starts from the persisted view state; `--reset` clears restored filters.
/// - Flags go through the filter machine, so duplicates and blanks are
///   handled the same way an interactive view would handle them.
/// - Only the final state is fetched; successful state is persisted.
///
/// # Errors
/// - Returns `Err` when the view cannot be opened or the fetch fails.
pub async fn handle_list_roles(args: &Args, settings: &Settings, client: GalaxyClient) -> Result<()> {
    let url_store = match (&args.url, settings.persist_mode) {
        (Some(url), _) => Some(Arc::new(UrlQueryStore::from_url(url))),
        (None, PersistMode::Url) => {
            let mut base = client.server_url().clone();
            base.set_path("roles");
            Some(Arc::new(UrlQueryStore::from_url(base.as_str())))
        }
        (None, PersistMode::Local) => None,
    };
    let store: Arc<dyn StateStore> = match &url_store {
        Some(store) => Arc::clone(store) as Arc<dyn StateStore>,
        None => Arc::new(LocalFileStore::for_view(ROLE_VIEW)),
    };
    let mut defaults = CodecDefaults::new("name");
    defaults.page_size = settings.page_size;

    let mut view = ListView::open(
        client,
        ListPersistence::new(store, defaults.clone()),
        role_sort_options(),
    )?;
    apply_args(&mut view, args);
    let Some(result) = view.settle().await else {
        return Ok(());
    };

    if result.status == ListStatus::Error {
        let err = list_failure(result.error);
        tracing::error!(error = %err, "Role listing failed");
        return Err(err);
    }
    print!("{}", render_roles(&result));
    match url_store {
        Some(store) => println!("{}", store.url()),
        None => {
            let query = codec::to_query_string(&codec::encode(&result.filters, &result.page, &defaults));
            if !query.is_empty() {
                println!("?{query}");
            }
        }
    }
    Ok(())
}

/// Error for a failed listing, keeping the controller's message as is.
fn list_failure(message: Option<String>) -> GalaxyError {
    GalaxyError::Refresh(message.unwrap_or_else(|| "role listing failed".to_string()))
}

/// What: Replay command-line flags on a view's filter machine.
///
/// Details:
/// - An unknown sort key is reported and replaced by the default sort.
/// - Ends with one explicit refresh so the current state is always loaded.
fn apply_args<F>(view: &mut ListView<Role, F>, args: &Args)
where
    F: crate::sources::ListFetcher<Role>,
{
    let machine = view.machine_mut();
    if args.reset {
        machine.clear_all();
    }
    let flags = [
        (FilterCategory::Keyword, &args.keywords),
        (FilterCategory::Tag, &args.tags),
        (FilterCategory::Platform, &args.platforms),
        (FilterCategory::CloudPlatform, &args.cloud_platforms),
        (FilterCategory::Author, &args.authors),
        (FilterCategory::RoleType, &args.role_types),
    ];
    for (category, values) in flags {
        for value in values {
            if let Err(e) = machine.apply_keyword(category, value) {
                eprintln!("ignoring {} filter: {e}", category.as_config_key());
            }
        }
    }
    let direction = if args.desc {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    let sort_key = args
        .sort
        .clone()
        .or_else(|| args.desc.then(|| machine.canonical_filters().sort_key.clone()));
    if let Some(key) = sort_key
        && let Err(e) = machine.set_sort(&key, direction)
    {
        eprintln!("{e}; sorting by {}", machine.canonical_filters().sort_key);
    }
    if let Some(page_size) = args.page_size {
        machine.set_page_size(page_size);
    }
    if let Some(page) = args.page {
        machine.set_page(page);
    }
    machine.refresh();
}

/// What: Render one page of roles as plain text.
///
/// Output:
/// - One line per role, a summary line and the page links; the current
///   page is bracketed.
#[must_use]
pub fn render_roles(result: &ListResult<Role>) -> String {
    let mut out = String::new();
    if result.items.is_empty() {
        out.push_str("No roles found.\n");
    }
    for role in &result.items {
        let _ = writeln!(
            out,
            "{:<40} {:<5} {:>9}  {}",
            role.full_name(),
            role.stars,
            role.download_count,
            role.description
        );
    }
    let page = &result.page;
    let _ = writeln!(
        out,
        "Page {} of {} ({} roles)",
        page.page,
        page.total_pages.max(1),
        page.total_count
    );
    let window = compute_window(page.page, page.total_pages);
    let mut links: Vec<String> = Vec::with_capacity(window.window.len() + 2);
    if window.has_previous() {
        links.push(format!("<{}", window.previous_page));
    }
    links.extend(window.window.iter().map(|p| {
        if *p == page.page {
            format!("[{p}]")
        } else {
            p.to_string()
        }
    }));
    if window.has_next(page.total_pages) {
        links.push(format!("{}>", window.next_page));
    }
    if !links.is_empty() {
        let _ = writeln!(out, "{}", links.join(" "));
    }
    out
}
