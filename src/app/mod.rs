//! Runtime pieces of a list view and the command-line entrypoint that drives
//! them.

/// Persistence of list state in a query string or a local file.
mod persist;
/// Polling refresher for import jobs.
mod poll;
/// List refresh controller and its request loop.
mod refresh;
/// Debounced typeahead lookups.
mod suggest;
/// Filter machine, controller and persistence wired into one view.
mod view;

use std::sync::Arc;

pub use persist::{ListPersistence, LocalFileStore, StateStore, UrlQueryStore};
pub use poll::{PollHandle, PollOutcome, Poller, import_status_fetch};
pub use refresh::{ListController, RefreshOutcome, run_refresh_loop};
pub use suggest::{SuggestHandle, SuggestQuery, Suggestions, spawn_suggest_worker};
pub use view::ListView;

use crate::args::{Args, imports, roles, suggest as lookup};
use crate::error::Result;
use crate::settings::Settings;
use crate::sources::GalaxyClient;

/// Environment variable holding the API token for mutating calls.
pub const TOKEN_ENV: &str = "GALAXY_API_TOKEN";

/// What: Run the command selected on the command line.
///
/// Inputs:
/// - `args`: Parsed command line.
/// - `settings`: Settings loaded from `settings.conf`.
///
/// Output:
/// - `Ok(())` when the command succeeded.
///
/// Details:
/// - `--server` overrides the configured server.
/// - Order of precedence: `--delete`, `--suggest`, `--import`/`--watch`,
///   then role listing.
///
/// # Errors
/// - Returns the first error the selected command reports.
pub async fn run(args: &Args, mut settings: Settings) -> Result<()> {
    if let Some(server) = &args.server {
        settings.server_url = server.trim().trim_end_matches('/').to_string();
    }
    tracing::info!(server = %settings.server_url, "galaxy-lists starting");
    let client = GalaxyClient::from_settings(&settings)?.with_token(std::env::var(TOKEN_ENV).ok());

    if let Some(target) = &args.delete {
        return imports::handle_delete(&client, target).await;
    }
    if let Some(text) = &args.suggest {
        let items = lookup::handle_suggest(Arc::new(client), &args.category, text, &settings).await?;
        if items.is_empty() {
            println!("No suggestions.");
        }
        for item in items {
            println!("{item}");
        }
        return Ok(());
    }
    if !args.import.is_empty() || !args.watch.is_empty() {
        return imports::handle_imports(Arc::new(client), &args.import, &args.watch, &settings)
            .await;
    }
    roles::handle_list_roles(args, &settings, client).await
}
