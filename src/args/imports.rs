//! Command-line import requests, import following and role removal.

use std::sync::Arc;
use std::time::Duration;

use crate::app::{PollOutcome, Poller, import_status_fetch};
use crate::args::utils::parse_targets;
use crate::error::{GalaxyError, Result};
use crate::settings::Settings;
use crate::sources::{GalaxyClient, ImportStatusSource};
use crate::state::{ImportState, PollTarget};

/// What: Request imports, then follow them and any watched targets.
///
/// Inputs:
/// - `client`: Galaxy client.
/// - `import`: `OWNER/REPO` values to import.
/// - `watch`: `OWNER/REPO` values to follow only.
/// - `settings`: Poll interval.
///
/// Output:
/// - `Ok(())` once every followed job finished or the user pressed Ctrl-C.
///
/// Details:
/// - A rejected import request is reported and not followed.
///
/// # Errors
/// - Returns `Err(Validation)` when nothing is left to follow.
/// - Returns `Err(ImportFailed)` when any followed import ended in `FAILED`.
pub async fn handle_imports(
    client: Arc<GalaxyClient>,
    import: &[String],
    watch: &[String],
    settings: &Settings,
) -> Result<()> {
    let mut targets = Vec::new();
    for target in parse_targets(import) {
        match client.request_import(&target.owner, &target.repo).await {
            Ok(queued) => {
                println!("{}/{}: import requested", queued.owner, queued.repo);
                targets.push(queued);
            }
            Err(e) => eprintln!("{}/{}: {e}", target.owner, target.repo),
        }
    }
    for target in parse_targets(watch) {
        if !targets.iter().any(|t| t.key() == target.key()) {
            targets.push(target);
        }
    }
    if targets.is_empty() {
        return Err(GalaxyError::Validation(
            "no valid OWNER/REPO targets to follow".to_string(),
        ));
    }

    let finished = follow_imports(client, targets, settings.poll_interval()).await;
    for target in &finished {
        println!("{}/{}: {}", target.owner, target.repo, target.state.as_api_str());
    }
    let failed = finished
        .iter()
        .filter(|t| t.state == ImportState::Failed)
        .count();
    if failed > 0 {
        return Err(GalaxyError::ImportFailed(failed));
    }
    Ok(())
}

/// What: Poll `targets` until all are terminal or Ctrl-C is pressed.
///
/// Output:
/// - Targets with the last states the poller applied.
pub async fn follow_imports<S>(
    source: Arc<S>,
    targets: Vec<PollTarget>,
    interval: Duration,
) -> Vec<PollTarget>
where
    S: ImportStatusSource + 'static,
{
    tracing::info!(count = targets.len(), "Following imports");
    let handle = Poller::start(targets, interval, import_status_fetch(source));
    let outcome = tokio::select! {
        outcome = handle.wait() => outcome,
        _ = tokio::signal::ctrl_c() => {
            handle.stop();
            handle.wait().await
        }
    };
    if outcome == PollOutcome::Stopped {
        eprintln!("stopped following imports");
    }
    handle.targets()
}

/// What: Delete the role imported from `OWNER/REPO`.
///
/// # Errors
/// - Returns `Err(Validation)` for a malformed target, or the server's error.
pub async fn handle_delete(client: &GalaxyClient, raw: &str) -> Result<()> {
    let target = PollTarget::parse(raw)
        .ok_or_else(|| GalaxyError::Validation(format!("'{raw}' is not OWNER/REPO")))?;
    client.delete_role(&target.owner, &target.repo).await?;
    println!("{}/{}: role deleted", target.owner, target.repo);
    Ok(())
}
