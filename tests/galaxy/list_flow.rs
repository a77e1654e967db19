//! Filter machine, refresh controller and persistence driving a mock server.

use std::sync::Arc;
use std::time::Duration;

use galaxy_lists::app::{
    ListController, ListPersistence, ListView, LocalFileStore, run_refresh_loop,
};
use galaxy_lists::logic::{CodecDefaults, FilterMachine};
use galaxy_lists::sources::{GalaxyClient, role_sort_options};
use galaxy_lists::state::{FilterCategory, ListStatus, PageState, Role};
use serde_json::json;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> GalaxyClient {
    GalaxyClient::new(&server.uri(), Duration::from_secs(5)).expect("mock server url")
}

fn roles_page(cur_page: u32, names: &[&str]) -> serde_json::Value {
    json!({
        "count": 25,
        "cur_page": cur_page,
        "num_pages": 3,
        "results": names
            .iter()
            .map(|n| json!({"name": n, "namespace": "acme"}))
            .collect::<Vec<_>>()
    })
}

#[tokio::test]
/// What: A view persists successful state and a reopened view resumes from it.
///
/// Inputs:
/// - A tag filter applied on a fresh view, then page 2 on a reopened view,
///   then a filter the server rejects
///
/// Output:
/// - Page 1 and page 2 are fetched with the tag; the stored state survives
///   the failed fetch unchanged
async fn view_persists_and_resumes_local_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/roles/"))
        .and(query_param("page", "1"))
        .and(query_param("tags_autocomplete", "web"))
        .respond_with(ResponseTemplate::new(200).set_body_json(roles_page(1, &["nginx", "apache"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/roles/"))
        .and(query_param("page", "2"))
        .and(query_param("tags_autocomplete", "web"))
        .respond_with(ResponseTemplate::new(200).set_body_json(roles_page(2, &["caddy"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/roles/"))
        .and(query_param("tags_autocomplete", "web broken"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("roles.json");
    let persistence =
        || ListPersistence::new(Arc::new(LocalFileStore::new(file.clone())), CodecDefaults::new("name"));

    let mut view = ListView::open(client(&server), persistence(), role_sort_options()).expect("view");
    assert!(view.machine().canonical_filters().is_empty());
    view.machine_mut()
        .apply_keyword(FilterCategory::Tag, "web")
        .expect("valid tag");
    let first = view.settle().await.expect("refresh queued");
    assert_eq!(first.status, ListStatus::Idle);
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.page.total_count, 25);
    assert_eq!(first.page.visible_window, vec![1, 2, 3]);
    let stored = std::fs::read_to_string(&file).expect("state written");
    assert!(stored.contains("\"tags\""));

    let mut reopened =
        ListView::open(client(&server), persistence(), role_sort_options()).expect("view");
    assert_eq!(
        reopened.machine().canonical_filters().values(FilterCategory::Tag),
        ["web".to_string()]
    );
    reopened.machine_mut().set_page(2);
    let second = reopened.settle().await.expect("refresh queued");
    assert_eq!(second.page.page, 2);
    assert_eq!(second.items[0].name, "caddy");
    let after_page_two = std::fs::read_to_string(&file).expect("state written");
    assert!(after_page_two.contains("\"page\""));

    reopened
        .machine_mut()
        .apply_keyword(FilterCategory::Tag, "broken")
        .expect("valid tag");
    let failed = reopened.settle().await.expect("refresh queued");
    assert_eq!(failed.status, ListStatus::Error);
    assert!(failed.items.is_empty());
    assert!(
        failed
            .error
            .as_deref()
            .is_some_and(|m| m.contains("upstream exploded"))
    );
    assert_eq!(
        std::fs::read_to_string(&file).expect("state kept"),
        after_page_two
    );
}

#[tokio::test]
/// What: Over real HTTP, a slow stale response never replaces a newer one.
///
/// Inputs:
/// - Filter machine requests for tag "slow" (delayed reply) then tag "fast"
///
/// Output:
/// - Only the "fast" request's result is applied
async fn refresh_loop_applies_only_newest_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/roles/"))
        .and(query_param("tags_autocomplete", "slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(roles_page(1, &["stale"]))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/roles/"))
        .and(query_param("tags_autocomplete", "fast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(roles_page(1, &["fresh"])))
        .mount(&server)
        .await;

    let controller = Arc::new(ListController::<Role, _>::new(client(&server), None));
    let (trigger, requests) = mpsc::unbounded_channel();
    let (applied_tx, mut applied_rx) = mpsc::unbounded_channel();
    let loop_task = tokio::spawn(run_refresh_loop(Arc::clone(&controller), requests, applied_tx));

    let (filters, page) = CodecDefaults::new("name").initial_state();
    let mut machine =
        FilterMachine::new(role_sort_options(), filters, page, trigger).expect("machine");
    machine
        .apply_keyword(FilterCategory::Tag, "slow")
        .expect("valid tag");
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(machine.remove_keyword(FilterCategory::Tag, "slow"));
    machine
        .apply_keyword(FilterCategory::Tag, "fast")
        .expect("valid tag");
    let newest = machine.latest_request_id();
    drop(machine);
    loop_task.await.expect("loop finished");

    let mut applied = Vec::new();
    while let Ok(item) = applied_rx.try_recv() {
        applied.push(item);
    }
    let last = applied.last().expect("newest request applied");
    assert_eq!(last.0, newest);
    assert_eq!(last.1.items[0].name, "fresh");
    assert!(
        applied
            .iter()
            .all(|(_, r)| r.items.iter().all(|role| role.name != "stale"))
    );
    assert_eq!(controller.snapshot().items[0].name, "fresh");
    assert_eq!(controller.snapshot().page, {
        let mut expected = PageState::new(10);
        expected.apply_totals(1, 25, 3);
        expected
    });
}
