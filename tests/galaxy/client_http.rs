//! `GalaxyClient` against a mock Galaxy server.

use std::time::Duration;

use galaxy_lists::GalaxyError;
use galaxy_lists::sources::GalaxyClient;
use galaxy_lists::state::{FilterCategory, FilterState, ImportState, PageState, SortDirection};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> GalaxyClient {
    GalaxyClient::new(&server.uri(), Duration::from_secs(5)).expect("mock server url")
}

#[tokio::test]
/// What: Role search sends paging, sort and filters and decodes the envelope.
///
/// Inputs:
/// - Tag and author filters, descending download sort, page 2 of size 5
///
/// Output:
/// - Roles with star glyphs and the envelope's totals
async fn search_roles_sends_filters_and_decodes_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/roles/"))
        .and(query_param("page", "2"))
        .and(query_param("page_size", "5"))
        .and(query_param("order_by", "-download_count"))
        .and(query_param("tags_autocomplete", "web proxy"))
        .and(query_param("username_autocomplete", "geerlingguy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 12,
            "cur_page": 2,
            "num_pages": 3,
            "results": [
                {"id": 7, "name": "nginx", "username": "geerlingguy",
                 "description": "Nginx for Linux", "download_count": 900,
                 "average_score": 4.4},
                {"id": 8, "name": "haproxy", "namespace": "geerlingguy",
                 "download_count": 300}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut filters = FilterState::new("download_count");
    filters.direction = SortDirection::Descending;
    filters.insert(FilterCategory::Tag, "web");
    filters.insert(FilterCategory::Tag, "proxy");
    filters.insert(FilterCategory::Author, "geerlingguy");
    let mut page = PageState::new(5);
    page.page = 2;

    let envelope = client(&server)
        .search_roles(&filters, &page)
        .await
        .expect("search succeeds");
    assert_eq!(envelope.count, Some(12));
    assert_eq!(envelope.cur_page, Some(2));
    assert_eq!(envelope.num_pages, Some(3));
    assert_eq!(envelope.results.len(), 2);
    assert_eq!(envelope.results[0].full_name(), "geerlingguy.nginx");
    assert_eq!(envelope.results[0].stars, "★★★★☆");
    assert_eq!(envelope.results[1].stars, "");
}

#[tokio::test]
/// What: A 4xx reply becomes `Server` carrying the `detail` message.
async fn client_error_maps_detail_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/roles/"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Invalid order_by field"})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .search_roles(&FilterState::new("bogus"), &PageState::new(10))
        .await
        .expect_err("rejected");
    assert!(err.is_client_rejection());
    match err {
        GalaxyError::Server { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid order_by field");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
/// What: Field-level validation errors surface the first message.
async fn client_error_maps_field_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/imports/"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"github_repo": ["Repository not found"]})),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .request_import("someone", "missing")
        .await
        .expect_err("rejected");
    assert_eq!(
        err.to_string(),
        "server returned 400: github_repo: Repository not found"
    );
}

#[tokio::test]
/// What: Import requests post the repository and carry the API token.
async fn request_import_posts_with_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/imports/"))
        .and(header("authorization", "Token s3cret"))
        .and(body_json(json!({"github_user": "acme", "github_repo": "ansible-role-web"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"results": []})))
        .expect(1)
        .mount(&server)
        .await;

    let target = client(&server)
        .with_token(Some("s3cret".to_string()))
        .request_import("acme", "ansible-role-web")
        .await
        .expect("import accepted");
    assert_eq!(target.key(), ("acme", "ansible-role-web"));
    assert_eq!(target.state, ImportState::Pending);
}

#[tokio::test]
/// What: The newest import record decides the state; none means pending.
async fn latest_import_state_reads_newest_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/imports/"))
        .and(query_param("github_repo", "busy"))
        .and(query_param("order_by", "-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "results": [{"id": 9, "state": "RUNNING"}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/imports/"))
        .and(query_param("github_repo", "fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 0, "results": []})))
        .mount(&server)
        .await;

    let client = client(&server);
    assert_eq!(
        client.latest_import_state("acme", "busy").await.expect("lookup"),
        ImportState::Running
    );
    assert_eq!(
        client.latest_import_state("acme", "fresh").await.expect("lookup"),
        ImportState::Pending
    );
}

#[tokio::test]
/// What: Tag suggestions come from the tags endpoint, role types locally.
async fn suggestions_by_category() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/search/tags/"))
        .and(query_param("autocomplete", "web"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{"tag": "web"}, {"tag": "webserver"}, {"tag": "web"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let tags = client
        .suggestions(FilterCategory::Tag, " web ")
        .await
        .expect("lookup");
    assert_eq!(tags, vec!["web".to_string(), "webserver".to_string()]);
    let types = client
        .suggestions(FilterCategory::RoleType, "a")
        .await
        .expect("local lookup");
    assert_eq!(types, vec!["ANS".to_string(), "APP".to_string()]);
}

#[tokio::test]
/// What: Role removal sends a DELETE naming the repository.
async fn delete_role_sends_delete() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/removerole/"))
        .and(query_param("github_user", "acme"))
        .and(query_param("github_repo", "old-role"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .delete_role("acme", "old-role")
        .await
        .expect("deleted");
    let err = client(&server)
        .delete_role(" ", "old-role")
        .await
        .expect_err("blank owner");
    assert!(matches!(err, GalaxyError::Validation(_)));
}
