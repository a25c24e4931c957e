mod common;

use common::{Backend, spawn_backend};
use directory::remote::http::resource_endpoint;
use directory::{FetchError, FilterParams, HttpListSource, ListSource, Resource};
use serde_json::Value;
use url::Url;

fn source(api_url: &str, resource: Resource) -> HttpListSource<Value> {
    let base = Url::parse(api_url).expect("api url");
    HttpListSource::new(resource_endpoint(&base, resource).expect("endpoint")).expect("source")
}

#[tokio::test]
async fn test_envelope_body_carries_total() {
    let api_url = spawn_backend(Backend::default()).await;
    let members = source(&api_url, Resource::Members);

    let page = members
        .load_page(&FilterParams::new(), 1, 20)
        .await
        .expect("page");
    assert_eq!(page.items.len(), 20);
    assert_eq!(page.total_items, 45);
    assert_eq!(page.items[0]["name"], "Member 1");

    let last = members
        .load_page(&FilterParams::new(), 3, 20)
        .await
        .expect("page");
    assert_eq!(last.items.len(), 5);
    assert_eq!(last.total_items, 45);
}

#[tokio::test]
async fn test_filters_reach_backend_as_query_parameters() {
    let backend = Backend::default();
    let api_url = spawn_backend(backend.clone()).await;
    let members = source(&api_url, Resource::Members);

    let filters = FilterParams::new()
        .with("region", ["us"])
        .with("tag", ["ai", "ml"]);
    let page = members.load_page(&filters, 2, 5).await.expect("page");
    assert_eq!(page.total_items, 22);
    assert!(page.items.iter().all(|m| m["region"] == "us"));

    let requests = backend.requests();
    let query = requests.last().expect("one request");
    assert_eq!(query["page"], "2");
    assert_eq!(query["limit"], "5");
    assert_eq!(query["region"], "us");
    assert_eq!(query["tag"], "ai\u{241F}ml");
}

#[tokio::test]
async fn test_bare_array_uses_total_count_header() {
    let api_url = spawn_backend(Backend::default()).await;
    let teams = source(&api_url, Resource::Teams);

    let page = teams
        .load_page(&FilterParams::new(), 1, 2)
        .await
        .expect("page");
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.total_items, 3);
}

#[tokio::test]
async fn test_missing_total_is_decode_error() {
    let api_url = spawn_backend(Backend::default()).await;
    let projects = source(&api_url, Resource::Projects);

    let err = projects
        .load_page(&FilterParams::new(), 1, 20)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn test_non_success_status_is_http_error() {
    let api_url = spawn_backend(Backend::default()).await;
    let events = source(&api_url, Resource::Events);

    let err = events
        .load_page(&FilterParams::new(), 1, 20)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        FetchError::Http {
            status: 404,
            status_text: "Not Found".to_string()
        }
    );
}

#[tokio::test]
async fn test_unreachable_backend_is_network_error() {
    // Bind and drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);

    let members = source(&format!("http://{addr}/v1"), Resource::Members);
    let err = members
        .load_page(&FilterParams::new(), 1, 20)
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Network(_)), "got {err:?}");
    assert!(err.is_transient());
}
