#![allow(clippy::unwrap_used)]
// Integration tests for `SessionClient` using wiremock.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use ufanet_api::{
    Credentials, DOORPHONES_PATH, DoorphoneId, Error, SessionClient, TransportConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

const OPEN_42: &str = "/api/v0/skud/shared/42/open/";

async fn setup() -> (MockServer, SessionClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = SessionClient::with_client(
        reqwest::Client::new(),
        base_url,
        Credentials::new("u1", "p1"),
    );
    (server, client)
}

/// Client with a real cookie jar, for tests that depend on session cookies.
async fn setup_with_jar() -> (MockServer, SessionClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = SessionClient::new(
        base_url,
        Credentials::new("u1", "p1"),
        &TransportConfig::default(),
    )
    .unwrap();
    (server, client)
}

async fn mount_login_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

async fn count_requests(server: &MockServer, http_method: &str, request_path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == http_method && r.url.path() == request_path)
        .count()
}

/// Hands out a new session cookie (`sessionid=s1`, `s2`, ...) per login.
struct RotatingSession {
    logins: Arc<AtomicUsize>,
}

impl Respond for RotatingSession {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.logins.fetch_add(1, Ordering::SeqCst) + 1;
        ResponseTemplate::new(200).insert_header("set-cookie", format!("sessionid=s{n}; Path=/"))
    }
}

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_submits_form() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/login/"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("next=%2Foffice%2Fskud%2F"))
        .and(body_string_contains("contract=u1"))
        .and(body_string_contains("password=p1"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    assert!(!client.has_session());
    client.authenticate().await.unwrap();
    assert!(client.has_session());
}

#[tokio::test]
async fn test_login_failure_carries_status() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let result = client.authenticate().await;

    match result {
        Err(Error::Authentication { status, ref message }) => {
            assert_eq!(status, Some(403));
            assert!(message.contains("Forbidden"), "got: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
    assert!(!client.has_session());
}

#[tokio::test]
async fn test_login_unreachable_portal() {
    // Nothing listens on port 1.
    let base_url = Url::parse("http://127.0.0.1:1").unwrap();
    let client = SessionClient::with_client(
        reqwest::Client::new(),
        base_url,
        Credentials::new("u1", "p1"),
    );
    let err = client.authenticate().await.unwrap_err();

    assert!(matches!(err, Error::Authentication { status: None, .. }), "got: {err:?}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_login_stores_session_cookie() {
    let (server, client) = setup_with_jar().await;

    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(
            ResponseTemplate::new(200).insert_header("set-cookie", "sessionid=abc123; Path=/"),
        )
        .mount(&server)
        .await;

    client.authenticate().await.unwrap();

    assert_eq!(client.cookie_header().as_deref(), Some("sessionid=abc123"));
}

// ── Listing ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_reuses_session() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(DOORPHONES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    client.authenticate().await.unwrap();
    let doorphones = client.list_doorphones().await.unwrap();

    assert!(doorphones.is_empty());
}

#[tokio::test]
async fn test_list_logs_in_lazily() {
    let (server, client) = setup().await;
    mount_login_ok(&server).await;

    Mock::given(method("GET"))
        .and(path(DOORPHONES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 42, "string_view": "Front Gate"},
            {"id": 43}
        ])))
        .mount(&server)
        .await;

    let doorphones = client.list_doorphones().await.unwrap();

    assert_eq!(count_requests(&server, "POST", "/login/").await, 1);
    assert_eq!(doorphones.len(), 2);
    assert_eq!(doorphones[0].id, DoorphoneId::from(42_u64));
    assert_eq!(doorphones[0].display_name(), "Front Gate");
    assert_eq!(doorphones[1].display_name(), "Unknown Doorphone");
}

#[tokio::test]
async fn test_list_reauthenticates_once_on_401() {
    let (server, client) = setup().await;
    mount_login_ok(&server).await;

    Mock::given(method("GET"))
        .and(path(DOORPHONES_PATH))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(DOORPHONES_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": 42, "string_view": "Front Gate"}])),
        )
        .mount(&server)
        .await;

    client.authenticate().await.unwrap();
    let doorphones = client.list_doorphones().await.unwrap();

    assert_eq!(doorphones.len(), 1);
    assert_eq!(count_requests(&server, "GET", DOORPHONES_PATH).await, 2);
    assert_eq!(count_requests(&server, "POST", "/login/").await, 2);
}

#[tokio::test]
async fn test_list_gives_up_after_second_401() {
    let (server, client) = setup().await;
    mount_login_ok(&server).await;

    Mock::given(method("GET"))
        .and(path(DOORPHONES_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.list_doorphones().await.unwrap_err();

    assert!(matches!(err, Error::Fetch { status: Some(401), .. }), "got: {err:?}");
    assert!(err.is_unauthorized());
    assert_eq!(count_requests(&server, "GET", DOORPHONES_PATH).await, 2);
    // Lazy login + exactly one re-authentication.
    assert_eq!(count_requests(&server, "POST", "/login/").await, 2);
    assert!(!client.has_session());
}

#[tokio::test]
async fn test_list_server_error() {
    let (server, client) = setup().await;
    mount_login_ok(&server).await;

    Mock::given(method("GET"))
        .and(path(DOORPHONES_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client.list_doorphones().await.unwrap_err();

    match err {
        Error::Fetch { status, ref message } => {
            assert_eq!(status, Some(503));
            assert!(message.contains("maintenance"), "got: {message}");
        }
        other => panic!("expected Fetch error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_list_invalid_body_is_fetch_error() {
    let (server, client) = setup().await;
    mount_login_ok(&server).await;

    Mock::given(method("GET"))
        .and(path(DOORPHONES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let err = client.list_doorphones().await.unwrap_err();

    assert!(matches!(err, Error::Fetch { status: Some(200), .. }), "got: {err:?}");
}

#[tokio::test]
async fn test_list_propagates_login_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(DOORPHONES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let err = client.list_doorphones().await.unwrap_err();

    assert!(
        matches!(err, Error::Authentication { status: Some(401), .. }),
        "got: {err:?}"
    );
}

// ── Opening ─────────────────────────────────────────────────────────

async fn open_with_body(body: serde_json::Value) -> bool {
    let (server, client) = setup().await;
    mount_login_ok(&server).await;

    Mock::given(method("GET"))
        .and(path(OPEN_42))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(&server)
        .await;

    client.open_doorphone(&DoorphoneId::from(42_u64)).await.unwrap()
}

#[tokio::test]
async fn test_open_result_field() {
    assert!(open_with_body(json!({"result": true})).await);
    assert!(!open_with_body(json!({"result": false})).await);
    assert!(!open_with_body(json!({})).await);
}

#[tokio::test]
async fn test_open_reauthenticates_once_on_401() {
    let (server, client) = setup().await;
    mount_login_ok(&server).await;

    Mock::given(method("GET"))
        .and(path(OPEN_42))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(OPEN_42))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": true})))
        .mount(&server)
        .await;

    assert!(client.open_doorphone(&DoorphoneId::from(42_u64)).await.unwrap());
    assert_eq!(count_requests(&server, "GET", OPEN_42).await, 2);
    assert_eq!(count_requests(&server, "POST", "/login/").await, 2);
}

#[tokio::test]
async fn test_open_gives_up_after_second_401() {
    let (server, client) = setup().await;
    mount_login_ok(&server).await;

    Mock::given(method("GET"))
        .and(path(OPEN_42))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client.open_doorphone(&DoorphoneId::from(42_u64)).await.unwrap_err();

    assert!(matches!(err, Error::Open { status: Some(401), .. }), "got: {err:?}");
    assert_eq!(count_requests(&server, "GET", OPEN_42).await, 2);
}

#[tokio::test]
async fn test_open_not_found() {
    let (server, client) = setup().await;
    mount_login_ok(&server).await;

    Mock::given(method("GET"))
        .and(path("/api/v0/skud/shared/999/open/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.open_doorphone(&DoorphoneId::from(999_u64)).await.unwrap_err();

    assert!(matches!(err, Error::Open { status: Some(404), .. }), "got: {err:?}");
}

// ── Session sharing ─────────────────────────────────────────────────

#[tokio::test]
async fn test_concurrent_calls_share_one_reauthentication() {
    let (server, client) = setup_with_jar().await;
    let logins = Arc::new(AtomicUsize::new(0));

    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(RotatingSession {
            logins: Arc::clone(&logins),
        })
        .mount(&server)
        .await;

    // Only the second session is accepted; the first one has "expired".
    Mock::given(method("GET"))
        .and(path(DOORPHONES_PATH))
        .and(header("cookie", "sessionid=s2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": 1}])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path(OPEN_42))
        .and(header("cookie", "sessionid=s2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"result": true})))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    client.authenticate().await.unwrap();
    assert_eq!(logins.load(Ordering::SeqCst), 1);

    let id = DoorphoneId::from(42_u64);
    let (listed, opened) = tokio::join!(client.list_doorphones(), client.open_doorphone(&id));

    assert_eq!(listed.unwrap().len(), 1);
    assert!(opened.unwrap());
    assert_eq!(logins.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_concurrent_authenticate_funnels_into_one_login() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_millis(50)))
        .expect(1)
        .mount(&server)
        .await;

    let client = Arc::new(client);
    let calls = (0..4).map(|_| {
        let client = Arc::clone(&client);
        async move { client.authenticate().await }
    });
    let results = futures_util::future::join_all(calls).await;

    assert!(results.iter().all(Result::is_ok));
    assert!(client.has_session());
}

#[tokio::test]
async fn test_concurrent_authenticate_shares_rejected_login() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(ResponseTemplate::new(403).set_delay(std::time::Duration::from_millis(50)))
        .expect(1)
        .mount(&server)
        .await;

    let client = Arc::new(client);
    let calls = (0..4).map(|_| {
        let client = Arc::clone(&client);
        async move { client.authenticate().await }
    });
    let results = futures_util::future::join_all(calls).await;

    for result in results {
        let err = result.unwrap_err();
        assert!(
            matches!(err, Error::Authentication { status: Some(403), .. }),
            "got: {err:?}"
        );
    }
    assert!(!client.has_session());
}

#[tokio::test]
async fn test_concurrent_lists_share_rejected_login() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(ResponseTemplate::new(403).set_delay(std::time::Duration::from_millis(50)))
        .expect(1)
        .mount(&server)
        .await;

    let client = Arc::new(client);
    let calls = (0..4).map(|_| {
        let client = Arc::clone(&client);
        async move { client.list_doorphones().await }
    });
    let results = futures_util::future::join_all(calls).await;

    assert!(results.iter().all(|r| matches!(r, Err(Error::Authentication { .. }))));
    assert_eq!(count_requests(&server, "GET", DOORPHONES_PATH).await, 0);
}

#[tokio::test]
async fn test_login_retried_after_earlier_rejection() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/login/"))
        .respond_with(ResponseTemplate::new(403))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_login_ok(&server).await;

    assert!(client.authenticate().await.is_err());
    client.authenticate().await.unwrap();

    assert!(client.has_session());
    assert_eq!(count_requests(&server, "POST", "/login/").await, 2);
}

// ── Transport failures ──────────────────────────────────────────────

/// Client whose requests time out long before the portal answers.
async fn setup_with_timeout() -> (MockServer, SessionClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let transport = TransportConfig::default().with_timeout(std::time::Duration::from_millis(100));
    let client = SessionClient::new(base_url, Credentials::new("u1", "p1"), &transport).unwrap();
    mount_login_ok(&server).await;
    (server, client)
}

#[tokio::test]
async fn test_list_timeout_is_fetch_error() {
    let (server, client) = setup_with_timeout().await;

    Mock::given(method("GET"))
        .and(path(DOORPHONES_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(std::time::Duration::from_secs(1)),
        )
        .mount(&server)
        .await;

    let err = client.list_doorphones().await.unwrap_err();

    assert!(matches!(err, Error::Fetch { status: None, .. }), "got: {err:?}");
    assert!(err.is_transient());
    assert!(client.has_session());
}

#[tokio::test]
async fn test_open_timeout_is_open_error() {
    let (server, client) = setup_with_timeout().await;

    Mock::given(method("GET"))
        .and(path(OPEN_42))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"result": true}))
                .set_delay(std::time::Duration::from_secs(1)),
        )
        .mount(&server)
        .await;

    let err = client.open_doorphone(&DoorphoneId::from(42_u64)).await.unwrap_err();

    assert!(matches!(err, Error::Open { status: None, .. }), "got: {err:?}");
    assert!(err.is_transient());
}
