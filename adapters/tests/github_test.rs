use adapters::GithubContentStore;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use errors::RemoteError;
use serde_json::json;
use std::time::Duration;
use tn_core::remote::{FetchOutcome, VersionToken, WriteOutcome, WriteRequest};
use tn_core::traits::RemoteObjectStore;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "test-token";
const CONTENTS: &str = "/repos/octo/clodcode/contents/youtube/data.json";

fn store(server: &MockServer) -> GithubContentStore {
    GithubContentStore::new(
        &server.uri(),
        "octo",
        "clodcode",
        TOKEN,
        Duration::from_secs(5)
    )
    .unwrap()
}

fn write_request(expected: Option<&str>) -> WriteRequest {
    WriteRequest {
        path: "youtube/data.json".to_string(),
        content: r#"{"version":2}"#.to_string(),
        expected_version: expected.map(|v| VersionToken::new(v.to_string())),
        branch: "master".to_string(),
        message: "Sync YouTube data - 2026-01-01T00:00:00.000Z".to_string()
    }
}

#[tokio::test]
async fn test_fetch_found_decodes_wrapped_base64() {
    let server = MockServer::start().await;
    let document = r#"{"version":2,"watchHistory":[],"videos":{}}"#;
    let encoded = STANDARD.encode(document);
    let wrapped = format!("{}\n{}\n", &encoded[..10], &encoded[10..]);

    Mock::given(method("GET"))
        .and(path(CONTENTS))
        .and(query_param("ref", "master"))
        .and(header("Authorization", format!("Bearer {}", TOKEN).as_str()))
        .and(header("Accept", "application/vnd.github.v3+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": wrapped,
            "encoding": "base64",
            "sha": "sha-1"
        })))
        .mount(&server)
        .await;

    let outcome = store(&server)
        .fetch_object("youtube/data.json", "master")
        .await
        .unwrap();
    match outcome {
        FetchOutcome::Found(object) => {
            assert_eq!(object.content, document);
            assert_eq!(object.version.as_str(), "sha-1");
        }
        FetchOutcome::NotFound => panic!("expected a found object")
    }
}

#[tokio::test]
async fn test_fetch_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;

    let outcome = store(&server)
        .fetch_object("youtube/data.json", "master")
        .await
        .unwrap();
    assert!(matches!(outcome, FetchOutcome::NotFound));
}

#[tokio::test]
async fn test_fetch_unauthorized_is_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({ "message": "Bad credentials" }))
        )
        .mount(&server)
        .await;

    let err = store(&server)
        .fetch_object("youtube/data.json", "master")
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::AuthFailure { ref reason } if reason == "Bad credentials"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_fetch_rate_limited_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "0")
                .insert_header("retry-after", "12")
                .set_body_json(json!({ "message": "API rate limit exceeded" }))
        )
        .mount(&server)
        .await;

    let err = store(&server)
        .fetch_object("youtube/data.json", "master")
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::RateLimited { retry_after: 12 }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_fetch_forbidden_is_access_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS))
        .respond_with(
            ResponseTemplate::new(403)
                .insert_header("x-ratelimit-remaining", "4999")
                .set_body_json(json!({ "message": "Resource not accessible by integration" }))
        )
        .mount(&server)
        .await;

    let err = store(&server)
        .fetch_object("youtube/data.json", "master")
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::AccessFailure { .. }));
    assert!(err.is_configuration());
}

#[tokio::test]
async fn test_fetch_server_error_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = store(&server)
        .fetch_object("youtube/data.json", "master")
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Transient { .. }));
}

#[tokio::test]
async fn test_fetch_malformed_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = store(&server)
        .fetch_object("youtube/data.json", "master")
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Decode { .. }));
}

#[tokio::test]
async fn test_fetch_timeout_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let store = GithubContentStore::new(
        &server.uri(),
        "octo",
        "clodcode",
        TOKEN,
        Duration::from_millis(100)
    )
    .unwrap();
    let err = store
        .fetch_object("youtube/data.json", "master")
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Transient { .. }));
}

#[tokio::test]
async fn test_write_sends_sha_and_returns_new_version() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS))
        .and(header("Authorization", format!("Bearer {}", TOKEN).as_str()))
        .and(body_partial_json(json!({
            "content": STANDARD.encode(r#"{"version":2}"#),
            "branch": "master",
            "sha": "sha-1",
            "message": "Sync YouTube data - 2026-01-01T00:00:00.000Z"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": { "sha": "sha-2", "path": "youtube/data.json" },
            "commit": { "sha": "commit-1" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = store(&server)
        .write_object(write_request(Some("sha-1")))
        .await
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Written(VersionToken::new("sha-2".to_string())));
}

#[tokio::test]
async fn test_write_create_omits_sha() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "content": { "sha": "sha-new" }
        })))
        .mount(&server)
        .await;

    let outcome = store(&server).write_object(write_request(None)).await.unwrap();
    assert_eq!(outcome, WriteOutcome::Written(VersionToken::new("sha-new".to_string())));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert!(body.get("sha").is_none());
}

#[tokio::test]
async fn test_write_conflict_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS))
        .and(body_partial_json(json!({ "sha": "stale-409" })))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "youtube/data.json does not match sha-9"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS))
        .and(body_partial_json(json!({ "sha": "stale-422" })))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Invalid request.\n\n\"sha\" wasn't supplied."
        })))
        .mount(&server)
        .await;

    let store = store(&server);
    assert_eq!(
        store.write_object(write_request(Some("stale-409"))).await.unwrap(),
        WriteOutcome::Conflict
    );
    assert_eq!(
        store.write_object(write_request(Some("stale-422"))).await.unwrap(),
        WriteOutcome::Conflict
    );
}

#[tokio::test]
async fn test_write_other_unprocessable_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path(CONTENTS))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Invalid request. content is not valid Base64"
        })))
        .mount(&server)
        .await;

    let err = store(&server)
        .write_object(write_request(Some("sha-1")))
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Rejected { status: 422, .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_verify_credentials_returns_login() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("Authorization", format!("Bearer {}", TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "login": "octo", "id": 1 })))
        .mount(&server)
        .await;

    let login = store(&server).verify_credentials().await.unwrap();
    assert_eq!(login, "octo");
}

#[tokio::test]
async fn test_verify_repository_missing_is_access_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/octo/clodcode"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
        .mount(&server)
        .await;

    let err = store(&server).verify_repository().await.unwrap_err();
    assert!(matches!(
        err,
        RemoteError::AccessFailure { ref resource, .. } if resource == "octo/clodcode"
    ));
}
