use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::Method;
use serde_json::{json, Value};
use sportclubs_core::auth::ACCESS_TOKEN_KEY;
use sportclubs_core::{ApiClient, ApiError, LocalStorage, RequestBody, TokenProvider, DEFAULT_UPCOMING_LIMIT};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN_PATH: &str = "/tokens/generate-my-token";
const SESSION_COOKIE: &str = "uid=session-123";

async fn mount_token(server: &MockServer, token: &str, expected_calls: u64) {
    Mock::given(method("GET"))
        .and(path(TOKEN_PATH))
        .and(header("cookie", SESSION_COOKIE))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": token })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn token_provider(server: &MockServer, storage: Option<LocalStorage>) -> TokenProvider {
    TokenProvider::new(
        format!("{}{}", server.uri(), TOKEN_PATH),
        Some(SESSION_COOKIE.to_string()),
        storage,
        None,
    )
    .expect("Failed to build token provider")
}

fn api_client(server: &MockServer) -> ApiClient {
    ApiClient::new(format!("{}/api", server.uri()), token_provider(server, None), None)
        .expect("Failed to build API client")
}

fn clubs_body() -> Value {
    json!([{
        "id": 1,
        "name": "Swimming",
        "description": "Pool sessions",
        "total_groups": 1,
        "groups": [{
            "id": 11,
            "name": "Evening",
            "description": "",
            "capacity": 15,
            "current_enrollment": 10,
            "is_club": true,
            "accredited": true,
            "trainers": [],
            "allowed_medical_groups": ["main"],
            "trainings": [{
                "id": 101,
                "start": "2099-01-14T18:00:00+03:00",
                "end": "2099-01-14T19:30:00+03:00",
                "training_class": null,
                "group_accredited": true,
                "can_grade": false,
                "can_check_in": true,
                "checked_in": false,
                "participants": {"total_checked_in": 0, "students": []},
                "capacity": 15,
                "available_spots": 5
            }]
        }]
    }])
}

#[tokio::test]
async fn test_get_clubs_sends_fresh_bearer_token() {
    let server = MockServer::start().await;
    mount_token(&server, "token-1", 1).await;

    Mock::given(method("GET"))
        .and(path("/api/clubs"))
        .and(header("authorization", "Bearer token-1"))
        .and(header("accept", "application/json"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(clubs_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = api_client(&server);
    let clubs = client.get_clubs().await.expect("clubs request should succeed");

    assert_eq!(clubs.len(), 1);
    assert_eq!(clubs[0].name, "Swimming");
    assert_eq!(clubs[0].groups[0].trainings[0].available_spots, 5);
    assert_eq!(client.tokens().current_token().await.as_deref(), Some("token-1"));

    // Session cookie goes to the accounts service only
    let requests = server.received_requests().await.expect("request recording enabled");
    let api_request = requests
        .iter()
        .find(|r| r.url.path() == "/api/clubs")
        .expect("clubs request recorded");
    assert!(api_request.headers.get("cookie").is_none());
}

#[tokio::test]
async fn test_null_training_fields_skip_only_that_record() {
    let server = MockServer::start().await;
    mount_token(&server, "token", 1).await;

    let mut body = clubs_body();
    let broken = json!({
        "id": 102,
        "start": null,
        "end": null,
        "training_class": null,
        "participants": null,
        "capacity": null,
        "available_spots": null
    });
    body[0]["groups"][0]["trainings"]
        .as_array_mut()
        .expect("trainings array")
        .insert(0, broken);

    Mock::given(method("GET"))
        .and(path("/api/clubs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let clubs = api_client(&server).get_clubs().await.expect("clubs with a null training should parse");
    assert_eq!(clubs[0].groups[0].trainings.len(), 2);

    let sessions = clubs[0].upcoming_sessions(Utc::now(), DEFAULT_UPCOMING_LIMIT);
    let ids: Vec<i64> = sessions.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![101]);
    assert_eq!(sessions[0].training_class, "Training");
}

#[tokio::test]
async fn test_every_call_reacquires_token() {
    let server = MockServer::start().await;
    mount_token(&server, "token-2", 2).await;

    Mock::given(method("GET"))
        .and(path("/api/faq"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "How do I sign up?": "Pick a group and press Join.",
            "Where is the gym?": "Sports complex, floor 2."
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = api_client(&server);
    let first = client.get_faq().await.unwrap();
    let second = client.get_faq().await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    assert_eq!(first["Where is the gym?"], "Sports complex, floor 2.");
}

#[tokio::test]
async fn test_forbidden_is_auth_error() {
    let server = MockServer::start().await;
    mount_token(&server, "stale", 1).await;

    Mock::given(method("GET"))
        .and(path("/api/clubs"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Not enough permissions"})))
        .mount(&server)
        .await;

    let err = api_client(&server).get_clubs().await.unwrap_err();
    assert_eq!(err.to_string(), "Authentication failed: Not enough permissions");
    match err {
        ApiError::Auth { status, status_text, details, .. } => {
            assert_eq!(status, 403);
            assert_eq!(status_text, "Forbidden");
            assert_eq!(details, Some(json!({"detail": "Not enough permissions"})));
        }
        other => panic!("expected Auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_without_detail_reports_access_denied() {
    let server = MockServer::start().await;
    mount_token(&server, "stale", 1).await;

    Mock::given(method("GET"))
        .and(path("/api/faq"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = api_client(&server).get_faq().await.unwrap_err();
    assert_eq!(err.to_string(), "Authentication failed: Access denied");
}

#[tokio::test]
async fn test_server_error_keeps_details_best_effort() {
    let server = MockServer::start().await;
    mount_token(&server, "token", 2).await;

    Mock::given(method("GET"))
        .and(path("/api/clubs"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/faq"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not Found"})))
        .mount(&server)
        .await;

    let client = api_client(&server);
    match client.get_clubs().await.unwrap_err() {
        ApiError::Api { status, status_text, details } => {
            assert_eq!(status, 500);
            assert_eq!(status_text, "Internal Server Error");
            assert!(details.is_none());
        }
        other => panic!("expected Api error, got {other:?}"),
    }
    match client.get_faq().await.unwrap_err() {
        ApiError::Api { status, details, .. } => {
            assert_eq!(status, 404);
            assert_eq!(details, Some(json!({"detail": "Not Found"})));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_body_is_none() {
    let server = MockServer::start().await;
    mount_token(&server, "token", 2).await;

    Mock::given(method("GET"))
        .and(path("/api/faq"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/groups/11/enroll"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = api_client(&server);
    assert!(client.get_faq().await.unwrap().is_empty());

    let result: Option<Value> = client
        .execute("/groups/11/enroll", Method::DELETE, None, None)
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_unparseable_success_body_is_malformed() {
    let server = MockServer::start().await;
    mount_token(&server, "token", 1).await;

    Mock::given(method("GET"))
        .and(path("/api/clubs"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let err = api_client(&server).get_clubs().await.unwrap_err();
    assert!(matches!(err, ApiError::MalformedResponse { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_token_failure_skips_resource_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/clubs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(clubs_body()))
        .expect(0)
        .mount(&server)
        .await;

    let err = api_client(&server).get_clubs().await.unwrap_err();
    assert!(matches!(err, ApiError::AuthUnavailable(_)), "got {err:?}");
}

#[tokio::test]
async fn test_token_response_without_access_token_is_unavailable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token": "wrong-field"})))
        .mount(&server)
        .await;

    let err = token_provider(&server, None).acquire_token().await.unwrap_err();
    assert!(matches!(err, ApiError::AuthUnavailable(_)), "got {err:?}");
}

#[tokio::test]
async fn test_unreachable_api_is_network_error() {
    let server = MockServer::start().await;
    mount_token(&server, "token", 1).await;

    // Nothing listens on port 1
    let client = ApiClient::new("http://127.0.0.1:1/api", token_provider(&server, None), None).unwrap();
    let err = client.get_clubs().await.unwrap_err();

    assert!(matches!(err, ApiError::Network { .. }), "got {err:?}");
    assert!(err.to_string().starts_with("Network error: Unable to connect to API at http://127.0.0.1:1/api/clubs"));
}

#[tokio::test]
async fn test_unreachable_identity_endpoint_is_auth_unavailable() {
    let provider = TokenProvider::new("http://127.0.0.1:1/tokens/generate-my-token", None, None, None).unwrap();
    let err = provider.acquire_token().await.unwrap_err();
    assert!(matches!(err, ApiError::AuthUnavailable(_)), "got {err:?}");
    assert!(!provider.has_session().await);
}

#[tokio::test]
async fn test_acquired_token_is_persisted_as_json_string() {
    let server = MockServer::start().await;
    mount_token(&server, "fresh-token", 1).await;

    let dir = tempfile::tempdir().unwrap();
    let provider = token_provider(&server, Some(LocalStorage::open(dir.path())));
    assert!(!provider.has_session().await);

    let token = provider.acquire_token().await.unwrap();
    assert_eq!(token, "fresh-token");

    let storage = LocalStorage::open(dir.path());
    assert_eq!(
        storage.get_item(ACCESS_TOKEN_KEY).unwrap().as_deref(),
        Some("\"fresh-token\"")
    );
}

#[tokio::test]
async fn test_json_body_and_header_overrides() {
    let server = MockServer::start().await;
    mount_token(&server, "token", 1).await;

    Mock::given(method("POST"))
        .and(path("/api/trainings/101/check-in"))
        .and(header("content-type", "application/json"))
        .and(header("accept", "application/vnd.sport+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"checked_in": true})))
        .expect(1)
        .mount(&server)
        .await;

    let mut extra = HeaderMap::new();
    extra.insert(ACCEPT, HeaderValue::from_static("application/vnd.sport+json"));

    let result: Option<Value> = api_client(&server)
        .execute(
            "/trainings/101/check-in",
            Method::POST,
            Some(RequestBody::Json(json!({"student_id": 7}))),
            Some(extra),
        )
        .await
        .unwrap();
    assert_eq!(result, Some(json!({"checked_in": true})));

    let requests = server.received_requests().await.unwrap();
    let post = requests.iter().find(|r| r.method.as_str() == "POST").unwrap();
    let body: Value = serde_json::from_slice(&post.body).unwrap();
    assert_eq!(body, json!({"student_id": 7}));
}

#[tokio::test]
async fn test_multipart_body_uses_transport_content_type() {
    let server = MockServer::start().await;
    mount_token(&server, "token", 1).await;

    Mock::given(method("POST"))
        .and(path("/api/medical/certificates"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let form = reqwest::multipart::Form::new().text("comment", "annual certificate");
    let result: Option<Value> = api_client(&server)
        .execute("/medical/certificates", Method::POST, Some(RequestBody::Multipart(form)), None)
        .await
        .unwrap();
    assert!(result.is_none());

    let requests = server.received_requests().await.unwrap();
    let post = requests.iter().find(|r| r.method.as_str() == "POST").unwrap();
    let content_type = post.headers.get("content-type").unwrap().to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="), "got {content_type}");
}

#[tokio::test]
async fn test_concurrent_calls_acquire_their_own_tokens() {
    let server = MockServer::start().await;
    mount_token(&server, "shared", 2).await;

    Mock::given(method("GET"))
        .and(path("/api/clubs"))
        .and(header("authorization", "Bearer shared"))
        .respond_with(ResponseTemplate::new(200).set_body_json(clubs_body()))
        .expect(2)
        .mount(&server)
        .await;

    let client = api_client(&server);
    let (first, second) = tokio::join!(client.get_clubs(), client.get_clubs());

    assert_eq!(first.unwrap(), second.unwrap());
}
