//! HttpBackend tests against a mock HTTP server.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bookopt_core::{
    backend::{Backend, BackendError, HttpBackend, ResultStatus, UploadToken},
    config::ApiConfig,
    testing::{fixtures, RecordingPresenter},
    Limits, PollSchedule, TaskState, UploadOrchestrator, Validator,
};

fn backend_for(server: &MockServer) -> HttpBackend {
    HttpBackend::new(&ApiConfig {
        base_url: server.uri(),
        timeout_secs: 5,
    })
    .expect("client")
}

#[tokio::test]
async fn test_upload_returns_token_and_problem_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(body_string_contains("filename=\"plan.json\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fileName": "plan_valid_ab12cd.json",
            "problemId": "P1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let token = backend_for(&server)
        .upload(&fixtures::json_file("plan.json", 32))
        .await
        .unwrap();

    assert_eq!(token.as_str(), "plan_valid_ab12cd.json");
    assert_eq!(token.problem_id(), Some("P1"));
}

#[tokio::test]
async fn test_upload_accepts_numeric_or_null_problem_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fileName": "x_valid_000000.json",
            "problemId": 42
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fileName": "y_valid_000000.json",
            "problemId": null
        })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let first = backend.upload(&fixtures::json_file("x.json", 8)).await.unwrap();
    let second = backend.upload(&fixtures::json_file("y.json", 8)).await.unwrap();

    assert_eq!(first.problem_id(), Some("42"));
    assert_eq!(second.problem_id(), None);
}

#[tokio::test]
async fn test_upload_error_uses_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "server error"})))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .upload(&fixtures::json_file("a.json", 8))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        BackendError::Status {
            status: 500,
            detail: "server error".into()
        }
    );
}

#[tokio::test]
async fn test_upload_error_without_json_body_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .upload(&fixtures::json_file("a.json", 8))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        BackendError::Status {
            status: 502,
            detail: "Upload failed for a.json (502)".into()
        }
    );
}

#[tokio::test]
async fn test_upload_malformed_success_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&server)
        .await;

    let err = backend_for(&server)
        .upload(&fixtures::json_file("a.json", 8))
        .await
        .unwrap_err();

    assert!(matches!(err, BackendError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_check_result_pending_and_ready() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/result"))
        .and(query_param("fileName", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ready": false})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/result"))
        .and(query_param("fileName", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ready": true,
            "jsonUrl": "/j/abc.json",
            "imageUrl": "/i/abc.png",
            "expiresInMinutes": 60,
            "problemId": "P1"
        })))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let token = UploadToken::new("abc", None);

    assert_eq!(backend.check_result(&token).await.unwrap(), ResultStatus::Pending);
    match backend.check_result(&token).await.unwrap() {
        ResultStatus::Ready(result) => {
            assert_eq!(result.json_url, "/j/abc.json");
            assert_eq!(result.image_url, "/i/abc.png");
            assert_eq!(result.expires_in_minutes, Some(60));
            assert_eq!(result.problem_id.as_deref(), Some("P1"));
        }
        other => panic!("expected ready, got {:?}", other),
    }
}

#[tokio::test]
async fn test_check_result_ready_without_links_is_failed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/result"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ready": true,
            "jsonUrl": "/j/abc.json"
        })))
        .mount(&server)
        .await;

    let status = backend_for(&server)
        .check_result(&UploadToken::new("abc", None))
        .await
        .unwrap();

    assert_eq!(
        status,
        ResultStatus::Failed {
            reason: "result reported ready without an image link".into()
        }
    );
}

#[tokio::test]
async fn test_check_result_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/result"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "detail": "fileName must end with .json"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/result"))
        .and(query_param("fileName", "down"))
        .respond_with(ResponseTemplate::new(503))
        .with_priority(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let bad = backend
        .check_result(&UploadToken::new("abc.txt", None))
        .await
        .unwrap_err();
    let down = backend
        .check_result(&UploadToken::new("down", None))
        .await
        .unwrap_err();

    assert_eq!(
        bad,
        BackendError::Status {
            status: 400,
            detail: "fileName must end with .json".into()
        }
    );
    assert_eq!(
        down,
        BackendError::Status {
            status: 503,
            detail: "Result check failed (503)".into()
        }
    );
}

#[tokio::test]
async fn test_echo_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/echo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Payload received",
            "data": {"hello": "world"}
        })))
        .mount(&server)
        .await;

    let reply = backend_for(&server)
        .echo(&json!({"hello": "world"}))
        .await
        .unwrap();

    assert_eq!(reply["message"], "Payload received");
    assert_eq!(reply["data"]["hello"], "world");
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let backend = HttpBackend::new(&ApiConfig {
        base_url: uri,
        timeout_secs: 2,
    })
    .unwrap();
    let err = backend
        .upload(&fixtures::json_file("a.json", 8))
        .await
        .unwrap_err();

    assert!(
        matches!(err, BackendError::ConnectionFailed(_) | BackendError::InvalidRequest(_)),
        "unexpected error: {:?}",
        err
    );
}

#[tokio::test]
async fn test_orchestrator_over_http_reaches_ready() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "fileName": "abc",
            "problemId": "P1"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/result"))
        .and(query_param("fileName", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ready": false})))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/result"))
        .and(query_param("fileName", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ready": true,
            "jsonUrl": "/j/abc.json",
            "imageUrl": "/i/abc.png"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let presenter = Arc::new(RecordingPresenter::new());
    let orchestrator = UploadOrchestrator::new(
        Validator::new(Limits::default()),
        Arc::new(backend_for(&server)),
        PollSchedule::new(Duration::from_millis(20), 30),
        presenter.clone(),
    );

    let reports = orchestrator
        .submit(vec![fixtures::json_file("a.json", 10 * 1024)])
        .unwrap()
        .join()
        .await;

    match &reports[0].state {
        TaskState::Ready(result) => {
            assert_eq!(result.json_url, "/j/abc.json");
            assert_eq!(result.image_url, "/i/abc.png");
        }
        other => panic!("expected ready, got {:?}", other),
    }
    assert_eq!(presenter.busy_transitions(), vec![true, false]);
}
