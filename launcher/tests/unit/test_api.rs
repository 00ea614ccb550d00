//! Deployment API client tests against a mock service

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use docklaunch::app::options::{AppOptions, Command};
use docklaunch::app::run::{run, Outcome};
use docklaunch::deploy::controller::{
    ControllerEvent, LifecycleController, Navigation, DEPLOY_FAILURE_NOTICE,
};
use docklaunch::deploy::fsm::{FailureKind, FsmSettings, LifecycleState};
use docklaunch::errors::LauncherError;
use docklaunch::http::client::HttpClient;
use docklaunch::models::deployment::SourceReference;

const REPO: &str = "https://github.com/acme/app";

fn client(server: &MockServer) -> HttpClient {
    let base = format!("{}/api/", server.uri());
    HttpClient::new(&base, Duration::from_secs(5)).unwrap()
}

fn options(server: &MockServer, assume_yes: bool) -> AppOptions {
    AppOptions {
        backend_base_url: format!("{}/api/", server.uri()),
        request_timeout: Duration::from_secs(5),
        assume_yes,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_create_deployment_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/deploy/"))
        .and(body_json(json!({ "repo_url": REPO })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "container_id": "c1",
            "ngrok_url": "https://x.ngrok.io"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let record = assert_ok!(client(&server).create_deployment(REPO).await);
    assert_eq!(record.container_id(), "c1");
    assert_eq!(record.public_url, "https://x.ngrok.io");
    assert_eq!(record.source_reference.as_known(), Some(REPO));
}

#[tokio::test]
async fn test_create_deployment_server_error_carries_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/deploy/"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "error": "Failed to build image" })),
        )
        .mount(&server)
        .await;

    let err = assert_err!(client(&server).create_deployment(REPO).await);
    match err {
        LauncherError::RequestFailed { status, detail } => {
            assert_eq!(status, 500);
            assert_eq!(detail, "Failed to build image");
        }
        other => panic!("Expected RequestFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_create_deployment_missing_url_is_invalid_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/deploy/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "container_id": "c1" })))
        .mount(&server)
        .await;

    let err = assert_err!(client(&server).create_deployment(REPO).await);
    assert!(matches!(err, LauncherError::InvalidResponseShape(_)));
}

#[tokio::test]
async fn test_create_deployment_non_json_body_is_invalid_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/deploy/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let err = assert_err!(client(&server).create_deployment(REPO).await);
    assert!(matches!(err, LauncherError::InvalidResponseShape(_)));
}

#[tokio::test]
async fn test_transport_error_when_service_unreachable() {
    let client = HttpClient::new("http://127.0.0.1:1/api/", Duration::from_secs(2)).unwrap();

    let err = assert_err!(client.create_deployment(REPO).await);
    assert!(matches!(err, LauncherError::TransportError(_)));
}

#[tokio::test]
async fn test_get_status_has_unknown_source() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status/c1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "container_id": "c1",
            "ngrok_url": "https://x.ngrok.io"
        })))
        .mount(&server)
        .await;

    let record = assert_ok!(client(&server).get_deployment_status("c1").await);
    assert_eq!(record.container_id(), "c1");
    assert_eq!(record.source_reference, SourceReference::Unknown);
}

#[tokio::test]
async fn test_get_status_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status/gone/"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "error": "Container not found" })),
        )
        .mount(&server)
        .await;

    let err = assert_err!(client(&server).get_deployment_status("gone").await);
    match err {
        LauncherError::NotFound(msg) => assert!(msg.contains("Container not found")),
        other => panic!("Expected NotFound, got {:?}", other),
    }
}

#[tokio::test]
async fn test_stop_deployment() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/stop/"))
        .and(body_json(json!({ "container_id": "c1" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "message": "Container stopped and removed" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let message = assert_ok!(client(&server).stop_deployment("c1").await);
    assert_eq!(message, "Container stopped and removed");
}

#[tokio::test]
async fn test_stop_deployment_without_message_is_invalid_shape() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/stop/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "" })))
        .mount(&server)
        .await;

    let err = assert_err!(client(&server).stop_deployment("c1").await);
    assert!(matches!(err, LauncherError::InvalidResponseShape(_)));
}

#[tokio::test]
async fn test_stop_deployment_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/stop/"))
        .respond_with(ResponseTemplate::new(500).set_body_string(""))
        .mount(&server)
        .await;

    let err = assert_err!(client(&server).stop_deployment("c1").await);
    match err {
        LauncherError::RequestFailed { status, detail } => {
            assert_eq!(status, 500);
            assert_eq!(detail, "Internal Server Error");
        }
        other => panic!("Expected RequestFailed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_stop_by_repository_sends_repo_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/stop/"))
        .and(body_json(json!({ "repo_url": REPO })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Stopped" })))
        .expect(1)
        .mount(&server)
        .await;

    let message = assert_ok!(client(&server).stop_deployment_by_repository(REPO).await);
    assert_eq!(message, "Stopped");
}

#[tokio::test]
async fn test_controller_full_lifecycle_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/deploy/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "container_id": "abcdef0123456789",
            "ngrok_url": "https://x.ngrok.io"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/stop/"))
        .and(body_json(json!({ "container_id": "abcdef0123456789" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Stopped" })))
        .expect(1)
        .mount(&server)
        .await;
    // The hand-off record makes a status query unnecessary
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let (controller, mut events) =
        LifecycleController::new(Arc::new(client(&server)), FsmSettings::default());

    assert_eq!(controller.submit(REPO).await, LifecycleState::Active);

    let mut navigation = None;
    while let Ok(event) = events.try_recv() {
        if let ControllerEvent::Navigate(target) = event {
            navigation = Some(target);
        }
    }
    let Some(Navigation::Deployment {
        container_id,
        hand_off,
    }) = navigation
    else {
        panic!("Expected navigation to the deployment view");
    };

    controller.leave();
    assert_eq!(
        controller.enter(&container_id, Some(hand_off)).await,
        LifecycleState::Active
    );

    controller.request_stop();
    assert_eq!(controller.confirm_stop().await, LifecycleState::Stopped);
    assert!(controller.view().record.is_none());
}

#[tokio::test]
async fn test_controller_not_found_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status/missing/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "No such container" })))
        .mount(&server)
        .await;

    let (controller, _events) =
        LifecycleController::new(Arc::new(client(&server)), FsmSettings::default());

    assert_eq!(
        controller.enter("missing", None).await,
        LifecycleState::Failed(FailureKind::NotFound)
    );
}

#[tokio::test]
async fn test_run_status_command() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status/c1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "container_id": "c1",
            "ngrok_url": "https://x.ngrok.io"
        })))
        .mount(&server)
        .await;

    let command = Command::Status {
        container_id: "c1".to_string(),
    };
    let mut input: &[u8] = b"";
    let outcome = assert_ok!(run(command, options(&server, false), &mut input).await);
    assert_eq!(outcome, Outcome::Succeeded);
}

#[tokio::test]
async fn test_run_stop_command_declined() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status/c1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "container_id": "c1",
            "ngrok_url": "https://x.ngrok.io"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/stop/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Stopped" })))
        .expect(0)
        .mount(&server)
        .await;

    let command = Command::Stop {
        container_id: "c1".to_string(),
    };
    let mut input: &[u8] = b"n\n";
    let outcome = assert_ok!(run(command, options(&server, false), &mut input).await);
    assert_eq!(outcome, Outcome::Cancelled);
}

#[tokio::test]
async fn test_run_stop_command_confirmed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status/c1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "container_id": "c1",
            "ngrok_url": "https://x.ngrok.io"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/stop/"))
        .and(body_json(json!({ "container_id": "c1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Stopped" })))
        .expect(1)
        .mount(&server)
        .await;

    let command = Command::Stop {
        container_id: "c1".to_string(),
    };
    let mut input: &[u8] = b"yes\n";
    let outcome = assert_ok!(run(command, options(&server, false), &mut input).await);
    assert_eq!(outcome, Outcome::Succeeded);
}

#[tokio::test]
async fn test_run_deploy_rejects_invalid_reference() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let command = Command::Deploy {
        repository: "not a url".to_string(),
    };
    let mut input: &[u8] = b"";
    let outcome = assert_ok!(run(command, options(&server, true), &mut input).await);
    assert_eq!(outcome, Outcome::Failed);
}

#[tokio::test]
async fn test_run_stop_repo_rejects_invalid_reference() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/stop/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Stopped" })))
        .expect(0)
        .mount(&server)
        .await;

    let command = Command::StopRepository {
        repository: "https://gitlab.com/acme/app".to_string(),
    };
    let mut input: &[u8] = b"yes\n";
    let outcome = assert_ok!(run(command, options(&server, false), &mut input).await);
    assert_eq!(outcome, Outcome::Failed);
}

#[tokio::test]
async fn test_run_stop_repo_honours_operation_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/stop/"))
        .and(body_json(json!({ "repo_url": REPO })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "message": "Stopped" }))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut options = options(&server, true);
    options.fsm_settings = FsmSettings {
        operation_timeout: Duration::from_millis(500),
    };

    let command = Command::StopRepository {
        repository: REPO.to_string(),
    };
    let mut input: &[u8] = b"";
    let started = Instant::now();
    let outcome = assert_ok!(run(command, options, &mut input).await);
    assert_eq!(outcome, Outcome::Failed);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_controller_notice_omits_html_error_page() {
    let server = MockServer::start().await;
    let page = format!(
        "<html><head><title>502 Bad Gateway</title></head><body>{}</body></html>",
        "x".repeat(4000)
    );
    Mock::given(method("POST"))
        .and(path("/api/deploy/"))
        .respond_with(ResponseTemplate::new(502).set_body_string(page))
        .mount(&server)
        .await;

    let (controller, mut events) =
        LifecycleController::new(Arc::new(client(&server)), FsmSettings::default());
    assert_eq!(controller.submit(REPO).await, LifecycleState::Idle);

    let mut texts = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let ControllerEvent::Notice(notice) = event {
            texts.push(notice.text);
        }
    }
    assert_eq!(texts, vec![format!("{}: Bad Gateway", DEPLOY_FAILURE_NOTICE)]);
}
