use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use event_scheduler_api::{create_app, AppState};
use event_scheduler_core::IntakeConfig;
use event_scheduler_dispatcher::{BatchDispatcher, IntakeService};
use event_scheduler_testing_utils::{
    MockEventRepository, MockFailureNotifier, MockInvocationClient, SubmittedEventBuilder,
};

fn test_app() -> (Router, Arc<MockEventRepository>, Arc<MockInvocationClient>) {
    let repository = Arc::new(MockEventRepository::new());
    let invoker = Arc::new(MockInvocationClient::new());
    let notifier = Arc::new(MockFailureNotifier::new());
    let dispatcher = Arc::new(BatchDispatcher::new(
        invoker.clone(),
        "schedule".to_string(),
        200,
    ));
    let intake = Arc::new(IntakeService::new(
        repository.clone(),
        dispatcher,
        notifier,
        IntakeConfig::default(),
    ));
    let state = AppState {
        intake,
        event_repo: repository.clone(),
    };
    (create_app(state), repository, invoker)
}

fn post_events(body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/events")
        .header("content-type", "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _, _) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_submit_valid_batch_returns_accepted() {
    let (app, repository, _) = test_app();

    let events = vec![SubmittedEventBuilder::new().build()];
    let response = app
        .oneshot(post_events(serde_json::to_string(&events).unwrap()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["received"], 1);
    assert_eq!(body["data"]["accepted"], 1);
    assert_eq!(body["data"]["rejected"], 0);
    assert_eq!(repository.count(), 1);
}

#[tokio::test]
async fn test_submit_mixed_batch_reports_counts_without_http_error() {
    let (app, repository, _) = test_app();

    let events = vec![
        SubmittedEventBuilder::new().build(),
        SubmittedEventBuilder::new().without_target().build(),
    ];
    let response = app
        .oneshot(post_events(serde_json::to_string(&events).unwrap()))
        .await
        .unwrap();

    // 逐条校验失败不是HTTP错误
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["accepted"], 1);
    assert_eq!(body["data"]["rejected"], 1);
    assert_eq!(repository.count(), 1);
}

#[tokio::test]
async fn test_submit_near_term_event_fast_tracks() {
    let (app, _, invoker) = test_app();

    let events = vec![SubmittedEventBuilder::new().due_in_seconds(120).build()];
    let response = app
        .oneshot(post_events(serde_json::to_string(&events).unwrap()))
        .await
        .unwrap();

    let body = response_json(response).await;
    assert_eq!(body["data"]["fast_tracked"], 1);
    assert_eq!(invoker.call_count(), 1);
}

#[tokio::test]
async fn test_get_existing_event() {
    let (app, repository, _) = test_app();

    let events = vec![SubmittedEventBuilder::new().build()];
    app.clone()
        .oneshot(post_events(serde_json::to_string(&events).unwrap()))
        .await
        .unwrap();

    let record = &repository.get_all_events()[0];
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/events/{}", record.id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["id"], record.id.to_string());
    assert_eq!(body["data"]["status"], "NEW");
}

#[tokio::test]
async fn test_get_unknown_event_returns_404() {
    let (app, _, _) = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/api/events/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = response_json(response).await;
    assert_eq!(body["error"]["type"], "EVENT_NOT_FOUND");
}

#[tokio::test]
async fn test_malformed_body_is_client_error() {
    let (app, _, _) = test_app();

    let response = app
        .oneshot(post_events(json!({"not": "an array"}).to_string()))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
