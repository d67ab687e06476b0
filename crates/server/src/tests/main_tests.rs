use super::*;
use crate::test_support::{sample_request_json, RecordingGenerator};
use axum::{body, body::Body, http::Request, response::Response};
use shared::error::ErrorCode;
use tower::ServiceExt;

fn test_app(credential: Option<&str>, generator: &RecordingGenerator) -> Router {
    let state = AppState {
        service: InterpretationService::new(
            credential.map(str::to_string),
            Arc::new(generator.clone()),
        ),
        body_limit_bytes: 16 * 1024,
    };
    build_router(Arc::new(state))
}

fn post_json(value: &serde_json::Value) -> Request<Body> {
    Request::post(INTERPRET_ROUTE)
        .header("content-type", "application/json")
        .body(Body::from(value.to_string()))
        .expect("request")
}

async fn json_body(response: Response) -> serde_json::Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let app = test_app(Some("sk-test"), &RecordingGenerator::default());
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn interpret_returns_generated_text() {
    let generator = RecordingGenerator::default();
    let app = test_app(Some("sk-test"), &generator);

    let response = app
        .oneshot(post_json(&sample_request_json()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let dto: InterpretationResponse =
        serde_json::from_value(json_body(response).await).expect("dto");
    assert!(!dto.interpretation.is_empty());
    assert_eq!(generator.calls(), 1);

    let prompt = generator.last_prompt().expect("prompt");
    assert!(prompt.contains("Will I find love?"));
    assert!(prompt.contains("The Fool"));
}

#[tokio::test]
async fn flat_card_list_returns_bad_request_without_upstream_call() {
    let generator = RecordingGenerator::default();
    let app = test_app(Some("sk-test"), &generator);

    let flat = serde_json::json!({
        "question": "Will I find love?",
        "cards": [
            { "name": "The Star", "orientation": "upright", "keywords": ["hope"], "position": "Future" },
            { "name": "The Fool", "orientation": "upright", "keywords": ["beginnings"], "position": "Past" },
            { "name": "The Magician", "orientation": "reversed", "keywords": ["willpower"], "position": "Present" }
        ]
    });
    let response = app.oneshot(post_json(&flat)).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ApiError = serde_json::from_value(json_body(response).await).expect("error");
    assert_eq!(error.code, ErrorCode::BadRequest);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn card_with_extra_position_key_returns_bad_request() {
    let generator = RecordingGenerator::default();
    let app = test_app(Some("sk-test"), &generator);

    let mut request = sample_request_json();
    request["cards"]["past"]["position"] = serde_json::json!("Future");
    let response = app.oneshot(post_json(&request)).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn missing_cards_returns_bad_request() {
    let generator = RecordingGenerator::default();
    let app = test_app(Some("sk-test"), &generator);

    let response = app
        .oneshot(post_json(&serde_json::json!({ "question": "Will I find love?" })))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let error: ApiError = serde_json::from_value(json_body(response).await).expect("error");
    assert_eq!(error.code, ErrorCode::BadRequest);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn non_json_body_returns_bad_request() {
    let generator = RecordingGenerator::default();
    let app = test_app(Some("sk-test"), &generator);

    let request = Request::post(INTERPRET_ROUTE)
        .body(Body::from("question=love"))
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn wrong_method_is_rejected_with_error_body() {
    let generator = RecordingGenerator::default();
    let app = test_app(Some("sk-test"), &generator);

    let request = Request::get(INTERPRET_ROUTE)
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

    let body = json_body(response).await;
    assert_eq!(body["code"], "bad_request");
    assert!(body["error"].as_str().expect("message").contains("POST"));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn missing_credential_returns_misconfigured() {
    let generator = RecordingGenerator::default();
    let app = test_app(None, &generator);

    let response = app
        .oneshot(post_json(&sample_request_json()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let error: ApiError = serde_json::from_value(json_body(response).await).expect("error");
    assert_eq!(error.code, ErrorCode::Misconfigured);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn upstream_failure_returns_bad_gateway() {
    let generator = RecordingGenerator::failing();
    let app = test_app(Some("sk-test"), &generator);

    let response = app
        .oneshot(post_json(&sample_request_json()))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let body = json_body(response).await;
    assert_eq!(body["code"], "upstream_error");
    assert_eq!(body["error"], "failed to generate interpretation");
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn oversized_body_is_refused() {
    let generator = RecordingGenerator::default();
    let app = test_app(Some("sk-test"), &generator);

    let mut request = sample_request_json();
    request["question"] = serde_json::json!("?".repeat(32 * 1024));
    let response = app.oneshot(post_json(&request)).await.expect("response");
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(generator.calls(), 0);
}
