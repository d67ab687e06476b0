use super::*;
use crate::test_support::{sample_request_json, RecordingGenerator};

fn service(credential: Option<&str>, generator: &RecordingGenerator) -> InterpretationService {
    InterpretationService::new(
        credential.map(str::to_string),
        Arc::new(generator.clone()),
    )
}

fn sample_body() -> Vec<u8> {
    serde_json::to_vec(&sample_request_json()).expect("json")
}

#[tokio::test]
async fn valid_request_calls_generator_once_and_returns_text() {
    let generator = RecordingGenerator::default();
    let text = service(Some("sk-test"), &generator)
        .interpret_body(&sample_body())
        .await
        .expect("interpretation");

    assert!(!text.is_empty());
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn missing_cards_is_bad_request_without_upstream_call() {
    let generator = RecordingGenerator::default();
    let body = serde_json::to_vec(&serde_json::json!({ "question": "Will I find love?" }))
        .expect("json");

    let err = service(Some("sk-test"), &generator)
        .interpret_body(&body)
        .await
        .expect_err("should fail");

    assert!(matches!(err, InterpretError::BadRequest(_)));
    assert_eq!(err.code(), ErrorCode::BadRequest);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn missing_credential_is_misconfigured_without_upstream_call() {
    let generator = RecordingGenerator::default();
    let err = service(None, &generator)
        .interpret_body(&sample_body())
        .await
        .expect_err("should fail");

    assert!(matches!(err, InterpretError::Misconfigured));
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn blank_credential_is_treated_as_missing() {
    let generator = RecordingGenerator::default();
    let service = service(Some("  "), &generator);
    assert!(!service.is_configured());

    let err = service
        .interpret_body(&sample_body())
        .await
        .expect_err("should fail");
    assert!(matches!(err, InterpretError::Misconfigured));
}

#[tokio::test]
async fn generator_failure_maps_to_upstream_error() {
    let generator = RecordingGenerator::failing();
    let err = service(Some("sk-test"), &generator)
        .interpret_body(&sample_body())
        .await
        .expect_err("should fail");

    assert_eq!(err.code(), ErrorCode::UpstreamError);
    assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(generator.calls(), 1);

    let api_error = err.to_api_error();
    assert!(!api_error.message.contains("overloaded"));
}

#[tokio::test]
async fn blank_question_and_card_name_are_rejected() {
    let generator = RecordingGenerator::default();
    let service = service(Some("sk-test"), &generator);

    let mut blank_question = sample_request_json();
    blank_question["question"] = serde_json::json!("   ");
    let err = service
        .interpret_body(&serde_json::to_vec(&blank_question).expect("json"))
        .await
        .expect_err("blank question");
    assert!(matches!(err, InterpretError::BadRequest(_)));

    let mut blank_name = sample_request_json();
    blank_name["cards"]["future"]["name"] = serde_json::json!("");
    let err = service
        .interpret_body(&serde_json::to_vec(&blank_name).expect("json"))
        .await
        .expect_err("blank name");
    assert!(err.to_string().contains("future card"));

    assert_eq!(generator.calls(), 0);
}

#[test]
fn unknown_orientation_is_bad_request() {
    let mut raw = sample_request_json();
    raw["cards"]["past"]["orientation"] = serde_json::json!("sideways");
    let err = parse_request(&serde_json::to_vec(&raw).expect("json")).expect_err("bad");
    assert!(matches!(err, InterpretError::BadRequest(_)));
}

#[test]
fn prompt_embeds_question_and_every_card() {
    let request: InterpretationRequest =
        serde_json::from_value(sample_request_json()).expect("request");
    let prompt = build_prompt(&request);

    assert!(prompt.contains("\"Will I find love?\""));
    assert!(prompt.contains("- Past: The Fool (upright). Keywords: beginnings, innocence."));
    assert!(prompt.contains("- Present: The Magician (reversed). Keywords: willpower."));
    assert!(prompt.contains("- Future: The Star (upright). Keywords: hope."));
    assert!(prompt.contains("under 200 words"));

    let past = prompt.find("- Past:").expect("past");
    let present = prompt.find("- Present:").expect("present");
    let future = prompt.find("- Future:").expect("future");
    assert!(past < present && present < future);
}

#[test]
fn prompt_marks_cards_without_keywords() {
    let mut raw = sample_request_json();
    raw["cards"]["present"]["keywords"] = serde_json::json!([]);
    let request: InterpretationRequest = serde_json::from_value(raw).expect("request");
    assert!(build_prompt(&request).contains("Keywords: none given."));
}
