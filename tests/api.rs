//! API endpoint integration tests

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use moonspell::api::{self, ApiState};
use moonspell::prompt::ReadingFormat;
use moonspell::{PromptAssembler, ReadingGenerator, SigilGenerator};
use tower::ServiceExt;

mod common;
use common::{HEADER_READING, MockGenerator, MockSigils, MockSynthesizer};

/// Build a test API router
fn build_test_router(generator: Arc<dyn ReadingGenerator>) -> axum::Router {
    build_router_with(generator, MockSigils::ok(), None)
}

fn build_router_with(
    generator: Arc<dyn ReadingGenerator>,
    sigils: Arc<dyn SigilGenerator>,
    static_dir: Option<&Path>,
) -> axum::Router {
    let state = Arc::new(ApiState {
        generator,
        synthesizer: MockSynthesizer::with_frames(2400),
        sigils,
        assembler: PromptAssembler::new(ReadingFormat::Headers),
    });
    api::router(state, static_dir)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

fn reading_body() -> serde_json::Value {
    serde_json::json!({
        "name": "Luna",
        "birthDate": "1990-01-01",
        "zodiacSign": "steenbok",
        "wish": "Ik wens rust en helderheid in mijn leven"
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = build_test_router(MockGenerator::replying(HEADER_READING));

    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
}

#[tokio::test]
async fn test_moon_for_date() {
    let app = build_test_router(MockGenerator::replying(HEADER_READING));

    let response = app.oneshot(get("/api/moon?date=2024-01-25")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["date"], "2024-01-25");
    assert_eq!(json["phase"]["index"], 4);
    assert_eq!(json["phase"]["name"], "Volle Maan");
}

#[tokio::test]
async fn test_moon_defaults_to_today() {
    let app = build_test_router(MockGenerator::replying(HEADER_READING));

    let response = app.oneshot(get("/api/moon")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let position = json["cyclePosition"].as_f64().unwrap();
    assert!((0.0..1.0).contains(&position));
}

#[tokio::test]
async fn test_moon_rejects_bad_date() {
    let app = build_test_router(MockGenerator::replying(HEADER_READING));

    let response = app.oneshot(get("/api/moon?date=25-01-2024")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_zodiac_list() {
    let app = build_test_router(MockGenerator::replying(HEADER_READING));

    let response = app.oneshot(get("/api/zodiac")).await.unwrap();

    let json = body_json(response).await;
    let signs = json.as_array().unwrap();
    assert_eq!(signs.len(), 12);
    assert_eq!(signs[0], "Ram");
    assert_eq!(signs[11], "Vissen");
}

#[tokio::test]
async fn test_reading_success() {
    let app = build_test_router(MockGenerator::replying(HEADER_READING));

    let response = app
        .oneshot(post_json("/api/reading", &reading_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["spell"]["geestenBoodschap"], "De sterren fluisteren je naam.");
    assert_eq!(json["spell"]["energetischeTip"], "Draag vandaag iets zilvers.");
    assert_eq!(json["lifePathNumber"], 3);
    assert!(json["moonPhase"]["name"].is_string());
}

#[tokio::test]
async fn test_reading_validation_error() {
    let generator = MockGenerator::replying(HEADER_READING);
    let app = build_test_router(generator.clone());

    let mut body = reading_body();
    body["wish"] = "Kort".into();
    let response = app.oneshot(post_json("/api/reading", &body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "validation_failed");
    assert_eq!(
        json["error"]["message"],
        "Beschrijf je wens iets uitgebreider voor een krachtigere boodschap."
    );
    assert!(generator.prompts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_reading_generation_error() {
    let app = build_test_router(MockGenerator::failing());

    let response = app
        .oneshot(post_json("/api/reading", &reading_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "generation_failed");
    let message = json["error"]["message"].as_str().unwrap();
    assert!(!message.contains("503"), "upstream details must not leak");
}

#[tokio::test]
async fn test_reading_malformed_error() {
    let app = build_test_router(MockGenerator::replying("### Alleen ###\neen sectie"));

    let response = app
        .oneshot(post_json("/api/reading", &reading_body()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "reading_malformed");
}

#[tokio::test]
async fn test_speech_returns_wav() {
    let app = build_test_router(MockGenerator::replying(HEADER_READING));

    let response = app
        .oneshot(post_json("/api/speech", &serde_json::json!({ "text": "Hallo" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/wav");

    let bytes = body_bytes(response).await;
    let reader = hound::WavReader::new(std::io::Cursor::new(bytes)).unwrap();
    assert_eq!(reader.spec().sample_rate, 24000);
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.len(), 2400);
}

#[tokio::test]
async fn test_speech_rejects_empty_text() {
    let app = build_test_router(MockGenerator::replying(HEADER_READING));

    let response = app
        .oneshot(post_json("/api/speech", &serde_json::json!({ "text": "   " })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_sigil_returns_png() {
    let app = build_test_router(MockGenerator::replying(HEADER_READING));

    let response = app
        .oneshot(post_json(
            "/api/sigil",
            &serde_json::json!({ "text": "De sterren fluisteren je naam." }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    let bytes = body_bytes(response).await;
    assert_eq!(&bytes[..4], &[0x89, b'P', b'N', b'G']);
}

#[tokio::test]
async fn test_garbled_sigil_is_sigil_failure() {
    let app = build_router_with(
        MockGenerator::replying(HEADER_READING),
        MockSigils::garbled(),
        None,
    );

    let response = app
        .oneshot(post_json(
            "/api/sigil",
            &serde_json::json!({ "text": "De sterren fluisteren je naam." }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "sigil_failed");
    assert_eq!(
        json["error"]["message"],
        "De kosmos kon de zegel niet vormen. Probeer het later opnieuw."
    );
}

#[tokio::test]
async fn test_static_fallback_serves_index() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>moonspell</h1>").unwrap();
    let app = build_router_with(
        MockGenerator::replying(HEADER_READING),
        MockSigils::ok(),
        Some(dir.path()),
    );

    let response = app.oneshot(get("/some/client/route")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"<h1>moonspell</h1>");
}
