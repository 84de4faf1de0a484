use arogya_common::config::AppConfig;
use arogya_common::embeddings::MockEmbedder;
use arogya_common::errors::{AppError, Result};
use arogya_common::llm::{GenerationConfig, GenerationResult, Generator};
use arogya_common::prompt::Prompt;
use arogya_common::vector::{ScoredChunk, VectorIndex};
use arogya_common::RagPipeline;
use arogya_gateway::{create_router, AppState};
use async_trait::async_trait;
use axum::body::{to_bytes, Body, Bytes};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceExt;

const FORM: &str = "application/x-www-form-urlencoded";

struct StaticIndex {
    fail: bool,
}

#[async_trait]
impl VectorIndex for StaticIndex {
    async fn query(&self, _vector: &[f32], top_k: usize) -> Result<Vec<ScoredChunk>> {
        if self.fail {
            return Err(AppError::VectorIndex {
                message: "connection refused".to_string(),
            });
        }

        let texts = [
            "A headache is pain in the head or face.",
            "Tension headaches respond to rest and hydration.",
            "Sudden severe headaches need urgent care.",
        ];
        Ok(texts
            .iter()
            .enumerate()
            .take(top_k)
            .map(|(i, text)| {
                let mut metadata = Map::new();
                metadata.insert("text".to_string(), Value::String(text.to_string()));
                ScoredChunk {
                    id: format!("chunk-{}", i),
                    score: 0.9 - i as f32 * 0.1,
                    metadata,
                }
            })
            .collect())
    }

    fn name(&self) -> &str {
        "static"
    }
}

enum Reply {
    Echo,
    NoAnswer,
    Fail,
    Panic,
}

struct StubGenerator {
    reply: Reply,
}

#[async_trait]
impl Generator for StubGenerator {
    async fn generate(&self, prompt: &Prompt, _config: &GenerationConfig) -> Result<GenerationResult> {
        match self.reply {
            Reply::Echo => Ok(GenerationResult::with_answer(format!("Answer to: {}", prompt.human))),
            Reply::NoAnswer => Ok(GenerationResult::default()),
            Reply::Fail => Err(AppError::Llm {
                message: "upstream 502".to_string(),
            }),
            Reply::Panic => panic!("generator exploded"),
        }
    }

    fn model(&self) -> &str {
        "stub"
    }
}

fn template_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../templates")
}

fn app_with(reply: Reply, index_fails: bool, template_dir: PathBuf) -> Router {
    let mut config = AppConfig::default();
    config.server.template_dir = template_dir;

    let pipeline = RagPipeline::from_clients(
        &config,
        Arc::new(MockEmbedder::new(32)),
        Arc::new(StaticIndex { fail: index_fails }),
        Arc::new(StubGenerator { reply }),
    )
    .unwrap();

    create_router(AppState::new(config, pipeline))
}

fn app(reply: Reply) -> Router {
    app_with(reply, false, template_dir())
}

fn chat_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/get")
        .header(header::CONTENT_TYPE, FORM)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Option<String>, Bytes) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, body)
}

fn json_body(body: &Bytes) -> Value {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_chat_returns_plain_text_answer() {
    let app = app(Reply::Echo);

    let (status, content_type, body) = send(&app, chat_request("msg=What+causes+headaches%3F")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/plain"));
    assert_eq!(body, "Answer to: What causes headaches?");
}

#[tokio::test]
async fn test_chat_trims_message() {
    let app = app(Reply::Echo);

    let (status, _, body) = send(&app, chat_request("msg=%20%20headache%20%20")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Answer to: headache");
}

#[tokio::test]
async fn test_chat_repeated_field_uses_first_value() {
    let app = app(Reply::Echo);

    let (status, _, body) = send(&app, chat_request("msg=fever&msg=cough")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Answer to: fever");
}

#[tokio::test]
async fn test_chat_rejects_missing_or_blank_message() {
    let app = app(Reply::Echo);

    for body in ["", "other=value", "msg=", "msg=%20%20%20", "msg=+++"] {
        let (status, _, response) = send(&app, chat_request(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", body);
        assert_eq!(json_body(&response), json!({"error": "No message provided"}));
    }
}

#[tokio::test]
async fn test_chat_rejects_non_form_body() {
    let app = app(Reply::Echo);

    let request = Request::builder()
        .method("POST")
        .uri("/get")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"msg":"headache"}"#))
        .unwrap();

    let (status, _, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&body), json!({"error": "No message provided"}));
}

#[tokio::test]
async fn test_chat_missing_answer_is_generation_failure() {
    let app = app(Reply::NoAnswer);

    let (status, _, body) = send(&app, chat_request("msg=headache")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&body), json!({"error": "Failed to generate response"}));
}

#[tokio::test]
async fn test_chat_generator_error_is_hidden() {
    let app = app(Reply::Fail);

    let (status, _, body) = send(&app, chat_request("msg=headache")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&body), json!({"error": "Internal server error"}));
}

#[tokio::test]
async fn test_chat_index_error_is_hidden() {
    let app = app_with(Reply::Echo, true, template_dir());

    let (status, _, body) = send(&app, chat_request("msg=headache")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&body), json!({"error": "Internal server error"}));
}

#[tokio::test]
async fn test_chat_panic_becomes_internal_error() {
    let app = app(Reply::Panic);

    let (status, _, body) = send(&app, chat_request("msg=headache")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&body), json!({"error": "Internal server error"}));
}

#[tokio::test]
async fn test_chat_is_repeatable() {
    let app = app(Reply::Echo);

    let (_, _, first) = send(&app, chat_request("msg=fever")).await;
    let (_, _, second) = send(&app, chat_request("msg=fever")).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let app = app(Reply::Echo);

    let (status, _, body) = send(&app, get("/unknown-path")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json_body(&body), json!({"error": "Endpoint not found"}));
}

#[tokio::test]
async fn test_get_on_chat_route_is_method_not_allowed() {
    let app = app(Reply::Echo);

    let (status, _, body) = send(&app, get("/get")).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json_body(&body), json!({"error": "Method not allowed"}));
}

#[tokio::test]
async fn test_index_serves_landing_page() {
    let app = app(Reply::Echo);

    let (status, content_type, body) = send(&app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(content_type.unwrap().starts_with("text/html"));
    assert!(String::from_utf8_lossy(&body).contains("Arogya Sahayak"));
}

#[tokio::test]
async fn test_index_missing_template() {
    let app = app_with(Reply::Echo, false, PathBuf::from("/nonexistent/templates"));

    let (status, _, body) = send(&app, get("/")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&body), json!({"error": "Template not found"}));
}

#[tokio::test]
async fn test_health_and_request_id() {
    let app = app(Reply::Echo);

    let response = app.clone().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(json_body(&body)["status"], "healthy");
}
