//! HTTP surface of `/clone_chat` and `/health`, driven through the router
//! with in-memory collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use clonechat_chat::{ChatGateway, Generator, PromptTemplate, Retriever};
use clonechat_core::{CloneChatConfig, Error, Result};
use clonechat_server::state::IndexSummary;
use clonechat_server::{build_router, AppState};

#[derive(Default)]
struct MockRetriever {
    passages: Vec<String>,
    fail: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn retrieve(&self, question: &str) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::embedding("API error 401 Unauthorized: secret detail"));
        }
        if self.passages.is_empty() {
            return Ok(vec![format!("about {}", question)]);
        }
        Ok(self.passages.clone())
    }
}

/// Returns the prompt it was given.
#[derive(Default)]
struct EchoGenerator {
    fail: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

#[async_trait]
impl Generator for EchoGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(Error::generation("API error 500: secret detail"));
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        // Yield so concurrent requests interleave.
        tokio::task::yield_now().await;
        Ok(prompt.to_string())
    }

    fn model(&self) -> &str {
        "echo"
    }
}

fn test_config() -> CloneChatConfig {
    CloneChatConfig::from_lookup(|key| (key == "API").then(|| "test-key".to_string())).unwrap()
}

fn app(retriever: Arc<MockRetriever>, generator: Arc<EchoGenerator>) -> Router {
    app_with_timeout(retriever, generator, Duration::from_secs(5))
}

fn app_with_timeout(
    retriever: Arc<MockRetriever>,
    generator: Arc<EchoGenerator>,
    timeout: Duration,
) -> Router {
    let template = PromptTemplate::parse("Context:\n{context}\n\nQuestion: {question}").unwrap();
    let gateway = ChatGateway::new(retriever, generator, template, timeout);
    let index = IndexSummary {
        collection: "clone".into(),
        passages: 2,
        embedding_model: "embed-english-v3.0".into(),
    };
    build_router(Arc::new(AppState::new(test_config(), gateway, index)))
}

fn post_json(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/clone_chat")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_answers_with_retrieved_context() {
    let retriever = Arc::new(MockRetriever {
        passages: vec!["A".into(), "B".into()],
        ..Default::default()
    });
    let generator = Arc::new(EchoGenerator::default());
    let app = app(retriever.clone(), generator.clone());

    let (status, body) = send(app, post_json(r#"{"question": "What is X?"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let response = body["response"].as_str().unwrap();
    assert!(response.contains('A'));
    assert!(response.contains('B'));
    assert!(response.contains("What is X?"));
    assert_eq!(response, "Context:\nA\n\nB\n\nQuestion: What is X?");
    assert_eq!(retriever.calls.load(Ordering::SeqCst), 1);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_or_empty_question_is_rejected_without_calls() {
    let retriever = Arc::new(MockRetriever::default());
    let generator = Arc::new(EchoGenerator::default());

    let bodies = [
        "{}",
        r#"{"question": ""}"#,
        r#"{"question": null}"#,
        r#"{"question": 42}"#,
        r#"{"message": "hi"}"#,
        "{not json",
        "",
    ];
    for body in bodies {
        let app = app(retriever.clone(), generator.clone());
        let (status, json) = send(app, post_json(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", body);
        assert_eq!(json, json!({ "error": "Missing question field" }));
    }

    assert_eq!(retriever.calls.load(Ordering::SeqCst), 0);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_body_without_json_content_type_is_rejected() {
    let retriever = Arc::new(MockRetriever::default());
    let generator = Arc::new(EchoGenerator::default());
    let app = app(retriever.clone(), generator);

    let request = Request::builder()
        .method(Method::POST)
        .uri("/clone_chat")
        .body(Body::from(r#"{"question": "hi"}"#))
        .unwrap();
    let (status, json) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Missing question field");
    assert_eq!(retriever.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_retrieval_failure_is_generic_500_and_skips_generation() {
    let retriever = Arc::new(MockRetriever {
        fail: true,
        ..Default::default()
    });
    let generator = Arc::new(EchoGenerator::default());
    let app = app(retriever, generator.clone());

    let (status, json) = send(app, post_json(r#"{"question": "hi"}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({ "error": "Internal Server Error" }));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_generation_failure_is_generic_500() {
    let retriever = Arc::new(MockRetriever::default());
    let generator = Arc::new(EchoGenerator {
        fail: true,
        ..Default::default()
    });
    let app = app(retriever, generator);

    let (status, json) = send(app, post_json(r#"{"question": "hi"}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({ "error": "Internal Server Error" }));
}

#[tokio::test]
async fn test_slow_generation_is_generic_500() {
    let retriever = Arc::new(MockRetriever::default());
    let generator = Arc::new(EchoGenerator {
        delay: Some(Duration::from_secs(2)),
        ..Default::default()
    });
    let app = app_with_timeout(retriever, generator.clone(), Duration::from_millis(50));

    let (status, json) = send(app, post_json(r#"{"question": "hi"}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json, json!({ "error": "Internal Server Error" }));
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_concurrent_requests_get_their_own_answers() {
    let retriever = Arc::new(MockRetriever::default());
    let generator = Arc::new(EchoGenerator::default());
    let app = app(retriever, generator.clone());

    let requests = (0..16).map(|i| {
        let app = app.clone();
        async move {
            let question = format!("question number {}", i);
            let body = json!({ "question": question }).to_string();
            let (status, json) = send(app, post_json(&body)).await;
            (question, status, json)
        }
    });

    for (question, status, json) in futures::future::join_all(requests).await {
        assert_eq!(status, StatusCode::OK);
        let response = json["response"].as_str().unwrap();
        assert!(response.ends_with(&format!("Question: {}", question)));
        assert!(response.contains(&format!("about {}\n", question)));
    }
    assert_eq!(generator.calls.load(Ordering::SeqCst), 16);
}

#[tokio::test]
async fn test_preflight_allows_any_origin() {
    let app = app(
        Arc::new(MockRetriever::default()),
        Arc::new(EchoGenerator::default()),
    );

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/clone_chat")
        .header(header::ORIGIN, "https://example.org")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert!(response.status().is_success());
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_cors_header_on_answers() {
    let app = app(
        Arc::new(MockRetriever::default()),
        Arc::new(EchoGenerator::default()),
    );

    let mut request = post_json(r#"{"question": "hi"}"#);
    request
        .headers_mut()
        .insert(header::ORIGIN, "https://example.org".parse().unwrap());
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_health_reports_index_without_calls() {
    let retriever = Arc::new(MockRetriever::default());
    let generator = Arc::new(EchoGenerator::default());
    let app = app(retriever.clone(), generator.clone());

    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["collection"], "clone");
    assert_eq!(json["passages"], 2);
    assert_eq!(json["chatModel"], "echo");
    assert_eq!(json["embeddingModel"], "embed-english-v3.0");
    assert_eq!(json["topK"], 4);
    assert_eq!(retriever.calls.load(Ordering::SeqCst), 0);
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_get_on_chat_route_is_not_allowed() {
    let app = app(
        Arc::new(MockRetriever::default()),
        Arc::new(EchoGenerator::default()),
    );
    let request = Request::builder()
        .uri("/clone_chat")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
