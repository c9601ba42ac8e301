use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use kings_landing::{config::ServerConfig, create_app, utils::ideas::FALLBACK_IDEAS, AppState};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn app_with(config: ServerConfig) -> Router {
    create_app(Arc::new(AppState::new(config)))
}

fn app() -> Router {
    app_with(ServerConfig::default())
}

fn post_ai(path: &str, body: &str, ip: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", ip)
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn ideas(body: &Value) -> Vec<String> {
    body["ideas"]
        .as_array()
        .unwrap()
        .iter()
        .map(|idea| idea.as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn without_key_serves_requested_number_of_fallback_ideas() {
    let response = app()
        .oneshot(post_ai("/api/ai", r#"{"prompt":"gym","count":3}"#, "203.0.113.1"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    let body = json_body(response).await;
    assert_eq!(ideas(&body), FALLBACK_IDEAS[..3].to_vec());
}

#[tokio::test]
async fn count_is_capped_at_ten() {
    let response = app()
        .oneshot(post_ai("/.netlify/functions/ai", r#"{"prompt":"gym","count":50}"#, "203.0.113.2"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(ideas(&body).len(), 10);
}

#[tokio::test]
async fn empty_body_uses_defaults() {
    let response = app().oneshot(post_ai("/api/ai", "", "203.0.113.3")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(ideas(&body).len(), 5);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let response = app()
        .oneshot(post_ai("/api/ai", "{prompt: nope", "203.0.113.4"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app().oneshot(post_ai("/api/ai", "null", "203.0.113.4")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn eleventh_request_from_one_ip_is_throttled() {
    let app = app();
    for i in 0..10 {
        let response = app
            .clone()
            .oneshot(post_ai("/api/ai", r#"{"prompt":"gym"}"#, "198.51.100.7"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "request {}", i + 1);
    }

    let response = app
        .clone()
        .oneshot(post_ai("/api/ai", r#"{"prompt":"gym"}"#, "198.51.100.7, 10.0.0.1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    // Another client still has its full budget.
    let response = app
        .oneshot(post_ai("/api/ai", r#"{"prompt":"gym"}"#, "198.51.100.8"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn concurrent_burst_gets_exactly_one_rejection() {
    let app = app();
    let requests = (0..11).map(|_| {
        app.clone()
            .oneshot(post_ai("/api/ai", r#"{"prompt":"gym","count":1}"#, "192.0.2.50"))
    });
    let responses = futures::future::join_all(requests).await;
    let throttled = responses
        .into_iter()
        .map(|r| r.unwrap().status())
        .filter(|status| *status == StatusCode::TOO_MANY_REQUESTS)
        .count();
    assert_eq!(throttled, 1);
}

#[tokio::test]
async fn preflight_echoes_origin() {
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/ai")
        .header(header::ORIGIN, "https://example.com")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://example.com");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST,OPTIONS");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "content-type");

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/ai")
        .body(Body::empty())
        .unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn other_methods_are_not_allowed() {
    for method in [Method::GET, Method::PUT, Method::DELETE] {
        let request = Request::builder()
            .method(method.clone())
            .uri("/api/ai")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED, "{}", method);
    }
}

#[tokio::test]
async fn unreachable_model_falls_back_to_static_ideas() {
    let config = ServerConfig {
        openai_api_key: Some("test-key".to_string()),
        openai_api_base: "http://127.0.0.1:9/v1".to_string(),
        ..ServerConfig::default()
    };
    let response = app_with(config)
        .oneshot(post_ai("/api/ai", r#"{"prompt":"gym","count":2}"#, "203.0.113.9"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(ideas(&body), FALLBACK_IDEAS[..2].to_vec());
}

#[tokio::test]
async fn health_check_answers_ok() {
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"OK");
}
