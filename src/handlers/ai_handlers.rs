use crate::api::openai::{create_openai_client, request_ideas};
use crate::handlers::ai_dtos::{AiRequest, AiResponse};
use crate::utils::ideas::fallback_ideas;
use crate::utils::rate_limit::client_ip;
use crate::AppState;
use axum::{
    body::to_bytes,
    extract::{ConnectInfo, Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Preflight for the AI routes. Echoes the caller's origin.
pub async fn ai_preflight(headers: HeaderMap) -> Response {
    let origin = headers
        .get(header::ORIGIN)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, origin),
            (header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static("POST,OPTIONS")),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static("content-type")),
        ],
    )
        .into_response()
}

pub async fn method_not_allowed() -> (StatusCode, &'static str) {
    (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

pub async fn generate_ideas(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Response, (StatusCode, Json<Value>)> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(request.headers(), peer);

    if !state.ai_limiter.check(&ip) {
        tracing::warn!("AI rate limit exceeded for {}", ip);
        return Err((
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({"error": "Too Many Requests"})),
        ));
    }

    let bytes = to_bytes(request.into_body(), MAX_BODY_BYTES).await.map_err(|e| {
        tracing::debug!("Failed to read AI request body: {}", e);
        (StatusCode::BAD_REQUEST, Json(json!({"error": "Bad Request"})))
    })?;

    let body: Value = if bytes.iter().all(u8::is_ascii_whitespace) {
        json!({})
    } else {
        serde_json::from_slice(&bytes).map_err(|e| {
            tracing::debug!("Malformed AI request body: {}", e);
            (StatusCode::BAD_REQUEST, Json(json!({"error": "Bad Request"})))
        })?
    };

    let ai_request = AiRequest::from_value(&body)
        .ok_or_else(|| (StatusCode::BAD_REQUEST, Json(json!({"error": "Bad Request"}))))?;
    let n = ai_request.count;

    let ideas = match create_openai_client(&state.config) {
        Ok(Some(client)) => {
            match request_ideas(&client, &state.config.ai_model, &ai_request.prompt, n).await {
                Ok(ideas) => ideas,
                Err(e) => {
                    tracing::error!("Idea generation failed, serving fallback ideas: {}", e);
                    fallback_ideas(n)
                }
            }
        }
        Ok(None) => fallback_ideas(n),
        Err(e) => {
            tracing::error!("Failed to create model client: {}", e);
            fallback_ideas(n)
        }
    };

    Ok((
        StatusCode::OK,
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"))],
        Json(AiResponse { ideas }),
    )
        .into_response())
}
