use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

pub mod effects {
    pub mod timers;
    pub mod capabilities;
    pub mod shapes;
    pub mod mascots;
    pub mod money_rain;
    pub mod reveal;
    pub mod offer;
    pub mod cosmetic;
    pub mod cursor_trail;
    pub mod contact_form;
    pub mod page;
}
pub mod handlers {
    pub mod ai_dtos;
    pub mod ai_handlers;
}
pub mod api {
    pub mod openai;
    pub mod ideas_client;
}
pub mod utils {
    pub mod parse;
    pub mod ideas;
    pub mod rate_limit;
}
pub mod config;
pub mod error;

use config::ServerConfig;
use handlers::ai_handlers;
use utils::rate_limit::IpRateLimiter;

pub struct AppState {
    pub config: ServerConfig,
    pub ai_limiter: IpRateLimiter,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let ai_limiter = IpRateLimiter::per_minute(config.ai_rate_limit_per_minute);
        Self { config, ai_limiter }
    }
}

pub async fn health_check() -> &'static str {
    "OK"
}

fn ai_route() -> MethodRouter<Arc<AppState>> {
    post(ai_handlers::generate_ideas)
        .options(ai_handlers::ai_preflight)
        .fallback(ai_handlers::method_not_allowed)
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origin = match config.frontend_url.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => AllowOrigin::exact(origin),
        Some(Err(e)) => {
            tracing::warn!("Ignoring invalid FRONTEND_URL: {}", e);
            AllowOrigin::from(Any)
        }
        None => AllowOrigin::from(Any),
    };
    CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_origin(origin)
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::ORIGIN])
}

/// The whole service: AI routes, health check and the static site.
pub fn create_app(state: Arc<AppState>) -> Router {
    // The AI routes answer their own preflights.
    let ai_routes = Router::new()
        .route("/api/ai", ai_route())
        .route("/.netlify/functions/ai", ai_route());

    let static_files = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=300"),
        ))
        .service(ServeDir::new(&state.config.static_dir));

    Router::new()
        .route("/health", get(health_check))
        .fallback_service(static_files)
        .layer(cors_layer(&state.config))
        .merge(ai_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
