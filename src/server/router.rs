use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::server::handlers::{ask, config, health};
use crate::state::AppState;

/// Creates the application router.
///
/// `/ask` sits behind a global concurrency limit of `server.max_in_flight`;
/// excess requests wait for a slot instead of being rejected.
pub fn router(state: Arc<AppState>) -> Router {
    let server = &state.config.settings.server;
    let cors_layer = build_cors_layer(&server.cors_allowed_origins);
    let ask_limit = GlobalConcurrencyLimitLayer::new(server.max_in_flight.max(1));

    Router::new()
        .route("/health", get(health::health))
        .route("/ask", post(ask::ask).layer(ask_limit))
        .route("/api/config", get(config::get_config))
        .route("/api/index/stats", get(health::index_stats))
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

fn build_cors_layer(configured: &[String]) -> CorsLayer {
    let origins = resolve_allowed_origins(configured)
        .into_iter()
        .filter_map(|origin| HeaderValue::from_str(&origin).ok())
        .collect::<Vec<_>>();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
}

fn resolve_allowed_origins(configured: &[String]) -> Vec<String> {
    let origins = configured
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>();

    if origins.is_empty() {
        return default_local_origins();
    }
    origins
}

fn default_local_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
        "http://localhost:5173".to_string(),
        "http://localhost:8000".to_string(),
        "http://127.0.0.1".to_string(),
        "http://127.0.0.1:3000".to_string(),
        "http://127.0.0.1:5173".to_string(),
        "http://127.0.0.1:8000".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_origin_list_falls_back_to_local_defaults() {
        let origins = resolve_allowed_origins(&["  ".to_string()]);
        assert!(origins.contains(&"http://localhost:3000".to_string()));
    }

    #[test]
    fn configured_origins_replace_defaults() {
        let origins = resolve_allowed_origins(&[" https://shop.example ".to_string()]);
        assert_eq!(origins, vec!["https://shop.example".to_string()]);
    }
}
