pub mod envelope;
pub mod health;
pub mod openapi;
pub mod rules;
pub mod schemas;

use std::sync::Arc;

use axum::Router;
use axum::http::{Method, StatusCode, Uri};
use axum::routing::{get, post};
use spider_registry::{RuleRegistry, TestRunner};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use self::envelope::ApiError;
use self::openapi::ApiDoc;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Rule CRUD and validation over the configured store.
    pub registry: Arc<RuleRegistry>,
    /// Test runs against live pages.
    pub runner: Arc<TestRunner>,
}

/// Build the Axum router with all API routes, middleware, and Swagger UI.
pub fn router(state: AppState) -> Router {
    let rules = Router::new()
        .route("/spider/rule/all", get(rules::list_rules))
        .route("/spider/rule/create", post(rules::create_rule))
        .route("/spider/rule/update", post(rules::update_rule))
        .route("/spider/rule/test", post(rules::test_rule))
        .route("/spider/rule/validate", post(rules::validate_rule))
        .route("/spider/rule/delete/{id}", get(rules::delete_rule))
        .route("/spider/rule/{id}", get(rules::get_rule));

    Router::new()
        .route("/health", get(health::health))
        .merge(rules)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn not_found(uri: Uri) -> ApiError {
    ApiError::not_found(format!("no route for {}", uri.path()))
}

async fn method_not_allowed(method: Method, uri: Uri) -> ApiError {
    ApiError::new(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("method {method} not allowed for {}", uri.path()),
    )
}
