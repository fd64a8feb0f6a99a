//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::auth::middleware::{auth_middleware, AuthState};
use crate::constants::API_PREFIX;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use hakobu_core::Config;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;
    let auth_state = Arc::new(AuthState {
        jwt: state.jwt.clone(),
        users: state.users.clone(),
    });

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/health", get(health))
        .route(
            &format!("{API_PREFIX}/auth/register"),
            post(handlers::auth::register),
        )
        .route(
            &format!("{API_PREFIX}/auth/token"),
            post(handlers::auth::login),
        )
        .route(
            &format!("{API_PREFIX}/auth/token/refresh"),
            post(handlers::auth::refresh),
        );

    // Protected routes (require a bearer token)
    let protected_routes = protected_routes().layer(axum::middleware::from_fn_with_state(
        auth_state,
        auth_middleware,
    ));

    // Multipart uploads need headroom over the raw file cap.
    let body_limit = state.config.max_upload_bytes() + 64 * 1024;

    let app = public_routes
        .merge(protected_routes)
        .route(
            "/api/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .merge(
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json")
                .path("/docs"),
        )
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        // users
        .route(
            &format!("{API_PREFIX}/users/profile"),
            get(handlers::users::get_profile).patch(handlers::users::update_profile),
        )
        .route(
            &format!("{API_PREFIX}/users/driver-profile"),
            get(handlers::users::get_driver_profile).patch(handlers::users::update_driver_profile),
        )
        .route(
            &format!("{API_PREFIX}/users/available-drivers"),
            get(handlers::users::available_drivers),
        )
        .route(
            &format!("{API_PREFIX}/users/drivers"),
            get(handlers::users::all_drivers),
        )
        .route(
            &format!("{API_PREFIX}/users/drivers/{{id}}"),
            delete(handlers::users::delete_driver),
        )
        // deliveries
        .route(
            &format!("{API_PREFIX}/deliveries/requests"),
            get(handlers::deliveries::list_requests).post(handlers::deliveries::create_request),
        )
        .route(
            &format!("{API_PREFIX}/deliveries/requests/{{id}}"),
            get(handlers::deliveries::get_request)
                .patch(handlers::deliveries::update_request)
                .delete(handlers::deliveries::delete_request),
        )
        .route(
            &format!("{API_PREFIX}/deliveries/requests/{{id}}/accept"),
            post(handlers::deliveries::accept_request),
        )
        .route(
            &format!("{API_PREFIX}/deliveries/requests/{{id}}/reward"),
            post(handlers::deliveries::set_driver_reward),
        )
        .route(
            &format!("{API_PREFIX}/deliveries/requests/{{id}}/assign-driver"),
            post(handlers::deliveries::assign_driver),
        )
        .route(
            &format!("{API_PREFIX}/deliveries/requests/{{id}}/status"),
            patch(handlers::deliveries::update_request_status),
        )
        .route(
            &format!("{API_PREFIX}/deliveries/assignments"),
            get(handlers::assignments::list_assignments),
        )
        .route(
            &format!("{API_PREFIX}/deliveries/assignments/{{id}}/status"),
            post(handlers::assignments::update_assignment_status),
        )
        // files
        .route(
            &format!("{API_PREFIX}/files/uploads"),
            get(handlers::uploads::list_uploads).post(handlers::uploads::upload_file),
        )
        .route(
            &format!("{API_PREFIX}/files/uploads/{{id}}"),
            get(handlers::uploads::get_upload).delete(handlers::uploads::delete_upload),
        )
        .route(
            &format!("{API_PREFIX}/files/uploads/{{id}}/download"),
            get(handlers::uploads::download_file),
        )
        .route(
            &format!("{API_PREFIX}/files/uploads/{{id}}/extract"),
            post(handlers::extraction::extract_document),
        )
        .route(
            &format!("{API_PREFIX}/files/uploads/{{id}}/create-delivery"),
            post(handlers::extraction::create_delivery_from_upload),
        )
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins().is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers(Any)
    };
    Ok(cors)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({"error": "Not found", "code": "NOT_FOUND"})),
    )
}
