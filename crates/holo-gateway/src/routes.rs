//! HTTP route definitions

use crate::{handlers, middleware, AppState};
use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Create the main router
pub fn create_router(state: Arc<AppState>) -> Router {
    // Create rate limiter
    let rate_limiter = middleware::create_rate_limiter(state.config.rate_limit_rps);

    // Build the router
    let mut router = Router::new()
        // Service endpoints
        .route(&api(""), get(handlers::index))
        .route(&api("/"), get(handlers::index))
        .route(&api("/health"), get(handlers::health_check))
        // Author endpoints
        .route(&api("/authors"), get(handlers::list_authors))
        .route(
            &api("/authors/{aid}"),
            get(handlers::get_author).put(handlers::put_author),
        )
        // Patient endpoints
        .route(&api("/patients"), get(handlers::list_patients))
        .route(
            &api("/patients/{pid}"),
            get(handlers::get_patient).put(handlers::put_patient),
        )
        // Hologram endpoints
        .route(
            &api("/holograms"),
            get(handlers::list_holograms).post(handlers::create_hologram),
        )
        .route(
            &api("/holograms/{hid}"),
            get(handlers::get_hologram).delete(handlers::delete_hologram),
        )
        .route(
            &api("/holograms/{hid}/download"),
            get(handlers::download_hologram),
        )
        // Apply middleware
        .layer(axum_middleware::from_fn(middleware::logging_middleware))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(axum_middleware::from_fn_with_state(
            rate_limiter,
            middleware::rate_limit_middleware,
        ));

    if state.config.cors_enabled {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        );
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .with_state(state)
}

/// Full path of an API route
fn api(path: &str) -> String {
    format!("{}{}", crate::API_BASE, path)
}
