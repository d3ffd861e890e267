//! Top-level router assembly.
//!
//! ```text
//! /                  service banner
//! /health            liveness
//! /verify            token verification (public, called by protected services)
//! /notify, /return   payment gateway callbacks (public)
//! /api/...           bearer-authenticated user and issuer routes
//! ```

use std::time::Duration;

use axum::{http::Method, middleware, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::credit_code::credit_code_routes;
use super::entitlement::{entitlement_routes, verify_routes};
use super::middleware::auth_middleware;
use super::payment::{gateway_routes, order_routes};
use super::service::{not_found, service_routes};
use super::state::AppState;

/// Builds the complete application router.
pub fn app_router(state: AppState, request_timeout: Duration) -> Router {
    let api = Router::new()
        .merge(entitlement_routes())
        .merge(credit_code_routes())
        .merge(order_routes())
        .layer(middleware::from_fn_with_state(
            state.authenticator.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(service_routes())
        .merge(verify_routes())
        .merge(gateway_routes())
        .nest("/api", api)
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any),
        )
        .layer(CompressionLayer::new())
        .with_state(state)
}
