pub mod api;
pub mod gateway;
mod middleware;

pub use api::{ApiState, build_resource_router};
pub use gateway::{GatewayState, RouteTable, build_gateway_router};
pub use middleware::{REQUEST_ID_HEADER, RequestContext};

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Router, middleware as axum_middleware};
use sqlx::Error as SqlxError;

use crate::application::error::ErrorReport;
use crate::application::resources::Resource;

use middleware::{log_responses, set_request_context};

fn db_health_response(result: Result<(), SqlxError>) -> Response {
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_error(
                "infra::http::db_health",
                StatusCode::SERVICE_UNAVAILABLE,
                &err,
            )
            .attach(&mut response);
            response
        }
    }
}

async fn health<E: Resource>(State(state): State<ApiState<E>>) -> Response {
    match state.db.as_ref() {
        Some(db) => db_health_response(db.health_check().await),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Full router of one resource service: resource routes, `/health` and the
/// request logging stack.
pub fn build_service_router<E: Resource>(state: ApiState<E>) -> Router {
    let health_router = Router::new()
        .route("/health", get(health::<E>))
        .with_state(state.clone());

    build_resource_router(state)
        .merge(health_router)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
