//! Path-prefix gateway in front of the resource services.
//!
//! Requests are matched against a static route table (longest prefix first,
//! segment boundaries only) and relayed unchanged: method, path, query,
//! end-to-end headers and body go upstream; status, headers and body come
//! back. There is no retry and no load balancing. Unreachable upstreams answer
//! 502, slow ones 504.

mod proxy;
mod routes;

pub use proxy::GatewayState;
pub use routes::{Route, RouteTable};

use axum::{Router, middleware as axum_middleware};

use super::middleware::{log_responses, set_request_context};

pub fn build_gateway_router(state: GatewayState) -> Router {
    Router::new()
        .fallback(proxy::forward)
        .with_state(state)
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
