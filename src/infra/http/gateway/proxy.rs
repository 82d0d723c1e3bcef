//! Request forwarding to the resolved upstream.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, HeaderName, Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use metrics::counter;
use reqwest::Client;
use tracing::{info, warn};

use crate::infra::http::api::error::{ApiError, codes};

use super::routes::RouteTable;

const SOURCE: &str = "infra::http::gateway";
const METRIC_GATEWAY_UPSTREAM_ERROR: &str = "folio_gateway_upstream_error_total";

/// Headers that describe a single connection and must not be relayed.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    HeaderName::from_static("keep-alive"),
];

#[derive(Clone)]
pub struct GatewayState {
    routes: Arc<RouteTable>,
    client: Client,
    max_body_bytes: usize,
}

impl GatewayState {
    pub fn new(
        routes: RouteTable,
        timeout: Duration,
        max_body_bytes: usize,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("folio-gateway/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            routes: Arc::new(routes),
            client,
            max_body_bytes,
        })
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }
}

fn strip_hop_by_hop(headers: &mut HeaderMap) {
    // `Connection` may name additional per-connection headers.
    let named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();
    for name in named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}

pub async fn forward(State(state): State<GatewayState>, request: Request<Body>) -> Response {
    let started = Instant::now();
    let (parts, body) = request.into_parts();
    let method = parts.method.clone();
    let path = parts.uri.path().to_string();

    let Some(route) = state.routes.resolve(&path) else {
        info!(
            target = "folio::gateway",
            method = %method,
            path = %path,
            status = StatusCode::NOT_FOUND.as_u16(),
            "No route for request"
        );
        return ApiError::not_found(SOURCE, format!("no route for {path}")).into_response();
    };

    let body = match Limited::new(body, state.max_body_bytes).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) if err.downcast_ref::<LengthLimitError>().is_some() => {
            return ApiError::new(
                SOURCE,
                StatusCode::PAYLOAD_TOO_LARGE,
                codes::PAYLOAD_TOO_LARGE,
                format!("request body exceeds {} bytes", state.max_body_bytes),
            )
            .into_response();
        }
        Err(err) => {
            return ApiError::validation(SOURCE, format!("failed to read request body: {err}"))
                .into_response();
        }
    };

    let target = route.target(&path, parts.uri.query());
    let mut headers = parts.headers;
    strip_hop_by_hop(&mut headers);
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);

    let upstream = state
        .client
        .request(method.clone(), target.clone())
        .headers(headers)
        .body(body)
        .send()
        .await;

    match upstream {
        Ok(upstream) => {
            let status = upstream.status();
            let mut response_headers = upstream.headers().clone();
            strip_hop_by_hop(&mut response_headers);

            info!(
                target = "folio::gateway",
                method = %method,
                path = %path,
                upstream = %target,
                status = status.as_u16(),
                elapsed_ms = started.elapsed().as_millis(),
                "Proxied request"
            );

            let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
            *response.status_mut() = status;
            *response.headers_mut() = response_headers;
            response
        }
        Err(err) => {
            let (status, code, reason) = if err.is_timeout() {
                (StatusCode::GATEWAY_TIMEOUT, codes::GATEWAY_TIMEOUT, "timeout")
            } else {
                (StatusCode::BAD_GATEWAY, codes::BAD_GATEWAY, "transport")
            };
            counter!(METRIC_GATEWAY_UPSTREAM_ERROR, "route" => route.prefix().to_string(), "reason" => reason)
                .increment(1);
            warn!(
                target = "folio::gateway",
                method = %method,
                path = %path,
                upstream = %target,
                status = status.as_u16(),
                error = %err,
                "Upstream request failed"
            );
            ApiError::new(SOURCE, status, code, format!("upstream {} unavailable", route.prefix()))
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn strips_connection_scoped_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive, x-trace-hop"));
        headers.insert("keep-alive", HeaderValue::from_static("timeout=5"));
        headers.insert("x-trace-hop", HeaderValue::from_static("1"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::CONTENT_TYPE));
    }
}
