//! Bearer-gated pass-through to the chat backend's OpenAI-compatible API.
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Request, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderMap, HeaderValue, Method, StatusCode, Uri,
    },
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::{info, warn};

use crate::state::AppState;

const BEARER_PREFIX: &str = "Bearer ";

fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "detail": message.into() }))).into_response()
}

/// Check the presented token against the configured one
fn authorize(headers: &HeaderMap, api_key: &str) -> Result<(), Response> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX));

    let Some(token) = token else {
        return Err(detail(
            StatusCode::UNAUTHORIZED,
            "Missing or invalid Authorization header",
        ));
    };
    if api_key.is_empty() || token != api_key {
        return Err(detail(StatusCode::UNAUTHORIZED, "Invalid API key"));
    }
    Ok(())
}

async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match authorize(request.headers(), &state.api_key) {
        Ok(()) => next.run(request).await,
        Err(rejection) => {
            warn!(path = %request.uri().path(), "rejected unauthenticated request");
            rejection
        }
    }
}

async fn forward(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut url = format!("{}{}", state.upstream_url, uri.path());

    let upstream = if method == Method::GET {
        if let Some(query) = uri.query() {
            url.push('?');
            url.push_str(query);
        }
        state.client.get(&url)
    } else {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("application/json");
        state
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body)
    };

    let response = match upstream.send().await {
        Ok(response) => response,
        Err(err) => {
            warn!(url = %url, error = %err, "upstream unreachable");
            return detail(StatusCode::BAD_GATEWAY, err.to_string());
        }
    };

    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| HeaderValue::from_bytes(value.as_bytes()).ok());
    let body = match response.bytes().await {
        Ok(body) => body,
        Err(err) => {
            warn!(url = %url, error = %err, "upstream body broke");
            return detail(StatusCode::BAD_GATEWAY, err.to_string());
        }
    };
    info!(path = %uri.path(), status = status.as_u16(), len = body.len(), "proxied");

    let mut proxied = (status, body).into_response();
    proxied.headers_mut().remove(CONTENT_TYPE);
    if let Some(content_type) = content_type {
        proxied.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    proxied
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/models", get(forward))
        .route("/v1/chat/completions", post(forward))
        .route("/v1/images/generations", post(forward))
        .route("/v1/video/generations", post(forward))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer))
        // Bodies are forwarded whole, with no size cap
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}
