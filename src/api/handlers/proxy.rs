use axum::body::to_bytes;
use axum::extract::{Request, State};
use axum::http::header::{ACCEPT, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};

use crate::api::auth::TOKEN_QUERY_PARAM;
use crate::errors::AppError;
use crate::AppState;

pub const GAMMA_PREFIX: &str = "/api/polymarket";
pub const DATA_PREFIX: &str = "/api/data";

const MAX_PROXY_BODY: usize = 1024 * 1024;

/// Map `/api/polymarket/events?x=1` onto `{base}/events?x=1`.
///
/// Returns `None` when `path_and_query` is not under `prefix` (a path that
/// merely starts with the same characters, like `/api/polymarketx`, is not).
pub fn rewrite_target(base: &str, prefix: &str, path_and_query: &str) -> Option<String> {
    let rest = path_and_query.strip_prefix(prefix)?;
    let rest = match rest.chars().next() {
        None | Some('?') => format!("/{rest}"),
        Some('/') => rest.to_string(),
        Some(_) => return None,
    };
    Some(format!("{}{}", base.trim_end_matches('/'), rest))
}

/// Remove the auth token pair from a request target. The service token is
/// never forwarded upstream.
pub fn strip_token(path_and_query: &str) -> String {
    let Some((path, query)) = path_and_query.split_once('?') else {
        return path_and_query.to_string();
    };
    let kept: Vec<&str> = query
        .split('&')
        .filter(|pair| {
            let key = pair.split_once('=').map_or(*pair, |(k, _)| k);
            key != TOKEN_QUERY_PARAM
        })
        .collect();

    if kept.is_empty() {
        path.to_string()
    } else {
        format!("{path}?{}", kept.join("&"))
    }
}

pub async fn gamma(State(state): State<AppState>, req: Request) -> Result<Response, AppError> {
    let base = state.config.gamma_api_url.clone();
    forward(&state.http, &base, GAMMA_PREFIX, req).await
}

pub async fn data(State(state): State<AppState>, req: Request) -> Result<Response, AppError> {
    let base = state.config.data_api_url.clone();
    forward(&state.http, &base, DATA_PREFIX, req).await
}

async fn forward(
    http: &reqwest::Client,
    base: &str,
    prefix: &str,
    req: Request,
) -> Result<Response, AppError> {
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| strip_token(pq.as_str()))
        .unwrap_or_else(|| req.uri().path().to_string());

    let target = rewrite_target(base, prefix, &path_and_query)
        .ok_or_else(|| AppError::NotFound(path_and_query.clone()))?;

    let method = req.method().clone();
    let content_type = req.headers().get(CONTENT_TYPE).cloned();
    let accept = req.headers().get(ACCEPT).cloned();
    let body = to_bytes(req.into_body(), MAX_PROXY_BODY)
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut upstream_req = http.request(method.clone(), &target);
    if let Some(ct) = content_type {
        upstream_req = upstream_req.header(CONTENT_TYPE, ct);
    }
    if let Some(accept) = accept {
        upstream_req = upstream_req.header(ACCEPT, accept);
    }
    if !body.is_empty() {
        upstream_req = upstream_req.body(body);
    }

    let upstream = upstream_req
        .send()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let status = upstream.status();
    let content_type = upstream.headers().get(CONTENT_TYPE).cloned();
    let bytes = upstream
        .bytes()
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    tracing::debug!(
        method = %method,
        target = %target,
        status = status.as_u16(),
        bytes = bytes.len(),
        "Proxied upstream request"
    );

    let mut response = (status, bytes).into_response();
    if let Some(ct) = content_type {
        response.headers_mut().insert(CONTENT_TYPE, ct);
    }
    Ok(response)
}
