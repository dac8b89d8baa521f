//! `/api/auth/*` relays: login, registration, logout and profile.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use tracing::{debug, info};

use super::cookies;
use super::{request_authorization, with_upstream_cookie, AppState};
use crate::error::{AppError, AppResult};
use crate::identity::upstream::extract_token;
use crate::identity::{AUTH_TOKEN_COOKIE, UPSTREAM_SESSION_COOKIE};

pub(super) async fn login(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    relay_credentials(&state, "/api/auth/login", &body).await
}

pub(super) async fn register(State(state): State<AppState>, body: Bytes) -> AppResult<Response> {
    relay_credentials(&state, "/api/auth/register", &body).await
}

/// Forward credentials unchanged and pass the upstream status and body straight back.
/// Whatever token or session cookie upstream issued is mirrored into relay cookies.
async fn relay_credentials(state: &AppState, path: &str, body: &[u8]) -> AppResult<Response> {
    let payload: Value = serde_json::from_slice(body)?;
    let resp = state.http
        .post(state.config.upstream_url(path))
        .json(&payload)
        .send()
        .await?;
    let status = resp.status();
    let upstream_cookie = cookies::joined_set_cookie(resp.headers());
    let data: Value = resp.json().await?;

    let secure = state.config.cookie_secure;
    let mut headers = HeaderMap::new();
    if let Some(token) = extract_token(&data) {
        cookies::append_set_cookie(&mut headers, AUTH_TOKEN_COOKIE, cookies::set_cookie(AUTH_TOKEN_COOKIE, &token, secure));
    }
    if let Some(raw) = upstream_cookie {
        let encoded = cookies::encode_upstream_cookie(&raw);
        cookies::append_set_cookie(&mut headers, UPSTREAM_SESSION_COOKIE, cookies::set_cookie(UPSTREAM_SESSION_COOKIE, &encoded, secure));
    }
    info!(target: "relay", "{} relayed with upstream status {}", path, status.as_u16());
    Ok((status, headers, Json(data)).into_response())
}

/// Expire both relay cookies. Succeeds whether or not they exist.
pub(super) async fn logout(State(state): State<AppState>) -> Response {
    let secure = state.config.cookie_secure;
    let mut headers = HeaderMap::new();
    cookies::append_set_cookie(&mut headers, AUTH_TOKEN_COOKIE, cookies::clear_cookie(AUTH_TOKEN_COOKIE, secure));
    cookies::append_set_cookie(&mut headers, UPSTREAM_SESSION_COOKIE, cookies::clear_cookie(UPSTREAM_SESSION_COOKIE, secure));
    debug!(target: "relay", "logout: relay cookies cleared");
    (StatusCode::NO_CONTENT, headers).into_response()
}

pub(super) async fn profile(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let auth = request_authorization(&headers).ok_or_else(AppError::missing_credential)?;
    let req = state.http
        .get(state.config.upstream_url("/api/auth/profile"))
        .header(reqwest::header::AUTHORIZATION, auth)
        .header(CONTENT_TYPE, "application/json");
    let resp = with_upstream_cookie(req, &headers).send().await?;
    let status = resp.status();
    let data: Value = resp.json().await?;
    Ok((status, Json(data)).into_response())
}
