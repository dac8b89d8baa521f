//! `/api/users/me` relays. Responses carrying a user are flattened so the browser always
//! receives the user object at top level.

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;
use tracing::{info, warn};

use super::upload::take_file;
use super::{request_authorization, with_upstream_cookie, AppState};
use crate::error::{AppError, AppResult};
use crate::identity::upstream::{error_message, extract_image_url, unwrap_user};

pub(super) async fn get_me(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let auth = request_authorization(&headers).ok_or_else(AppError::missing_credential)?;
    let req = state.http
        .get(state.config.upstream_url("/api/users/me"))
        .header(reqwest::header::AUTHORIZATION, auth)
        .header(CONTENT_TYPE, "application/json");
    let resp = with_upstream_cookie(req, &headers).send().await?;
    let status = resp.status();
    let data: Value = resp.json().await?;
    Ok((status, Json(unwrap_user(data))).into_response())
}

pub(super) async fn patch_me(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> AppResult<Response> {
    let auth = request_authorization(&headers).ok_or_else(AppError::missing_credential)?;
    let payload: Value = serde_json::from_slice(&body)?;
    let req = state.http
        .patch(state.config.upstream_url("/api/users/me"))
        .header(reqwest::header::AUTHORIZATION, auth)
        .json(&payload);
    let resp = with_upstream_cookie(req, &headers).send().await?;
    let status = resp.status();
    let data: Value = resp.json().await?;
    info!(target: "relay", "profile update relayed with upstream status {}", status.as_u16());
    Ok((status, Json(unwrap_user(data))).into_response())
}

/// Profile picture upload on behalf of the caller, using the caller's bearer.
pub(super) async fn upload_profile_image(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Response> {
    let auth = request_authorization(&headers).ok_or_else(AppError::missing_credential)?;
    let form = take_file(multipart).await?.into_form()?;
    let req = state.http
        .post(state.config.upstream_url("/api/users/upload-image"))
        .header(reqwest::header::AUTHORIZATION, auth)
        .multipart(form);
    let resp = with_upstream_cookie(req, &headers).send().await?;
    let status = resp.status();
    let data: Value = resp.json().await?;
    if !status.is_success() {
        let message = error_message(&data).unwrap_or_else(|| format!("Image upload failed (HTTP {})", status.as_u16()));
        return Err(AppError::upstream("upload_failed".to_string(), message, status.as_u16()));
    }
    let Some(url) = extract_image_url(&data) else {
        warn!(target: "relay", "profile upload succeeded but no URL field was present");
        return Err(AppError::upstream("url_missing", "Image URL missing in response", 500));
    };
    Ok((status, Json(serde_json::json!({ "url": url }))).into_response())
}

pub(super) async fn change_password(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> AppResult<Response> {
    let auth = request_authorization(&headers).ok_or_else(AppError::missing_credential)?;
    let payload: Value = serde_json::from_slice(&body)?;
    let req = state.http
        .patch(state.config.upstream_url("/api/users/me/change-password"))
        .header(reqwest::header::AUTHORIZATION, auth)
        .json(&payload);
    let resp = with_upstream_cookie(req, &headers).send().await?;
    let status = resp.status();
    let data: Value = resp.json().await?;
    Ok((status, Json(data)).into_response())
}
