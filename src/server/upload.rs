//! Image uploads: multipart intake shared by both uploaders, plus the society-wide
//! uploader backed by server-held image storage credentials.

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{info, warn};

use super::AppState;
use crate::error::{AppError, AppResult};
use crate::identity::upstream::{error_message, parse_image_upload};

/// The single `file` part of an upload form.
pub(super) struct UploadedFile {
    file_name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

impl UploadedFile {
    /// Re-wrap into a fresh multipart body for upstream.
    pub(super) fn into_form(self) -> AppResult<Form> {
        let size = self.bytes.len();
        let part = Part::bytes(self.bytes.to_vec()).file_name(self.file_name);
        let part = match self.content_type {
            Some(ct) => part
                .mime_str(&ct)
                .map_err(|_| AppError::user("invalid_content_type", "Invalid file content type"))?,
            None => part,
        };
        info!(target: "relay", "forwarding upload of {} bytes", size);
        Ok(Form::new().part("file", part))
    }
}

/// Pull the `file` part out of the form. It must be a file, not a plain text field.
pub(super) async fn take_file(multipart: Result<Multipart, MultipartRejection>) -> AppResult<UploadedFile> {
    let mut multipart = multipart.map_err(|e| {
        warn!(target: "relay", "upload rejected: {}", e);
        AppError::user("invalid_multipart", "Invalid multipart payload")
    })?;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => return Err(AppError::missing_file()),
            Err(e) => {
                warn!(target: "relay", "upload rejected: {}", e);
                return Err(AppError::user("invalid_multipart", "Invalid multipart payload"));
            }
        };
        if field.name() != Some("file") {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            return Err(AppError::missing_file());
        };
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map_err(|e| {
            warn!(target: "relay", "upload body unreadable: {}", e);
            AppError::user("invalid_multipart", "Invalid multipart payload")
        })?;
        return Ok(UploadedFile { file_name, content_type, bytes });
    }
}

/// Society-wide uploader. Credentials are checked before the form is read.
pub(super) async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Response> {
    let (account, token) = state.config.images.credentials()?;
    let form = take_file(multipart).await?.into_form()?;
    let resp = state.http
        .post(state.config.images.upload_url(&account))
        .bearer_auth(&token)
        .multipart(form)
        .send()
        .await?;
    let status = resp.status();
    let data: Value = resp.json().await?;
    let upload = if status.is_success() { parse_image_upload(&data) } else { None };
    match upload {
        Some(up) => {
            info!(target: "relay", "image stored: id={:?}", up.id);
            Ok((StatusCode::OK, Json(up)).into_response())
        }
        None => {
            let message = error_message(&data).unwrap_or_else(|| "Upload failed".to_string());
            warn!(target: "relay", "image storage rejected upload: status={} message={}", status.as_u16(), message);
            Err(AppError::upstream("upload_failed".to_string(), message, status.as_u16()))
        }
    }
}
