//! Typed calls against the relay's browser-facing routes.

use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SessionError;
use crate::identity::upstream::{error_message, extract_image_url, unwrap_user, AuthOutcome};
use crate::identity::{bearer, User, UserPatch};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirm_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Clone)]
pub struct RelayApi {
    base: String,
    client: reqwest::Client,
}

impl RelayApi {
    /// The client keeps relay cookies between calls, as a browser would.
    pub fn new(base: &str) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()?;
        Ok(Self { base: base.trim_end_matches('/').to_string(), client })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn with_bearer(req: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(t) => req.header(reqwest::header::AUTHORIZATION, bearer(t)),
            None => req,
        }
    }

    /// Body as JSON; non-2xx becomes `SessionError::Status` carrying the body's message.
    /// A 2xx body that is not JSON is a decode failure, never an empty success.
    async fn read_json(resp: reqwest::Response) -> Result<Value, SessionError> {
        let status = resp.status();
        if !status.is_success() {
            let data: Value = resp.json().await.unwrap_or_else(|_| serde_json::json!({}));
            let message = error_message(&data).unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(SessionError::Status { status: status.as_u16(), message });
        }
        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| SessionError::Decode(format!("relay body is not JSON: {}", e)))
    }

    /// A user record must carry an id; anything else is not authoritative.
    fn to_user(v: Value) -> Result<User, SessionError> {
        let user = serde_json::from_value::<User>(unwrap_user(v)).map_err(|e| SessionError::Decode(e.to_string()))?;
        if user.id.is_empty() {
            return Err(SessionError::Decode("user record without id".into()));
        }
        Ok(user)
    }

    pub async fn login_user(&self, email: &str, password: &str) -> Result<AuthOutcome, SessionError> {
        let resp = self.client
            .post(self.url("/api/auth/login"))
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        Ok(AuthOutcome::from_value(&Self::read_json(resp).await?))
    }

    pub async fn register_user(&self, req: &RegisterRequest) -> Result<AuthOutcome, SessionError> {
        let resp = self.client.post(self.url("/api/auth/register")).json(req).send().await?;
        Ok(AuthOutcome::from_value(&Self::read_json(resp).await?))
    }

    pub async fn get_profile(&self, token: Option<&str>) -> Result<User, SessionError> {
        let req = Self::with_bearer(self.client.get(self.url("/api/auth/profile")), token);
        Self::to_user(Self::read_json(req.send().await?).await?)
    }

    pub async fn get_me(&self, token: Option<&str>) -> Result<User, SessionError> {
        let req = Self::with_bearer(self.client.get(self.url("/api/users/me")), token);
        Self::to_user(Self::read_json(req.send().await?).await?)
    }

    pub async fn update_me(&self, patch: &UserPatch, token: Option<&str>) -> Result<User, SessionError> {
        let req = Self::with_bearer(self.client.patch(self.url("/api/users/me")), token).json(patch);
        Self::to_user(Self::read_json(req.send().await?).await?)
    }

    /// Upload a profile picture and return its URL.
    pub async fn upload_profile_image(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
        token: Option<&str>,
    ) -> Result<String, SessionError> {
        let mut part = Part::bytes(bytes).file_name(file_name.to_string());
        if let Some(ct) = content_type {
            part = part
                .mime_str(ct)
                .map_err(|e| SessionError::Decode(format!("invalid content type: {}", e)))?;
        }
        let req = Self::with_bearer(self.client.post(self.url("/api/users/me")), token)
            .multipart(Form::new().part("file", part));
        let data = Self::read_json(req.send().await?).await?;
        extract_image_url(&data).ok_or(SessionError::UrlMissing)
    }

    pub async fn change_password(&self, req: &ChangePasswordRequest, token: Option<&str>) -> Result<String, SessionError> {
        let builder = Self::with_bearer(self.client.patch(self.url("/api/users/me/change-password")), token).json(req);
        let data = Self::read_json(builder.send().await?).await?;
        Ok(data.get("message").and_then(Value::as_str).unwrap_or("Password updated").to_string())
    }

    /// Ask the relay to expire its cookies.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let resp = self.client.post(self.url("/api/auth/logout")).send().await?;
        if !resp.status().is_success() {
            return Err(SessionError::Status { status: resp.status().as_u16(), message: "logout failed".into() });
        }
        Ok(())
    }
}
