//! In-process stand-ins for the upstream identity API and image storage, plus helpers to
//! run the relay against them on ephemeral localhost ports.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};

use memberportal::config::{ImagesConfig, RelayConfig};
use memberportal::server::{router, AppState};

pub const MEMBER_TOKEN: &str = "member-token";
pub const PASSWORD: &str = "correct-horse";
pub const UPSTREAM_SET_COOKIE: &str = "connect.sid=s%3Aabc123; Path=/; HttpOnly";
pub const IMAGES_SECRET: &str = "images-secret";
pub const PICTURE_URL: &str = "https://cdn.society.org/avatars/m-1.png";

pub fn member() -> Value {
    json!({"_id": "m-1", "name": "Dr. Farhana Akter", "email": "farhana@society.org", "phone": "+8801700000000"})
}

#[derive(Default)]
pub struct Upstream {
    pub hits: AtomicUsize,
    pub last_cookie: Mutex<Option<String>>,
    pub last_auth: Mutex<Option<String>>,
}

impl Upstream {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn record(&self, headers: &HeaderMap) {
        self.hits.fetch_add(1, Ordering::SeqCst);
        *self.last_cookie.lock() = headers.get("cookie").and_then(|v| v.to_str().ok()).map(str::to_string);
        *self.last_auth.lock() = headers.get("authorization").and_then(|v| v.to_str().ok()).map(str::to_string);
    }
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({"success": false, "message": "Invalid token"}))).into_response()
}

fn bearer(headers: &HeaderMap) -> &str {
    headers.get("authorization").and_then(|v| v.to_str().ok()).unwrap_or("")
}

async fn login(State(up): State<Arc<Upstream>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    up.record(&headers);
    if body["password"] != PASSWORD {
        return (StatusCode::UNAUTHORIZED, Json(json!({"success": false, "message": "Invalid credentials"}))).into_response();
    }
    let mut h = HeaderMap::new();
    h.insert("set-cookie", HeaderValue::from_static(UPSTREAM_SET_COOKIE));
    let body = json!({"success": true, "message": "Login successful", "token": MEMBER_TOKEN, "user": member()});
    (StatusCode::OK, h, Json(body)).into_response()
}

async fn register(State(up): State<Arc<Upstream>>, headers: HeaderMap) -> Response {
    up.record(&headers);
    (StatusCode::CREATED, Json(json!({"success": true, "message": "User registered"}))).into_response()
}

async fn me(State(up): State<Arc<Upstream>>, headers: HeaderMap) -> Response {
    up.record(&headers);
    match bearer(&headers) {
        "Bearer shape-user" => Json(json!({"user": {"id": "1", "name": "A"}})).into_response(),
        "Bearer shape-data" => Json(json!({"data": {"user": {"id": "1", "name": "A"}}})).into_response(),
        "Bearer shape-flat" => Json(json!({"id": "1", "name": "A"})).into_response(),
        b if b == format!("Bearer {}", MEMBER_TOKEN) => Json(json!({"success": true, "data": {"user": member()}})).into_response(),
        _ => unauthorized(),
    }
}

async fn patch_me(State(up): State<Arc<Upstream>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    up.record(&headers);
    if bearer(&headers) != format!("Bearer {}", MEMBER_TOKEN) {
        return unauthorized();
    }
    let mut merged = member();
    if let (Some(m), Some(b)) = (merged.as_object_mut(), body.as_object()) {
        for (k, v) in b {
            m.insert(k.clone(), v.clone());
        }
    }
    Json(json!({"success": true, "data": {"user": merged}})).into_response()
}

async fn profile(State(up): State<Arc<Upstream>>, headers: HeaderMap) -> Response {
    up.record(&headers);
    if bearer(&headers) != format!("Bearer {}", MEMBER_TOKEN) {
        return unauthorized();
    }
    Json(json!({"success": true, "user": member()})).into_response()
}

async fn change_password(State(up): State<Arc<Upstream>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    up.record(&headers);
    if body["currentPassword"] != PASSWORD {
        return (StatusCode::BAD_REQUEST, Json(json!({"success": false, "message": "Current password is incorrect"}))).into_response();
    }
    Json(json!({"success": true, "message": "Password changed"})).into_response()
}

async fn file_name_of(mut multipart: Multipart) -> Option<String> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            return field.file_name().map(str::to_string);
        }
    }
    None
}

async fn upload_profile(State(up): State<Arc<Upstream>>, headers: HeaderMap, multipart: Multipart) -> Response {
    up.record(&headers);
    if bearer(&headers) != format!("Bearer {}", MEMBER_TOKEN) {
        return unauthorized();
    }
    match file_name_of(multipart).await.as_deref() {
        Some("url.png") => Json(json!({"url": PICTURE_URL})).into_response(),
        Some("ppu.png") => Json(json!({"profilePictureUrl": PICTURE_URL})).into_response(),
        Some("nested.png") => Json(json!({"success": true, "user": {"profilePictureUrl": PICTURE_URL}})).into_response(),
        Some("huge.png") => (StatusCode::PAYLOAD_TOO_LARGE, Json(json!({"success": false, "message": "File too large"}))).into_response(),
        _ => Json(json!({"success": true})).into_response(),
    }
}

async fn images(State(up): State<Arc<Upstream>>, Path(account): Path<String>, headers: HeaderMap, multipart: Multipart) -> Response {
    up.record(&headers);
    if bearer(&headers) != format!("Bearer {}", IMAGES_SECRET) {
        return (StatusCode::FORBIDDEN, Json(json!({"success": false, "errors": [{"code": 10000, "message": "Authentication error"}]}))).into_response();
    }
    if file_name_of(multipart).await.as_deref() == Some("reject.png") {
        return (StatusCode::BAD_REQUEST, Json(json!({"success": false, "errors": [{"code": 5400, "message": "Bad image"}]}))).into_response();
    }
    let base = format!("https://imagedelivery.net/{}/img-1", account);
    Json(json!({
        "success": true,
        "errors": [],
        "result": {"id": "img-1", "variants": [format!("{}/public", base), format!("{}/thumb", base)]}
    }))
    .into_response()
}

pub async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind 127.0.0.1:0");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            eprintln!("test server error: {e:?}");
        }
    });
    format!("http://{}", addr)
}

pub async fn start_upstream() -> (String, Arc<Upstream>) {
    let up = Arc::new(Upstream::default());
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/auth/profile", get(profile))
        .route("/api/users/me", get(me).patch(patch_me))
        .route("/api/users/me/change-password", axum::routing::patch(change_password))
        .route("/api/users/upload-image", post(upload_profile))
        .route("/accounts/{account}/images/v1", post(images))
        .with_state(up.clone());
    (spawn(app).await, up)
}

/// Relay config pointing both the identity API and image storage at `upstream`.
/// `images_vars` names the env vars holding image credentials for this test.
pub fn relay_config(upstream: &str, images_vars: (&str, &str)) -> RelayConfig {
    RelayConfig {
        upstream_base: upstream.to_string(),
        images: ImagesConfig {
            api_base: upstream.to_string(),
            account_var: images_vars.0.to_string(),
            token_var: images_vars.1.to_string(),
        },
        ..RelayConfig::default()
    }
}

pub async fn start_relay(config: RelayConfig) -> String {
    spawn(router(AppState::new(config).expect("relay state"))).await
}

/// All `Set-Cookie` values of a response.
pub fn set_cookies(resp: &reqwest::Response) -> Vec<String> {
    resp.headers()
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// Turn `Set-Cookie` values into the `Cookie` header a browser would send back.
pub fn cookie_header(set_cookies: &[String]) -> String {
    set_cookies
        .iter()
        .filter_map(|c| c.split(';').next())
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("; ")
}
