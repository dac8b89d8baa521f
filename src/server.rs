//!
//! memberportal relay server
//! -------------------------
//! Axum-based credential relay between the browser and the upstream identity API.
//!
//! Responsibilities:
//! - Login/registration pass-through, capturing the upstream token and session cookie
//!   into the site's own http-only cookies.
//! - Logout by expiring both cookies; no upstream call.
//! - Profile and "me" routes that rebuild the Authorization header from those cookies
//!   when the caller sends none.
//! - Image uploads re-wrapped as fresh multipart bodies.
//! - A preflight response on every route.
//!
//! Handlers are stateless: nothing is shared between requests except the upstream
//! HTTP client and read-only configuration.

use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::http::header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, AUTHORIZATION};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, MethodRouter};
use axum::Router;
use tracing::info;

use crate::config::RelayConfig;
use crate::identity::{resolve_authorization, AUTH_TOKEN_COOKIE, UPSTREAM_SESSION_COOKIE};

pub mod cookies;
mod auth;
mod users;
mod upload;

pub(crate) const CREDENTIAL_METHODS: &str = "POST";
pub(crate) const PROFILE_METHODS: &str = "GET";
pub(crate) const ME_METHODS: &str = "GET, PATCH, POST";
pub(crate) const PASSWORD_METHODS: &str = "PATCH";
pub(crate) const UPLOAD_METHODS: &str = "POST";
pub(crate) const JSON_HEADERS: &str = "Content-Type";
pub(crate) const BEARER_HEADERS: &str = "Content-Type, Authorization";

/// Uploads are images; allow more than axum's 2 MiB default.
const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Shared server state injected into all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    /// Outbound client for upstream calls. No cookie store: upstream cookies are
    /// forwarded explicitly from the browser's relay cookies.
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: RelayConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("While building upstream HTTP client")?;
        Ok(Self { config: Arc::new(config), http })
    }
}

/// Access-control headers advertised by a route.
pub(crate) fn cors_headers(methods: &'static str, headers: &'static str) -> HeaderMap {
    let mut h = HeaderMap::new();
    h.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    h.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(methods));
    h.insert(ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(headers));
    h
}

/// Unconditional 200 with no body.
pub(crate) fn preflight(methods: &'static str, headers: &'static str) -> Response {
    (StatusCode::OK, cors_headers(methods, headers)).into_response()
}

/// Authorization to forward upstream: the caller's header, else a bearer from the token cookie.
pub(crate) fn request_authorization(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    let cookie = cookies::parse_cookie(headers, AUTH_TOKEN_COOKIE);
    resolve_authorization(header, cookie.as_deref())
}

/// Attach the stored upstream session cookie, decoded, when the browser sent one.
pub(crate) fn with_upstream_cookie(req: reqwest::RequestBuilder, headers: &HeaderMap) -> reqwest::RequestBuilder {
    match cookies::parse_cookie(headers, UPSTREAM_SESSION_COOKIE).and_then(|c| cookies::decode_upstream_cookie(&c)) {
        Some(raw) => req.header(reqwest::header::COOKIE, raw),
        None => req,
    }
}

/// Stamp the route's access-control headers on every response it produces, errors included.
fn with_cors(route: MethodRouter<AppState>, methods: &'static str, headers: &'static str) -> MethodRouter<AppState> {
    route
        .options(move || async move { preflight(methods, headers) })
        .layer(middleware::map_response(move |mut resp: Response| async move {
            resp.headers_mut().extend(cors_headers(methods, headers));
            resp
        }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "memberportal relay ok" }))
        .route("/api/auth/login", with_cors(post(auth::login), CREDENTIAL_METHODS, JSON_HEADERS))
        .route("/api/auth/register", with_cors(post(auth::register), CREDENTIAL_METHODS, JSON_HEADERS))
        .route("/api/auth/logout", with_cors(post(auth::logout), CREDENTIAL_METHODS, JSON_HEADERS))
        .route("/api/auth/profile", with_cors(get(auth::profile), PROFILE_METHODS, BEARER_HEADERS))
        .route(
            "/api/users/me",
            with_cors(
                get(users::get_me)
                    .patch(users::patch_me)
                    .post(users::upload_profile_image)
                    .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
                ME_METHODS,
                BEARER_HEADERS,
            ),
        )
        .route(
            "/api/users/me/change-password",
            with_cors(axum::routing::patch(users::change_password), PASSWORD_METHODS, BEARER_HEADERS),
        )
        .route(
            "/api/upload-image",
            with_cors(post(upload::upload_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)), UPLOAD_METHODS, JSON_HEADERS),
        )
        .with_state(state)
}

fn log_startup(config: &RelayConfig) {
    info!(
        target: "startup",
        "memberportal relay starting: bind={}, upstream={}, images_api={}, images_env=({}, {}), cookie_secure={}",
        config.bind_addr(), config.upstream_base, config.images.api_base,
        config.images.account_var, config.images.token_var, config.cookie_secure
    );
    if config.images.credentials().is_err() {
        tracing::warn!(target: "startup", "image storage credentials not set; /api/upload-image will answer 500 until they are");
    }
}

/// Start the relay and serve until the listener fails.
pub async fn run(config: RelayConfig) -> anyhow::Result<()> {
    log_startup(&config);
    let addr = config.bind_addr();
    let app = router(AppState::new(config)?);
    info!("Starting relay on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind relay listener on {}", addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorization_from_header_or_cookie() {
        let mut h = HeaderMap::new();
        h.insert("cookie", HeaderValue::from_static("theme=dark; auth_token=tok123"));
        assert_eq!(request_authorization(&h).as_deref(), Some("Bearer tok123"));
        h.insert(AUTHORIZATION, HeaderValue::from_static("Bearer explicit"));
        assert_eq!(request_authorization(&h).as_deref(), Some("Bearer explicit"));
        assert_eq!(request_authorization(&HeaderMap::new()), None);
    }

    #[test]
    fn preflight_advertises_methods() {
        let resp = preflight(ME_METHODS, BEARER_HEADERS);
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_METHODS], "GET, PATCH, POST");
        assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type, Authorization");
        assert_eq!(resp.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
