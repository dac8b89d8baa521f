/// Cookie holding the upstream bearer token on the site's own domain.
pub const AUTH_TOKEN_COOKIE: &str = "auth_token";
/// Cookie holding the base64-encoded raw upstream `Set-Cookie` value.
pub const UPSTREAM_SESSION_COOKIE: &str = "upstream_session";

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Pick the Authorization value to forward upstream.
/// An explicit, non-empty header wins; otherwise a bearer is built from the token cookie.
pub fn resolve_authorization(header: Option<&str>, token_cookie: Option<&str>) -> Option<String> {
    if let Some(h) = header.filter(|h| !h.is_empty()) {
        return Some(h.to_string());
    }
    token_cookie.filter(|t| !t.is_empty()).map(bearer)
}
