//! Relay cookie helpers. Both relay cookies are http-only, same-site-lax and scoped to `/`.

use axum::http::{HeaderMap, HeaderValue};
use base64::Engine;
use tracing::warn;

const EXPIRED: &str = "Expires=Thu, 01 Jan 1970 00:00:00 GMT";

pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    for cookie in headers.get_all("cookie") {
        let Ok(s) = cookie.to_str() else { continue };
        for part in s.split(';') {
            let p = part.trim();
            if let Some((k, v)) = p.split_once('=') {
                if k == name { return Some(v.to_string()); }
            }
        }
    }
    None
}

fn attributes(secure: bool) -> &'static str {
    if secure { "HttpOnly; Secure; SameSite=Lax; Path=/" } else { "HttpOnly; SameSite=Lax; Path=/" }
}

pub fn set_cookie(name: &str, value: &str, secure: bool) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("{}={}; {}", name, value, attributes(secure))).ok()
}

pub fn clear_cookie(name: &str, secure: bool) -> Option<HeaderValue> {
    HeaderValue::from_str(&format!("{}=; {}; {}", name, EXPIRED, attributes(secure))).ok()
}

/// Append a `Set-Cookie` header; values that are not valid header text are dropped with a warning.
pub fn append_set_cookie(headers: &mut HeaderMap, name: &str, value: Option<HeaderValue>) {
    match value {
        Some(v) => { headers.append(axum::http::header::SET_COOKIE, v); }
        None => warn!(target: "relay", "cookie {} not set: value is not valid header text", name),
    }
}

/// All upstream `Set-Cookie` values joined with `", "`, kept verbatim.
pub fn joined_set_cookie(headers: &reqwest::header::HeaderMap) -> Option<String> {
    let parts: Vec<&str> = headers
        .get_all(reqwest::header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();
    if parts.is_empty() { None } else { Some(parts.join(", ")) }
}

pub fn encode_upstream_cookie(raw: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(raw.as_bytes())
}

pub fn decode_upstream_cookie(encoded: &str) -> Option<String> {
    let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    String::from_utf8(bytes).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_finds_named_cookie_with_equals_in_value() {
        let mut h = HeaderMap::new();
        h.insert("cookie", HeaderValue::from_static("a=1; upstream_session=c2lkPTE7IFBhdGg9Lw==; b=2"));
        assert_eq!(parse_cookie(&h, "upstream_session").as_deref(), Some("c2lkPTE7IFBhdGg9Lw=="));
        assert_eq!(parse_cookie(&h, "b").as_deref(), Some("2"));
        assert_eq!(parse_cookie(&h, "missing"), None);
    }

    #[test]
    fn set_and_clear_attributes() {
        let v = set_cookie("auth_token", "abc", true).unwrap();
        assert_eq!(v, "auth_token=abc; HttpOnly; Secure; SameSite=Lax; Path=/");
        let c = clear_cookie("auth_token", true).unwrap();
        assert_eq!(c, "auth_token=; Expires=Thu, 01 Jan 1970 00:00:00 GMT; HttpOnly; Secure; SameSite=Lax; Path=/");
        let dev = set_cookie("auth_token", "abc", false).unwrap();
        assert!(!dev.to_str().unwrap().contains("Secure"));
    }

    #[test]
    fn upstream_cookie_survives_encoding_unmodified() {
        let raw = "connect.sid=s%3Aabc.def; Path=/; HttpOnly; SameSite=None; Secure";
        let enc = encode_upstream_cookie(raw);
        assert!(!enc.contains(';'));
        assert_eq!(decode_upstream_cookie(&enc).as_deref(), Some(raw));
        assert_eq!(decode_upstream_cookie("%%%"), None);
    }

    #[test]
    fn joins_multiple_set_cookie_values() {
        let mut h = reqwest::header::HeaderMap::new();
        h.append(reqwest::header::SET_COOKIE, reqwest::header::HeaderValue::from_static("a=1; Path=/"));
        h.append(reqwest::header::SET_COOKIE, reqwest::header::HeaderValue::from_static("b=2"));
        assert_eq!(joined_set_cookie(&h).as_deref(), Some("a=1; Path=/, b=2"));
        assert_eq!(joined_set_cookie(&reqwest::header::HeaderMap::new()), None);
    }
}
