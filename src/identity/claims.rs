//! Best-effort, unverified peek at a compact token's claims.
//!
//! The signature is never checked here. The result only seeds an optimistic user for
//! display; authorization is always confirmed by the upstream "me" call.

use base64::Engine;
use serde_json::Value;

use super::user::User;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenClaims {
    pub sub: Option<String>,
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

fn claim_str(v: &Value, key: &str) -> Option<String> {
    match v.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn decode_segment(seg: &str) -> Option<Vec<u8>> {
    let seg = seg.trim_end_matches('=');
    base64::engine::general_purpose::URL_SAFE_NO_PAD
        .decode(seg)
        .or_else(|_| base64::engine::general_purpose::STANDARD_NO_PAD.decode(seg))
        .ok()
}

/// Decode the middle segment of `header.payload.signature` as JSON claims.
/// Returns `None` on any malformed input.
pub fn peek_unverified_claims(token: &str) -> Option<TokenClaims> {
    let payload = token.split('.').nth(1)?;
    let bytes = decode_segment(payload)?;
    let v: Value = serde_json::from_slice(&bytes).ok()?;
    if !v.is_object() {
        return None;
    }
    Some(TokenClaims {
        sub: claim_str(&v, "sub"),
        user_id: claim_str(&v, "userId"),
        name: claim_str(&v, "name"),
        email: claim_str(&v, "email"),
    })
}

impl TokenClaims {
    /// Minimal user derived from claims, if any identifying claim is present.
    pub fn optimistic_user(&self) -> Option<User> {
        if self.email.is_none() && self.name.is_none() && self.sub.is_none() {
            return None;
        }
        let id = self.sub.clone().or_else(|| self.user_id.clone()).unwrap_or_else(|| "unknown".to_string());
        let name = self.name.clone()
            .or_else(|| {
                self.email.as_deref()
                    .and_then(|e| e.split('@').next())
                    .filter(|local| !local.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "Member".to_string());
        Some(User { id, name, email: self.email.clone().unwrap_or_default(), ..Default::default() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(payload: serde_json::Value) -> String {
        let enc = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        format!("{}.{}.sig", enc.encode(br#"{"alg":"HS256"}"#), enc.encode(payload.to_string()))
    }

    #[test]
    fn full_claims_produce_user() {
        let t = token_with(serde_json::json!({"sub": "u-1", "name": "Dr. Sen", "email": "sen@society.org"}));
        let u = peek_unverified_claims(&t).and_then(|c| c.optimistic_user()).unwrap();
        assert_eq!(u.id, "u-1");
        assert_eq!(u.name, "Dr. Sen");
        assert_eq!(u.email, "sen@society.org");
        assert_eq!(u.phone, None);
    }

    #[test]
    fn email_only_falls_back_to_local_part() {
        let t = token_with(serde_json::json!({"email": "karim@society.org"}));
        let u = peek_unverified_claims(&t).unwrap().optimistic_user().unwrap();
        assert_eq!(u.id, "unknown");
        assert_eq!(u.name, "karim");
    }

    #[test]
    fn subject_only_is_member() {
        let t = token_with(serde_json::json!({"sub": 42}));
        let u = peek_unverified_claims(&t).unwrap().optimistic_user().unwrap();
        assert_eq!(u.id, "42");
        assert_eq!(u.name, "Member");
        assert_eq!(u.email, "");
    }

    #[test]
    fn no_identifying_claims_yield_no_user() {
        let t = token_with(serde_json::json!({"iat": 1, "userId": "x"}));
        assert!(peek_unverified_claims(&t).unwrap().optimistic_user().is_none());
    }

    #[test]
    fn malformed_tokens_are_swallowed() {
        assert!(peek_unverified_claims("not-a-token").is_none());
        assert!(peek_unverified_claims("a.%%%.c").is_none());
        let enc = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        assert!(peek_unverified_claims(&format!("a.{}.c", enc.encode("not json"))).is_none());
    }

    #[test]
    fn padded_standard_alphabet_is_tolerated() {
        let payload = base64::engine::general_purpose::STANDARD.encode(br#"{"name":"Ayesha"}"#);
        let c = peek_unverified_claims(&format!("h.{}.s", payload)).unwrap();
        assert_eq!(c.name.as_deref(), Some("Ayesha"));
    }
}
