//! Adapter over the upstream service's loosely-typed JSON.
//!
//! Upstream has used several shapes for the same data (`token` / `accessToken` /
//! `access_token`, a bare user or one nested under `user` or `data.user`, several image
//! URL fields). All probing happens here so the rest of the crate sees one canonical
//! shape. This tolerates schema drift; it is not a contract.

use serde::Serialize;
use serde_json::Value;

use super::user::User;

const TOKEN_FIELDS: [&str; 3] = ["accessToken", "token", "access_token"];

fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn non_empty_str(v: Option<&Value>) -> Option<String> {
    v.and_then(Value::as_str).filter(|s| !s.is_empty()).map(str::to_string)
}

/// Bearer token from a login/registration response, if upstream issued one.
pub fn extract_token(v: &Value) -> Option<String> {
    TOKEN_FIELDS.iter().find_map(|k| non_empty_str(v.get(*k)))
}

/// Return the user object at top level: `{user:{..}}` and `{data:{user:{..}}}` are
/// unwrapped, anything else is returned unchanged.
pub fn unwrap_user(v: Value) -> Value {
    if !v.is_object() {
        return v;
    }
    if v.get("user").map(truthy).unwrap_or(false) {
        return v["user"].clone();
    }
    if v.pointer("/data/user").map(truthy).unwrap_or(false) {
        return v["data"]["user"].clone();
    }
    v
}

/// Profile picture URL from an upload response: `url`, `profilePictureUrl`, or
/// `user.profilePictureUrl`, in that order.
pub fn extract_image_url(v: &Value) -> Option<String> {
    non_empty_str(v.get("url"))
        .or_else(|| non_empty_str(v.get("profilePictureUrl")))
        .or_else(|| non_empty_str(v.pointer("/user/profilePictureUrl")))
}

/// Human-readable failure reason carried in an upstream error body.
pub fn error_message(v: &Value) -> Option<String> {
    non_empty_str(v.get("message"))
        .or_else(|| non_empty_str(v.get("error")))
        .or_else(|| non_empty_str(v.pointer("/errors/0/message")))
}

/// Canonical result of a society-wide image upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageUpload {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<String>>,
}

/// Image storage responds `{success, result:{id, variants:[..]}, errors:[{message}]}`.
/// Returns `None` when the body does not report success.
pub fn parse_image_upload(v: &Value) -> Option<ImageUpload> {
    if !v.get("success").map(truthy).unwrap_or(false) {
        return None;
    }
    let result = v.get("result");
    let variants: Option<Vec<String>> = result
        .and_then(|r| r.get("variants"))
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect());
    Some(ImageUpload {
        success: true,
        id: result.and_then(|r| r.get("id")).and_then(Value::as_str).map(str::to_string),
        url: variants.as_ref().and_then(|vs| vs.first().cloned()),
        variants,
    })
}

/// Canonical view of a login or registration response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthOutcome {
    pub token: Option<String>,
    pub user: Option<User>,
    pub message: Option<String>,
}

impl AuthOutcome {
    pub fn from_value(v: &Value) -> Self {
        let unwrapped = unwrap_user(v.clone());
        let looks_like_user = unwrapped.get("email").is_some() || unwrapped.get("id").is_some() || unwrapped.get("_id").is_some();
        let user = if looks_like_user {
            serde_json::from_value::<User>(unwrapped).ok()
        } else {
            None
        };
        Self { token: extract_token(v), user, message: non_empty_str(v.get("message")) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn token_field_probing() {
        assert_eq!(extract_token(&json!({"accessToken": "a", "token": "b"})).as_deref(), Some("a"));
        assert_eq!(extract_token(&json!({"token": "b"})).as_deref(), Some("b"));
        assert_eq!(extract_token(&json!({"access_token": "c"})).as_deref(), Some("c"));
        assert_eq!(extract_token(&json!({"token": ""})), None);
        assert_eq!(extract_token(&json!({"success": false})), None);
    }

    #[test]
    fn unwrap_flattens_all_three_shapes_identically() {
        let flat = json!({"id": "1", "name": "A"});
        let shapes = [
            json!({"user": {"id": "1", "name": "A"}}),
            json!({"data": {"user": {"id": "1", "name": "A"}}}),
            json!({"id": "1", "name": "A"}),
        ];
        let expected = serde_json::to_vec(&flat).unwrap();
        for s in shapes {
            assert_eq!(serde_json::to_vec(&unwrap_user(s)).unwrap(), expected);
        }
    }

    #[test]
    fn unwrap_leaves_errors_and_non_objects_alone() {
        let err = json!({"success": false, "message": "Unauthorized"});
        assert_eq!(unwrap_user(err.clone()), err);
        assert_eq!(unwrap_user(json!({"user": null, "id": "1"})), json!({"user": null, "id": "1"}));
        assert_eq!(unwrap_user(json!([1, 2])), json!([1, 2]));
    }

    #[test]
    fn image_url_shapes() {
        let want = Some("https://cdn/p.png".to_string());
        assert_eq!(extract_image_url(&json!({"url": "https://cdn/p.png"})), want);
        assert_eq!(extract_image_url(&json!({"profilePictureUrl": "https://cdn/p.png"})), want);
        assert_eq!(extract_image_url(&json!({"user": {"profilePictureUrl": "https://cdn/p.png"}})), want);
        assert_eq!(extract_image_url(&json!({"success": true})), None);
    }

    #[test]
    fn error_message_sources() {
        assert_eq!(error_message(&json!({"message": "bad"})).as_deref(), Some("bad"));
        assert_eq!(error_message(&json!({"error": "worse"})).as_deref(), Some("worse"));
        assert_eq!(error_message(&json!({"errors": [{"message": "too large"}]})).as_deref(), Some("too large"));
        assert_eq!(error_message(&json!({})), None);
    }

    #[test]
    fn image_upload_picks_first_variant() {
        let body = json!({"success": true, "result": {"id": "img1", "variants": ["https://i/1/public", "https://i/1/thumb"]}});
        let up = parse_image_upload(&body).unwrap();
        assert_eq!(up.id.as_deref(), Some("img1"));
        assert_eq!(up.url.as_deref(), Some("https://i/1/public"));
        assert_eq!(up.variants.as_ref().map(Vec::len), Some(2));
        assert!(parse_image_upload(&json!({"success": false, "errors": []})).is_none());
    }

    #[test]
    fn auth_outcome_from_nested_response() {
        let o = AuthOutcome::from_value(&json!({
            "success": true, "message": "ok", "token": "t.k.n",
            "data": {"user": {"_id": "9", "name": "Nadia", "email": "n@x.org"}}
        }));
        assert_eq!(o.token.as_deref(), Some("t.k.n"));
        assert_eq!(o.user.as_ref().map(|u| u.id.as_str()), Some("9"));
        assert_eq!(o.message.as_deref(), Some("ok"));
        assert_eq!(AuthOutcome::from_value(&json!({"accessToken": "z"})).user, None);
    }
}
