use serde::{Deserialize, Serialize};

/// Member record owned by the upstream service.
///
/// The session client may hold a partial copy: an optimistic user built from token
/// claims carries only `id`, `name` and `email`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
}

/// Partial user fields. Serialized as the PATCH body for `/api/users/me` and applied
/// locally by the session client's update transition.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_picture_url: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self == &UserPatch::default()
    }

    /// Set a field by its wire name (`name`, `phone`, `profilePictureUrl`, ...).
    pub fn set(&mut self, key: &str, value: String) -> bool {
        let slot = match key {
            "name" => &mut self.name,
            "email" => &mut self.email,
            "avatar" => &mut self.avatar,
            "phone" => &mut self.phone,
            "address" => &mut self.address,
            "bio" => &mut self.bio,
            "profilePictureUrl" | "profile_picture_url" => &mut self.profile_picture_url,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

impl From<&User> for UserPatch {
    /// Every editable field of a stored record, e.g. the one upstream returns after a PATCH.
    fn from(u: &User) -> Self {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        Self {
            name: non_empty(&u.name),
            email: non_empty(&u.email),
            avatar: u.avatar.clone(),
            phone: u.phone.clone(),
            address: u.address.clone(),
            bio: u.bio.clone(),
            profile_picture_url: u.profile_picture_url.clone(),
        }
    }
}

impl User {
    /// Shallow merge: fields present in the patch overwrite, absent ones are kept.
    pub fn apply(&mut self, patch: &UserPatch) {
        if let Some(v) = &patch.name { self.name = v.clone(); }
        if let Some(v) = &patch.email { self.email = v.clone(); }
        if patch.avatar.is_some() { self.avatar = patch.avatar.clone(); }
        if patch.phone.is_some() { self.phone = patch.phone.clone(); }
        if patch.address.is_some() { self.address = patch.address.clone(); }
        if patch.bio.is_some() { self.bio = patch.bio.clone(); }
        if patch.profile_picture_url.is_some() { self.profile_picture_url = patch.profile_picture_url.clone(); }
    }
}
