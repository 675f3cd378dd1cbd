use serde::Serialize;

/// Body returned by successful register and login: the public profile, the
/// photo as base64 (or null when the account has none), and a fresh token.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub name: String,
    pub email: String,
    #[serde(rename = "accessLevel")]
    pub access_level: i32,
    #[serde(rename = "profilePhoto")]
    pub profile_photo: Option<String>,
    pub token: String,
}
