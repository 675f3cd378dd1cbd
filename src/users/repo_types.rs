use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// User record in the database. The email is a natural key only by
/// convention: uniqueness is enforced by the registration pre-check, not by
/// a schema constraint, so concurrent registrations can race.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    // Argon2 hash. Serialized because the reset route returns the full
    // record, hash included, matching the system this replaces.
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(rename = "accessLevel")]
    pub access_level: i32,
    #[serde(rename = "profilePhotoFilename")]
    pub profile_photo_filename: Option<String>,
    #[serde(rename = "createdAt", with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
