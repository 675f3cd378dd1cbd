use std::sync::Arc;

use axum::extract::Multipart;
use base64ct::{Base64, Encoding};
use sqlx::PgPool;
use tracing::warn;

use crate::auth::password::{hash_password, verify_password};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::storage::UploadStore;
use crate::users::repo_types::User;

// Identical wording for unknown email and wrong password, so a caller cannot
// probe which accounts exist.
pub const LOGIN_FAILED: &str =
    "The login or password is incorrect. Or the account was not registered";

pub const SEED_ADMIN_NAME: &str = "Administrator";
pub const SEED_ADMIN_EMAIL: &str = "admin@admin.com";
pub const SEED_ADMIN_PASSWORD: &str = "123!\"\u{a3}qweQWE";

const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/png", "image/jpg", "image/jpeg"];

/// A file already written to the upload store, type not yet checked.
#[derive(Debug)]
pub struct StoredUpload {
    pub filename: String,
    pub content_type: String,
}

/// An upload that passed the image-type check.
#[derive(Debug)]
pub struct ProfilePhoto {
    pub filename: String,
}

pub fn is_supported_image(content_type: &str) -> bool {
    ALLOWED_IMAGE_TYPES.contains(&content_type)
}

/// Registration step 1: drain the multipart body looking for the single
/// `profilePhoto` field and persist it under a generated name. The bytes hit
/// the store before any validation runs, as in the system this replaces.
pub async fn accept_upload(
    store: &dyn UploadStore,
    mut multipart: Multipart,
) -> Result<Option<StoredUpload>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.to_string()))?
    {
        if field.name() != Some("profilePhoto") {
            continue;
        }
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let body = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        let filename = store.save(body).await?;
        return Ok(Some(StoredUpload {
            filename,
            content_type,
        }));
    }
    Ok(None)
}

/// Registration step 2: the upload is mandatory.
pub fn require_upload(upload: Option<StoredUpload>) -> Result<StoredUpload, ApiError> {
    upload.ok_or_else(|| ApiError::Validation("No file was selected to be uploaded".into()))
}

/// Registration step 3: only png/jpg/jpeg pass. A rejected file is deleted
/// before the validation error is raised; if that deletion fails, the
/// deletion error is the one reported.
pub async fn validate_image_type(
    store: &dyn UploadStore,
    upload: StoredUpload,
) -> Result<ProfilePhoto, ApiError> {
    if is_supported_image(&upload.content_type) {
        return Ok(ProfilePhoto {
            filename: upload.filename,
        });
    }
    store.delete(&upload.filename).await?;
    Err(ApiError::Validation(
        "Invalid file type, only JPEG, JPG, and PNG are allowed!".into(),
    ))
}

/// Registration step 4: best-effort uniqueness pre-check. Returns the
/// source system's 401 for a duplicate account, not 409.
pub async fn ensure_email_unused(db: &PgPool, email: &str) -> Result<(), ApiError> {
    if User::find_by_email(db, email).await?.is_some() {
        return Err(ApiError::Auth("Account already exists".into()));
    }
    Ok(())
}

/// Registration step 5: hash, then insert with the default access level.
pub async fn create_account(
    db: &PgPool,
    config: &AppConfig,
    name: &str,
    email: &str,
    password: &str,
    photo: &ProfilePhoto,
) -> Result<User, ApiError> {
    let hash = hash_password(password, config.hash_cost)?;
    User::create(
        db,
        name,
        email,
        &hash,
        config.access_level_user,
        Some(&photo.filename),
    )
    .await?
    .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("user insert returned no row")))
}

/// Login step 2: a missing account and a wrong password are
/// indistinguishable to the caller.
pub fn verify_login(user: Option<User>, password: &str) -> Result<User, ApiError> {
    let user = user.ok_or_else(|| ApiError::Auth(LOGIN_FAILED.into()))?;
    if !verify_password(password, &user.password_hash)? {
        return Err(ApiError::Auth(LOGIN_FAILED.into()));
    }
    Ok(user)
}

/// Read a stored photo back as base64 text for the profile response.
pub async fn encode_photo(store: &dyn UploadStore, filename: &str) -> Result<String, ApiError> {
    let bytes = store.read(filename).await?;
    Ok(Base64::encode_string(&bytes))
}

/// Reset step 2: seed the fixed administrator account.
pub async fn seed_admin(db: &PgPool, config: &AppConfig) -> Result<User, ApiError> {
    let hash = hash_password(SEED_ADMIN_PASSWORD, config.hash_cost)?;
    User::create(
        db,
        SEED_ADMIN_NAME,
        SEED_ADMIN_EMAIL,
        &hash,
        config.access_level_admin,
        None,
    )
    .await?
    .ok_or_else(|| ApiError::Conflict("Failed to create Admin user for testing purposes".into()))
}

/// Reset step 3: empty the upload directory without holding up the
/// response. Best-effort; failures are logged and ignored.
pub fn clear_uploads_best_effort(store: Arc<dyn UploadStore>) {
    tokio::spawn(async move {
        if let Err(e) = store.clear().await {
            warn!(error = %e, "upload directory cleanup failed");
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemStore;
    use axum::http::StatusCode;
    use bytes::Bytes;
    use time::OffsetDateTime;
    use uuid::Uuid;

    async fn stored(store: &MemStore, content_type: &str) -> StoredUpload {
        let filename = store.save(Bytes::from_static(b"\xffjunk")).await.unwrap();
        StoredUpload {
            filename,
            content_type: content_type.into(),
        }
    }

    fn make_user(password_hash: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password_hash: password_hash.into(),
            access_level: 1,
            profile_photo_filename: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn supported_image_types_are_exact() {
        assert!(is_supported_image("image/png"));
        assert!(is_supported_image("image/jpg"));
        assert!(is_supported_image("image/jpeg"));
        assert!(!is_supported_image("image/webp"));
        assert!(!is_supported_image("image/PNG"));
        assert!(!is_supported_image("application/octet-stream"));
    }

    #[test]
    fn missing_upload_is_a_validation_error() {
        let err = require_upload(None).unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "No file was selected to be uploaded");
    }

    #[tokio::test]
    async fn accepted_image_keeps_its_file() {
        let store = MemStore::default();
        let upload = stored(&store, "image/png").await;
        let filename = upload.filename.clone();

        let photo = validate_image_type(&store, upload).await.expect("valid");
        assert_eq!(photo.filename, filename);
        assert!(store.contains(&filename));
    }

    #[tokio::test]
    async fn rejected_upload_is_deleted_before_failing() {
        let store = MemStore::default();
        let upload = stored(&store, "text/plain").await;
        let filename = upload.filename.clone();

        let err = validate_image_type(&store, upload).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "Invalid file type, only JPEG, JPG, and PNG are allowed!"
        );
        assert!(!store.contains(&filename));
    }

    #[tokio::test]
    async fn failed_deletion_outranks_the_validation_error() {
        let store = MemStore::default();
        let upload = StoredUpload {
            filename: "never-stored".into(),
            content_type: "text/plain".into(),
        };
        let err = validate_image_type(&store, upload).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unknown_email_and_wrong_password_read_identically() {
        let hash = crate::auth::password::hash_password("right", 2).expect("hash");

        let missing = verify_login(None, "whatever").unwrap_err();
        let wrong = verify_login(Some(make_user(&hash)), "wrong").unwrap_err();

        assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(missing.to_string(), wrong.to_string());
    }

    #[test]
    fn correct_password_logs_in() {
        let hash = crate::auth::password::hash_password("right", 2).expect("hash");
        let user = verify_login(Some(make_user(&hash)), "right").expect("login");
        assert_eq!(user.email, "alice@example.com");
    }

    #[tokio::test]
    async fn encode_photo_is_base64_of_stored_bytes() {
        let store = MemStore::default();
        let filename = store.save(Bytes::from_static(b"hello")).await.unwrap();
        let encoded = encode_photo(&store, &filename).await.expect("encode");
        assert_eq!(encoded, "aGVsbG8=");
    }

    #[tokio::test]
    async fn clearing_uploads_does_not_block_and_empties_store() {
        let store = MemStore::default();
        store.save(Bytes::from_static(b"a")).await.unwrap();
        store.save(Bytes::from_static(b"b")).await.unwrap();

        clear_uploads_best_effort(Arc::new(store.clone()));

        // give the spawned task a moment
        for _ in 0..50 {
            if store.len() == 0 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert_eq!(store.len(), 0);
    }
}
