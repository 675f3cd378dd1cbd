use sqlx::PgPool;

use crate::users::repo_types::User;

const USER_COLUMNS: &str = "id, name, email, password_hash, access_level, \
                            profile_photo_filename, created_at";

impl User {
    /// Find a user by email. More than one row can exist for an email (the
    /// uniqueness pre-check races with inserts); the first match wins.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 LIMIT 1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Insert a new user with an already-hashed password.
    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        access_level: i32,
        profile_photo_filename: Option<&str>,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (name, email, password_hash, access_level, profile_photo_filename) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(access_level)
        .bind(profile_photo_filename)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Remove every user record. Returns the number of rows deleted.
    pub async fn delete_all(db: &PgPool) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM users").execute(db).await?;
        Ok(result.rows_affected())
    }
}
