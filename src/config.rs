use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// HS256 signing secret, read from the key file once at startup.
    pub secret: String,
    pub expiry_secs: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub uploads_dir: PathBuf,
    pub hash_cost: u32,
    pub access_level_user: i32,
    pub access_level_admin: i32,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;

        let key_file = std::env::var("JWT_PRIVATE_KEY_FILENAME")
            .context("JWT_PRIVATE_KEY_FILENAME not set")?;
        let secret = std::fs::read_to_string(&key_file)
            .with_context(|| format!("read signing key from {key_file}"))?
            .trim_end()
            .to_string();

        let jwt = JwtConfig {
            secret,
            expiry_secs: std::env::var("JWT_EXPIRY")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(3600),
        };

        Ok(Self {
            database_url,
            uploads_dir: std::env::var("UPLOADED_FILES_FOLDER")
                .unwrap_or_else(|_| "./uploads".into())
                .into(),
            hash_cost: std::env::var("PASSWORD_HASH_SALT_ROUNDS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(3),
            access_level_user: std::env::var("ACCESS_LEVEL_NORMAL_USER")
                .ok()
                .and_then(|v| v.parse::<i32>().ok())
                .unwrap_or(1),
            access_level_admin: std::env::var("ACCESS_LEVEL_ADMIN")
                .ok()
                .and_then(|v| v.parse::<i32>().ok())
                .unwrap_or(2),
            jwt,
        })
    }
}
