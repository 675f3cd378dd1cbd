use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::state::AppState;

/// Claim set carried by every issued token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    #[serde(rename = "accessLevel")]
    pub access_level: i32,
    pub iat: usize,
    pub exp: usize,
}

/// Signing material derived once from config; the secret was read from the
/// key file at boot and is immutable for the life of the process.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub expiry: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let jwt = &state.config.jwt;
        Self {
            encoding: EncodingKey::from_secret(jwt.secret.as_bytes()),
            decoding: DecodingKey::from_secret(jwt.secret.as_bytes()),
            expiry: Duration::from_secs(jwt.expiry_secs.max(0) as u64),
        }
    }
}

impl JwtKeys {
    /// HS256-sign an `{email, accessLevel}` claim set with the configured expiry.
    pub fn sign(&self, email: &str, access_level: i32) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(self.expiry.as_secs() as i64);
        let claims = Claims {
            email: email.to_string(),
            access_level,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(%email, access_level, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::default())?;
        debug!(email = %data.claims.email, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        JwtKeys::from_ref(&AppState::fake())
    }

    #[tokio::test]
    async fn sign_and_verify_carries_email_and_access_level() {
        let keys = make_keys();
        let token = keys.sign("alice@example.com", 1).expect("sign");
        let claims = keys.verify(&token).expect("verify");
        assert_eq!(claims.email, "alice@example.com");
        assert_eq!(claims.access_level, 1);
        assert!(claims.exp > claims.iat);
    }

    #[tokio::test]
    async fn verify_rejects_other_secret() {
        let keys = make_keys();
        let token = keys.sign("alice@example.com", 1).expect("sign");

        let other = JwtKeys {
            encoding: EncodingKey::from_secret(b"different"),
            decoding: DecodingKey::from_secret(b"different"),
            expiry: Duration::from_secs(300),
        };
        assert!(other.verify(&token).is_err());
    }

    #[tokio::test]
    async fn verify_rejects_garbage() {
        assert!(make_keys().verify("not.a.jwt").is_err());
    }

    #[test]
    fn claims_serialize_access_level_camel_case() {
        let claims = Claims {
            email: "a@b.c".into(),
            access_level: 2,
            iat: 0,
            exp: 1,
        };
        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("\"accessLevel\":2"));
    }
}
