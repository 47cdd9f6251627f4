//! Credential hashing, token issue and the `AuthenticatedUser` extractor.
//!
//! Passwords are stored as Argon2id PHC strings (`$argon2id$v=19$...`).
//! Clients authenticate with an `Authorization: Token <key>` header, the
//! key being the one handed out by register or login.
use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use argon2::{
    password_hash::{self, rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use futures::future::LocalBoxFuture;
use sha2::{Digest, Sha256};
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::{db::Database, error::ApiError, models::user::User};

const TOKEN_KEYWORD: &str = "Token";

pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash has an unknown format: {e}");
            false
        }
    }
}

/// Fresh opaque API token, 40 hex characters.
pub fn generate_token() -> String {
    let seed = Uuid::new_v4();
    let mut hasher = Sha256::new();
    hasher.update(seed.as_bytes());
    hex::encode(hasher.finalize())[..40].to_string()
}

/// Pulls the key out of an `Authorization` header value. `Ok(None)` means
/// no token credentials were sent at all.
pub fn parse_token_header(value: Option<&str>) -> Result<Option<String>, ApiError> {
    let Some(value) = value else {
        return Ok(None);
    };

    let mut parts = value.split_whitespace();
    match parts.next() {
        Some(keyword) if keyword.eq_ignore_ascii_case(TOKEN_KEYWORD) => {}
        _ => return Ok(None),
    }

    match (parts.next(), parts.next()) {
        (Some(key), None) => Ok(Some(key.to_string())),
        _ => Err(ApiError::InvalidToken),
    }
}

/// The caller behind a valid token. Handlers taking this argument reject
/// anonymous requests with 401.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl FromRequest for AuthenticatedUser {
    type Error = ApiError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .map(|h| h.to_str().map(str::to_string));
        let db = req.app_data::<web::Data<Database>>().cloned();

        Box::pin(async move {
            let header = match header {
                Some(Ok(value)) => Some(value),
                Some(Err(_)) => return Err(ApiError::InvalidToken),
                None => None,
            };
            let key = parse_token_header(header.as_deref())?.ok_or(ApiError::NotAuthenticated)?;

            let Some(db) = db else {
                error!("[AUTH] Database missing from app data");
                return Err(ApiError::Internal("database handle not configured"));
            };

            match db.get_user_by_token(&key).await? {
                Some(user) => {
                    debug!("[AUTH] Authenticated user {}", user.id);
                    Ok(AuthenticatedUser(user))
                }
                None => Err(ApiError::InvalidToken),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip_and_salting() {
        let first = hash_password("password123").unwrap();
        let second = hash_password("password123").unwrap();
        assert_ne!(first, second);
        assert!(first.starts_with("$argon2id$"));

        assert!(verify_password("password123", &first));
        assert!(verify_password("password123", &second));
        assert!(!verify_password("password124", &first));
        assert!(!verify_password("password123", "plaintext"));
        assert!(!verify_password("password123", "sha256$salt$digest"));
    }

    #[test]
    fn test_generate_token_shape() {
        let token = generate_token();
        assert_eq!(token.len(), 40);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[test]
    fn test_parse_token_header() {
        assert_eq!(parse_token_header(None).unwrap(), None);
        assert_eq!(
            parse_token_header(Some("Token abc123")).unwrap(),
            Some("abc123".to_string())
        );
        assert_eq!(
            parse_token_header(Some("token abc123")).unwrap(),
            Some("abc123".to_string())
        );
        assert_eq!(parse_token_header(Some("Bearer abc123")).unwrap(), None);
        assert!(matches!(
            parse_token_header(Some("Token")),
            Err(ApiError::InvalidToken)
        ));
        assert!(matches!(
            parse_token_header(Some("Token a b")),
            Err(ApiError::InvalidToken)
        ));
    }
}
