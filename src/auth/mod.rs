pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config;
use crate::database::models::{Account, Role};

pub use password::{hash_password, verify_password};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: i32,
    pub email: String,
    pub rm_number: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(id: i32, email: String, rm_number: String, role: Role) -> Self {
        let now = Utc::now();
        let expiry_minutes = config::config().security.jwt_expiry_minutes;
        let exp = (now + Duration::minutes(expiry_minutes)).timestamp();

        Self {
            id,
            email,
            rm_number,
            role,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn for_account(account: &Account) -> Self {
        Self::new(
            account.rm_account_id,
            account.email.clone(),
            account.rm_number.clone(),
            account.role(),
        )
    }

    /// Seconds until expiry, as reported to clients
    pub fn expires_in(&self) -> i64 {
        self.exp - self.iat
    }
}

#[derive(Debug)]
pub enum JwtError {
    TokenGeneration(String),
    InvalidToken(String),
    InvalidSecret,
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::TokenGeneration(msg) => write!(f, "JWT generation error: {}", msg),
            JwtError::InvalidToken(msg) => write!(f, "Invalid JWT token: {}", msg),
            JwtError::InvalidSecret => write!(f, "Invalid JWT secret"),
        }
    }
}

impl std::error::Error for JwtError {}

pub fn generate_jwt(claims: &Claims) -> Result<String, JwtError> {
    sign_with_secret(claims, &config::config().security.jwt_secret)
}

pub fn validate_jwt(token: &str) -> Result<Claims, JwtError> {
    verify_with_secret(token, &config::config().security.jwt_secret)
}

fn sign_with_secret(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

fn verify_with_secret(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| JwtError::InvalidToken(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "unit-test-secret";

    fn claims(role: Role) -> Claims {
        Claims::new(3, "RM003@batiinvestasi.ai".to_string(), "RM003".to_string(), role)
    }

    #[test]
    fn token_round_trip_preserves_claims() {
        let token = sign_with_secret(&claims(Role::Admin), SECRET).unwrap();
        let decoded = verify_with_secret(&token, SECRET).unwrap();
        assert_eq!(decoded.id, 3);
        assert_eq!(decoded.rm_number, "RM003");
        assert_eq!(decoded.role, Role::Admin);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let token = sign_with_secret(&claims(Role::User), "other-secret").unwrap();
        assert!(matches!(
            verify_with_secret(&token, SECRET),
            Err(JwtError::InvalidToken(_))
        ));
    }

    #[test]
    fn rejects_expired_token() {
        let mut expired = claims(Role::User);
        expired.iat -= 7200;
        expired.exp = expired.iat + 60;
        let token = sign_with_secret(&expired, SECRET).unwrap();
        assert!(verify_with_secret(&token, SECRET).is_err());
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(
            sign_with_secret(&claims(Role::User), ""),
            Err(JwtError::InvalidSecret)
        ));
        assert!(matches!(
            verify_with_secret("a.b.c", ""),
            Err(JwtError::InvalidSecret)
        ));
    }

    #[test]
    fn role_is_encoded_lowercase() {
        let value = serde_json::to_value(claims(Role::Admin)).unwrap();
        assert_eq!(value["role"], "admin");
    }
}
