use crate::{errors::ServiceError, AppState};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims carried by bearer tokens. User and session management is an
/// external collaborator; this service only verifies tokens and extracts the
/// user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    /// Expiry (seconds since epoch)
    pub exp: i64,
    /// Issued at (seconds since epoch)
    pub iat: i64,
}

#[derive(Clone)]
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
}

impl AuthService {
    pub fn new(jwt_secret: &str, token_ttl_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            token_ttl: Duration::seconds(token_ttl_secs as i64),
        }
    }

    /// Issues a token for the given user id. Used by tests and local tooling.
    pub fn issue_token(&self, user_id: Uuid) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (now + self.token_ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::InternalError(format!("failed to sign token: {}", e)))
    }

    /// Verifies a bearer token and returns the authenticated user id.
    pub fn verify_token(&self, token: &str) -> Result<Uuid, ServiceError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| ServiceError::Unauthorized(format!("invalid token: {}", e)))?;

        Uuid::parse_str(&data.claims.sub)
            .map_err(|_| ServiceError::Unauthorized("invalid subject claim".to_string()))
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

/// Extractor for endpoints that require an authenticated user.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ServiceError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| ServiceError::Unauthorized("missing bearer token".to_string()))?;

        state.auth.verify_token(token).map(AuthenticatedUser)
    }
}

/// Extractor for endpoints that behave differently for signed-in users but
/// never reject anonymous ones (e.g. the wishlist flag on product detail).
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthenticatedUser(pub Option<Uuid>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthenticatedUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = bearer_token(parts).and_then(|token| state.auth.verify_token(token).ok());
        Ok(MaybeAuthenticatedUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let auth = AuthService::new("test_secret_key_for_unit_tests_only_32ch", 3600);
        let user_id = Uuid::new_v4();
        let token = auth.issue_token(user_id).expect("token should be issued");
        assert_eq!(auth.verify_token(&token).expect("token should verify"), user_id);
    }

    #[test]
    fn garbage_token_rejected() {
        let auth = AuthService::new("test_secret_key_for_unit_tests_only_32ch", 3600);
        assert!(matches!(
            auth.verify_token("not-a-jwt"),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[test]
    fn token_signed_with_other_secret_rejected() {
        let auth = AuthService::new("test_secret_key_for_unit_tests_only_32ch", 3600);
        let other = AuthService::new("another_secret_key_for_unit_tests_32char", 3600);
        let token = other.issue_token(Uuid::new_v4()).unwrap();
        assert!(auth.verify_token(&token).is_err());
    }
}
