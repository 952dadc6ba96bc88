//! # Bearer token identity
//!
//! HS256 tokens minted by the school's sign-in service. The verifier is
//! built once at startup; a `BearerIdentity` is built per request.

use std::sync::Arc;

use async_trait::async_trait;
use domains::{IdentityProvider, Principal, Result, Role};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::AuthError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Principal id.
    pub sub: String,
    #[serde(default)]
    pub name: String,
    pub role: String,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &SecretString, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }
        Self {
            key: DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> std::result::Result<Principal, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        let claims = data.claims;
        let role: Role = claims
            .role
            .parse()
            .map_err(|_| AuthError::UnknownRole(claims.role.clone()))?;
        Ok(Principal::new(claims.sub, claims.name, role))
    }

    /// Identity provider for one request's `Authorization` header value.
    pub fn for_request(self: &Arc<Self>, authorization: Option<&str>) -> BearerIdentity {
        let token = authorization.map(|h| h.strip_prefix("Bearer ").unwrap_or(h).trim().to_string());
        BearerIdentity {
            verifier: Arc::clone(self),
            token,
        }
    }
}

pub struct BearerIdentity {
    verifier: Arc<JwtVerifier>,
    token: Option<String>,
}

#[async_trait]
impl IdentityProvider for BearerIdentity {
    async fn resolve_acting_principal(&self) -> Result<Principal> {
        let token = self
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingCredentials)?;
        match self.verifier.verify(token) {
            Ok(principal) => Ok(principal),
            Err(err) => {
                tracing::warn!(error = %err, "bearer token rejected");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use domains::DomainError;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-with-enough-length-1234";

    fn token(role: &str, exp_offset: Duration) -> String {
        let claims = Claims {
            sub: "t-1".into(),
            name: "Meena".into(),
            role: role.into(),
            exp: (Utc::now() + exp_offset).timestamp() as u64,
            iss: None,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn verifier() -> Arc<JwtVerifier> {
        Arc::new(JwtVerifier::new(&SecretString::from(SECRET.to_string()), None))
    }

    #[tokio::test]
    async fn valid_token_resolves() {
        let header = format!("Bearer {}", token("teacher", Duration::hours(1)));
        let principal = verifier()
            .for_request(Some(&header))
            .resolve_acting_principal()
            .await
            .unwrap();
        assert_eq!(principal.id, "t-1");
        assert_eq!(principal.role, Role::Teacher);
    }

    #[tokio::test]
    async fn expired_token_is_unauthorized() {
        let header = format!("Bearer {}", token("admin", Duration::hours(-2)));
        let err = verifier()
            .for_request(Some(&header))
            .resolve_acting_principal()
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let err = verifier()
            .for_request(None)
            .resolve_acting_principal()
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Unauthorized(_)));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let err = verifier().verify(&token("janitor", Duration::hours(1))).unwrap_err();
        assert_eq!(err, AuthError::UnknownRole("janitor".into()));
    }
}
