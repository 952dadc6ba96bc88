//! Fixed identities for the seed tool, tests and trusted internal callers.

use async_trait::async_trait;
use domains::{IdentityProvider, Principal, Result};

use crate::AuthError;

/// Always resolves to the same principal.
#[derive(Debug, Clone)]
pub struct StaticIdentity(Principal);

impl StaticIdentity {
    pub fn new(principal: Principal) -> Self {
        Self(principal)
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn resolve_acting_principal(&self) -> Result<Principal> {
        Ok(self.0.clone())
    }
}

/// A caller that presented no credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousIdentity;

#[async_trait]
impl IdentityProvider for AnonymousIdentity {
    async fn resolve_acting_principal(&self) -> Result<Principal> {
        Err(AuthError::MissingCredentials.into())
    }
}
