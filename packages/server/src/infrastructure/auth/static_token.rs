//! Token table gateway.
//!
//! Resolves bearer tokens against a fixed table loaded at startup. Suitable
//! for development, tests and single-tenant deployments that hand out
//! tokens out of band.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{AuthError, AuthGateway, Identity, Timestamp};

/// What a token grants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub identity: Identity,
    /// The token is rejected at or after this instant.
    pub expires_at: Option<Timestamp>,
}

impl TokenGrant {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            expires_at: None,
        }
    }

    pub fn expiring(identity: Identity, expires_at: Timestamp) -> Self {
        Self {
            identity,
            expires_at: Some(expires_at),
        }
    }

    fn is_expired(&self, now: Timestamp) -> bool {
        self.expires_at.is_some_and(|deadline| now >= deadline)
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticTokenGateway {
    grants: HashMap<String, TokenGrant>,
}

impl StaticTokenGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a token.
    pub fn with_grant(mut self, token: impl Into<String>, grant: TokenGrant) -> Self {
        self.grants.insert(token.into(), grant);
        self
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }
}

impl FromIterator<(String, Identity)> for StaticTokenGateway {
    fn from_iter<I: IntoIterator<Item = (String, Identity)>>(iter: I) -> Self {
        Self {
            grants: iter
                .into_iter()
                .map(|(token, identity)| (token, TokenGrant::new(identity)))
                .collect(),
        }
    }
}

#[async_trait]
impl AuthGateway for StaticTokenGateway {
    async fn resolve(&self, credential: Option<&str>) -> Result<Identity, AuthError> {
        let token = match credential {
            Some(token) if !token.is_empty() => token,
            _ => return Err(AuthError::MissingCredential),
        };

        let grant = self.grants.get(token).ok_or(AuthError::InvalidCredential)?;
        if grant.is_expired(Timestamp::now()) {
            tracing::debug!("token for '{}' has expired", grant.identity);
            return Err(AuthError::InvalidCredential);
        }
        Ok(grant.identity.clone())
    }
}
