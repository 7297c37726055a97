//! Authentication gateway contract.

use async_trait::async_trait;

use super::{error::AuthError, value_object::Identity};

/// Maps an opaque credential to a verified identity.
///
/// The session layer only depends on this trait; whether verification is a
/// local lookup, a signed token or a remote identity service is up to the
/// implementation.
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Resolve `credential` to an identity.
    ///
    /// `None` (or an empty string) must yield [`AuthError::MissingCredential`].
    async fn resolve(&self, credential: Option<&str>) -> Result<Identity, AuthError>;
}
