//! Authentication hook for the external credential provider.
//!
//! Parlor does not issue or validate credentials itself — that belongs to
//! an external provider (Supabase, custom JWT, whatever the deployment
//! uses). The coordinator only needs one operation from it: turn a bearer
//! token into a durable user id. The [`Authenticator`] trait is that seam;
//! the server calls it when a connection sends `register`.

use parlor_protocol::UserId;

use crate::PresenceError;

/// Validates a client's bearer token and returns the durable identity.
///
/// Implementations must be `Send + Sync + 'static` — the server shares one
/// authenticator across every connection task.
///
/// # Example
///
/// ```rust
/// use parlor_presence::{Authenticator, PresenceError};
/// use parlor_protocol::UserId;
///
/// /// Accepts any non-empty token and uses it verbatim as the user id.
/// /// This reproduces a trust-the-client setup; only for development.
/// struct DevAuthenticator;
///
/// impl Authenticator for DevAuthenticator {
///     async fn verify(&self, token: &str) -> Result<UserId, PresenceError> {
///         if token.is_empty() {
///             return Err(PresenceError::AuthFailed("empty token".into()));
///         }
///         Ok(UserId(token.to_string()))
///     }
/// }
/// ```
pub trait Authenticator: Send + Sync + 'static {
    /// Verifies the given token and returns the user it belongs to.
    ///
    /// # Errors
    /// [`PresenceError::AuthFailed`] when the token is invalid, expired,
    /// or rejected by the provider.
    fn verify(
        &self,
        token: &str,
    ) -> impl std::future::Future<Output = Result<UserId, PresenceError>> + Send;
}
