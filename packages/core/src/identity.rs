//! Identity store: where the current user id comes from.
//!
//! Mapping requests carry the acting user's id. The client asks the store on
//! every mapping call rather than caching it, so a store backed by a config
//! file picks up a re-login without rebuilding the client.

use thiserror::Error;

/// Errors an identity store can report.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("no user id is configured; log in first")]
    NotConfigured,
}

/// Supplies the current user id.
///
/// Implementations must be `Send + Sync`: a single store is shared by every
/// client that needs it.
pub trait IdentityStore: Send + Sync {
    fn user_id(&self) -> Result<String, IdentityError>;
}

/// An identity store holding a fixed user id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticIdentity {
    user_id: Option<String>,
}

impl StaticIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    /// A store with no user id; every lookup fails with
    /// [`IdentityError::NotConfigured`].
    pub fn unset() -> Self {
        Self { user_id: None }
    }
}

impl IdentityStore for StaticIdentity {
    fn user_id(&self) -> Result<String, IdentityError> {
        match &self.user_id {
            Some(id) if !id.is_empty() => Ok(id.clone()),
            _ => Err(IdentityError::NotConfigured),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_identity_returns_user_id() {
        assert_eq!(StaticIdentity::new("u-1").user_id(), Ok("u-1".to_string()));
    }

    #[test]
    fn unset_or_empty_identity_is_not_configured() {
        assert_eq!(StaticIdentity::unset().user_id(), Err(IdentityError::NotConfigured));
        assert_eq!(StaticIdentity::new("").user_id(), Err(IdentityError::NotConfigured));
    }
}
