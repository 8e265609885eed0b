//! Authenticated session capability.
//!
//! Logging in, refreshing and storing tokens happen outside this crate. A
//! [`NodeClient`](crate::NodeClient) only needs something that can hand it
//! the current identity token once, at construction.

/// A source of the identity token sent as the `Authorization` header.
pub trait Session {
    /// The current identity token, or `None` if the session holds none.
    fn id_token(&self) -> Option<String>;
}

/// A session backed by a token obtained elsewhere (environment, flag, file).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSession {
    token: Option<String>,
}

impl TokenSession {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// A session that is not logged in.
    pub fn anonymous() -> Self {
        Self { token: None }
    }
}

impl Session for TokenSession {
    fn id_token(&self) -> Option<String> {
        self.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_session_yields_token() {
        assert_eq!(TokenSession::new("tok").id_token().as_deref(), Some("tok"));
    }

    #[test]
    fn anonymous_session_yields_none() {
        assert!(TokenSession::anonymous().id_token().is_none());
    }
}
