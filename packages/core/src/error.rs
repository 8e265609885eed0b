//! Error taxonomy for node operations.

use rmaker_api::FailureResponse;
use thiserror::Error;

use crate::identity::IdentityError;

/// Errors returned by [`NodeClient`](crate::NodeClient) operations.
///
/// A *soft failure* (the params endpoint answering `{"status":"failure"}`)
/// is not an error; it is reported as `Ok(None)`.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Construction or request-building input was unusable, e.g. a session
    /// with no token or an empty node id.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The transport reported a TLS or certificate failure.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Connection-level failure: DNS, refused, reset or timed out.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("server returned status {status}: {body}")]
    Http { status: u16, body: String },

    /// A 2xx response whose body is not valid JSON.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// The identity store could not supply a user id.
    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl NodeError {
    /// The service's `description` for an [`NodeError::Http`] error, when the
    /// body is a [`FailureResponse`].
    pub fn description(&self) -> Option<String> {
        match self {
            NodeError::Http { body, .. } => FailureResponse::parse(body)?.description,
            _ => None,
        }
    }
}

/// Result type for node operations.
pub type Result<T> = std::result::Result<T, NodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_description_from_failure_body() {
        let e = NodeError::Http {
            status: 404,
            body: r#"{"status":"failure","description":"Node not found","error_code":100010}"#
                .into(),
        };
        assert_eq!(e.description().as_deref(), Some("Node not found"));
    }

    #[test]
    fn http_description_absent_for_plain_body() {
        let e = NodeError::Http {
            status: 502,
            body: "Bad Gateway".into(),
        };
        assert!(e.description().is_none());
        assert_eq!(e.to_string(), "server returned status 502: Bad Gateway");
    }

    #[test]
    fn non_http_errors_have_no_description() {
        assert!(NodeError::Network("refused".into()).description().is_none());
    }
}
