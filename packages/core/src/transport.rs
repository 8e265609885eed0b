//! Transport layer: one synchronous HTTPS round trip per call.
//!
//! [`Transport`] is the seam between request building and the network.
//! [`HttpTransport`] is the production implementation over a blocking
//! [`reqwest`] client; tests substitute in-memory fakes.
//!
//! Transport failures are classified here, once, into [`NodeError::Tls`],
//! [`NodeError::Network`] or [`NodeError::InvalidInput`]. Status codes are
//! *not* interpreted; a 500 is a successful round trip at this layer.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{NodeError, Result};
use crate::session::Session;

// ---------------------------------------------------------------------------
// Request / Response
// ---------------------------------------------------------------------------

/// HTTP methods used by the node API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Put => write!(f, "PUT"),
        }
    }
}

/// Headers sent on every request: JSON content type plus the session token.
///
/// Computed once when a client is built. `Debug` output redacts the token.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestHeader {
    authorization: String,
}

impl RequestHeader {
    pub const CONTENT_TYPE: &'static str = "application/json";

    /// Build the header from `session`'s identity token.
    ///
    /// Fails with [`NodeError::InvalidInput`] if the session has no token.
    pub fn from_session(session: &dyn Session) -> Result<Self> {
        match session.id_token() {
            Some(token) if !token.is_empty() => Ok(Self {
                authorization: token,
            }),
            _ => Err(NodeError::InvalidInput(
                "session does not provide an identity token".into(),
            )),
        }
    }

    /// `(name, value)` pairs in the order they are sent.
    pub fn pairs(&self) -> [(&'static str, &str); 2] {
        [
            ("content-type", Self::CONTENT_TYPE),
            ("Authorization", &self.authorization),
        ]
    }
}

impl fmt::Debug for RequestHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHeader")
            .field("content_type", &Self::CONTENT_TYPE)
            .field("authorization", &"<redacted>")
            .finish()
    }
}

/// A fully built request, ready to send.
#[derive(Debug, Clone)]
pub struct Request<'a> {
    pub method: Method,
    pub url: String,
    pub header: &'a RequestHeader,
    /// JSON-encoded body, if any.
    pub body: Option<String>,
}

/// Status code and raw body of a completed round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: String,
}

impl Response {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Sends one request and returns the response, without retries.
pub trait Transport {
    fn send(&self, request: &Request<'_>) -> Result<Response>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &Request<'_>) -> Result<Response> {
        (**self).send(request)
    }
}

/// Blocking HTTPS transport.
///
/// Wraps a [`reqwest::blocking::Client`], which pools connections and is
/// safe to share across threads.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build the client: timeout from `config`, plus every certificate in
    /// `config.cert_file` as an extra trust root.
    ///
    /// No network I/O happens here. An unreadable or invalid bundle is a
    /// [`NodeError::Tls`].
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder().timeout(Duration::from_secs(config.timeout_secs));

        if let Some(path) = &config.cert_file {
            let pem = std::fs::read(path).map_err(|e| {
                NodeError::Tls(format!(
                    "failed to read certificate bundle {}: {e}",
                    path.display()
                ))
            })?;
            let certs = reqwest::Certificate::from_pem_bundle(&pem).map_err(|e| {
                NodeError::Tls(format!(
                    "invalid certificate bundle {}: {e}",
                    path.display()
                ))
            })?;
            if certs.is_empty() {
                return Err(NodeError::Tls(format!(
                    "certificate bundle {} contains no certificates",
                    path.display()
                )));
            }
            debug!(
                "transport: trusting {} certificate(s) from {}",
                certs.len(),
                path.display()
            );
            for cert in certs {
                builder = builder.add_root_certificate(cert);
            }
        }

        let client = builder.build().map_err(classify)?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request<'_>) -> Result<Response> {
        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Put => self.client.put(&request.url),
        };
        for (name, value) in request.header.pairs() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(classify)?;
        Ok(Response { status, body })
    }
}

// ---------------------------------------------------------------------------
// Error classification
// ---------------------------------------------------------------------------

/// Substrings that identify a TLS failure somewhere in an error's cause chain.
const TLS_MARKERS: &[&str] = &["certificate", "tls", "ssl", "handshake"];

/// Map a `reqwest` failure onto the client's error taxonomy.
///
/// TLS is checked first: a failed handshake is also reported by `reqwest`
/// as a connect error, and must not be downgraded to a network error.
fn classify(err: reqwest::Error) -> NodeError {
    let detail = describe(&err);
    if is_tls_failure(&err) {
        NodeError::Tls(detail)
    } else if err.is_builder() {
        NodeError::InvalidInput(detail)
    } else {
        NodeError::Network(detail)
    }
}

/// `true` if any *cause* of `err` mentions a TLS marker.
///
/// The outermost message is skipped: it embeds the request URL, and a host
/// name is not evidence of a TLS failure.
pub(crate) fn is_tls_failure(err: &(dyn StdError + 'static)) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        let message = cause.to_string().to_ascii_lowercase();
        if TLS_MARKERS.iter().any(|m| message.contains(m)) {
            return true;
        }
        source = cause.source();
    }
    false
}

/// The error and its causes joined with `": "`.
fn describe(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TokenSession;

    #[derive(Debug)]
    struct Chain {
        message: &'static str,
        source: Option<Box<Chain>>,
    }

    impl Chain {
        fn new(messages: &[&'static str]) -> Self {
            let (first, rest) = messages.split_first().unwrap();
            Chain {
                message: *first,
                source: (!rest.is_empty()).then(|| Box::new(Chain::new(rest))),
            }
        }
    }

    impl fmt::Display for Chain {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.message)
        }
    }

    impl StdError for Chain {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            self.source.as_deref().map(|c| c as &(dyn StdError + 'static))
        }
    }

    #[test]
    fn certificate_failure_is_tls() {
        let err = Chain::new(&[
            "error sending request for url (https://api.example.com/v1/user/nodes/status)",
            "client error (Connect)",
            "error:0A000086:SSL routines:tls_post_process_server_certificate:certificate verify failed",
        ]);
        assert!(is_tls_failure(&err));
    }

    #[test]
    fn refused_connection_is_not_tls() {
        let err = Chain::new(&[
            "error sending request for url (https://api.example.com/v1/user/nodes/status)",
            "client error (Connect)",
            "tcp connect error",
            "Connection refused (os error 111)",
        ]);
        assert!(!is_tls_failure(&err));
    }

    #[test]
    fn host_name_in_outer_message_is_ignored() {
        let err = Chain::new(&[
            "error sending request for url (https://tls.example.com/)",
            "dns error: failed to lookup address information",
        ]);
        assert!(!is_tls_failure(&err));
    }

    #[test]
    fn describe_joins_the_cause_chain() {
        let err = Chain::new(&["outer", "middle", "inner"]);
        assert_eq!(describe(&err), "outer: middle: inner");
    }

    #[test]
    fn header_requires_a_token() {
        assert!(matches!(
            RequestHeader::from_session(&TokenSession::anonymous()),
            Err(NodeError::InvalidInput(_))
        ));
        assert!(matches!(
            RequestHeader::from_session(&TokenSession::new("")),
            Err(NodeError::InvalidInput(_))
        ));
    }

    #[test]
    fn header_pairs_and_redacted_debug() {
        let header = RequestHeader::from_session(&TokenSession::new("secret-token")).unwrap();
        assert_eq!(
            header.pairs(),
            [
                ("content-type", "application/json"),
                ("Authorization", "secret-token")
            ]
        );
        assert!(!format!("{header:?}").contains("secret-token"));
    }

    #[test]
    fn response_success_range() {
        assert!(Response::new(200, "").is_success());
        assert!(Response::new(204, "").is_success());
        assert!(!Response::new(199, "").is_success());
        assert!(!Response::new(300, "").is_success());
        assert!(!Response::new(404, "").is_success());
    }

    #[test]
    fn missing_certificate_bundle_is_tls_error() {
        let mut config = ClientConfig::new("https://api.example.com/v1/");
        config.cert_file = Some("/nonexistent/rmaker/server_cert.pem".into());
        assert!(matches!(HttpTransport::new(&config), Err(NodeError::Tls(_))));
    }
}
