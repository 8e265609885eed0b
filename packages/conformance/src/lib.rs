//! Shared helpers for the rmaker conformance test suite.
//!
//! Provides [`spawn_cloud`], a function that binds a `TcpListener` on an
//! ephemeral port and serves a mock of the cloud API from a background
//! thread. The mock records every request it receives and answers with
//! responses the test registered up front, so tests can drive the real
//! blocking HTTPS transport end to end and then inspect the wire traffic.
//!
//! [`spawn_tls_cloud`] covers the certificate path: it terminates TLS with a
//! self-signed certificate for `127.0.0.1` and answers every request with
//! one canned response.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use native_tls::{Identity, TlsAcceptor};

/// Path prefix the mock serves the API under, mirroring a versioned host.
pub const API_PREFIX: &str = "/v1/";

/// Path of the PEM certificate [`spawn_tls_cloud`] presents. Trust it through
/// `ClientConfig::cert_file` to make the handshake succeed.
pub const SELF_SIGNED_CERT_PATH: &str =
    concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/self_signed.pem");

const SELF_SIGNED_CERT: &[u8] = include_bytes!("../tests/fixtures/self_signed.pem");
const SELF_SIGNED_KEY: &[u8] = include_bytes!("../tests/fixtures/self_signed.key");

/// One request as the mock received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: String,
    /// Full path, e.g. `/v1/user/nodes/status`.
    pub path: String,
    /// Raw query string without the leading `?`.
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

#[derive(Debug, Clone)]
struct Canned {
    status: u16,
    body: String,
}

#[derive(Default)]
struct CloudState {
    routes: Mutex<HashMap<(String, String), Canned>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Handle to a running mock cloud.
#[derive(Clone)]
pub struct MockCloud {
    /// Host URL to hand to the client, e.g. `http://127.0.0.1:51234/v1/`.
    pub base_url: String,
    /// `host:port` the mock listens on.
    pub addr: String,
    state: Arc<CloudState>,
}

impl MockCloud {
    /// Answer `method` requests to `path` (relative to [`API_PREFIX`], e.g.
    /// `user/nodes/status`) with `status` and `body`, whatever the query.
    ///
    /// Registering the same route again replaces the previous answer.
    pub fn respond(&self, method: &str, path: &str, status: u16, body: impl Into<String>) {
        self.state.routes.lock().unwrap().insert(
            (method.to_string(), format!("{API_PREFIX}{path}")),
            Canned {
                status,
                body: body.into(),
            },
        );
    }

    /// Every request received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }
}

/// Start a mock cloud and return a handle to it.
///
/// The listener is bound before this function returns, so connections made
/// immediately afterwards queue until the server task picks them up. The
/// server runs on its own thread with a current-thread `tokio` runtime,
/// leaving the calling thread free for blocking clients.
///
/// Unregistered routes answer `404` with a failure body.
///
/// # Panics
///
/// Panics if the TCP listener cannot be bound.
pub fn spawn_cloud() -> MockCloud {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    listener
        .set_nonblocking(true)
        .expect("set listener non-blocking");
    let addr = listener.local_addr().expect("get local addr");

    let state = Arc::new(CloudState::default());
    let router = Router::new()
        .fallback(record_and_reply)
        .with_state(Arc::clone(&state));

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("build mock cloud runtime");
        runtime.block_on(async move {
            let listener =
                tokio::net::TcpListener::from_std(listener).expect("adopt std listener");
            axum::serve(listener, router)
                .await
                .expect("mock cloud error");
        });
    });

    MockCloud {
        base_url: format!("http://{addr}{API_PREFIX}"),
        addr: addr.to_string(),
        state,
    }
}

async fn record_and_reply(
    State(state): State<Arc<CloudState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let get_header = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    };
    let key = (method.to_string(), uri.path().to_string());

    state.requests.lock().unwrap().push(RecordedRequest {
        method: method.to_string(),
        path: uri.path().to_string(),
        query: uri.query().map(String::from),
        authorization: get_header(header::AUTHORIZATION),
        content_type: get_header(header::CONTENT_TYPE),
        body,
    });

    let canned = state.routes.lock().unwrap().get(&key).cloned();
    match canned {
        Some(Canned { status, body }) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "application/json")],
            r#"{"status":"failure","description":"no such route"}"#,
        )
            .into_response(),
    }
}

/// Start a TLS endpoint that presents the self-signed fixture certificate and
/// answers every request with `status` and a JSON `body`.
///
/// Returns the host URL to hand to the client, e.g.
/// `https://127.0.0.1:51234/v1/`. Connections are served one at a time on a
/// background thread; failed handshakes are dropped.
///
/// # Panics
///
/// Panics if the fixture identity cannot be loaded or the listener cannot be
/// bound.
pub fn spawn_tls_cloud(status: u16, body: &str) -> String {
    let identity =
        Identity::from_pkcs8(SELF_SIGNED_CERT, SELF_SIGNED_KEY).expect("load fixture identity");
    let acceptor = TlsAcceptor::new(identity).expect("build TLS acceptor");
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind ephemeral port");
    let addr = listener.local_addr().expect("get local addr");

    let reason = StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");
    let reply = format!(
        "HTTP/1.1 {status} {reason}\r\ncontent-type: application/json\r\n\
         content-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len()
    );

    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(stream) = stream else { continue };
            let Ok(mut tls) = acceptor.accept(stream) else {
                continue;
            };
            if read_request_head(&mut tls).is_ok() {
                let _ = tls.write_all(reply.as_bytes());
                let _ = tls.flush();
            }
            let _ = tls.shutdown();
        }
    });

    format!("https://{addr}{API_PREFIX}")
}

/// Consume a request up to the blank line ending its headers. The client
/// only sends bodies on `PUT`, which the TLS mock is not used for.
fn read_request_head(stream: &mut impl Read) -> std::io::Result<()> {
    let mut head = Vec::new();
    let mut chunk = [0u8; 1024];
    while !head.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        head.extend_from_slice(&chunk[..n]);
    }
    Ok(())
}
