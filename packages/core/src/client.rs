//! [`NodeClient`]: operations on one cloud-managed node.
//!
//! Every public method is a single round trip: build the request, send it
//! through the [`Transport`], reject non-2xx statuses as
//! [`NodeError::Http`], decode the JSON body, then apply the operation's own
//! shape check. Nothing is retried and nothing is cached between calls.
//!
//! # Mapping workflow
//!
//! Associating a user with a node is asynchronous. The caller submits a
//! request with [`NodeClient::add_user_node_mapping`] (or
//! [`NodeClient::remove_user_node_mapping`]), keeps the returned request id,
//! and polls [`NodeClient::get_mapping_status`] on its own schedule until it
//! sees a terminal status:
//!
//! ```text
//! NONE ──add/remove──▶ PENDING(request_id) ──poll…──▶ TERMINAL(status)
//! ```
//!
//! The client holds no state between those calls.

use std::sync::Arc;

use rmaker_api::{
    is_soft_failure, MappingOperation, MappingRequest, MappingResponse, MappingStatusResponse,
};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::endpoints::Endpoints;
use crate::error::{NodeError, Result};
use crate::identity::IdentityStore;
use crate::session::Session;
use crate::transport::{HttpTransport, Method, Request, RequestHeader, Transport};

/// A remote node, bound to one node id and one authenticated session.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use rmaker::{ClientConfig, NodeClient, StaticIdentity, TokenSession};
///
/// # fn example() -> rmaker::Result<()> {
/// let session = TokenSession::new("eyJraWQiOi…");
/// let identity = Arc::new(StaticIdentity::new("5b2f5c3e-user"));
/// let node = NodeClient::connect("abcd1234", &session, &ClientConfig::from_env(), identity)?;
///
/// let status = node.get_node_status()?;
/// if let Some(request_id) = node.add_user_node_mapping("abc123")? {
///     let state = node.get_mapping_status(&request_id)?;
///     println!("{status} {state:?}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct NodeClient<T = HttpTransport> {
    node_id: String,
    header: RequestHeader,
    endpoints: Endpoints,
    transport: T,
    identity: Arc<dyn IdentityStore>,
}

impl NodeClient<HttpTransport> {
    /// Bind to `node_id` over the blocking HTTPS transport described by `config`.
    ///
    /// Performs no network I/O. Fails with [`NodeError::InvalidInput`] if the
    /// node id is empty or `session` has no token, and with [`NodeError::Tls`]
    /// if the configured certificate bundle cannot be loaded.
    pub fn connect(
        node_id: impl Into<String>,
        session: &dyn Session,
        config: &ClientConfig,
        identity: Arc<dyn IdentityStore>,
    ) -> Result<Self> {
        let (node_id, header) = prepare(node_id.into(), session)?;
        let transport = HttpTransport::new(config)?;
        Ok(Self::assemble(
            node_id,
            header,
            Endpoints::new(config.host.as_str()),
            transport,
            identity,
        ))
    }
}

impl<T: Transport> NodeClient<T> {
    /// Bind to `node_id` over a caller-supplied transport.
    pub fn with_transport(
        node_id: impl Into<String>,
        session: &dyn Session,
        endpoints: Endpoints,
        transport: T,
        identity: Arc<dyn IdentityStore>,
    ) -> Result<Self> {
        let (node_id, header) = prepare(node_id.into(), session)?;
        Ok(Self::assemble(node_id, header, endpoints, transport, identity))
    }

    fn assemble(
        node_id: String,
        header: RequestHeader,
        endpoints: Endpoints,
        transport: T,
        identity: Arc<dyn IdentityStore>,
    ) -> Self {
        info!("node: initialising node with nodeid {node_id}");
        Self {
            node_id,
            header,
            endpoints,
            transport,
            identity,
        }
    }

    /// The id this client is bound to.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    // ── Status, config, params ────────────────────────────────────────────────

    /// Online/offline status of the node, as returned by the service.
    pub fn get_node_status(&self) -> Result<Value> {
        info!("node: getting online/offline status of node {}", self.node_id);
        let status = self.get_json(self.endpoints.status_url(&self.node_id))?;
        info!("node: received node status");
        Ok(status)
    }

    /// The node's configuration document.
    pub fn get_node_config(&self) -> Result<Value> {
        info!("node: getting config of node {}", self.node_id);
        let config = self.get_json(self.endpoints.config_url(&self.node_id))?;
        info!("node: received node config");
        Ok(config)
    }

    /// The node's current parameters.
    ///
    /// Returns `Ok(None)` when the service answers `{"status":"failure"}`:
    /// the call succeeded but the node has no parameters to report.
    pub fn get_node_params(&self) -> Result<Option<Value>> {
        info!("node: getting params of node {}", self.node_id);
        let params = self.get_json(self.endpoints.params_url(&self.node_id))?;
        if is_soft_failure(&params) {
            info!("node: service reported no params for node {}", self.node_id);
            return Ok(None);
        }
        info!("node: received node params");
        Ok(Some(params))
    }

    /// Update the node's parameters with `data`.
    ///
    /// Any 2xx response counts as success; its body is only logged.
    pub fn set_node_params(&self, data: &Value) -> Result<bool> {
        info!("node: updating params of node {}", self.node_id);
        let payload = serde_json::to_string(data)?;
        debug!("node: set params payload {payload}");
        self.call(Method::Put, self.endpoints.params_url(&self.node_id), Some(payload))?;
        info!("node: updated node params");
        Ok(true)
    }

    // ── User–node mapping ─────────────────────────────────────────────────────

    /// Request that the current user be associated with this node.
    ///
    /// Returns the request id to poll with [`Self::get_mapping_status`], or
    /// `None` if the service did not return one.
    pub fn add_user_node_mapping(&self, secret_key: &str) -> Result<Option<String>> {
        info!("node: adding user node mapping for node {}", self.node_id);
        self.user_node_mapping(secret_key, MappingOperation::Add)
    }

    /// Request that the current user's association with this node be removed.
    pub fn remove_user_node_mapping(&self) -> Result<Option<String>> {
        info!("node: removing user node mapping for node {}", self.node_id);
        self.user_node_mapping("", MappingOperation::Remove)
    }

    /// Current status of a mapping request, or `None` if the service did not
    /// report one.
    pub fn get_mapping_status(&self, request_id: &str) -> Result<Option<String>> {
        info!("node: checking status of user node mapping request {request_id}");
        let payload = self.get_json(self.endpoints.mapping_status_url(request_id))?;
        Ok(serde_json::from_value::<MappingStatusResponse>(payload)
            .ok()
            .and_then(|r| r.request_status))
    }

    /// Shared request path behind add and remove. The user id is looked up
    /// on every call.
    fn user_node_mapping(
        &self,
        secret_key: &str,
        operation: MappingOperation,
    ) -> Result<Option<String>> {
        let user_id = self.identity.user_id()?;
        debug!("node: mapping operation {operation} for user {user_id}");
        let request = match operation {
            MappingOperation::Add => MappingRequest::add(user_id, &self.node_id, secret_key),
            MappingOperation::Remove => MappingRequest::remove(user_id, &self.node_id),
        };
        let body = self.call(
            Method::Put,
            self.endpoints.mapping_url(),
            Some(serde_json::to_string(&request)?),
        )?;
        let payload: Value = serde_json::from_str(&body)?;
        Ok(serde_json::from_value::<MappingResponse>(payload)
            .ok()
            .and_then(|r| r.request_id))
    }

    // ── Plumbing ──────────────────────────────────────────────────────────────

    fn get_json(&self, url: String) -> Result<Value> {
        let body = self.call(Method::Get, url, None)?;
        Ok(serde_json::from_str(&body)?)
    }

    /// One round trip; non-2xx becomes [`NodeError::Http`] carrying the body.
    fn call(&self, method: Method, url: String, body: Option<String>) -> Result<String> {
        debug!("node: {method} {url}");
        let request = Request {
            method,
            url,
            header: &self.header,
            body,
        };
        let response = self.transport.send(&request)?;
        debug!("node: response {} {}", response.status, response.body);
        if !response.is_success() {
            return Err(NodeError::Http {
                status: response.status,
                body: response.body,
            });
        }
        Ok(response.body)
    }
}

fn prepare(node_id: String, session: &dyn Session) -> Result<(String, RequestHeader)> {
    if node_id.is_empty() {
        return Err(NodeError::InvalidInput("node id must not be empty".into()));
    }
    let header = RequestHeader::from_session(session)?;
    Ok((node_id, header))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
