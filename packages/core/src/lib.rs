//! Client for nodes managed through the device-management cloud.
//!
//! A [`NodeClient`] is bound to one node id and one authenticated session.
//! It reads the node's online status, configuration and parameters, updates
//! parameters, and drives the asynchronous user–node mapping protocol. Each
//! call is one blocking HTTPS round trip with no retries.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`client`] | [`NodeClient`] and its operations |
//! | [`transport`] | [`Transport`] seam and the blocking [`HttpTransport`] |
//! | [`endpoints`] | URL construction for every node endpoint |
//! | [`session`] | [`Session`] token capability |
//! | [`identity`] | [`IdentityStore`] supplying the current user id |
//! | [`config`] | [`ClientConfig`] populated from the environment |
//! | [`error`] | [`NodeError`] taxonomy |
//!
//! Wire types live in the `rmaker-api` crate and are re-exported as [`api`].

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod identity;
pub mod session;
pub mod transport;

pub use rmaker_api as api;

pub use client::NodeClient;
pub use config::ClientConfig;
pub use endpoints::Endpoints;
pub use error::{NodeError, Result};
pub use identity::{IdentityError, IdentityStore, StaticIdentity};
pub use session::{Session, TokenSession};
pub use transport::{HttpTransport, Method, Request, RequestHeader, Response, Transport};
