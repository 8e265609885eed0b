//! Request and response types for the node endpoints of the cloud API.
//!
//! This crate encodes the HTTP contract the `rmaker` client speaks as Rust
//! types. It has no I/O; the client crate builds URLs from [`paths`] and
//! (de)serialises the bodies defined here.
//!
//! # Endpoints covered
//!
//! | Method | Path | Type |
//! |--------|------|------|
//! | GET | `user/nodes/status?nodeid=` | → opaque JSON |
//! | GET | `user/nodes/config?nodeid=` | → opaque JSON |
//! | GET | `user/nodes/params?nodeid=` | → opaque JSON or [`FailureResponse`] |
//! | PUT | `user/nodes/params?nodeid=` | opaque JSON object → ignored |
//! | PUT | `user/nodes/mapping` | [`MappingRequest`] → [`MappingResponse`] |
//! | GET | `user/nodes/mapping?request_id=` | → [`MappingStatusResponse`] |

pub mod failure;
pub mod mapping;

pub use failure::{is_soft_failure, FailureResponse};
pub use mapping::{MappingOperation, MappingRequest, MappingResponse, MappingStatusResponse};

/// Endpoint paths, relative to the service host.
pub mod paths {
    pub const NODE_STATUS: &str = "user/nodes/status";
    pub const NODE_CONFIG: &str = "user/nodes/config";
    pub const NODE_PARAMS: &str = "user/nodes/params";
    pub const USER_NODE_MAPPING: &str = "user/nodes/mapping";
}

/// Query parameter names used by the node endpoints.
pub mod query {
    pub const NODE_ID: &str = "nodeid";
    pub const REQUEST_ID: &str = "request_id";
}
