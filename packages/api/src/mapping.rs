//! User–node mapping types: `PUT` and `GET user/nodes/mapping`.
//!
//! Mapping is a two-phase protocol. A `PUT` submits a [`MappingRequest`] and
//! the server answers with a `request_id`; the caller then polls `GET
//! user/nodes/mapping?request_id=…` until the `request_status` it reads back
//! is terminal. The status vocabulary is server-defined and passed through
//! unchanged.

use serde::{Deserialize, Serialize};

/// Whether a mapping request associates or dissociates the user and node.
///
/// Serialises as a lowercase string (`"add"` / `"remove"`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MappingOperation {
    /// Associate the node with the user. Requires the node's secret key.
    Add,
    /// Remove the association. The secret key is sent empty.
    Remove,
}

impl std::fmt::Display for MappingOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MappingOperation::Add => write!(f, "add"),
            MappingOperation::Remove => write!(f, "remove"),
        }
    }
}

impl std::str::FromStr for MappingOperation {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(MappingOperation::Add),
            "remove" => Ok(MappingOperation::Remove),
            _ => Err(format!(
                "unknown mapping operation {:?}; expected one of: add, remove",
                s
            )),
        }
    }
}

/// Request body for `PUT user/nodes/mapping`.
///
/// ```json
/// {
///   "user_id": "5b2f5c3e-…",
///   "node_id": "abcd1234",
///   "secret_key": "abc123",
///   "operation": "add"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MappingRequest {
    pub user_id: String,
    pub node_id: String,
    /// Secret generated during provisioning; empty for [`MappingOperation::Remove`].
    pub secret_key: String,
    pub operation: MappingOperation,
}

impl MappingRequest {
    /// An `add` request carrying the node's secret key.
    pub fn add(
        user_id: impl Into<String>,
        node_id: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            node_id: node_id.into(),
            secret_key: secret_key.into(),
            operation: MappingOperation::Add,
        }
    }

    /// A `remove` request; the secret key is always empty.
    pub fn remove(user_id: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            node_id: node_id.into(),
            secret_key: String::new(),
            operation: MappingOperation::Remove,
        }
    }
}

/// Response body for `PUT user/nodes/mapping`.
///
/// Only `request_id` is interpreted. It is absent when the server accepted
/// the call but did not open a mapping request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MappingResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Response body for `GET user/nodes/mapping?request_id=…`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MappingStatusResponse {
    /// Server-defined status, e.g. `"requested"`, `"confirmed"`, `"discarded"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_request_wire_shape() {
        let req = MappingRequest::add("user-1", "abcd1234", "abc123");
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "user_id": "user-1",
                "node_id": "abcd1234",
                "secret_key": "abc123",
                "operation": "add"
            })
        );
    }

    #[test]
    fn remove_request_has_empty_secret() {
        let req = MappingRequest::remove("user-1", "abcd1234");
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["secret_key"], "");
        assert_eq!(v["operation"], "remove");
    }

    #[test]
    fn operation_parses_and_displays() {
        assert_eq!("add".parse::<MappingOperation>(), Ok(MappingOperation::Add));
        assert_eq!(MappingOperation::Remove.to_string(), "remove");
        assert!("Add".parse::<MappingOperation>().is_err());
    }

    #[test]
    fn mapping_response_ignores_extra_fields() {
        let r: MappingResponse =
            serde_json::from_str(r#"{"request_id":"req-42","status":"success"}"#).unwrap();
        assert_eq!(r.request_id.as_deref(), Some("req-42"));
    }

    #[test]
    fn missing_correlation_fields_decode_as_none() {
        let r: MappingResponse = serde_json::from_str(r#"{"status":"success"}"#).unwrap();
        assert!(r.request_id.is_none());
        let s: MappingStatusResponse = serde_json::from_str("{}").unwrap();
        assert!(s.request_status.is_none());
    }
}
