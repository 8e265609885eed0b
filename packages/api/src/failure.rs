//! The service's failure body and the soft-failure predicate.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The `status` value the service uses to signal a failed operation.
pub const STATUS_FAILURE: &str = "failure";

/// The JSON body the service returns when an operation fails.
///
/// Sent with non-2xx statuses, and by the params endpoint with a 2xx status
/// when the node has no parameters to report.
///
/// ```json
/// { "status": "failure", "description": "Node not found", "error_code": 100010 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureResponse {
    /// Always `"failure"` for this body shape.
    pub status: String,

    /// Human-readable description of the problem.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Numeric service error code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<i64>,
}

impl FailureResponse {
    /// Parse `body` as a failure response.
    ///
    /// Returns `None` when the body is not JSON or its `status` is anything
    /// other than `"failure"`.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str::<Self>(body)
            .ok()
            .filter(|f| f.status == STATUS_FAILURE)
    }
}

/// `true` if `payload` is an object whose `status` field is `"failure"`.
///
/// A successful HTTP exchange carrying this shape is a *soft failure*: the
/// server answered but reports no data.
pub fn is_soft_failure(payload: &Value) -> bool {
    payload.get("status").and_then(Value::as_str) == Some(STATUS_FAILURE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_failure_is_soft_failure() {
        assert!(is_soft_failure(&json!({"status": "failure"})));
        assert!(is_soft_failure(&json!({
            "status": "failure",
            "description": "no params reported"
        })));
    }

    #[test]
    fn other_payloads_are_not_soft_failures() {
        assert!(!is_soft_failure(&json!({"status": "success"})));
        assert!(!is_soft_failure(&json!({"Light": {"power": true}})));
        assert!(!is_soft_failure(&json!({"status": {"nested": "failure"}})));
        assert!(!is_soft_failure(&json!(["failure"])));
        assert!(!is_soft_failure(&json!("failure")));
        assert!(!is_soft_failure(&Value::Null));
    }

    #[test]
    fn parse_full_failure_body() {
        let body = r#"{"status":"failure","description":"Node not found","error_code":100010}"#;
        let f = FailureResponse::parse(body).unwrap();
        assert_eq!(f.description.as_deref(), Some("Node not found"));
        assert_eq!(f.error_code, Some(100010));
    }

    #[test]
    fn parse_rejects_non_failure_bodies() {
        assert!(FailureResponse::parse(r#"{"status":"success"}"#).is_none());
        assert!(FailureResponse::parse("<html>bad gateway</html>").is_none());
        assert!(FailureResponse::parse("").is_none());
    }
}
