//! Endpoint URL builder for the node API.
//!
//! [`Endpoints`] is constructed from the service host and returns full URL
//! strings for every endpoint a [`NodeClient`](crate::NodeClient) calls.
//! There is no I/O here.

use rmaker_api::{paths, query};
use urlencoding::encode;

/// URL helpers bound to one service host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Service base URL without a trailing slash,
    /// e.g. `https://api.rainmaker.espressif.com/v1`.
    pub host: String,
}

impl Endpoints {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into().trim_end_matches('/').to_string(),
        }
    }

    // ── Node endpoints ────────────────────────────────────────────────────────

    /// `{host}/user/nodes/status?nodeid={node_id}`
    pub fn status_url(&self, node_id: &str) -> String {
        self.node_url(paths::NODE_STATUS, node_id)
    }

    /// `{host}/user/nodes/config?nodeid={node_id}`
    pub fn config_url(&self, node_id: &str) -> String {
        self.node_url(paths::NODE_CONFIG, node_id)
    }

    /// `{host}/user/nodes/params?nodeid={node_id}`: both `GET` and `PUT`.
    pub fn params_url(&self, node_id: &str) -> String {
        self.node_url(paths::NODE_PARAMS, node_id)
    }

    // ── Mapping endpoints ─────────────────────────────────────────────────────

    /// `{host}/user/nodes/mapping`: submit a mapping request via `PUT`.
    pub fn mapping_url(&self) -> String {
        format!("{}/{}", self.host, paths::USER_NODE_MAPPING)
    }

    /// `{host}/user/nodes/mapping?request_id={request_id}`
    pub fn mapping_status_url(&self, request_id: &str) -> String {
        format!(
            "{}/{}?{}={}",
            self.host,
            paths::USER_NODE_MAPPING,
            query::REQUEST_ID,
            encode(request_id)
        )
    }

    fn node_url(&self, path: &str, node_id: &str) -> String {
        format!("{}/{}?{}={}", self.host, path, query::NODE_ID, encode(node_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> Endpoints {
        Endpoints::new("https://api.example.com/v1")
    }

    #[test]
    fn status_url() {
        assert_eq!(
            endpoints().status_url("abcd1234"),
            "https://api.example.com/v1/user/nodes/status?nodeid=abcd1234"
        );
    }

    #[test]
    fn config_url() {
        assert_eq!(
            endpoints().config_url("abcd1234"),
            "https://api.example.com/v1/user/nodes/config?nodeid=abcd1234"
        );
    }

    #[test]
    fn params_url() {
        assert_eq!(
            endpoints().params_url("abcd1234"),
            "https://api.example.com/v1/user/nodes/params?nodeid=abcd1234"
        );
    }

    #[test]
    fn mapping_urls() {
        assert_eq!(
            endpoints().mapping_url(),
            "https://api.example.com/v1/user/nodes/mapping"
        );
        assert_eq!(
            endpoints().mapping_status_url("req-42"),
            "https://api.example.com/v1/user/nodes/mapping?request_id=req-42"
        );
    }

    #[test]
    fn trailing_slash_on_host_is_stripped() {
        let e = Endpoints::new("https://api.example.com/v1/");
        assert_eq!(e.host, "https://api.example.com/v1");
        assert_eq!(e.mapping_url(), "https://api.example.com/v1/user/nodes/mapping");
    }

    #[test]
    fn query_values_are_percent_encoded() {
        assert_eq!(
            endpoints().status_url("a b&c"),
            "https://api.example.com/v1/user/nodes/status?nodeid=a%20b%26c"
        );
    }
}
