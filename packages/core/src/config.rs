//! Client configuration, populated from environment variables.

use std::path::PathBuf;

/// Connection settings for the cloud service.
///
/// | Variable | Default | Description |
/// |----------|---------|-------------|
/// | `RMAKER_HOST` | `https://api.rainmaker.espressif.com/v1/` | Service base URL |
/// | `RMAKER_CERT_FILE` | (absent = system roots) | PEM bundle trusted as root certificates |
/// | `RMAKER_TIMEOUT_SECS` | `30` | Per-request transport timeout |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every endpoint path is joined to.
    pub host: String,

    /// PEM file whose certificates are added to the trust store.
    /// `None` means the platform's default roots only.
    pub cert_file: Option<PathBuf>,

    /// Seconds before a request is abandoned and reported as a network error.
    pub timeout_secs: u64,
}

impl ClientConfig {
    pub const DEFAULT_HOST: &'static str = "https://api.rainmaker.espressif.com/v1/";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Configuration for `host` with default trust roots and timeout.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            cert_file: None,
            timeout_secs: Self::DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Populate config from environment variables, applying defaults where absent.
    pub fn from_env() -> Self {
        let timeout_secs = std::env::var("RMAKER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(Self::DEFAULT_TIMEOUT_SECS);

        Self {
            host: std::env::var("RMAKER_HOST").unwrap_or_else(|_| Self::DEFAULT_HOST.into()),
            cert_file: std::env::var_os("RMAKER_CERT_FILE").map(PathBuf::from),
            timeout_secs,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HOST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_uses_default_roots_and_timeout() {
        let c = ClientConfig::new("https://api.example.com/v1/");
        assert_eq!(c.host, "https://api.example.com/v1/");
        assert!(c.cert_file.is_none());
        assert_eq!(c.timeout_secs, 30);
    }

    #[test]
    fn default_points_at_public_host() {
        assert_eq!(ClientConfig::default().host, ClientConfig::DEFAULT_HOST);
    }

    // Only this test touches the RMAKER_* variables.
    #[test]
    fn from_env_reads_variables_and_falls_back() {
        std::env::set_var("RMAKER_HOST", "https://staging.example.com/v1/");
        std::env::set_var("RMAKER_CERT_FILE", "/etc/rmaker/roots.pem");
        std::env::set_var("RMAKER_TIMEOUT_SECS", "soon");
        let c = ClientConfig::from_env();
        assert_eq!(c.host, "https://staging.example.com/v1/");
        assert_eq!(c.cert_file, Some(PathBuf::from("/etc/rmaker/roots.pem")));
        assert_eq!(c.timeout_secs, 30);

        std::env::set_var("RMAKER_TIMEOUT_SECS", "5");
        assert_eq!(ClientConfig::from_env().timeout_secs, 5);

        std::env::remove_var("RMAKER_HOST");
        std::env::remove_var("RMAKER_CERT_FILE");
        std::env::remove_var("RMAKER_TIMEOUT_SECS");
        assert_eq!(ClientConfig::from_env(), ClientConfig::default());
    }
}
