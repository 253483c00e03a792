//! HTTP Server Configuration
//!
//! Configuration for the HTTP server including bind address, CORS and
//! listing defaults.

use serde::{Deserialize, Serialize};

use crate::storage::{DEFAULT_LIMIT, MAX_LIMIT};

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpServerConfig {
    /// Host to bind to (default: "127.0.0.1")
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind to (default: 8000)
    #[serde(default = "default_port")]
    pub port: u16,

    /// CORS allowed origins; empty means any origin
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Listing size when the client sends no `limit` (default: 20)
    #[serde(default = "default_list_limit")]
    pub default_limit: u64,

    /// Whole-request timeout in seconds (default: 15)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_list_limit() -> u64 {
    DEFAULT_LIMIT
}

fn default_request_timeout() -> u64 {
    15
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            default_limit: default_list_limit(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl HttpServerConfig {
    /// Create a new config with specified port
    pub fn with_port(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Default listing size, kept within `1..=MAX_LIMIT`
    pub fn list_limit(&self) -> u64 {
        self.default_limit.clamp(1, MAX_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpServerConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.list_limit(), 20);
        assert_eq!(config.request_timeout_secs, 15);
    }

    #[test]
    fn test_socket_addr() {
        let config = HttpServerConfig::with_port(8080);
        assert_eq!(config.socket_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_list_limit_clamped() {
        let config = HttpServerConfig {
            default_limit: 500,
            ..Default::default()
        };
        assert_eq!(config.list_limit(), MAX_LIMIT);

        let config = HttpServerConfig {
            default_limit: 0,
            ..Default::default()
        };
        assert_eq!(config.list_limit(), 1);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: HttpServerConfig = serde_json::from_str(r#"{"port": 9000}"#).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.host, "127.0.0.1");
    }
}
