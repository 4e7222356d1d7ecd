use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Path of an optional JSON config file.
pub const CONFIG_ENV: &str = "LB_CONFIG";
/// Overrides `listen`.
pub const LISTEN_ENV: &str = "LB_LISTEN";
/// Comma-separated backend list, overrides `servers`.
pub const SERVERS_ENV: &str = "LB_SERVERS";

/// One inbound entry point and the algorithm its dispatcher is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteConfig {
    pub path: String,
    pub algorithm: String,
}

impl RouteConfig {
    pub fn new(path: impl Into<String>, algorithm: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            algorithm: algorithm.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Listen address (default: 0.0.0.0:8080)
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Backend addresses in round-robin order
    #[serde(default = "default_servers")]
    pub servers: Vec<String>,

    #[serde(default = "default_routes")]
    pub routes: Vec<RouteConfig>,

    /// Shuffle the backend list once before serving
    #[serde(default)]
    pub shuffle_on_start: bool,

    /// Upper bound on waiting for a backend's response head
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_servers() -> Vec<String> {
    vec![
        "http://localhost:8001".to_string(),
        "http://localhost:8002".to_string(),
        "http://localhost:8003".to_string(),
    ]
}

fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("/rr", "round-robin"),
        RouteConfig::new("/intelligent", "intelligent"),
    ]
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            servers: default_servers(),
            routes: default_routes(),
            shuffle_on_start: false,
            request_timeout_secs: None,
        }
    }
}

impl Config {
    /// Defaults, then the file named by `LB_CONFIG` if set, then the
    /// `LB_LISTEN` / `LB_SERVERS` overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(
            std::env::var(LISTEN_ENV).ok(),
            std::env::var(SERVERS_ENV).ok(),
        );
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: display.clone(),
            source,
        })?;
        Self::from_json(&contents).map_err(|source| ConfigError::Parse {
            path: display,
            source,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn apply_overrides(&mut self, listen: Option<String>, servers: Option<String>) {
        if let Some(listen) = listen {
            self.listen = listen;
        }
        if let Some(servers) = servers {
            self.servers = servers
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
    }

    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen
            .parse()
            .map_err(|_| ConfigError::InvalidListen(self.listen.clone()))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_setup() {
        let config = Config::default();
        assert_eq!(config.listen, "0.0.0.0:8080");
        assert_eq!(config.servers.len(), 3);
        assert_eq!(
            config.routes,
            vec![
                RouteConfig::new("/rr", "round-robin"),
                RouteConfig::new("/intelligent", "intelligent"),
            ]
        );
        assert!(!config.shuffle_on_start);
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = Config::from_json(r#"{ "servers": ["http://10.0.0.1:9000"] }"#).unwrap();
        assert_eq!(config.servers, ["http://10.0.0.1:9000"]);
        assert_eq!(config.listen, "0.0.0.0:8080");
        assert_eq!(config.routes.len(), 2);
    }

    #[test]
    fn full_json() {
        let json = r#"{
            "listen": "127.0.0.1:9090",
            "servers": ["http://10.0.0.1:9000", "http://10.0.0.2:9000"],
            "routes": [{ "path": "/near", "algorithm": "intelligent" }],
            "shuffle_on_start": true,
            "request_timeout_secs": 5
        }"#;
        let config = Config::from_json(json).unwrap();
        assert_eq!(config.listen_addr().unwrap(), "127.0.0.1:9090".parse().unwrap());
        assert_eq!(config.routes, vec![RouteConfig::new("/near", "intelligent")]);
        assert!(config.shuffle_on_start);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn overrides_replace_listen_and_servers() {
        let mut config = Config::default();
        config.apply_overrides(
            Some("127.0.0.1:7000".to_string()),
            Some(" http://a:1 , http://b:2,,".to_string()),
        );
        assert_eq!(config.listen, "127.0.0.1:7000");
        assert_eq!(config.servers, ["http://a:1", "http://b:2"]);
    }

    #[test]
    fn invalid_listen_is_reported() {
        let mut config = Config::default();
        config.listen = "nowhere".to_string();
        assert!(matches!(config.listen_addr(), Err(ConfigError::InvalidListen(_))));
    }
}
