use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// listen on this network address
    pub bind: String,
    /// route prefix the gateway answers under
    pub route_prefix: String,
    /// API version prefix joined into every upstream URL
    pub upstream_api_prefix: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8780".to_string(),
            route_prefix: "/api/orchestrator".to_string(),
            upstream_api_prefix: "api/v1".to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, confy::ConfyError> {
        match path {
            Some(path) => confy::load_path(path),
            None => confy::load("flowgate", None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_from_missing_path_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = GatewayConfig::load(Some(&dir.path().join("gateway.toml"))).unwrap();
        assert_eq!(config.route_prefix, "/api/orchestrator");
        assert_eq!(config.upstream_api_prefix, "api/v1");
    }
}
