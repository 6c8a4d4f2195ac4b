//! Runtime configuration: environment-driven by default, with an optional
//! file-backed loader behind the `service` feature (§10).

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Knobs that shape topology construction and controller timeouts.
/// Everything here has a sane default so a bare `RuntimeConfig::from_env()`
/// is enough to run the demonstration service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Reject cycles at topology-build time instead of retaining the graph
    /// (`TopologyOptions::allow_loops`, inverted).
    #[serde(default = "default_true")]
    pub reject_cycles: bool,
    /// Promote duplicate-locator warnings to hard construction errors
    /// (`TopologyOptions::strict`).
    #[serde(default)]
    pub strict_topology: bool,
    /// Drop backendRefs carrying an explicit port for routes that honor
    /// `strict` (§4.D).
    #[serde(default)]
    pub strict_backend_refs: bool,
    /// Expand gateway listeners into section-scoped nodes.
    #[serde(default = "default_true")]
    pub expand_listeners: bool,
    /// Expand route rules into section-scoped nodes.
    #[serde(default = "default_true")]
    pub expand_route_rules: bool,
    /// Expand service ports into section-scoped nodes.
    #[serde(default = "default_true")]
    pub expand_service_ports: bool,
    /// Seconds to wait for every runnable to report `HasSynced` before
    /// `Controller::start` fails.
    #[serde(default = "default_sync_timeout_secs")]
    pub sync_timeout_secs: u64,
    /// Listen address for the demonstration service (`service` feature).
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

fn default_true() -> bool {
    true
}

fn default_sync_timeout_secs() -> u64 {
    30
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            reject_cycles: true,
            strict_topology: false,
            strict_backend_refs: false,
            expand_listeners: true,
            expand_route_rules: true,
            expand_service_ports: true,
            sync_timeout_secs: default_sync_timeout_secs(),
            listen_addr: default_listen_addr(),
        }
    }
}

impl RuntimeConfig {
    /// Build configuration from `POLICY_GRAPH_*` environment variables,
    /// falling back to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(v) = std::env::var("POLICY_GRAPH_REJECT_CYCLES") {
            if let Ok(b) = v.parse() {
                config.reject_cycles = b;
            }
        }
        if let Ok(v) = std::env::var("POLICY_GRAPH_STRICT_TOPOLOGY") {
            if let Ok(b) = v.parse() {
                config.strict_topology = b;
            }
        }
        if let Ok(v) = std::env::var("POLICY_GRAPH_STRICT_BACKEND_REFS") {
            if let Ok(b) = v.parse() {
                config.strict_backend_refs = b;
            }
        }
        if let Ok(v) = std::env::var("POLICY_GRAPH_SYNC_TIMEOUT_SECS") {
            if let Ok(n) = v.parse() {
                config.sync_timeout_secs = n;
            }
        }
        if let Ok(v) = std::env::var("POLICY_GRAPH_LISTEN_ADDR") {
            config.listen_addr = v;
        }
        config
    }

    pub fn sync_timeout(&self) -> Duration {
        Duration::from_secs(self.sync_timeout_secs)
    }

    pub fn topology_options(&self) -> crate::topology::TopologyOptions {
        crate::topology::TopologyOptions {
            allow_loops: !self.reject_cycles,
            strict: self.strict_topology,
        }
    }

    /// Load configuration layering a JSON/YAML file under the environment
    /// (file values win), via `figment`, grounded on the teacher's
    /// environment-first configuration pattern. Only available with the
    /// `service` feature, which is the only consumer that needs file-based
    /// overrides.
    #[cfg(feature = "service")]
    pub fn from_file(path: &std::path::Path) -> Result<Self, figment::Error> {
        use figment::providers::{Env, Format, Json, Yaml};
        use figment::Figment;

        let mut figment = Figment::from(Env::prefixed("POLICY_GRAPH_"));
        figment = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
            _ => figment.merge(Json::file(path)),
        };
        figment.extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_reject_cycles_and_expand_every_section() {
        let config = RuntimeConfig::default();
        assert!(config.reject_cycles);
        assert!(!config.strict_topology);
        assert!(config.expand_listeners);
        assert!(config.expand_route_rules);
        assert!(config.expand_service_ports);
    }

    #[test]
    fn topology_options_inverts_reject_cycles_into_allow_loops() {
        let mut config = RuntimeConfig::default();
        config.reject_cycles = false;
        let options = config.topology_options();
        assert!(options.allow_loops);
    }
}
