//! Node configuration.

use std::net::SocketAddr;
use std::time::Duration;

use meshsim_core::SimConfig;

/// Configuration for a meshsim node.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// HTTP control-plane listen address.
    pub http_addr: SocketAddr,

    /// Simulator configuration.
    pub sim: SimConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl NodeConfig {
    /// Create config from environment variables with sensible defaults.
    pub fn from_env() -> Self {
        let http_addr = std::env::var("MESHSIM_HTTP_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8088".to_string())
            .parse()
            .expect("Invalid MESHSIM_HTTP_ADDR");

        let tick_ms = env_parse("MESHSIM_TICK_MS", 100u64);
        let max_range_m = env_parse("MESHSIM_RANGE_M", meshsim_topology::DEFAULT_RANGE_M);
        let script_ops = env_parse("MESHSIM_SCRIPT_OPS", 500_000u64);
        // Scatter spawn positions like a physical deployment would;
        // ~0.00045 degrees is a few tens of meters.
        let spawn_jitter_deg = env_parse("MESHSIM_SPAWN_JITTER_DEG", 0.00045f64);
        let max_peers = std::env::var("MESHSIM_MAX_PEERS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .filter(|&n| n > 0);

        Self {
            http_addr,
            sim: SimConfig {
                tick_interval: Duration::from_millis(tick_ms),
                max_range_m,
                max_peers,
                script_ops,
                spawn_jitter_deg,
            },
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_env() {
        // Env vars are absent in the test environment.
        let config = NodeConfig::from_env();
        assert_eq!(config.http_addr.port(), 8088);
        assert_eq!(config.sim.tick_interval, Duration::from_millis(100));
        assert_eq!(config.sim.max_peers, None);
        assert!(config.sim.spawn_jitter_deg > 0.0);
    }
}
