//! Coordinator configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::events::DEFAULT_EVENT_CAPACITY;
use crate::topology::TopologyKind;

/// Tunables for a swarm coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmConfig {
    /// Wiring policy for agent connections.
    pub topology: TopologyKind,

    /// Hard cap on registered agents.
    pub max_agents: usize,

    /// Edge density for distributed (and hybrid) wiring, 0.0..=1.0.
    pub connection_density: f64,

    /// Budget for the primary scorer before falling back to the baseline.
    pub scorer_timeout: Duration,

    /// Interval of the expired-entry sweep.
    pub sweep_interval: Duration,

    /// TTL applied to persisted task results.
    pub task_result_ttl: Duration,

    /// Deadline granted to each assignment, in seconds.
    pub assignment_deadline_secs: i64,

    /// Event bus channel capacity.
    pub event_capacity: usize,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            topology: TopologyKind::Mesh,
            max_agents: 10,
            connection_density: 0.3,
            scorer_timeout: Duration::from_millis(500),
            sweep_interval: Duration::from_secs(60),
            task_result_ttl: Duration::from_secs(300),
            assignment_deadline_secs: 300,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl SwarmConfig {
    /// Start from defaults with a chosen topology.
    pub fn with_topology(topology: TopologyKind) -> Self {
        Self {
            topology,
            ..Default::default()
        }
    }

    /// Defaults overridden from the environment where set:
    /// `SWARM_TOPOLOGY`, `SWARM_MAX_AGENTS`, `SWARM_CONNECTION_DENSITY`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(value) = std::env::var("SWARM_TOPOLOGY") {
            match value.as_str() {
                "mesh" => config.topology = TopologyKind::Mesh,
                "hierarchical" => config.topology = TopologyKind::Hierarchical,
                "distributed" => config.topology = TopologyKind::Distributed,
                "centralized" => config.topology = TopologyKind::Centralized,
                "hybrid" => config.topology = TopologyKind::Hybrid,
                _ => {}
            }
        }
        if let Some(value) = std::env::var("SWARM_MAX_AGENTS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            config.max_agents = value;
        }
        if let Some(value) = std::env::var("SWARM_CONNECTION_DENSITY")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
        {
            config.connection_density = value.clamp(0.0, 1.0);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SwarmConfig::default();
        assert_eq!(config.topology, TopologyKind::Mesh);
        assert_eq!(config.max_agents, 10);
        assert!((config.connection_density - 0.3).abs() < f64::EPSILON);
    }

    #[test]
    fn test_with_topology() {
        let config = SwarmConfig::with_topology(TopologyKind::Hierarchical);
        assert_eq!(config.topology, TopologyKind::Hierarchical);
        assert_eq!(config.max_agents, 10);
    }
}
