//! Connection topology between agents.
//!
//! Edges are recomputed incrementally: wiring happens when an agent joins
//! and touching edges are dropped when it leaves. Policies:
//!
//! - **Mesh**: the joining agent connects to every existing agent
//!   (`Coordination` edges).
//! - **Hierarchical**: a coordinator connects to all non-coordinators
//!   (`Control`); a non-coordinator connects to the first coordinator found
//!   (`Feedback`).
//! - **Distributed**: the joining agent connects to a random subset of
//!   `round(peer_count * connection_density)` peers (`Data`).
//! - **Centralized**: the earliest-registered agent still present acts as
//!   the hub; every later agent gets one `Control` edge to it. Removing the
//!   hub does not rewire survivors; the next join connects to the new
//!   earliest agent.
//! - **Hybrid**: hierarchical wiring plus distributed `Data` edges drawn at
//!   half the configured density.

use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentId, AgentType};

/// Topology wiring policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyKind {
    Mesh,
    Hierarchical,
    Distributed,
    Centralized,
    Hybrid,
}

impl std::fmt::Display for TopologyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopologyKind::Mesh => write!(f, "mesh"),
            TopologyKind::Hierarchical => write!(f, "hierarchical"),
            TopologyKind::Distributed => write!(f, "distributed"),
            TopologyKind::Centralized => write!(f, "centralized"),
            TopologyKind::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Kind of a topology edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionType {
    Data,
    Control,
    Feedback,
    Coordination,
    Workflow,
}

/// An undirected edge of the topology graph (stored once, adjacency kept on
/// both endpoints).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub from: AgentId,
    pub to: AgentId,
    pub weight: f32,
    pub kind: ConnectionType,
}

impl Connection {
    fn new(from: &AgentId, to: &AgentId, kind: ConnectionType) -> Self {
        Self {
            from: from.clone(),
            to: to.clone(),
            weight: 1.0,
            kind,
        }
    }

    /// Whether this edge touches the given agent.
    pub fn touches(&self, id: &str) -> bool {
        self.from == id || self.to == id
    }
}

/// The topology graph plus the wiring policy driving it.
#[derive(Debug, Clone)]
pub struct Topology {
    kind: TopologyKind,
    density: f64,
    connections: Vec<Connection>,
    /// Agent ids in registration order (drives the centralized hub choice).
    order: Vec<AgentId>,
}

impl Topology {
    pub fn new(kind: TopologyKind, density: f64) -> Self {
        Self {
            kind,
            density: density.clamp(0.0, 1.0),
            connections: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn kind(&self) -> TopologyKind {
        self.kind
    }

    /// All current edges.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Edges touching the given agent.
    pub fn connections_of(&self, id: &str) -> Vec<&Connection> {
        self.connections.iter().filter(|c| c.touches(id)).collect()
    }

    /// Wire a joining agent against the existing peers, returning the newly
    /// created edges. Peers must not include the joining agent.
    pub fn wire_in(&mut self, joining: &Agent, peers: &[Agent]) -> Vec<Connection> {
        let added = match self.kind {
            TopologyKind::Mesh => self.wire_mesh(joining, peers),
            TopologyKind::Hierarchical => self.wire_hierarchical(joining, peers),
            TopologyKind::Distributed => self.wire_distributed(joining, peers, self.density),
            TopologyKind::Centralized => self.wire_centralized(joining, peers),
            TopologyKind::Hybrid => {
                let mut edges = self.wire_hierarchical(joining, peers);
                let linked: Vec<AgentId> = edges
                    .iter()
                    .map(|c| {
                        if c.from == joining.id {
                            c.to.clone()
                        } else {
                            c.from.clone()
                        }
                    })
                    .collect();
                let remaining: Vec<Agent> = peers
                    .iter()
                    .filter(|p| !linked.contains(&p.id))
                    .cloned()
                    .collect();
                edges.extend(self.wire_distributed(joining, &remaining, self.density / 2.0));
                edges
            }
        };

        self.order.push(joining.id.clone());
        self.connections.extend(added.iter().cloned());
        added
    }

    /// Drop every edge touching the given agent, returning how many were
    /// removed.
    pub fn drop_agent(&mut self, id: &str) -> usize {
        let before = self.connections.len();
        self.connections.retain(|c| !c.touches(id));
        self.order.retain(|a| a != id);
        before - self.connections.len()
    }

    fn wire_mesh(&self, joining: &Agent, peers: &[Agent]) -> Vec<Connection> {
        peers
            .iter()
            .map(|p| Connection::new(&joining.id, &p.id, ConnectionType::Coordination))
            .collect()
    }

    fn wire_hierarchical(&self, joining: &Agent, peers: &[Agent]) -> Vec<Connection> {
        if joining.agent_type == AgentType::Coordinator {
            peers
                .iter()
                .filter(|p| p.agent_type != AgentType::Coordinator)
                .map(|p| Connection::new(&joining.id, &p.id, ConnectionType::Control))
                .collect()
        } else {
            peers
                .iter()
                .find(|p| p.agent_type == AgentType::Coordinator)
                .map(|c| vec![Connection::new(&joining.id, &c.id, ConnectionType::Feedback)])
                .unwrap_or_default()
        }
    }

    fn wire_distributed(&self, joining: &Agent, peers: &[Agent], density: f64) -> Vec<Connection> {
        let count = ((peers.len() as f64) * density).round() as usize;
        if count == 0 {
            return Vec::new();
        }
        let mut rng = rand::rng();
        peers
            .choose_multiple(&mut rng, count)
            .map(|p| Connection::new(&joining.id, &p.id, ConnectionType::Data))
            .collect()
    }

    fn wire_centralized(&self, joining: &Agent, peers: &[Agent]) -> Vec<Connection> {
        let hub = self
            .order
            .iter()
            .find(|id| peers.iter().any(|p| &p.id == *id));
        match hub {
            Some(hub_id) => vec![Connection::new(&joining.id, hub_id, ConnectionType::Control)],
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent(id: &str, agent_type: AgentType) -> Agent {
        Agent::new(id, agent_type)
    }

    fn wire_all(topology: &mut Topology, agents: &[Agent]) {
        let mut present: Vec<Agent> = Vec::new();
        for a in agents {
            topology.wire_in(a, &present);
            present.push(a.clone());
        }
    }

    #[test]
    fn test_mesh_three_agents_three_edges() {
        let mut topo = Topology::new(TopologyKind::Mesh, 0.5);
        let agents = vec![
            agent("a", AgentType::Researcher),
            agent("b", AgentType::Generator),
            agent("c", AgentType::Editor),
        ];
        wire_all(&mut topo, &agents);

        assert_eq!(topo.connections().len(), 3);
        for id in ["a", "b", "c"] {
            assert_eq!(topo.connections_of(id).len(), 2);
        }
        assert!(topo
            .connections()
            .iter()
            .all(|c| c.kind == ConnectionType::Coordination));
    }

    #[test]
    fn test_hierarchical_wiring() {
        let mut topo = Topology::new(TopologyKind::Hierarchical, 0.5);
        let agents = vec![
            agent("lead", AgentType::Coordinator),
            agent("w1", AgentType::Researcher),
            agent("w2", AgentType::Generator),
        ];
        wire_all(&mut topo, &agents);

        // Workers each hold one feedback edge to the coordinator.
        assert_eq!(topo.connections_of("lead").len(), 2);
        assert_eq!(topo.connections_of("w1").len(), 1);
        assert!(topo
            .connections_of("w1")
            .iter()
            .all(|c| c.kind == ConnectionType::Feedback));
    }

    #[test]
    fn test_coordinator_joining_last_controls_workers() {
        let mut topo = Topology::new(TopologyKind::Hierarchical, 0.5);
        let agents = vec![
            agent("w1", AgentType::Researcher),
            agent("w2", AgentType::Generator),
            agent("lead", AgentType::Coordinator),
        ];
        wire_all(&mut topo, &agents);

        let lead_edges = topo.connections_of("lead");
        assert_eq!(lead_edges.len(), 2);
        assert!(lead_edges.iter().all(|c| c.kind == ConnectionType::Control));
    }

    #[test]
    fn test_centralized_hub_is_earliest() {
        let mut topo = Topology::new(TopologyKind::Centralized, 0.5);
        let agents = vec![
            agent("hub", AgentType::Researcher),
            agent("b", AgentType::Generator),
            agent("c", AgentType::Editor),
        ];
        wire_all(&mut topo, &agents);

        assert_eq!(topo.connections_of("hub").len(), 2);
        assert_eq!(topo.connections_of("b").len(), 1);
        assert_eq!(topo.connections_of("c").len(), 1);
    }

    #[test]
    fn test_centralized_hub_removal_promotes_next() {
        let mut topo = Topology::new(TopologyKind::Centralized, 0.5);
        let a = agent("hub", AgentType::Researcher);
        let b = agent("b", AgentType::Generator);
        topo.wire_in(&a, &[]);
        topo.wire_in(&b, std::slice::from_ref(&a));

        topo.drop_agent("hub");
        assert!(topo.connections_of("b").is_empty());

        // Next join connects to "b", now the earliest survivor.
        let c = agent("c", AgentType::Editor);
        topo.wire_in(&c, std::slice::from_ref(&b));
        assert_eq!(topo.connections_of("b").len(), 1);
    }

    #[test]
    fn test_distributed_subset_size() {
        let mut topo = Topology::new(TopologyKind::Distributed, 0.5);
        let agents: Vec<Agent> = (0..5)
            .map(|i| agent(&format!("a{}", i), AgentType::Analyst))
            .collect();
        let joining = agent("new", AgentType::Analyst);
        let edges = topo.wire_in(&joining, &agents);

        // round(5 * 0.5) = 3 random data links.
        assert_eq!(edges.len(), 3);
        assert!(edges.iter().all(|c| c.kind == ConnectionType::Data));
    }

    #[test]
    fn test_drop_agent_removes_touching_edges() {
        let mut topo = Topology::new(TopologyKind::Mesh, 0.5);
        let agents = vec![
            agent("a", AgentType::Researcher),
            agent("b", AgentType::Generator),
            agent("c", AgentType::Editor),
        ];
        wire_all(&mut topo, &agents);

        let removed = topo.drop_agent("a");
        assert_eq!(removed, 2);
        assert_eq!(topo.connections().len(), 1);
        assert!(topo.connections_of("a").is_empty());
    }
}
