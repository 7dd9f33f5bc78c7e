//! Swarm coordination engine.
//!
//! A library for orchestrating a pool of agents over pluggable connection
//! topologies: durable categorized memory with TTL expiry, lifecycle hooks
//! that can veto operations, scored task assignment with a baseline
//! fallback, workflow tracking with out-of-order step completion, and an
//! in-process event bus for notifications.
//!
//! # Architecture
//!
//! - [`memory`] — sled-backed durable store: categorized TTL entries,
//!   workflow memory, agent snapshots, and the append-only event log.
//! - [`pool`] — agent registry with exclusive-acquisition semantics.
//! - [`hooks`] — lifecycle hook pipeline with fail-closed verdict merging.
//! - [`scorer`] — pluggable assignment ranking.
//! - [`topology`] — mesh, hierarchical, distributed, centralized, and
//!   hybrid wiring policies.
//! - [`coordinator`] — ties it together: registration, assignment,
//!   workflows, conflicts, metrics.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use swarm_coordination::{
//!     Agent, AgentType, FnExecutor, MemoryStore, SwarmConfig, SwarmCoordinator, Task,
//!     TaskPriority,
//! };
//!
//! # async fn run() -> anyhow::Result<()> {
//! let store = MemoryStore::open("./swarm.db")?.shared();
//! let coordinator = SwarmCoordinator::new(SwarmConfig::default(), store).shared();
//!
//! coordinator.register_agent(
//!     Agent::new("researcher-1", AgentType::Researcher),
//!     Arc::new(FnExecutor(|task: &Task| -> anyhow::Result<serde_json::Value> {
//!         Ok(serde_json::json!({ "handled": task.id }))
//!     })),
//! )?;
//!
//! let task = coordinator
//!     .assign_task(Task::new("survey the literature", TaskPriority::High))
//!     .await?;
//! println!("task {} -> {:?}", task.id, task.status);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod coordinator;
pub mod events;
pub mod hooks;
pub mod memory;
pub mod metrics;
pub mod pool;
pub mod scorer;
pub mod task;
pub mod topology;
pub mod workflow;

pub use agent::{Agent, AgentId, AgentStatus, AgentType, FnExecutor, PerformanceStats, TaskExecutor};
pub use config::SwarmConfig;
pub use coordinator::{SharedCoordinator, SwarmCoordinator, SwarmError, SwarmResult, SwarmState};
pub use events::{EventBus, FilteredReceiver, SwarmEvent};
pub use hooks::{HookContext, HookHandler, HookOutcome, HookPipeline, HookType};
pub use memory::{
    CoordinationEvent, EventQuery, MemoryEntry, MemoryStore, SharedMemoryStore, StoreError,
    WorkflowMemory,
};
pub use metrics::{MetricsSnapshot, SwarmMetrics};
pub use pool::{AgentPool, LeasedAgent, PoolError};
pub use scorer::{
    AssignmentCandidate, AssignmentScorer, BaselineScorer, CapabilityScorer,
};
pub use task::{Task, TaskId, TaskPriority, TaskStatus};
pub use topology::{Connection, ConnectionType, Topology, TopologyKind};
pub use workflow::{WorkflowId, WorkflowState, WorkflowStatus};
