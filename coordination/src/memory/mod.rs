//! Durable memory: categorized TTL entries, workflow memory, agent
//! snapshots, and the coordination event log.

pub mod schema;
pub mod store;
pub mod types;

pub use store::{MemoryStore, SharedMemoryStore, StoreError, StoreResult};
pub use types::{
    AgentSnapshot, CoordinationEvent, EventQuery, MemoryEntry, WorkflowMemory,
    WorkflowPerformance,
};
