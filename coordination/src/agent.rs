//! Agent model — identity, capabilities, live state, and performance counters.
//!
//! Agents are in-process representations of workers, not networked peers.
//! The pluggable [`TaskExecutor`] trait is the only piece of domain logic an
//! agent carries; everything else is bookkeeping owned by the coordinator.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::task::{Task, TaskId};

/// Unique identifier for agents.
pub type AgentId = String;

/// Declared type of an agent.
///
/// Hierarchical and centralized topologies treat [`AgentType::Coordinator`]
/// specially; every other variant is an ordinary worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Coordinator,
    Researcher,
    Generator,
    Editor,
    Analyst,
    Optimizer,
    Scheduler,
    Custom(String),
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentType::Coordinator => write!(f, "coordinator"),
            AgentType::Researcher => write!(f, "researcher"),
            AgentType::Generator => write!(f, "generator"),
            AgentType::Editor => write!(f, "editor"),
            AgentType::Analyst => write!(f, "analyst"),
            AgentType::Optimizer => write!(f, "optimizer"),
            AgentType::Scheduler => write!(f, "scheduler"),
            AgentType::Custom(name) => write!(f, "{}", name),
        }
    }
}

/// Live status of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Registered and ready to accept a task.
    Idle,
    /// Currently executing a task.
    Busy,
    /// Last execution failed; held out of the available set.
    Error,
    /// Deregistered or unreachable.
    Offline,
}

/// Rolling performance counters for one agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PerformanceStats {
    /// Number of tasks completed successfully.
    pub tasks_completed: u64,
    /// Number of tasks that ended in failure.
    pub tasks_failed: u64,
    /// Running average execution time over successful tasks, in milliseconds.
    pub avg_execution_ms: f64,
    /// `completed / (completed + failed)`; 1.0 when no task has finished.
    pub success_rate: f64,
}

impl PerformanceStats {
    /// Record one finished task. The average uses the incremental form
    /// `avg' = (avg * (n - 1) + new) / n` over completions.
    pub fn record(&mut self, execution_ms: u64, success: bool) {
        if success {
            self.tasks_completed += 1;
            let n = self.tasks_completed as f64;
            self.avg_execution_ms = (self.avg_execution_ms * (n - 1.0) + execution_ms as f64) / n;
        } else {
            self.tasks_failed += 1;
        }
        let total = self.tasks_completed + self.tasks_failed;
        self.success_rate = if total == 0 {
            1.0
        } else {
            self.tasks_completed as f64 / total as f64
        };
    }
}

/// A registered worker agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    /// Unique agent identifier.
    pub id: AgentId,

    /// Declared type, used by topology wiring and the scorer.
    pub agent_type: AgentType,

    /// Capability tags the scorer may match against task metadata.
    pub capabilities: Vec<String>,

    /// Current status.
    pub status: AgentStatus,

    /// Task currently being executed, if any.
    pub current_task: Option<TaskId>,

    /// Normalized load factor (0.0 idle .. 1.0 saturated).
    pub load: f32,

    /// Rolling performance counters.
    pub performance: PerformanceStats,

    /// Ids of directly connected agents (topology adjacency list).
    pub connections: Vec<AgentId>,

    /// Registration timestamp.
    pub registered_at: DateTime<Utc>,

    /// Last state transition timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Agent {
    /// Create a new idle agent.
    pub fn new(id: impl Into<AgentId>, agent_type: AgentType) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            agent_type,
            capabilities: Vec::new(),
            status: AgentStatus::Idle,
            current_task: None,
            load: 0.0,
            performance: PerformanceStats {
                success_rate: 1.0,
                ..Default::default()
            },
            connections: Vec::new(),
            registered_at: now,
            updated_at: now,
        }
    }

    /// Set capability tags.
    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    /// Whether the agent can accept a task right now.
    pub fn is_available(&self) -> bool {
        self.status == AgentStatus::Idle
    }

    /// Touch the last-updated timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Pluggable execution body for an agent.
///
/// Registered at agent creation; the coordinator only cares about the
/// result/error contract. Implementations may perform I/O and are awaited
/// outside any coordinator lock.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    /// Execute one task, returning an opaque JSON result.
    async fn execute(&self, task: &Task) -> anyhow::Result<serde_json::Value>;
}

/// Adapter turning a plain closure into a [`TaskExecutor`].
pub struct FnExecutor<F>(pub F);

#[async_trait]
impl<F> TaskExecutor for FnExecutor<F>
where
    F: Fn(&Task) -> anyhow::Result<serde_json::Value> + Send + Sync,
{
    async fn execute(&self, task: &Task) -> anyhow::Result<serde_json::Value> {
        (self.0)(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_agent_is_idle() {
        let agent = Agent::new("a1", AgentType::Researcher);
        assert_eq!(agent.status, AgentStatus::Idle);
        assert!(agent.is_available());
        assert!(agent.connections.is_empty());
        assert_eq!(agent.performance.success_rate, 1.0);
    }

    #[test]
    fn test_performance_incremental_average() {
        let mut perf = PerformanceStats::default();
        perf.record(100, true);
        perf.record(200, true);
        perf.record(300, true);
        assert!((perf.avg_execution_ms - 200.0).abs() < f64::EPSILON);
        assert_eq!(perf.tasks_completed, 3);
        assert_eq!(perf.success_rate, 1.0);
    }

    #[test]
    fn test_performance_failure_does_not_move_average() {
        let mut perf = PerformanceStats::default();
        perf.record(100, true);
        perf.record(900, false);
        assert!((perf.avg_execution_ms - 100.0).abs() < f64::EPSILON);
        assert_eq!(perf.tasks_failed, 1);
        assert!((perf.success_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_agent_type_display() {
        assert_eq!(AgentType::Coordinator.to_string(), "coordinator");
        assert_eq!(AgentType::Custom("probe".to_string()).to_string(), "probe");
    }

    #[test]
    fn test_agent_serde_round_trip() {
        let agent = Agent::new("a1", AgentType::Analyst).with_capabilities(["stats", "reports"]);
        let json = serde_json::to_string(&agent).unwrap();
        let parsed: Agent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, "a1");
        assert_eq!(parsed.capabilities.len(), 2);
    }
}
