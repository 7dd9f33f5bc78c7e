//! Task model — priority, dependencies, status transitions, metadata bag.
//!
//! Workflow linkage is carried in the metadata bag (`workflow_id` +
//! `step_index`) rather than a pointer, so tasks and workflows never form an
//! ownership cycle.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::agent::AgentId;
use crate::workflow::WorkflowId;

/// Unique identifier for tasks.
pub type TaskId = String;

/// Metadata key holding the owning workflow id.
pub const META_WORKFLOW_ID: &str = "workflow_id";

/// Metadata key holding the zero-based workflow step index.
pub const META_STEP_INDEX: &str = "step_index";

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

/// Task lifecycle status.
///
/// `Completed` and `Failed` are terminal. A vetoed task reverts to
/// `Pending` and is not auto-retried by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Failed,
}

/// A unit of work submitted to the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier (assigned on submission if empty).
    pub id: TaskId,

    /// Human-readable description of the work.
    pub description: String,

    /// Scheduling priority.
    pub priority: TaskPriority,

    /// Ids of tasks whose results must exist before this one may run.
    pub dependencies: Vec<TaskId>,

    /// Current lifecycle status.
    pub status: TaskStatus,

    /// Agents this task has been assigned to.
    pub assigned_agents: Vec<AgentId>,

    /// Result payload once completed.
    pub result: Option<serde_json::Value>,

    /// Error message once failed.
    pub error: Option<String>,

    /// Free-form metadata (may carry workflow linkage).
    pub metadata: HashMap<String, serde_json::Value>,

    /// Submission timestamp.
    pub created_at: DateTime<Utc>,

    /// Terminal transition timestamp.
    pub finished_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new pending task with a fresh id.
    pub fn new(description: impl Into<String>, priority: TaskPriority) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            description: description.into(),
            priority,
            dependencies: Vec::new(),
            status: TaskStatus::Pending,
            assigned_agents: Vec::new(),
            result: None,
            error: None,
            metadata: HashMap::new(),
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Use a caller-chosen id instead of the generated one.
    pub fn with_id(mut self, id: impl Into<TaskId>) -> Self {
        self.id = id.into();
        self
    }

    /// Declare dependency task ids.
    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskId>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Link this task to a workflow step via the metadata bag.
    pub fn with_workflow(mut self, workflow_id: impl Into<WorkflowId>, step: usize) -> Self {
        self.metadata.insert(
            META_WORKFLOW_ID.to_string(),
            serde_json::Value::String(workflow_id.into()),
        );
        self.metadata
            .insert(META_STEP_INDEX.to_string(), serde_json::json!(step));
        self
    }

    /// Attach an arbitrary metadata value.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Workflow linkage, if the metadata bag carries one.
    pub fn workflow_ref(&self) -> Option<(WorkflowId, usize)> {
        let workflow_id = self.metadata.get(META_WORKFLOW_ID)?.as_str()?.to_string();
        let step = self.metadata.get(META_STEP_INDEX)?.as_u64()? as usize;
        Some((workflow_id, step))
    }

    /// Whether the task has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TaskStatus::Completed | TaskStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_pending() {
        let task = Task::new("summarize sources", TaskPriority::High);
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(task.assigned_agents.is_empty());
        assert!(!task.id.is_empty());
        assert!(!task.is_terminal());
    }

    #[test]
    fn test_workflow_ref_round_trip() {
        let task = Task::new("step work", TaskPriority::Medium).with_workflow("wf1", 2);
        assert_eq!(task.workflow_ref(), Some(("wf1".to_string(), 2)));
    }

    #[test]
    fn test_workflow_ref_absent() {
        let task = Task::new("standalone", TaskPriority::Low);
        assert_eq!(task.workflow_ref(), None);
    }

    #[test]
    fn test_priority_ordering() {
        assert!(TaskPriority::Critical > TaskPriority::High);
        assert!(TaskPriority::High > TaskPriority::Medium);
        assert!(TaskPriority::Medium > TaskPriority::Low);
    }

    #[test]
    fn test_task_serde() {
        let task = Task::new("check facts", TaskPriority::Critical)
            .with_id("t1")
            .with_dependencies(["t0"]);
        let json = serde_json::to_string(&task).unwrap();
        let parsed: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, "t1");
        assert_eq!(parsed.dependencies, vec!["t0".to_string()]);
        assert_eq!(parsed.priority, TaskPriority::Critical);
    }
}
