//! Workflow state — an ordered sequence of steps tracked as one entity.
//!
//! Completion is detected from a completion set rather than a high-water
//! mark: a workflow of `n` steps completes only once all indices `0..n`
//! hold a recorded result, so an out-of-order final step cannot complete
//! the workflow early.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::agent::AgentId;

/// Unique identifier for workflows.
pub type WorkflowId = String;

/// Workflow lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Draft,
    Active,
    Paused,
    Completed,
    Failed,
}

/// Progress state for one workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Unique workflow identifier.
    pub id: WorkflowId,

    /// Current lifecycle status.
    pub status: WorkflowStatus,

    /// Highest step index that has recorded a result.
    pub current_step: usize,

    /// Total number of steps.
    pub total_steps: usize,

    /// Agents participating in this workflow.
    pub assigned_agents: Vec<AgentId>,

    /// Step index -> step result. Tolerates out-of-order arrival.
    pub step_results: BTreeMap<usize, serde_json::Value>,

    /// Start timestamp.
    pub started_at: DateTime<Utc>,

    /// Completion timestamp, set when all steps have results.
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkflowState {
    /// Create an active workflow with no recorded steps.
    pub fn new(id: impl Into<WorkflowId>, total_steps: usize) -> Self {
        Self {
            id: id.into(),
            status: WorkflowStatus::Active,
            current_step: 0,
            total_steps,
            assigned_agents: Vec::new(),
            step_results: BTreeMap::new(),
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Record the result for one step, advancing `current_step` to the
    /// highest recorded index. Re-recording a step replaces its result.
    pub fn record_step(&mut self, step: usize, result: serde_json::Value) {
        self.step_results.insert(step, result);
        if step > self.current_step {
            self.current_step = step;
        }
    }

    /// Whether every step index in `0..total_steps` has a recorded result.
    pub fn is_complete(&self) -> bool {
        self.total_steps > 0 && (0..self.total_steps).all(|s| self.step_results.contains_key(&s))
    }

    /// Elapsed duration, up to completion if finished.
    pub fn duration_ms(&self) -> u64 {
        let end = self.completed_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_milliseconds().max(0) as u64
    }
}
