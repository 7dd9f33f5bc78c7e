//! Hook points, contexts, and outcomes.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::agent::AgentId;
use crate::task::{Task, TaskId};
use crate::workflow::WorkflowState;

/// Lifecycle points a handler can attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookType {
    PreTask,
    PostTask,
    PreWorkflow,
    PostWorkflow,
    PreDecision,
    PostDecision,
    Error,
    /// Hook point for user-installed notification integrations. The engine
    /// registers no baseline handler here and never runs it itself; bus
    /// publishes are not gated on it.
    Notification,
}

impl HookType {
    /// Stable string tag for logging.
    pub fn name(&self) -> &'static str {
        match self {
            HookType::PreTask => "pre_task",
            HookType::PostTask => "post_task",
            HookType::PreWorkflow => "pre_workflow",
            HookType::PostWorkflow => "post_workflow",
            HookType::PreDecision => "pre_decision",
            HookType::PostDecision => "post_decision",
            HookType::Error => "error",
            HookType::Notification => "notification",
        }
    }
}

impl std::fmt::Display for HookType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only context handed to every handler at a hook point.
#[derive(Debug, Clone, Default)]
pub struct HookContext {
    pub hook: Option<HookType>,
    pub task: Option<Task>,
    pub workflow: Option<WorkflowState>,
    pub agent_id: Option<AgentId>,
    /// Dependency id -> whether its result exists in durable memory.
    pub resolved_dependencies: HashMap<TaskId, bool>,
    /// Idle agents at the time of the call.
    pub available_agents: usize,
    /// Agents the operation needs.
    pub required_agents: usize,
    /// Error message, set at the error hook point.
    pub error: Option<String>,
    /// Task execution time, set at the post-task hook point.
    pub execution_ms: Option<u64>,
}

impl HookContext {
    pub fn new(hook: HookType) -> Self {
        Self {
            hook: Some(hook),
            ..Default::default()
        }
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.task = Some(task);
        self
    }

    pub fn with_workflow(mut self, workflow: WorkflowState) -> Self {
        self.workflow = Some(workflow);
        self
    }

    pub fn with_agent(mut self, agent_id: impl Into<AgentId>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_execution_ms(mut self, ms: u64) -> Self {
        self.execution_ms = Some(ms);
        self
    }
}

/// The verdict of one handler, or of a whole pipeline run after merging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookOutcome {
    /// Whether the guarded operation may proceed.
    pub proceed: bool,
    /// Reason for a rejection; `None` on success.
    pub reason: Option<String>,
    /// Free-form data handlers want to surface.
    pub metadata: HashMap<String, serde_json::Value>,
}

impl HookOutcome {
    /// A passing outcome.
    pub fn proceed() -> Self {
        Self {
            proceed: true,
            reason: None,
            metadata: HashMap::new(),
        }
    }

    /// A rejecting outcome with a reason.
    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            proceed: false,
            reason: Some(reason.into()),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Fold another handler's verdict into this one: `proceed` is ANDed,
    /// the first rejection reason wins, metadata merges last-write-wins.
    pub fn merge(&mut self, other: HookOutcome) {
        self.proceed = self.proceed && other.proceed;
        if self.reason.is_none() {
            self.reason = other.reason;
        }
        self.metadata.extend(other.metadata);
    }
}

impl Default for HookOutcome {
    fn default() -> Self {
        Self::proceed()
    }
}
