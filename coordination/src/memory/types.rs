//! Row types persisted by the durable memory store.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::agent::{Agent, AgentId};
use crate::workflow::WorkflowId;

/// A keyed, categorized, TTL-aware entry. Unique per (key, category);
/// writes are insert-or-replace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub key: String,
    pub category: String,
    pub value: serde_json::Value,
    pub created_at: DateTime<Utc>,
    /// Absolute expiry; entries past it are invisible to reads and later
    /// purged by the sweep.
    pub expires_at: Option<DateTime<Utc>>,
}

impl MemoryEntry {
    pub fn new(
        key: impl Into<String>,
        category: impl Into<String>,
        value: serde_json::Value,
        ttl: Option<std::time::Duration>,
    ) -> Self {
        let now = Utc::now();
        let expires_at = ttl.and_then(|d| Duration::from_std(d).ok()).map(|d| now + d);
        Self {
            key: key.into(),
            category: category.into(),
            value,
            created_at: now,
            expires_at,
        }
    }

    /// Whether the entry has passed its expiry at the given instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(exp) if exp <= now)
    }

    /// Whether the entry has passed its expiry now.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Per-workflow durable memory: step map, decisions, performance record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowMemory {
    pub workflow_id: WorkflowId,
    /// Step index -> recorded step result.
    pub steps: BTreeMap<u32, serde_json::Value>,
    /// Free-form decision records appended during the run.
    pub decisions: Vec<serde_json::Value>,
    pub performance: WorkflowPerformance,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowMemory {
    pub fn new(workflow_id: impl Into<WorkflowId>) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            steps: BTreeMap::new(),
            decisions: Vec::new(),
            performance: WorkflowPerformance::default(),
            updated_at: Utc::now(),
        }
    }

    /// Record a step result and fold its execution time into the
    /// performance record.
    pub fn record_step(&mut self, step: u32, result: serde_json::Value, execution_ms: u64) {
        self.steps.insert(step, result);
        self.performance.tasks_completed += 1;
        self.performance.total_execution_ms += execution_ms;
        self.updated_at = Utc::now();
    }
}

/// Performance record kept alongside a workflow's step map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowPerformance {
    pub started_at: DateTime<Utc>,
    pub tasks_completed: u64,
    pub total_execution_ms: u64,
}

impl Default for WorkflowPerformance {
    fn default() -> Self {
        Self {
            started_at: Utc::now(),
            tasks_completed: 0,
            total_execution_ms: 0,
        }
    }
}

/// One persisted snapshot of an agent's state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent: Agent,
    pub recorded_at: DateTime<Utc>,
}

impl AgentSnapshot {
    pub fn new(agent: Agent) -> Self {
        Self {
            agent,
            recorded_at: Utc::now(),
        }
    }
}

/// An append-only audit record of a coordinator action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinationEvent {
    pub id: String,
    pub event_type: String,
    pub agent_id: Option<AgentId>,
    pub workflow_id: Option<WorkflowId>,
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl CoordinationEvent {
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            event_type: event_type.into(),
            agent_id: None,
            workflow_id: None,
            payload,
            timestamp: Utc::now(),
        }
    }

    pub fn with_agent(mut self, agent_id: impl Into<AgentId>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_workflow(mut self, workflow_id: impl Into<WorkflowId>) -> Self {
        self.workflow_id = Some(workflow_id.into());
        self
    }
}

/// Filter for querying the coordination event log. Results come back
/// newest-first, capped by `limit`.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    pub event_type: Option<String>,
    pub agent_id: Option<AgentId>,
    pub workflow_id: Option<WorkflowId>,
    pub limit: Option<usize>,
}

impl EventQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn agent(mut self, agent_id: impl Into<AgentId>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn workflow(mut self, workflow_id: impl Into<WorkflowId>) -> Self {
        self.workflow_id = Some(workflow_id.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether an event passes this filter.
    pub fn matches(&self, event: &CoordinationEvent) -> bool {
        if let Some(ref t) = self.event_type {
            if &event.event_type != t {
                return false;
            }
        }
        if let Some(ref a) = self.agent_id {
            if event.agent_id.as_deref() != Some(a.as_str()) {
                return false;
            }
        }
        if let Some(ref w) = self.workflow_id {
            if event.workflow_id.as_deref() != Some(w.as_str()) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration as StdDuration;

    #[test]
    fn test_entry_without_ttl_never_expires() {
        let entry = MemoryEntry::new("k", "c", json!(1), None);
        assert!(!entry.is_expired());
        assert!(entry.expires_at.is_none());
    }

    #[test]
    fn test_entry_expiry() {
        let entry = MemoryEntry::new("k", "c", json!(1), Some(StdDuration::from_secs(60)));
        assert!(!entry.is_expired());
        let later = Utc::now() + Duration::seconds(120);
        assert!(entry.is_expired_at(later));
    }

    #[test]
    fn test_workflow_memory_records_performance() {
        let mut mem = WorkflowMemory::new("wf1");
        mem.record_step(0, json!("r0"), 120);
        mem.record_step(1, json!("r1"), 80);
        assert_eq!(mem.steps.len(), 2);
        assert_eq!(mem.performance.tasks_completed, 2);
        assert_eq!(mem.performance.total_execution_ms, 200);
    }

    #[test]
    fn test_event_query_matching() {
        let event = CoordinationEvent::new("task_completed", json!({"task_id": "t1"}))
            .with_agent("a1")
            .with_workflow("wf1");

        assert!(EventQuery::new().matches(&event));
        assert!(EventQuery::new().event_type("task_completed").matches(&event));
        assert!(!EventQuery::new().event_type("task_failed").matches(&event));
        assert!(EventQuery::new().agent("a1").workflow("wf1").matches(&event));
        assert!(!EventQuery::new().agent("a2").matches(&event));
    }
}
