//! Baseline hook handlers installed by the coordinator.
//!
//! These carry the default lifecycle behavior: task validation, result
//! persistence, workflow initialization, and error classification. Users
//! extend behavior by registering additional handlers next to them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use super::pipeline::HookHandler;
use super::types::{HookContext, HookOutcome};
use crate::memory::{CoordinationEvent, SharedMemoryStore, WorkflowMemory};

/// Memory category for persisted task results.
pub const CATEGORY_TASK_RESULTS: &str = "task_results";

/// Memory category for retry records written by the error classifier.
pub const CATEGORY_RETRIES: &str = "retries";

/// Linear backoff step between retry attempts, in seconds.
const RETRY_BACKOFF_SECS: i64 = 30;

/// Error signatures classified as transient (retryable).
const TRANSIENT_SIGNATURES: &[&str] = &[
    "timeout",
    "timed out",
    "connection reset",
    "name resolution",
    "temporary failure",
];

/// Memory key holding a task's persisted result.
pub fn task_result_key(task_id: &str) -> String {
    format!("task_{}_result", task_id)
}

/// Memory key holding a task's retry record.
pub fn retry_key(task_id: &str) -> String {
    format!("retry_{}", task_id)
}

// =============================================================================
// Pre-task: validation
// =============================================================================

/// Rejects malformed tasks and tasks with unmet dependencies; passing tasks
/// get a `task_start` audit record.
pub struct TaskValidationHook {
    store: SharedMemoryStore,
}

impl TaskValidationHook {
    pub fn new(store: SharedMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl HookHandler for TaskValidationHook {
    fn name(&self) -> &str {
        "task_validation"
    }

    async fn handle(&self, ctx: &HookContext) -> anyhow::Result<HookOutcome> {
        let task = match &ctx.task {
            Some(task) => task,
            None => return Ok(HookOutcome::reject("no task in context")),
        };

        if task.description.trim().is_empty() {
            return Ok(HookOutcome::reject("task has no description"));
        }

        let mut unmet: Vec<&str> = ctx
            .resolved_dependencies
            .iter()
            .filter(|(_, resolved)| !**resolved)
            .map(|(id, _)| id.as_str())
            .collect();
        if !unmet.is_empty() {
            unmet.sort_unstable();
            return Ok(HookOutcome::reject(format!(
                "unmet dependencies: {}",
                unmet.join(", ")
            )));
        }

        let mut event = CoordinationEvent::new(
            "task_start",
            json!({ "task_id": task.id, "priority": task.priority }),
        );
        if let Some(agent_id) = &ctx.agent_id {
            event = event.with_agent(agent_id.clone());
        }
        self.store.log_event(&event)?;

        info!(task_id = %task.id, priority = ?task.priority, "task starting");
        Ok(HookOutcome::proceed().with_metadata("validated", json!(true)))
    }
}

// =============================================================================
// Post-task: result persistence + workflow memory advance
// =============================================================================

/// Persists a completed task's result and advances durable workflow memory.
pub struct TaskResultHook {
    store: SharedMemoryStore,
    result_ttl: Duration,
}

impl TaskResultHook {
    pub fn new(store: SharedMemoryStore, result_ttl: Duration) -> Self {
        Self { store, result_ttl }
    }
}

#[async_trait]
impl HookHandler for TaskResultHook {
    fn name(&self) -> &str {
        "task_result"
    }

    async fn handle(&self, ctx: &HookContext) -> anyhow::Result<HookOutcome> {
        let task = match &ctx.task {
            Some(task) => task,
            None => return Ok(HookOutcome::proceed()),
        };
        let result = task.result.clone().unwrap_or(serde_json::Value::Null);
        let execution_ms = ctx.execution_ms.unwrap_or(0);

        let key = task_result_key(&task.id);
        self.store
            .store(&key, result.clone(), CATEGORY_TASK_RESULTS, Some(self.result_ttl))?;

        if let Some((workflow_id, step)) = task.workflow_ref() {
            let mut memory = self
                .store
                .get_workflow_memory(&workflow_id)?
                .unwrap_or_else(|| WorkflowMemory::new(workflow_id.clone()));
            memory.record_step(step as u32, result, execution_ms);
            self.store.store_workflow_memory(&memory)?;
            debug!(task_id = %task.id, workflow_id = %workflow_id, step, "workflow memory advanced");
        }

        Ok(HookOutcome::proceed()
            .with_metadata("result_key", json!(key))
            .with_metadata("execution_ms", json!(execution_ms)))
    }
}

// =============================================================================
// Pre-workflow: initialization gate
// =============================================================================

/// Rejects unstartable workflows and seeds their durable memory row.
pub struct WorkflowInitHook {
    store: SharedMemoryStore,
}

impl WorkflowInitHook {
    pub fn new(store: SharedMemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl HookHandler for WorkflowInitHook {
    fn name(&self) -> &str {
        "workflow_init"
    }

    async fn handle(&self, ctx: &HookContext) -> anyhow::Result<HookOutcome> {
        let workflow = match &ctx.workflow {
            Some(workflow) => workflow,
            None => return Ok(HookOutcome::reject("no workflow in context")),
        };

        if workflow.total_steps == 0 {
            return Ok(HookOutcome::reject("workflow has no steps"));
        }
        if ctx.required_agents > ctx.available_agents {
            return Ok(HookOutcome::reject(format!(
                "insufficient agents: need {}, have {}",
                ctx.required_agents, ctx.available_agents
            )));
        }

        if self.store.get_workflow_memory(&workflow.id)?.is_none() {
            self.store
                .store_workflow_memory(&WorkflowMemory::new(workflow.id.clone()))?;
        }
        info!(workflow_id = %workflow.id, total_steps = workflow.total_steps, "workflow starting");
        Ok(HookOutcome::proceed())
    }
}

// =============================================================================
// Error: transient/fatal classification
// =============================================================================

/// Classifies task errors as transient or fatal; transient failures get a
/// durable retry record for external retry machinery to pick up.
pub struct ErrorClassifierHook {
    store: SharedMemoryStore,
}

impl ErrorClassifierHook {
    pub fn new(store: SharedMemoryStore) -> Self {
        Self { store }
    }

    fn is_transient(error: &str) -> bool {
        let lower = error.to_lowercase();
        TRANSIENT_SIGNATURES.iter().any(|sig| lower.contains(sig))
    }
}

#[async_trait]
impl HookHandler for ErrorClassifierHook {
    fn name(&self) -> &str {
        "error_classifier"
    }

    async fn handle(&self, ctx: &HookContext) -> anyhow::Result<HookOutcome> {
        let error = match &ctx.error {
            Some(error) => error,
            None => return Ok(HookOutcome::proceed()),
        };

        if !Self::is_transient(error) {
            return Ok(HookOutcome::proceed().with_metadata("classification", json!("fatal")));
        }

        let mut attempts: u64 = 0;
        if let Some(task) = &ctx.task {
            let key = retry_key(&task.id);
            attempts = self
                .store
                .retrieve(&key, Some(CATEGORY_RETRIES))?
                .and_then(|v| v.get("attempts").and_then(|a| a.as_u64()))
                .unwrap_or(0)
                + 1;
            let next_retry_at =
                chrono::Utc::now() + chrono::Duration::seconds(RETRY_BACKOFF_SECS * attempts as i64);
            self.store.store(
                &key,
                json!({
                    "task_id": task.id,
                    "error": error,
                    "attempts": attempts,
                    "next_retry_at": next_retry_at,
                }),
                CATEGORY_RETRIES,
                None,
            )?;
            debug!(task_id = %task.id, attempts, "transient failure recorded");
        }

        Ok(HookOutcome::proceed()
            .with_metadata("classification", json!("transient"))
            .with_metadata("attempts", json!(attempts)))
    }
}

/// Install the baseline handlers on a pipeline.
pub fn install_baseline(
    pipeline: &super::pipeline::HookPipeline,
    store: &SharedMemoryStore,
    result_ttl: Duration,
) {
    use super::types::HookType;

    pipeline.register(
        HookType::PreTask,
        Arc::new(TaskValidationHook::new(store.clone())),
    );
    pipeline.register(
        HookType::PostTask,
        Arc::new(TaskResultHook::new(store.clone(), result_ttl)),
    );
    pipeline.register(
        HookType::PreWorkflow,
        Arc::new(WorkflowInitHook::new(store.clone())),
    );
    pipeline.register(
        HookType::Error,
        Arc::new(ErrorClassifierHook::new(store.clone())),
    );
}
