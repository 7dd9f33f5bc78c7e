//! Swarm coordinator — agent registration, task assignment, workflow
//! tracking, and conflict resolution.
//!
//! The coordinator owns an in-memory view (tasks, workflows, topology,
//! metrics) behind one mutex with short lock scopes, and delegates durable
//! state to the memory store. Task execution is dispatched fire-and-forget:
//! `assign_task` returns as soon as an agent is acquired, and the spawned
//! assignment drives the pre-task gate, the executor, and the post-task
//! bookkeeping.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::agent::{Agent, AgentId, TaskExecutor};
use crate::config::SwarmConfig;
use crate::events::{EventBus, FilteredReceiver, SwarmEvent};
use crate::hooks::baseline::{install_baseline, task_result_key, CATEGORY_RETRIES, CATEGORY_TASK_RESULTS};
use crate::hooks::{HookContext, HookPipeline, HookType};
use crate::memory::{CoordinationEvent, EventQuery, SharedMemoryStore, StoreError};
use crate::metrics::{MetricsSnapshot, SwarmMetrics};
use crate::pool::{AgentPool, LeasedAgent, PoolError};
use crate::scorer::{AssignmentScorer, BaselineScorer};
use crate::task::{Task, TaskId, TaskStatus};
use crate::topology::{Topology, TopologyKind};
use crate::workflow::{WorkflowId, WorkflowState, WorkflowStatus};

/// Error type for coordinator operations.
#[derive(Debug, thiserror::Error)]
pub enum SwarmError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("agent capacity exceeded (max {max})")]
    CapacityExceeded { max: usize },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("lock poisoned")]
    LockPoisoned,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Result type for coordinator operations.
pub type SwarmResult<T> = Result<T, SwarmError>;

/// Shared reference to a [`SwarmCoordinator`].
pub type SharedCoordinator = Arc<SwarmCoordinator>;

/// Point-in-time view of the whole swarm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmState {
    pub topology: TopologyKind,
    pub agents: Vec<Agent>,
    pub tasks: Vec<Task>,
    pub workflows: Vec<WorkflowState>,
    pub connection_count: usize,
    pub metrics: SwarmMetrics,
}

struct CoordinatorInner {
    tasks: HashMap<TaskId, Task>,
    workflows: HashMap<WorkflowId, WorkflowState>,
    topology: Topology,
    metrics: SwarmMetrics,
}

/// Central coordination engine for a swarm of agents.
pub struct SwarmCoordinator {
    config: SwarmConfig,
    pool: AgentPool,
    memory: SharedMemoryStore,
    hooks: Arc<HookPipeline>,
    bus: EventBus,
    scorer: Option<Arc<dyn AssignmentScorer>>,
    baseline: BaselineScorer,
    inner: Mutex<CoordinatorInner>,
    sweeper: tokio::task::JoinHandle<()>,
}

impl SwarmCoordinator {
    /// Create a coordinator over a memory store, installing the baseline
    /// hook handlers and starting the expiry sweeper.
    pub fn new(config: SwarmConfig, memory: SharedMemoryStore) -> Self {
        let hooks = Arc::new(HookPipeline::new());
        install_baseline(&hooks, &memory, config.task_result_ttl);
        let sweeper = memory.start_sweeper(config.sweep_interval);

        info!(topology = %config.topology, max_agents = config.max_agents, "swarm coordinator created");
        Self {
            bus: EventBus::new(config.event_capacity),
            baseline: BaselineScorer::new(config.assignment_deadline_secs),
            inner: Mutex::new(CoordinatorInner {
                tasks: HashMap::new(),
                workflows: HashMap::new(),
                topology: Topology::new(config.topology, config.connection_density),
                metrics: SwarmMetrics::new(),
            }),
            pool: AgentPool::new(),
            memory,
            hooks,
            scorer: None,
            sweeper,
            config,
        }
    }

    /// Install a primary scorer; the baseline remains the fallback.
    pub fn with_scorer(mut self, scorer: Arc<dyn AssignmentScorer>) -> Self {
        self.scorer = Some(scorer);
        self
    }

    /// Create a shared reference to this coordinator.
    pub fn shared(self) -> SharedCoordinator {
        Arc::new(self)
    }

    fn lock(&self) -> SwarmResult<MutexGuard<'_, CoordinatorInner>> {
        self.inner.lock().map_err(|_| SwarmError::LockPoisoned)
    }

    // =========================================================================
    // Agent lifecycle
    // =========================================================================

    /// Register an agent with its execution body, wiring it into the
    /// topology. Fails when the pool is at capacity or the id is taken.
    pub fn register_agent(
        &self,
        agent: Agent,
        executor: Arc<dyn TaskExecutor>,
    ) -> SwarmResult<Agent> {
        if self.pool.len()? >= self.config.max_agents {
            return Err(SwarmError::CapacityExceeded {
                max: self.config.max_agents,
            });
        }
        // The pool insert is the duplicate-id gate; the topology must not
        // record anything for an id the pool rejected.
        self.pool.add(agent.clone(), executor)?;
        let peers: Vec<Agent> = self
            .pool
            .agents()?
            .into_iter()
            .filter(|a| a.id != agent.id)
            .collect();
        let edges = {
            let mut inner = self.lock()?;
            inner.topology.wire_in(&agent, &peers)
        };

        for edge in &edges {
            self.pool.connect(&edge.from, &edge.to)?;
        }

        let registered = self
            .pool
            .get(&agent.id)?
            .ok_or_else(|| SwarmError::NotFound(agent.id.clone()))?;
        self.memory.update_agent_state(&registered)?;
        self.memory.log_event(
            &CoordinationEvent::new(
                "agent_added",
                json!({
                    "agent_type": registered.agent_type.to_string(),
                    "connections": edges.len(),
                }),
            )
            .with_agent(registered.id.clone()),
        )?;
        self.bus.publish(SwarmEvent::AgentAdded {
            agent_id: registered.id.clone(),
            agent_type: registered.agent_type.to_string(),
        });

        info!(agent_id = %registered.id, edges = edges.len(), "agent registered");
        Ok(registered)
    }

    /// Deregister an agent, dropping its topology edges. Any task it was
    /// executing reverts to pending with the agent removed from its
    /// assignee list.
    pub fn deregister_agent(&self, id: &str) -> SwarmResult<Agent> {
        let agent = self.pool.remove(id)?;
        self.pool.disconnect_all(id)?;

        let reverted: Vec<TaskId> = {
            let mut inner = self.lock()?;
            inner.topology.drop_agent(id);
            let mut reverted = Vec::new();
            for task in inner.tasks.values_mut() {
                if !task.is_terminal() && task.assigned_agents.iter().any(|a| a == id) {
                    task.status = TaskStatus::Pending;
                    task.assigned_agents.retain(|a| a != id);
                    reverted.push(task.id.clone());
                }
            }
            reverted
        };
        for task_id in &reverted {
            warn!(agent_id = id, task_id = %task_id, "in-flight task reverted to pending");
        }

        self.memory.log_event(
            &CoordinationEvent::new("agent_removed", json!({ "reverted_tasks": reverted }))
                .with_agent(id.to_string()),
        )?;
        self.bus.publish(SwarmEvent::AgentRemoved {
            agent_id: id.to_string(),
        });
        Ok(agent)
    }

    // =========================================================================
    // Task assignment and execution
    // =========================================================================

    /// Submit a task for assignment. Returns the task in its post-submission
    /// state: `Assigned` with an agent when one was acquired, otherwise
    /// `Pending` with no assignee. Execution proceeds in the background.
    pub async fn assign_task(self: &Arc<Self>, mut task: Task) -> SwarmResult<Task> {
        if task.description.trim().is_empty() {
            return Err(SwarmError::Validation("task has no description".to_string()));
        }
        if task.id.is_empty() {
            task.id = uuid::Uuid::new_v4().to_string();
        }
        task.status = TaskStatus::Pending;

        {
            let mut inner = self.lock()?;
            inner.metrics.total_tasks += 1;
            inner.tasks.insert(task.id.clone(), task.clone());
        }

        let agents = self.pool.agents()?;
        let candidates = match &self.scorer {
            Some(scorer) => {
                match tokio::time::timeout(self.config.scorer_timeout, scorer.rank(&task, &agents))
                    .await
                {
                    Ok(ranked) => ranked,
                    Err(_) => {
                        warn!(task_id = %task.id, "scorer timed out, using baseline");
                        self.baseline.rank(&task, &agents).await
                    }
                }
            }
            None => self.baseline.rank(&task, &agents).await,
        };

        for candidate in candidates {
            let leased = match self.pool.try_acquire(&candidate.agent_id)? {
                Some(leased) => leased,
                None => continue,
            };

            task.status = TaskStatus::Assigned;
            task.assigned_agents.push(leased.agent.id.clone());
            self.pool.set_current_task(&leased.agent.id, Some(task.id.clone()))?;
            {
                let mut inner = self.lock()?;
                inner.tasks.insert(task.id.clone(), task.clone());
            }

            self.memory.log_event(
                &CoordinationEvent::new(
                    "task_assigned",
                    json!({ "task_id": task.id, "deadline": candidate.deadline }),
                )
                .with_agent(leased.agent.id.clone()),
            )?;
            self.bus.publish(SwarmEvent::TaskAssigned {
                task_id: task.id.clone(),
                agent_id: leased.agent.id.clone(),
            });
            debug!(task_id = %task.id, agent_id = %leased.agent.id, "task assigned");

            let this = Arc::clone(self);
            let dispatched = task.clone();
            tokio::spawn(async move {
                this.execute_assignment(dispatched, leased).await;
            });
            return Ok(task);
        }

        debug!(task_id = %task.id, "no agent available, task pending");
        Ok(task)
    }

    /// Drive one assignment: pre-task gate, executor, post-task bookkeeping.
    /// Runs in a spawned task; failures are recorded, not propagated.
    async fn execute_assignment(self: Arc<Self>, mut task: Task, leased: LeasedAgent) {
        let agent_id = leased.agent.id.clone();

        let gate = HookContext {
            resolved_dependencies: self.resolve_dependencies(&task),
            ..HookContext::new(HookType::PreTask)
                .with_task(task.clone())
                .with_agent(agent_id.clone())
        };
        let verdict = self.hooks.run(&gate).await;
        if !verdict.proceed {
            let reason = verdict.reason.unwrap_or_else(|| "rejected".to_string());
            warn!(task_id = %task.id, agent_id = %agent_id, %reason, "assignment vetoed");
            if let Err(e) = self.revert_vetoed(&task.id, &agent_id, &reason) {
                warn!(task_id = %task.id, error = %e, "failed to revert vetoed task");
            }
            return;
        }

        self.set_task_status(&task.id, TaskStatus::InProgress);
        task.status = TaskStatus::InProgress;

        let started = Instant::now();
        let outcome = leased.executor.execute(&task).await;
        let execution_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                if let Err(e) = self.finish_success(&mut task, &agent_id, result, execution_ms).await {
                    warn!(task_id = %task.id, error = %e, "post-completion bookkeeping failed");
                }
            }
            Err(e) => {
                if let Err(err) = self
                    .finish_failure(&mut task, &agent_id, e.to_string(), execution_ms)
                    .await
                {
                    warn!(task_id = %task.id, error = %err, "post-failure bookkeeping failed");
                }
            }
        }
    }

    fn revert_vetoed(&self, task_id: &str, agent_id: &str, reason: &str) -> SwarmResult<()> {
        {
            let mut inner = self.lock()?;
            if let Some(task) = inner.tasks.get_mut(task_id) {
                task.status = TaskStatus::Pending;
                task.assigned_agents.retain(|a| a != agent_id);
            }
        }
        self.pool.release(agent_id)?;
        self.memory.log_event(
            &CoordinationEvent::new(
                "task_vetoed",
                json!({ "task_id": task_id, "reason": reason }),
            )
            .with_agent(agent_id.to_string()),
        )?;
        Ok(())
    }

    async fn finish_success(
        &self,
        task: &mut Task,
        agent_id: &str,
        result: serde_json::Value,
        execution_ms: u64,
    ) -> SwarmResult<()> {
        // Deregistration mid-flight reverts the task to pending; if the
        // agent is gone the result is dropped and the task stays there.
        let agent = match self.pool.record_completion(agent_id, execution_ms, true) {
            Ok(agent) => agent,
            Err(PoolError::NotFound(_)) => {
                warn!(task_id = %task.id, agent_id, "agent deregistered mid-flight, result dropped");
                self.set_task_status(&task.id, TaskStatus::Pending);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        self.memory.update_agent_state(&agent)?;

        task.status = TaskStatus::Completed;
        task.result = Some(result.clone());
        task.finished_at = Some(Utc::now());
        {
            let mut inner = self.lock()?;
            inner.tasks.insert(task.id.clone(), task.clone());
            inner.metrics.record_task_completed(execution_ms);
        }

        // Post-task handlers persist the result and advance durable
        // workflow memory.
        let ctx = HookContext::new(HookType::PostTask)
            .with_task(task.clone())
            .with_agent(agent_id.to_string())
            .with_execution_ms(execution_ms);
        self.hooks.run(&ctx).await;

        self.memory.log_event(
            &CoordinationEvent::new(
                "task_completed",
                json!({ "task_id": task.id, "execution_ms": execution_ms }),
            )
            .with_agent(agent_id.to_string()),
        )?;
        self.bus.publish(SwarmEvent::TaskCompleted {
            task_id: task.id.clone(),
            agent_id: agent_id.to_string(),
            execution_ms,
        });
        info!(task_id = %task.id, agent_id, execution_ms, "task completed");

        if let Some((workflow_id, step)) = task.workflow_ref() {
            self.record_workflow_step(&workflow_id, step, result).await?;
        }
        Ok(())
    }

    async fn finish_failure(
        &self,
        task: &mut Task,
        agent_id: &str,
        error: String,
        execution_ms: u64,
    ) -> SwarmResult<()> {
        let agent = match self.pool.record_completion(agent_id, execution_ms, false) {
            Ok(agent) => agent,
            Err(PoolError::NotFound(_)) => {
                warn!(task_id = %task.id, agent_id, "agent deregistered mid-flight, failure dropped");
                self.set_task_status(&task.id, TaskStatus::Pending);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        self.memory.update_agent_state(&agent)?;

        task.status = TaskStatus::Failed;
        task.error = Some(error.clone());
        task.finished_at = Some(Utc::now());
        {
            let mut inner = self.lock()?;
            inner.tasks.insert(task.id.clone(), task.clone());
            inner.metrics.record_task_failed();
        }

        // The error classifier records a retry entry for transient failures.
        let ctx = HookContext::new(HookType::Error)
            .with_task(task.clone())
            .with_agent(agent_id.to_string())
            .with_error(error.clone());
        self.hooks.run(&ctx).await;

        self.memory.log_event(
            &CoordinationEvent::new(
                "task_failed",
                json!({ "task_id": task.id, "error": error }),
            )
            .with_agent(agent_id.to_string()),
        )?;
        self.bus.publish(SwarmEvent::TaskFailed {
            task_id: task.id.clone(),
            agent_id: agent_id.to_string(),
            error: error.clone(),
        });
        warn!(task_id = %task.id, agent_id, %error, "task failed");
        Ok(())
    }

    fn set_task_status(&self, task_id: &str, status: TaskStatus) {
        if let Ok(mut inner) = self.inner.lock() {
            if let Some(task) = inner.tasks.get_mut(task_id) {
                task.status = status;
            }
        }
    }

    /// Whether each declared dependency has a visible result, either in the
    /// in-memory task table or as a persisted result row.
    fn resolve_dependencies(&self, task: &Task) -> HashMap<TaskId, bool> {
        let mut resolved = HashMap::new();
        for dep in &task.dependencies {
            let in_table = self
                .inner
                .lock()
                .ok()
                .and_then(|inner| {
                    inner
                        .tasks
                        .get(dep)
                        .map(|t| t.status == TaskStatus::Completed)
                })
                .unwrap_or(false);
            let durable = !in_table
                && self
                    .memory
                    .retrieve(&task_result_key(dep), Some(CATEGORY_TASK_RESULTS))
                    .ok()
                    .flatten()
                    .is_some();
            resolved.insert(dep.clone(), in_table || durable);
        }
        resolved
    }

    // =========================================================================
    // Workflows
    // =========================================================================

    /// Start a workflow after the pre-workflow gate passes. A workflow with
    /// no assigned agents still needs one available agent to start.
    pub async fn start_workflow(
        &self,
        id: impl Into<WorkflowId>,
        total_steps: usize,
        assigned_agents: Vec<AgentId>,
    ) -> SwarmResult<WorkflowState> {
        let mut workflow = WorkflowState::new(id, total_steps);
        workflow.assigned_agents = assigned_agents;

        let mut ctx = HookContext::new(HookType::PreWorkflow).with_workflow(workflow.clone());
        ctx.required_agents = workflow.assigned_agents.len().max(1);
        ctx.available_agents = self.pool.available_count()?;
        let verdict = self.hooks.run(&ctx).await;
        if !verdict.proceed {
            let reason = verdict.reason.unwrap_or_else(|| "rejected".to_string());
            return Err(SwarmError::Validation(reason));
        }

        {
            let mut inner = self.lock()?;
            inner.metrics.total_workflows += 1;
            inner.metrics.active_workflows += 1;
            inner.workflows.insert(workflow.id.clone(), workflow.clone());
        }

        self.memory.log_event(
            &CoordinationEvent::new("workflow_started", json!({ "total_steps": total_steps }))
                .with_workflow(workflow.id.clone()),
        )?;
        self.bus.publish(SwarmEvent::WorkflowStarted {
            workflow_id: workflow.id.clone(),
            total_steps,
        });
        info!(workflow_id = %workflow.id, total_steps, "workflow started");
        Ok(workflow)
    }

    /// Record one step result against an active workflow. The workflow
    /// completes only once every step index holds a result, whatever order
    /// they arrive in.
    pub async fn record_workflow_step(
        &self,
        workflow_id: &str,
        step: usize,
        result: serde_json::Value,
    ) -> SwarmResult<()> {
        let completed = {
            let mut inner = self.lock()?;
            let workflow = inner
                .workflows
                .get_mut(workflow_id)
                .ok_or_else(|| SwarmError::NotFound(workflow_id.to_string()))?;
            if workflow.status != WorkflowStatus::Active {
                return Ok(());
            }
            workflow.record_step(step, result);
            if workflow.is_complete() {
                workflow.status = WorkflowStatus::Completed;
                workflow.completed_at = Some(Utc::now());
                let duration_ms = workflow.duration_ms();
                inner.metrics.record_workflow_completed(duration_ms);
                Some(duration_ms)
            } else {
                None
            }
        };

        if let Some(duration_ms) = completed {
            self.memory.log_event(
                &CoordinationEvent::new(
                    "workflow_completed",
                    json!({ "duration_ms": duration_ms }),
                )
                .with_workflow(workflow_id.to_string()),
            )?;
            self.bus.publish(SwarmEvent::WorkflowCompleted {
                workflow_id: workflow_id.to_string(),
                duration_ms,
            });
            self.run_post_workflow(workflow_id).await;
            info!(workflow_id, duration_ms, "workflow completed");
        }
        Ok(())
    }

    async fn run_post_workflow(&self, workflow_id: &str) {
        let workflow = self
            .inner
            .lock()
            .ok()
            .and_then(|inner| inner.workflows.get(workflow_id).cloned());
        if let Some(workflow) = workflow {
            let ctx = HookContext::new(HookType::PostWorkflow).with_workflow(workflow);
            self.hooks.run(&ctx).await;
        }
    }

    /// Mark a workflow failed, ending its run.
    pub async fn fail_workflow(&self, workflow_id: &str, error: impl Into<String>) -> SwarmResult<()> {
        let error = error.into();
        {
            let mut inner = self.lock()?;
            let workflow = inner
                .workflows
                .get_mut(workflow_id)
                .ok_or_else(|| SwarmError::NotFound(workflow_id.to_string()))?;
            if workflow.status != WorkflowStatus::Active {
                return Ok(());
            }
            workflow.status = WorkflowStatus::Failed;
            workflow.completed_at = Some(Utc::now());
            inner.metrics.record_workflow_failed();
        }

        self.memory.log_event(
            &CoordinationEvent::new("workflow_failed", json!({ "error": error }))
                .with_workflow(workflow_id.to_string()),
        )?;
        self.bus.publish(SwarmEvent::WorkflowFailed {
            workflow_id: workflow_id.to_string(),
            error,
        });
        self.run_post_workflow(workflow_id).await;
        Ok(())
    }

    // =========================================================================
    // Conflict resolution
    // =========================================================================

    /// Resolve a conflict between tasks by rule, bracketed by the decision
    /// hook points and recorded in the event log.
    pub async fn resolve_conflict(
        &self,
        conflict_type: &str,
        involved: &[TaskId],
    ) -> SwarmResult<String> {
        let pre = HookContext::new(HookType::PreDecision);
        let verdict = self.hooks.run(&pre).await;
        if !verdict.proceed {
            return Err(SwarmError::Validation(
                verdict.reason.unwrap_or_else(|| "decision rejected".to_string()),
            ));
        }

        let decision = match conflict_type {
            "resource" => "assign to highest priority task",
            "scheduling" => "reschedule lower priority tasks",
            "dependency" => "reorder by dependency topology",
            _ => "manual intervention required",
        }
        .to_string();

        self.memory.log_event(&CoordinationEvent::new(
            "conflict_resolved",
            json!({
                "conflict_type": conflict_type,
                "involved": involved,
                "decision": decision,
            }),
        ))?;
        self.hooks.run(&HookContext::new(HookType::PostDecision)).await;

        info!(conflict_type, %decision, "conflict resolved");
        Ok(decision)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    /// Current metrics combined with live pool and task-table state.
    pub fn get_metrics(&self) -> SwarmResult<MetricsSnapshot> {
        let (metrics, pending) = {
            let inner = self.lock()?;
            let pending = inner
                .tasks
                .values()
                .filter(|t| t.status == TaskStatus::Pending)
                .count();
            (inner.metrics.clone(), pending)
        };
        Ok(MetricsSnapshot::build(
            metrics,
            self.pool.busy_count()?,
            self.pool.len()?,
            pending,
        ))
    }

    /// Full point-in-time view of the swarm.
    pub fn get_state(&self) -> SwarmResult<SwarmState> {
        let inner = self.lock()?;
        Ok(SwarmState {
            topology: inner.topology.kind(),
            agents: self.pool.agents()?,
            tasks: inner.tasks.values().cloned().collect(),
            workflows: inner.workflows.values().cloned().collect(),
            connection_count: inner.topology.connections().len(),
            metrics: inner.metrics.clone(),
        })
    }

    /// Pending retry records written by the error classifier, newest first.
    pub fn retry_queue(&self) -> SwarmResult<Vec<serde_json::Value>> {
        Ok(self
            .memory
            .list(Some(CATEGORY_RETRIES), None)?
            .into_iter()
            .map(|e| e.value)
            .collect())
    }

    /// Snapshot one task.
    pub fn get_task(&self, id: &str) -> SwarmResult<Option<Task>> {
        Ok(self.lock()?.tasks.get(id).cloned())
    }

    /// Snapshot one workflow.
    pub fn get_workflow(&self, id: &str) -> SwarmResult<Option<WorkflowState>> {
        Ok(self.lock()?.workflows.get(id).cloned())
    }

    /// Subscribe to lifecycle notifications.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SwarmEvent> {
        self.bus.subscribe()
    }

    /// Subscribe to notifications passing a predicate, e.g. one workflow's
    /// events only.
    pub fn subscribe_filtered<F>(&self, filter: F) -> FilteredReceiver<F>
    where
        F: Fn(&SwarmEvent) -> bool,
    {
        self.bus.subscribe_filtered(filter)
    }

    /// Query the durable event log.
    pub fn events(&self, query: &EventQuery) -> SwarmResult<Vec<CoordinationEvent>> {
        Ok(self.memory.events(query)?)
    }

    /// The hook pipeline, for registering custom handlers.
    pub fn hooks(&self) -> &HookPipeline {
        &self.hooks
    }

    /// The underlying memory store.
    pub fn memory(&self) -> &SharedMemoryStore {
        &self.memory
    }

    /// The agent pool.
    pub fn pool(&self) -> &AgentPool {
        &self.pool
    }

    /// Stop background work. Also happens on drop.
    pub fn shutdown(&self) {
        self.sweeper.abort();
    }
}

impl Drop for SwarmCoordinator {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}
