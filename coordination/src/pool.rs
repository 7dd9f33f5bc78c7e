//! Agent pool — registration, exclusive acquisition, and release.
//!
//! The pool is the single mutual-exclusion point for agent state: an agent
//! is acquirable iff it is `Idle`, and acquisition flips it to `Busy` under
//! the same lock, so two concurrent acquisitions can never hand out the same
//! agent. The lock is never held across an await point.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::agent::{Agent, AgentId, AgentStatus, AgentType, TaskExecutor};
use crate::task::TaskId;

/// Error type for pool operations.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("agent already registered: {0}")]
    DuplicateAgent(AgentId),

    #[error("agent not found: {0}")]
    NotFound(AgentId),

    #[error("lock poisoned")]
    LockPoisoned,
}

/// Result type for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

/// An exclusively acquired agent plus its execution body. The caller must
/// hand the agent back via [`AgentPool::release`] or
/// [`AgentPool::record_completion`].
pub struct LeasedAgent {
    pub agent: Agent,
    pub executor: Arc<dyn TaskExecutor>,
}

struct PoolInner {
    agents: HashMap<AgentId, Agent>,
    executors: HashMap<AgentId, Arc<dyn TaskExecutor>>,
}

/// Registry of live agents with exclusive-acquisition semantics.
pub struct AgentPool {
    inner: Mutex<PoolInner>,
}

impl AgentPool {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(PoolInner {
                agents: HashMap::new(),
                executors: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> PoolResult<MutexGuard<'_, PoolInner>> {
        self.inner.lock().map_err(|_| PoolError::LockPoisoned)
    }

    /// Register an agent with its execution body. Ids must be unique.
    pub fn add(&self, agent: Agent, executor: Arc<dyn TaskExecutor>) -> PoolResult<()> {
        let mut inner = self.lock()?;
        if inner.agents.contains_key(&agent.id) {
            return Err(PoolError::DuplicateAgent(agent.id));
        }
        debug!(agent_id = %agent.id, agent_type = %agent.agent_type, "agent added to pool");
        inner.executors.insert(agent.id.clone(), executor);
        inner.agents.insert(agent.id.clone(), agent);
        Ok(())
    }

    /// Remove an agent, returning its final state.
    pub fn remove(&self, id: &str) -> PoolResult<Agent> {
        let mut inner = self.lock()?;
        inner.executors.remove(id);
        inner
            .agents
            .remove(id)
            .ok_or_else(|| PoolError::NotFound(id.to_string()))
    }

    /// Acquire a specific agent if it is idle right now.
    pub fn try_acquire(&self, id: &str) -> PoolResult<Option<LeasedAgent>> {
        let mut inner = self.lock()?;
        let available = inner.agents.get(id).map(Agent::is_available).unwrap_or(false);
        if !available {
            return Ok(None);
        }
        Ok(Self::lease(&mut inner, &id.to_string()))
    }

    /// Acquire any idle agent, optionally restricted to a type. Returns
    /// `None` when no matching agent is idle.
    pub fn acquire_available(&self, agent_type: Option<&AgentType>) -> PoolResult<Option<LeasedAgent>> {
        let mut inner = self.lock()?;
        let id = inner
            .agents
            .values()
            .filter(|a| a.is_available())
            .filter(|a| agent_type.map(|t| &a.agent_type == t).unwrap_or(true))
            .map(|a| a.id.clone())
            .next();
        match id {
            Some(id) => Ok(Self::lease(&mut inner, &id)),
            None => Ok(None),
        }
    }

    fn lease(inner: &mut PoolInner, id: &AgentId) -> Option<LeasedAgent> {
        let executor = inner.executors.get(id)?.clone();
        let agent = inner.agents.get_mut(id)?;
        agent.status = AgentStatus::Busy;
        agent.load = 1.0;
        agent.touch();
        Some(LeasedAgent {
            agent: agent.clone(),
            executor,
        })
    }

    /// Return an agent to the idle set without recording a finished task
    /// (used when an assignment is vetoed before execution).
    pub fn release(&self, id: &str) -> PoolResult<Agent> {
        let mut inner = self.lock()?;
        let agent = inner
            .agents
            .get_mut(id)
            .ok_or_else(|| PoolError::NotFound(id.to_string()))?;
        agent.status = AgentStatus::Idle;
        agent.current_task = None;
        agent.load = 0.0;
        agent.touch();
        Ok(agent.clone())
    }

    /// Record a finished task for an agent and return it to the idle set,
    /// yielding the updated state for snapshotting.
    pub fn record_completion(&self, id: &str, execution_ms: u64, success: bool) -> PoolResult<Agent> {
        let mut inner = self.lock()?;
        let agent = inner
            .agents
            .get_mut(id)
            .ok_or_else(|| PoolError::NotFound(id.to_string()))?;
        agent.performance.record(execution_ms, success);
        agent.status = AgentStatus::Idle;
        agent.current_task = None;
        agent.load = 0.0;
        agent.touch();
        Ok(agent.clone())
    }

    /// Record which task an agent is working on.
    pub fn set_current_task(&self, id: &str, task: Option<TaskId>) -> PoolResult<()> {
        let mut inner = self.lock()?;
        let agent = inner
            .agents
            .get_mut(id)
            .ok_or_else(|| PoolError::NotFound(id.to_string()))?;
        agent.current_task = task;
        agent.touch();
        Ok(())
    }

    /// Add a topology adjacency on both endpoints.
    pub fn connect(&self, a: &str, b: &str) -> PoolResult<()> {
        let mut inner = self.lock()?;
        if let Some(agent) = inner.agents.get_mut(a) {
            if !agent.connections.iter().any(|c| c == b) {
                agent.connections.push(b.to_string());
            }
        }
        if let Some(agent) = inner.agents.get_mut(b) {
            if !agent.connections.iter().any(|c| c == a) {
                agent.connections.push(a.to_string());
            }
        }
        Ok(())
    }

    /// Drop the adjacency to a removed agent from every survivor.
    pub fn disconnect_all(&self, id: &str) -> PoolResult<()> {
        let mut inner = self.lock()?;
        for agent in inner.agents.values_mut() {
            agent.connections.retain(|c| c != id);
        }
        Ok(())
    }

    /// Snapshot one agent's state.
    pub fn get(&self, id: &str) -> PoolResult<Option<Agent>> {
        Ok(self.lock()?.agents.get(id).cloned())
    }

    /// Snapshot all agents.
    pub fn agents(&self) -> PoolResult<Vec<Agent>> {
        Ok(self.lock()?.agents.values().cloned().collect())
    }

    /// Snapshot idle agents.
    pub fn idle_agents(&self) -> PoolResult<Vec<Agent>> {
        Ok(self
            .lock()?
            .agents
            .values()
            .filter(|a| a.is_available())
            .cloned()
            .collect())
    }

    pub fn len(&self) -> PoolResult<usize> {
        Ok(self.lock()?.agents.len())
    }

    pub fn is_empty(&self) -> PoolResult<bool> {
        Ok(self.lock()?.agents.is_empty())
    }

    pub fn available_count(&self) -> PoolResult<usize> {
        Ok(self
            .lock()?
            .agents
            .values()
            .filter(|a| a.is_available())
            .count())
    }

    /// Number of agents currently executing a task.
    pub fn busy_count(&self) -> PoolResult<usize> {
        Ok(self
            .lock()?
            .agents
            .values()
            .filter(|a| a.status == AgentStatus::Busy)
            .count())
    }
}

impl Default for AgentPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::FnExecutor;
    use serde_json::json;

    fn noop_executor() -> Arc<dyn TaskExecutor> {
        Arc::new(FnExecutor(
            |_task: &crate::task::Task| -> anyhow::Result<serde_json::Value> { Ok(json!(null)) },
        ))
    }

    fn pool_with(ids: &[&str]) -> AgentPool {
        let pool = AgentPool::new();
        for id in ids {
            pool.add(Agent::new(*id, AgentType::Researcher), noop_executor())
                .unwrap();
        }
        pool
    }

    #[test]
    fn test_add_rejects_duplicate() {
        let pool = pool_with(&["a1"]);
        let err = pool
            .add(Agent::new("a1", AgentType::Generator), noop_executor())
            .unwrap_err();
        assert!(matches!(err, PoolError::DuplicateAgent(id) if id == "a1"));
    }

    #[test]
    fn test_acquire_flips_to_busy() {
        let pool = pool_with(&["a1"]);
        let leased = pool.try_acquire("a1").unwrap().unwrap();
        assert_eq!(leased.agent.status, AgentStatus::Busy);

        // Second acquisition of the same agent fails.
        assert!(pool.try_acquire("a1").unwrap().is_none());
        assert_eq!(pool.available_count().unwrap(), 0);
        assert_eq!(pool.busy_count().unwrap(), 1);
    }

    #[test]
    fn test_acquire_available_exhausts_pool() {
        let pool = pool_with(&["a1", "a2"]);
        let first = pool.acquire_available(None).unwrap();
        let second = pool.acquire_available(None).unwrap();
        assert!(first.is_some());
        assert!(second.is_some());
        assert_ne!(first.unwrap().agent.id, second.unwrap().agent.id);
        assert!(pool.acquire_available(None).unwrap().is_none());
    }

    #[test]
    fn test_acquire_available_respects_type() {
        let pool = AgentPool::new();
        pool.add(Agent::new("r1", AgentType::Researcher), noop_executor())
            .unwrap();
        pool.add(Agent::new("g1", AgentType::Generator), noop_executor())
            .unwrap();

        let leased = pool
            .acquire_available(Some(&AgentType::Generator))
            .unwrap()
            .unwrap();
        assert_eq!(leased.agent.id, "g1");
        assert!(pool
            .acquire_available(Some(&AgentType::Generator))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_release_returns_agent_to_idle() {
        let pool = pool_with(&["a1"]);
        pool.try_acquire("a1").unwrap().unwrap();
        pool.release("a1").unwrap();
        assert!(pool.try_acquire("a1").unwrap().is_some());
    }

    #[test]
    fn test_record_completion_updates_performance() {
        let pool = pool_with(&["a1"]);
        pool.try_acquire("a1").unwrap().unwrap();
        let agent = pool.record_completion("a1", 150, true).unwrap();
        assert_eq!(agent.status, AgentStatus::Idle);
        assert_eq!(agent.performance.tasks_completed, 1);
        assert!((agent.performance.avg_execution_ms - 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_remove_missing_agent() {
        let pool = pool_with(&["a1"]);
        assert!(matches!(pool.remove("nope"), Err(PoolError::NotFound(_))));
        assert!(pool.remove("a1").is_ok());
        assert!(pool.is_empty().unwrap());
    }

    #[test]
    fn test_connect_is_bidirectional_and_deduped() {
        let pool = pool_with(&["a1", "a2"]);
        pool.connect("a1", "a2").unwrap();
        pool.connect("a1", "a2").unwrap();
        assert_eq!(pool.get("a1").unwrap().unwrap().connections, vec!["a2"]);
        assert_eq!(pool.get("a2").unwrap().unwrap().connections, vec!["a1"]);

        pool.disconnect_all("a2").unwrap();
        assert!(pool.get("a1").unwrap().unwrap().connections.is_empty());
    }
}
