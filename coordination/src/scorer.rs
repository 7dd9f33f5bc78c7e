//! Assignment scoring — pluggable ranking of candidate agents for a task.
//!
//! Scorers are advisory: the coordinator still acquires each candidate
//! through the pool, so a stale ranking can never double-book an agent. An
//! empty ranking means "leave the task pending", never an error.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::agent::{Agent, AgentId};
use crate::task::{Task, TaskId};

/// Metadata key listing capability tags a task wants from its agent.
pub const META_REQUIRED_CAPABILITIES: &str = "required_capabilities";

/// Default deadline granted to an assignment, in seconds.
pub const DEFAULT_DEADLINE_SECS: i64 = 300;

/// One ranked assignment proposal.
#[derive(Debug, Clone)]
pub struct AssignmentCandidate {
    pub agent_id: AgentId,
    pub task_id: TaskId,
    /// Instant by which the assignment should have finished.
    pub deadline: DateTime<Utc>,
}

/// Ranks available agents for a task, best candidate first.
#[async_trait]
pub trait AssignmentScorer: Send + Sync {
    async fn rank(&self, task: &Task, agents: &[Agent]) -> Vec<AssignmentCandidate>;
}

/// Fallback scorer: picks the first available agent, no weighing.
///
/// Also used when a primary scorer times out or returns nothing useful.
pub struct BaselineScorer {
    deadline_secs: i64,
}

impl BaselineScorer {
    pub fn new(deadline_secs: i64) -> Self {
        Self { deadline_secs }
    }
}

impl Default for BaselineScorer {
    fn default() -> Self {
        Self::new(DEFAULT_DEADLINE_SECS)
    }
}

#[async_trait]
impl AssignmentScorer for BaselineScorer {
    async fn rank(&self, task: &Task, agents: &[Agent]) -> Vec<AssignmentCandidate> {
        agents
            .iter()
            .find(|a| a.is_available())
            .map(|a| AssignmentCandidate {
                agent_id: a.id.clone(),
                task_id: task.id.clone(),
                deadline: Utc::now() + Duration::seconds(self.deadline_secs),
            })
            .into_iter()
            .collect()
    }
}

/// Scorer weighing capability overlap, success history, and current load.
pub struct CapabilityScorer {
    deadline_secs: i64,
}

impl CapabilityScorer {
    pub fn new(deadline_secs: i64) -> Self {
        Self { deadline_secs }
    }

    /// Fraction of wanted capabilities the agent carries. With no explicit
    /// requirement, capabilities are matched against the task description.
    fn capability_score(task: &Task, agent: &Agent) -> f64 {
        let required: Vec<String> = task
            .metadata
            .get(META_REQUIRED_CAPABILITIES)
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str())
                    .map(|s| s.to_lowercase())
                    .collect()
            })
            .unwrap_or_default();

        if !required.is_empty() {
            let have = required
                .iter()
                .filter(|r| agent.capabilities.iter().any(|c| c.to_lowercase() == **r))
                .count();
            return have as f64 / required.len() as f64;
        }

        if agent.capabilities.is_empty() {
            return 0.5;
        }
        let description = task.description.to_lowercase();
        let mentioned = agent
            .capabilities
            .iter()
            .filter(|c| description.contains(&c.to_lowercase()))
            .count();
        mentioned as f64 / agent.capabilities.len() as f64
    }

    fn score(task: &Task, agent: &Agent) -> f64 {
        let capability = Self::capability_score(task, agent);
        let history = agent.performance.success_rate;
        let idleness = 1.0 - agent.load as f64;
        0.4 * capability + 0.3 * history + 0.3 * idleness
    }
}

impl Default for CapabilityScorer {
    fn default() -> Self {
        Self::new(DEFAULT_DEADLINE_SECS)
    }
}

#[async_trait]
impl AssignmentScorer for CapabilityScorer {
    async fn rank(&self, task: &Task, agents: &[Agent]) -> Vec<AssignmentCandidate> {
        let deadline = Utc::now() + Duration::seconds(self.deadline_secs);
        let mut scored: Vec<(f64, &Agent)> = agents
            .iter()
            .filter(|a| a.is_available())
            .map(|a| (Self::score(task, a), a))
            .collect();
        // Descending score, agent id as the deterministic tie-break.
        scored.sort_by(|(sa, a), (sb, b)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored
            .into_iter()
            .map(|(_, a)| AssignmentCandidate {
                agent_id: a.id.clone(),
                task_id: task.id.clone(),
                deadline,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentStatus, AgentType};
    use crate::task::TaskPriority;
    use serde_json::json;

    #[tokio::test]
    async fn test_baseline_picks_first_available() {
        let mut busy = Agent::new("busy", AgentType::Researcher);
        busy.status = AgentStatus::Busy;
        let idle = Agent::new("idle", AgentType::Researcher);

        let task = Task::new("anything", TaskPriority::Medium);
        let ranked = BaselineScorer::default()
            .rank(&task, &[busy, idle])
            .await;
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].agent_id, "idle");
        assert!(ranked[0].deadline > Utc::now());
    }

    #[tokio::test]
    async fn test_baseline_empty_when_none_available() {
        let mut busy = Agent::new("busy", AgentType::Researcher);
        busy.status = AgentStatus::Busy;
        let task = Task::new("anything", TaskPriority::Medium);
        assert!(BaselineScorer::default().rank(&task, &[busy]).await.is_empty());
    }

    #[tokio::test]
    async fn test_capability_scorer_prefers_matching_agent() {
        let searcher = Agent::new("searcher", AgentType::Researcher)
            .with_capabilities(["search", "summarize"]);
        let coder = Agent::new("coder", AgentType::Generator).with_capabilities(["codegen"]);

        let task = Task::new("index sources", TaskPriority::Medium).with_metadata(
            META_REQUIRED_CAPABILITIES,
            json!(["search"]),
        );
        let ranked = CapabilityScorer::default()
            .rank(&task, &[coder, searcher])
            .await;
        assert_eq!(ranked[0].agent_id, "searcher");
        assert_eq!(ranked.len(), 2);
    }

    #[tokio::test]
    async fn test_capability_scorer_weighs_success_history() {
        let mut flaky = Agent::new("flaky", AgentType::Analyst);
        flaky.performance.record(100, false);
        flaky.performance.record(100, false);
        let steady = Agent::new("steady", AgentType::Analyst);

        let task = Task::new("crunch numbers", TaskPriority::High);
        let ranked = CapabilityScorer::default()
            .rank(&task, &[flaky, steady])
            .await;
        assert_eq!(ranked[0].agent_id, "steady");
    }

    #[tokio::test]
    async fn test_capability_scorer_skips_unavailable() {
        let mut offline = Agent::new("off", AgentType::Analyst);
        offline.status = AgentStatus::Offline;
        let task = Task::new("work", TaskPriority::Low);
        assert!(CapabilityScorer::default()
            .rank(&task, &[offline])
            .await
            .is_empty());
    }
}
