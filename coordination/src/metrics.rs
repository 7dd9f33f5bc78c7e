//! Swarm-level counters and derived metrics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Monotonic counters maintained by the coordinator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwarmMetrics {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub failed_tasks: u64,
    pub total_workflows: u64,
    pub active_workflows: u64,
    pub completed_workflows: u64,
    /// Running average over completed tasks, in milliseconds.
    pub avg_task_duration_ms: f64,
    /// Running average over completed workflows, in milliseconds.
    pub avg_workflow_duration_ms: f64,
    /// `completed_workflows / total_workflows`; 1.0 before any workflow.
    pub success_rate: f64,
    pub started_at: DateTime<Utc>,
}

impl SwarmMetrics {
    pub fn new() -> Self {
        Self {
            total_tasks: 0,
            completed_tasks: 0,
            failed_tasks: 0,
            total_workflows: 0,
            active_workflows: 0,
            completed_workflows: 0,
            avg_task_duration_ms: 0.0,
            avg_workflow_duration_ms: 0.0,
            success_rate: 1.0,
            started_at: Utc::now(),
        }
    }

    /// Fold one completed task into the counters.
    pub fn record_task_completed(&mut self, duration_ms: u64) {
        self.completed_tasks += 1;
        let n = self.completed_tasks as f64;
        self.avg_task_duration_ms =
            (self.avg_task_duration_ms * (n - 1.0) + duration_ms as f64) / n;
    }

    pub fn record_task_failed(&mut self) {
        self.failed_tasks += 1;
    }

    /// Fold one completed workflow into the counters.
    pub fn record_workflow_completed(&mut self, duration_ms: u64) {
        self.completed_workflows += 1;
        self.active_workflows = self.active_workflows.saturating_sub(1);
        let n = self.completed_workflows as f64;
        self.avg_workflow_duration_ms =
            (self.avg_workflow_duration_ms * (n - 1.0) + duration_ms as f64) / n;
        self.refresh_success_rate();
    }

    pub fn record_workflow_failed(&mut self) {
        self.active_workflows = self.active_workflows.saturating_sub(1);
        self.refresh_success_rate();
    }

    fn refresh_success_rate(&mut self) {
        self.success_rate = if self.total_workflows == 0 {
            1.0
        } else {
            self.completed_workflows as f64 / self.total_workflows as f64
        };
    }
}

impl Default for SwarmMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time metrics view combining counters with live pool state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    #[serde(flatten)]
    pub metrics: SwarmMetrics,
    /// `busy_agents / total_agents`; 0.0 with an empty pool.
    pub agent_utilization: f64,
    /// Completed tasks per minute since start.
    pub throughput_per_min: f64,
    pub pending_tasks: usize,
    pub busy_agents: usize,
    pub total_agents: usize,
}

impl MetricsSnapshot {
    pub fn build(
        metrics: SwarmMetrics,
        busy_agents: usize,
        total_agents: usize,
        pending_tasks: usize,
    ) -> Self {
        let agent_utilization = if total_agents == 0 {
            0.0
        } else {
            busy_agents as f64 / total_agents as f64
        };
        let elapsed_ms = (Utc::now() - metrics.started_at).num_milliseconds().max(1) as f64;
        let throughput_per_min = metrics.completed_tasks as f64 / elapsed_ms * 60_000.0;
        Self {
            metrics,
            agent_utilization,
            throughput_per_min,
            pending_tasks,
            busy_agents,
            total_agents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_duration_running_average() {
        let mut metrics = SwarmMetrics::new();
        metrics.record_task_completed(100);
        metrics.record_task_completed(300);
        assert_eq!(metrics.completed_tasks, 2);
        assert!((metrics.avg_task_duration_ms - 200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_workflow_success_rate() {
        let mut metrics = SwarmMetrics::new();
        assert_eq!(metrics.success_rate, 1.0);

        metrics.total_workflows = 2;
        metrics.active_workflows = 2;
        metrics.record_workflow_completed(500);
        assert!((metrics.success_rate - 0.5).abs() < f64::EPSILON);
        assert_eq!(metrics.active_workflows, 1);

        metrics.record_workflow_failed();
        assert_eq!(metrics.active_workflows, 0);
        assert!((metrics.success_rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snapshot_utilization() {
        let snapshot = MetricsSnapshot::build(SwarmMetrics::new(), 2, 4, 1);
        assert!((snapshot.agent_utilization - 0.5).abs() < f64::EPSILON);
        assert_eq!(snapshot.pending_tasks, 1);

        let empty = MetricsSnapshot::build(SwarmMetrics::new(), 0, 0, 0);
        assert_eq!(empty.agent_utilization, 0.0);
    }
}
