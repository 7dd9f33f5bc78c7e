//! In-process event bus for swarm lifecycle notifications.
//!
//! Built on a tokio broadcast channel: publishing succeeds whether or not
//! anyone is listening, and slow subscribers lag rather than block the
//! coordinator.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::agent::AgentId;
use crate::task::TaskId;
use crate::workflow::WorkflowId;

/// Default broadcast channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// A swarm lifecycle event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SwarmEvent {
    AgentAdded {
        agent_id: AgentId,
        agent_type: String,
    },
    AgentRemoved {
        agent_id: AgentId,
    },
    TaskAssigned {
        task_id: TaskId,
        agent_id: AgentId,
    },
    TaskCompleted {
        task_id: TaskId,
        agent_id: AgentId,
        execution_ms: u64,
    },
    TaskFailed {
        task_id: TaskId,
        agent_id: AgentId,
        error: String,
    },
    WorkflowStarted {
        workflow_id: WorkflowId,
        total_steps: usize,
    },
    WorkflowCompleted {
        workflow_id: WorkflowId,
        duration_ms: u64,
    },
    WorkflowFailed {
        workflow_id: WorkflowId,
        error: String,
    },
}

impl SwarmEvent {
    /// Stable string tag for logging and filtering.
    pub fn event_type(&self) -> &'static str {
        match self {
            SwarmEvent::AgentAdded { .. } => "agent:added",
            SwarmEvent::AgentRemoved { .. } => "agent:removed",
            SwarmEvent::TaskAssigned { .. } => "task:assigned",
            SwarmEvent::TaskCompleted { .. } => "task:completed",
            SwarmEvent::TaskFailed { .. } => "task:failed",
            SwarmEvent::WorkflowStarted { .. } => "workflow:started",
            SwarmEvent::WorkflowCompleted { .. } => "workflow:completed",
            SwarmEvent::WorkflowFailed { .. } => "workflow:failed",
        }
    }

    /// The agent involved, if the event names one.
    pub fn agent_id(&self) -> Option<&str> {
        match self {
            SwarmEvent::AgentAdded { agent_id, .. }
            | SwarmEvent::AgentRemoved { agent_id }
            | SwarmEvent::TaskAssigned { agent_id, .. }
            | SwarmEvent::TaskCompleted { agent_id, .. }
            | SwarmEvent::TaskFailed { agent_id, .. } => Some(agent_id),
            _ => None,
        }
    }

    /// The workflow involved, if the event names one.
    pub fn workflow_id(&self) -> Option<&str> {
        match self {
            SwarmEvent::WorkflowStarted { workflow_id, .. }
            | SwarmEvent::WorkflowCompleted { workflow_id, .. }
            | SwarmEvent::WorkflowFailed { workflow_id, .. } => Some(workflow_id),
            _ => None,
        }
    }
}

/// Broadcast bus for [`SwarmEvent`]s.
pub struct EventBus {
    sender: broadcast::Sender<SwarmEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event. Returns how many subscribers received it; zero
    /// subscribers is not an error.
    pub fn publish(&self, event: SwarmEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    /// Subscribe to all events from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<SwarmEvent> {
        self.sender.subscribe()
    }

    /// Subscribe to events passing a predicate; non-matching events are
    /// dropped silently.
    pub fn subscribe_filtered<F>(&self, filter: F) -> FilteredReceiver<F>
    where
        F: Fn(&SwarmEvent) -> bool,
    {
        FilteredReceiver {
            receiver: self.sender.subscribe(),
            filter,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// A broadcast receiver that skips events failing its predicate.
pub struct FilteredReceiver<F> {
    receiver: broadcast::Receiver<SwarmEvent>,
    filter: F,
}

impl<F> FilteredReceiver<F>
where
    F: Fn(&SwarmEvent) -> bool,
{
    /// Receive the next matching event, or `None` once the bus is closed.
    /// Lagged gaps are skipped.
    pub async fn recv(&mut self) -> Option<SwarmEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if (self.filter)(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_subscribers_is_ok() {
        let bus = EventBus::default();
        let delivered = bus.publish(SwarmEvent::AgentRemoved {
            agent_id: "a1".to_string(),
        });
        assert_eq!(delivered, 0);
    }

    #[tokio::test]
    async fn test_subscribe_receives_events() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(SwarmEvent::AgentAdded {
            agent_id: "a1".to_string(),
            agent_type: "researcher".to_string(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "agent:added");
        assert_eq!(event.agent_id(), Some("a1"));
    }

    #[tokio::test]
    async fn test_filtered_receiver_skips_non_matching() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe_filtered(|e| e.event_type() == "task:completed");

        bus.publish(SwarmEvent::AgentRemoved {
            agent_id: "a1".to_string(),
        });
        bus.publish(SwarmEvent::TaskCompleted {
            task_id: "t1".to_string(),
            agent_id: "a1".to_string(),
            execution_ms: 12,
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.event_type(), "task:completed");
    }

    #[test]
    fn test_event_serde_tagging() {
        let event = SwarmEvent::WorkflowStarted {
            workflow_id: "wf1".to_string(),
            total_steps: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "workflow_started");
        assert_eq!(event.workflow_id(), Some("wf1"));
    }
}
