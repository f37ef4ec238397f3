//! Domain events — the decision loop's observability seam.
//!
//! The engine and scheduler publish what happened; presentation layers
//! (CLI output, future dashboards) subscribe without the core knowing they
//! exist. Publishing with no subscribers is a no-op, so the loop pays
//! nothing when nobody is listening.

use crate::decision::{ExitReason, Trigger};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

const DEFAULT_BUS_CAPACITY: usize = 256;

/// Everything the core announces about itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A decision cycle started
    CycleStarted {
        cycle_id: String,
        trigger: Trigger,
        timestamp: DateTime<Utc>,
    },

    /// The model answered one round
    ModelResponded {
        cycle_id: String,
        model: String,
        tokens_used: u32,
        requested_tool_calls: usize,
        timestamp: DateTime<Utc>,
    },

    /// One tool call was dispatched and came back
    ToolExecuted {
        cycle_id: String,
        tool_name: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A decision cycle produced its result
    DecisionCompleted {
        cycle_id: String,
        exit_reason: ExitReason,
        rounds_used: u32,
        wall_clock_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A reactive event was dropped before it could trigger a cycle
    /// (cooldown, queue overflow, or a cycle already in flight)
    ReactiveEventDropped {
        event_kind: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast fan-out for domain events. Slow subscribers lag and lose old
/// events rather than backpressuring the decision loop.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to every current subscriber; a send with none is a no-op.
    pub fn publish(&self, event: DomainEvent) {
        let _ = self.sender.send(Arc::new(event));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscriber_sees_cycle_lifecycle() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::CycleStarted {
            cycle_id: "c1".into(),
            trigger: Trigger::Scheduled,
            timestamp: Utc::now(),
        });
        bus.publish(DomainEvent::DecisionCompleted {
            cycle_id: "c1".into(),
            exit_reason: ExitReason::Natural,
            rounds_used: 1,
            wall_clock_ms: 1800,
            timestamp: Utc::now(),
        });

        assert!(matches!(
            rx.recv().await.unwrap().as_ref(),
            DomainEvent::CycleStarted { .. }
        ));
        match rx.recv().await.unwrap().as_ref() {
            DomainEvent::DecisionCompleted {
                cycle_id,
                exit_reason,
                ..
            } => {
                assert_eq!(cycle_id, "c1");
                assert_eq!(*exit_reason, ExitReason::Natural);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let bus = EventBus::default();
        bus.publish(DomainEvent::ReactiveEventDropped {
            event_kind: "soil_moisture_low".into(),
            reason: "cooldown".into(),
            timestamp: Utc::now(),
        });
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_events() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::CycleStarted {
            cycle_id: "c1".into(),
            trigger: Trigger::Scheduled,
            timestamp: Utc::now(),
        });

        let mut rx = bus.subscribe();
        assert!(matches!(
            rx.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }
}
