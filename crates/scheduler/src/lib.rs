//! Trigger scheduling — when a decision cycle runs, and why.
//!
//! Three trigger families feed one engine:
//! - **Scheduled**: a fixed interval, always eligible, dropped when a cycle
//!   is already in flight.
//! - **Reactive / Anomaly**: events from external detectors, gated by a
//!   per-kind cooldown so a burst collapses into one cycle; dropped (never
//!   requeued) inside the cooldown or while a cycle runs.
//! - **On-demand** (interactive, API, Telegram): queue on the single-flight
//!   lock and always run.
//!
//! Single-flight is the invariant everything else hangs off: at most one
//! cycle per agent instance, because tool handlers mutate shared external
//! state that is not safe under concurrent cycles.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use verdant_config::SchedulerConfig;
use verdant_core::decision::{DecisionResult, ReactiveEvent, Trigger};
use verdant_core::event::{DomainEvent, EventBus};
use verdant_core::message::Message;
use verdant_engine::DecisionEngine;

/// Which detector family produced a reactive event. Both share the cooldown
/// machinery; they differ only in trigger provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    Reactive,
    Anomaly,
}

type QueuedEvent = (ReactiveEvent, EventClass);

/// The trigger scheduler. Owns the single-flight lock, the reactive queue,
/// and the cooldown map; autonomous cycle results are delivered on the
/// channel returned by [`TriggerScheduler::new`].
pub struct TriggerScheduler {
    engine: Arc<DecisionEngine>,
    config: SchedulerConfig,
    /// Single-flight gate: held for the duration of every cycle
    flight: tokio::sync::Mutex<()>,
    /// Per-event-kind cooldown stamps; one guard makes check-and-set atomic
    cooldowns: Mutex<HashMap<String, Instant>>,
    event_bus: Arc<EventBus>,
    queue_tx: mpsc::Sender<QueuedEvent>,
    queue_rx: Mutex<Option<mpsc::Receiver<QueuedEvent>>>,
    results_tx: mpsc::Sender<DecisionResult>,
}

impl TriggerScheduler {
    /// Create a scheduler plus the receiver for autonomous cycle results
    /// (scheduled and reactive cycles; on-demand results return directly).
    pub fn new(
        engine: Arc<DecisionEngine>,
        config: SchedulerConfig,
        event_bus: Arc<EventBus>,
    ) -> (Self, mpsc::Receiver<DecisionResult>) {
        let (queue_tx, queue_rx) = mpsc::channel(config.event_queue_capacity);
        let (results_tx, results_rx) = mpsc::channel(16);
        let scheduler = Self {
            engine,
            config,
            flight: tokio::sync::Mutex::new(()),
            cooldowns: Mutex::new(HashMap::new()),
            event_bus,
            queue_tx,
            queue_rx: Mutex::new(Some(queue_rx)),
            results_tx,
        };
        (scheduler, results_rx)
    }

    /// Enqueue a reactive event. Returns false when the queue is full (the
    /// event is dropped, not blocked on).
    pub fn submit_reactive(&self, event: ReactiveEvent) -> bool {
        self.submit(event, EventClass::Reactive)
    }

    /// Enqueue an anomaly event from the external watchdog.
    pub fn submit_anomaly(&self, event: ReactiveEvent) -> bool {
        self.submit(event, EventClass::Anomaly)
    }

    fn submit(&self, event: ReactiveEvent, class: EventClass) -> bool {
        match self.queue_tx.try_send((event, class)) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full((event, _))) => {
                warn!(kind = %event.kind, "Reactive event queue full, dropping event");
                self.publish_dropped(&event.kind, "queue full");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Run an on-demand cycle. Queues behind any in-flight cycle and always
    /// runs; rate limiting, if any, belongs to the calling surface.
    pub async fn request(
        &self,
        trigger: Trigger,
        seed: Option<Vec<Message>>,
    ) -> DecisionResult {
        debug_assert!(
            trigger.queues_when_busy(),
            "autonomous triggers go through try_scheduled / try_reactive"
        );
        let _guard = self.flight.lock().await;
        self.engine.decide(trigger, seed).await
    }

    /// Attempt a scheduled cycle. Dropped (returns None) when a cycle is
    /// already in flight.
    pub async fn try_scheduled(&self) -> Option<DecisionResult> {
        let Ok(_guard) = self.flight.try_lock() else {
            debug!("Scheduled trigger dropped: cycle already in flight");
            return None;
        };
        info!("Scheduled trigger starting cycle");
        Some(self.engine.decide(Trigger::Scheduled, None).await)
    }

    /// Attempt a reactive cycle. Dropped when a cycle is in flight or the
    /// event kind is inside its cooldown window.
    pub async fn try_reactive(
        &self,
        event: ReactiveEvent,
        class: EventClass,
    ) -> Option<DecisionResult> {
        let Ok(_guard) = self.flight.try_lock() else {
            debug!(kind = %event.kind, "Reactive trigger dropped: cycle already in flight");
            self.publish_dropped(&event.kind, "cycle in flight");
            return None;
        };

        if !self.passes_cooldown(&event.kind) {
            debug!(kind = %event.kind, "Reactive trigger dropped: cooldown active");
            self.publish_dropped(&event.kind, "cooldown");
            return None;
        }

        let trigger = match class {
            EventClass::Reactive => Trigger::Reactive {
                event_kind: event.kind.clone(),
            },
            EventClass::Anomaly => Trigger::Anomaly {
                event_kind: event.kind.clone(),
            },
        };
        info!(kind = %event.kind, trigger = %trigger, "Reactive trigger starting cycle");

        let seed = Message::user(format!(
            "Reactive event '{}' observed at {}. Details: {}",
            event.kind,
            event.observed_at.format("%Y-%m-%d %H:%M:%S UTC"),
            event.payload
        ));
        Some(self.engine.decide(trigger, Some(vec![seed])).await)
    }

    /// Atomic cooldown check-and-set: under one guard, so two concurrent
    /// triggers of the same kind cannot both pass.
    fn passes_cooldown(&self, kind: &str) -> bool {
        let mut cooldowns = self.cooldowns.lock().unwrap();
        let now = Instant::now();
        match cooldowns.get(kind) {
            Some(last) if now.duration_since(*last) < self.config.reactive_cooldown() => false,
            _ => {
                cooldowns.insert(kind.to_string(), now);
                true
            }
        }
    }

    fn publish_dropped(&self, kind: &str, reason: &str) {
        self.event_bus.publish(DomainEvent::ReactiveEventDropped {
            event_kind: kind.to_string(),
            reason: reason.to_string(),
            timestamp: chrono::Utc::now(),
        });
    }

    /// The scheduler main loop: multiplexes the fixed interval and the
    /// reactive queue into cycles until shutdown. Each trigger runs in its
    /// own task so the loop stays responsive (and busy drops actually
    /// drop instead of piling up behind a running cycle).
    pub async fn run(self: Arc<Self>, shutdown: CancellationToken) {
        let mut queue_rx = self
            .queue_rx
            .lock()
            .unwrap()
            .take()
            .expect("TriggerScheduler::run called twice");

        let mut ticker = tokio::time::interval(self.config.cycle_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval() fires immediately; the first scheduled cycle should
        // come after one full period.
        ticker.tick().await;

        info!(
            interval_minutes = self.config.cycle_interval_minutes,
            cooldown_secs = self.config.reactive_cooldown_secs,
            "Trigger scheduler running"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Trigger scheduler shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    let scheduler = self.clone();
                    tokio::spawn(async move {
                        if let Some(result) = scheduler.try_scheduled().await {
                            let _ = scheduler.results_tx.send(result).await;
                        }
                    });
                }
                queued = queue_rx.recv() => {
                    let Some((event, class)) = queued else {
                        info!("Reactive event queue closed, scheduler stopping");
                        return;
                    };
                    let scheduler = self.clone();
                    tokio::spawn(async move {
                        if let Some(result) = scheduler.try_reactive(event, class).await {
                            let _ = scheduler.results_tx.send(result).await;
                        }
                    });
                }
            }
        }
    }
}
