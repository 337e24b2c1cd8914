//! In-process event fan-out with bounded per-subscriber queues.
//!
//! Unlike a shared ring buffer, each subscriber owns its own queue so one
//! stalled dashboard can never make another miss events. A subscriber that
//! lets its queue fill up is disconnected: it is dropped from the registry
//! and its stream ends once the events already queued have been read.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use llmdash_core::metric_names;
use llmdash_core::metrics::{MetricsReading, MetricsSample};
use llmdash_core::types::Timestamp;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

// ---------------------------------------------------------------------------
// DashboardEvent
// ---------------------------------------------------------------------------

/// An event pushed to live dashboard clients.
///
/// Serialized as `{"type": "<name>", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DashboardEvent {
    /// A sample was ingested.
    MetricsUpdate {
        device_name: String,
        metrics: MetricsReading,
        #[serde(with = "llmdash_core::timestamps::canonical")]
        timestamp: Timestamp,
    },
    /// One line of script output.
    ScriptLog { message: String },
    /// A script run ended.
    ScriptFinished { success: bool },
    /// Greeting sent when a live connection is established.
    Connected { status: String },
}

impl DashboardEvent {
    pub fn metrics_update(sample: MetricsSample) -> Self {
        Self::MetricsUpdate {
            device_name: sample.device_name,
            metrics: sample.metrics,
            timestamp: sample.timestamp,
        }
    }

    pub fn script_log(message: impl Into<String>) -> Self {
        Self::ScriptLog {
            message: message.into(),
        }
    }

    /// Wire name of the event, as found in the `type` field.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::MetricsUpdate { .. } => metric_names::EVENT_METRICS_UPDATE,
            Self::ScriptLog { .. } => metric_names::EVENT_SCRIPT_LOG,
            Self::ScriptFinished { .. } => metric_names::EVENT_SCRIPT_FINISHED,
            Self::Connected { .. } => metric_names::EVENT_CONNECTED,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBroadcaster
// ---------------------------------------------------------------------------

/// Default per-subscriber queue capacity.
pub const DEFAULT_BUFFER_SIZE: usize = 256;

/// Opaque handle identifying one subscriber.
pub type SubscriberId = u64;

/// Receiving half handed to a subscriber.
#[derive(Debug)]
pub struct Subscription {
    pub id: SubscriberId,
    receiver: mpsc::Receiver<DashboardEvent>,
}

impl Subscription {
    /// Next event, or `None` once the subscriber has been removed (or the
    /// broadcaster closed) and its queue is drained.
    pub async fn recv(&mut self) -> Option<DashboardEvent> {
        self.receiver.recv().await
    }
}

/// Fan-out hub. Shared as `Arc<EventBroadcaster>`.
///
/// ```rust
/// use llmdash_events::{DashboardEvent, EventBroadcaster};
///
/// let broadcaster = EventBroadcaster::default();
/// let _subscription = broadcaster.subscribe();
///
/// broadcaster.publish(DashboardEvent::script_log("Executing: uptime"));
/// ```
pub struct EventBroadcaster {
    buffer_size: usize,
    next_id: AtomicU64,
    subscribers: RwLock<HashMap<SubscriberId, mpsc::Sender<DashboardEvent>>>,
}

impl EventBroadcaster {
    /// Create a broadcaster whose subscribers each buffer up to
    /// `buffer_size` undelivered events.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
            next_id: AtomicU64::new(1),
            subscribers: RwLock::new(HashMap::new()),
        }
    }

    /// Register a new subscriber.
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.buffer_size);
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, sender);
        tracing::debug!(subscriber_id = id, "Subscriber registered");
        Subscription { id, receiver }
    }

    /// Remove a subscriber. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriberId) {
        let removed = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        if removed.is_some() {
            tracing::debug!(subscriber_id = id, "Subscriber removed");
        }
    }

    /// Deliver `event` to every subscriber without waiting.
    ///
    /// Subscribers whose queue is full are disconnected; subscribers whose
    /// receiver was dropped are pruned.
    pub fn publish(&self, event: DashboardEvent) {
        let mut dead = Vec::new();
        {
            let subscribers = self.subscribers.read().unwrap_or_else(PoisonError::into_inner);
            for (id, sender) in subscribers.iter() {
                match sender.try_send(event.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(
                            subscriber_id = id,
                            event_type = event.event_type(),
                            "Subscriber queue full, disconnecting"
                        );
                        dead.push(*id);
                    }
                    Err(TrySendError::Closed(_)) => dead.push(*id),
                }
            }
        }

        if !dead.is_empty() {
            let mut subscribers = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);
            for id in dead {
                subscribers.remove(&id);
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop every subscriber; their streams end after draining.
    pub fn close_all(&self) {
        let mut subscribers = self.subscribers.write().unwrap_or_else(PoisonError::into_inner);
        let count = subscribers.len();
        subscribers.clear();
        tracing::info!(count, "Closed all subscribers");
    }
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use llmdash_core::timestamps;

    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let broadcaster = EventBroadcaster::default();
        let mut sub = broadcaster.subscribe();

        broadcaster.publish(DashboardEvent::script_log("Executing: uptime"));

        let received = sub.recv().await.expect("should receive the event");
        assert_matches!(received, DashboardEvent::ScriptLog { message } if message == "Executing: uptime");
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event_in_order() {
        let broadcaster = EventBroadcaster::default();
        let mut a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();

        broadcaster.publish(DashboardEvent::script_log("one"));
        broadcaster.publish(DashboardEvent::ScriptFinished { success: true });

        for sub in [&mut a, &mut b] {
            assert_matches!(sub.recv().await, Some(DashboardEvent::ScriptLog { .. }));
            assert_matches!(sub.recv().await, Some(DashboardEvent::ScriptFinished { success: true }));
        }
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let broadcaster = EventBroadcaster::default();
        broadcaster.publish(DashboardEvent::script_log("orphan"));
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn full_subscriber_is_disconnected_after_draining() {
        let broadcaster = EventBroadcaster::new(2);
        let mut slow = broadcaster.subscribe();
        let mut fast = broadcaster.subscribe();

        broadcaster.publish(DashboardEvent::script_log("1"));
        broadcaster.publish(DashboardEvent::script_log("2"));
        // Drain the fast subscriber so only the slow one overflows.
        assert!(fast.recv().await.is_some());
        assert!(fast.recv().await.is_some());
        broadcaster.publish(DashboardEvent::script_log("3"));

        assert_eq!(broadcaster.subscriber_count(), 1);
        assert_matches!(fast.recv().await, Some(DashboardEvent::ScriptLog { message }) if message == "3");

        // The slow subscriber still sees what was queued, then its stream ends.
        assert!(slow.recv().await.is_some());
        assert!(slow.recv().await.is_some());
        assert!(slow.recv().await.is_none());
    }

    #[test]
    fn dropped_subscription_is_pruned_on_publish() {
        let broadcaster = EventBroadcaster::default();
        let sub = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 1);

        drop(sub);
        broadcaster.publish(DashboardEvent::script_log("x"));
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn unsubscribe_and_close_all_end_streams() {
        let broadcaster = EventBroadcaster::default();
        let mut a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();

        broadcaster.unsubscribe(a.id);
        broadcaster.unsubscribe(a.id);
        assert!(a.recv().await.is_none());
        assert_eq!(broadcaster.subscriber_count(), 1);

        broadcaster.close_all();
        assert!(b.recv().await.is_none());
        assert_eq!(broadcaster.subscriber_count(), 0);
    }

    #[test]
    fn events_serialize_as_type_and_data() {
        let log = serde_json::to_value(DashboardEvent::script_log("hi")).unwrap();
        assert_eq!(log, serde_json::json!({"type": "script_log", "data": {"message": "hi"}}));

        let done = serde_json::to_value(DashboardEvent::ScriptFinished { success: false }).unwrap();
        assert_eq!(done["type"], "script_finished");
        assert_eq!(done["data"]["success"], false);
    }

    #[test]
    fn metrics_update_nests_readings() {
        let sample = MetricsSample {
            device_name: "gpu-box".into(),
            timestamp: timestamps::parse("2025-03-01T10:00:00Z").unwrap(),
            metrics: MetricsReading {
                cpu_usage: Some(42.0),
                ..Default::default()
            },
        };
        let json = serde_json::to_value(DashboardEvent::metrics_update(sample)).unwrap();
        assert_eq!(json["type"], "metrics_update");
        assert_eq!(json["data"]["device_name"], "gpu-box");
        assert_eq!(json["data"]["timestamp"], "2025-03-01T10:00:00.000Z");
        assert_eq!(json["data"]["metrics"]["cpu_usage"], 42.0);
        assert!(json["data"]["metrics"]["gpu_usage"].is_null());
    }

    #[test]
    fn event_type_matches_wire_name() {
        let events = [
            DashboardEvent::script_log("x"),
            DashboardEvent::ScriptFinished { success: true },
            DashboardEvent::Connected {
                status: "Connected to dashboard".into(),
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.event_type());
        }
    }
}
