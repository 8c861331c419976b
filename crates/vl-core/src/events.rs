//! Application event system.
//!
//! [`EventBus`] wraps a `tokio::sync::broadcast` channel. Subscribers only
//! see events sent after they subscribed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::ids::{UserId, VideoId};
use crate::media::VideoStatus;

// ---------------------------------------------------------------------------
// JobFinished
// ---------------------------------------------------------------------------

/// Emitted exactly once per processing run that got past the precondition
/// check, carrying the final state of the video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFinished {
    pub video_id: VideoId,
    pub user_id: UserId,
    pub status: VideoStatus,
    pub error: Option<String>,
    /// Number of renditions recorded during the run.
    pub renditions: usize,
}

// ---------------------------------------------------------------------------
// EventPayload
// ---------------------------------------------------------------------------

/// Payload describing what happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    VideoIngested {
        video_id: VideoId,
        user_id: UserId,
        name: String,
    },
    VideoProcessed(JobFinished),
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A timestamped event ready for broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub payload: EventPayload,
}

impl Event {
    /// Create a new event with a fresh UUID and the current timestamp.
    pub fn new(payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Broadcast channel for application events.
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    /// Create a new event bus; `capacity` bounds how far a slow subscriber
    /// may lag before it starts missing events.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to the broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Broadcast an event to all current subscribers.
    pub fn broadcast(&self, payload: EventPayload) {
        // Ignore send errors (no subscribers).
        let _ = self.tx.send(Event::new(payload));
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(status: VideoStatus) -> JobFinished {
        JobFinished {
            video_id: VideoId::new(),
            user_id: UserId::new(),
            status,
            error: None,
            renditions: 0,
        }
    }

    #[test]
    fn broadcast_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let done = finished(VideoStatus::Complete);
        bus.broadcast(EventPayload::VideoProcessed(done.clone()));

        let event = rx.try_recv().unwrap();
        match &event.payload {
            EventPayload::VideoProcessed(received) => assert_eq!(*received, done),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[test]
    fn late_subscriber_misses_earlier_events() {
        let bus = EventBus::new(16);
        bus.broadcast(EventPayload::VideoIngested {
            video_id: VideoId::new(),
            user_id: UserId::new(),
            name: "clip".into(),
        });

        let mut rx = bus.subscribe();
        assert!(rx.try_recv().is_err());

        bus.broadcast(EventPayload::VideoProcessed(finished(VideoStatus::Failed)));
        let event = rx.try_recv().unwrap();
        assert!(matches!(event.payload, EventPayload::VideoProcessed(_)));
    }

    #[test]
    fn no_subscribers_does_not_panic() {
        let bus = EventBus::new(4);
        bus.broadcast(EventPayload::VideoProcessed(finished(VideoStatus::Failed)));
    }

    #[test]
    fn payload_is_tagged() {
        let json =
            serde_json::to_string(&EventPayload::VideoProcessed(finished(VideoStatus::Complete)))
                .unwrap();
        assert!(json.contains("\"type\":\"video_processed\""));
        assert!(json.contains("\"status\":\"complete\""));
    }

    #[test]
    fn events_arrive_in_send_order() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        for status in [VideoStatus::Complete, VideoStatus::Failed] {
            bus.broadcast(EventPayload::VideoProcessed(finished(status)));
        }

        let statuses: Vec<VideoStatus> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|e| match e.payload {
                EventPayload::VideoProcessed(done) => done.status,
                other => panic!("unexpected payload: {:?}", other),
            })
            .collect();
        assert_eq!(statuses, vec![VideoStatus::Complete, VideoStatus::Failed]);
    }
}
