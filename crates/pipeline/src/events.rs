//! Job status events over a `tokio::sync::broadcast` channel.
//!
//! Every status transition applied by the job store is published here so
//! that observers (logs, tests, push channels) see them in order.

use chrono::Utc;
use kana_core::job::JobStatus;
use kana_core::types::{JobId, Timestamp};
use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobEvent {
    pub job_id: JobId,
    #[serde(flatten)]
    pub status: JobStatus,
    pub timestamp: Timestamp,
}

impl JobEvent {
    pub fn new(job_id: JobId, status: JobStatus) -> Self {
        Self {
            job_id,
            status,
            timestamp: Utc::now(),
        }
    }
}

const DEFAULT_CAPACITY: usize = 256;

pub struct JobEventBus {
    sender: broadcast::Sender<JobEvent>,
}

impl JobEventBus {
    /// Slow receivers observe `RecvError::Lagged` once `capacity` events
    /// are buffered.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: JobEvent) {
        // A send error only means there are no receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.sender.subscribe()
    }
}

/// Feed every event from `receiver` to `handle` until the bus closes.
///
/// A receiver that falls behind skips the dropped events and keeps going.
pub async fn for_each_event<F>(mut receiver: broadcast::Receiver<JobEvent>, mut handle: F)
where
    F: FnMut(JobEvent),
{
    loop {
        match receiver.recv().await {
            Ok(event) => handle(event),
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(skipped = n, "Job event receiver lagged, some events were dropped");
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::debug!("Job event bus closed");
                break;
            }
        }
    }
}

impl Default for JobEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_events() {
        let bus = JobEventBus::default();
        let mut rx = bus.subscribe();
        let id = uuid::Uuid::new_v4();

        bus.publish(JobEvent::new(id, JobStatus::Processing));

        let event = rx.recv().await.unwrap();
        assert_eq!(event.job_id, id);
        assert_eq!(event.status, JobStatus::Processing);
    }

    #[tokio::test]
    async fn lagged_receiver_keeps_receiving_later_events() {
        let bus = JobEventBus::new(2);
        let rx = bus.subscribe();
        let ids: Vec<JobId> = (0..3).map(|_| uuid::Uuid::new_v4()).collect();
        for id in &ids {
            bus.publish(JobEvent::new(*id, JobStatus::Processing));
        }
        // Closing the bus ends the loop once the buffer is drained.
        drop(bus);

        let mut seen = Vec::new();
        for_each_event(rx, |event| seen.push(event.job_id)).await;

        assert_eq!(seen, ids[1..].to_vec());
    }

    #[tokio::test]
    async fn events_after_a_lag_are_delivered() {
        let bus = JobEventBus::new(1);
        let rx = bus.subscribe();
        bus.publish(JobEvent::new(uuid::Uuid::new_v4(), JobStatus::Idle));
        bus.publish(JobEvent::new(uuid::Uuid::new_v4(), JobStatus::Idle));

        let (tx, mut seen) = tokio::sync::mpsc::unbounded_channel();
        let task = tokio::spawn(for_each_event(rx, move |event| {
            let _ = tx.send(event.job_id);
        }));

        let late = uuid::Uuid::new_v4();
        assert!(seen.recv().await.is_some());
        bus.publish(JobEvent::new(late, JobStatus::Processing));
        assert_eq!(seen.recv().await, Some(late));

        drop(bus);
        task.await.unwrap();
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        JobEventBus::default().publish(JobEvent::new(uuid::Uuid::new_v4(), JobStatus::Idle));
    }

    #[test]
    fn event_serializes_flat_status() {
        let event = JobEvent::new(
            uuid::Uuid::nil(),
            JobStatus::Error {
                error: "Generation failed".into(),
            },
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "Generation failed");
    }
}
