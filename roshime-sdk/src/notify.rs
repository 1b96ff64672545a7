//! Transient user-visible notifications

use chrono::{DateTime, Utc};
use futures::stream::{Stream, StreamExt};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Shown after a comment is confirmed
pub const COMMENT_POSTED: &str = "Thanks for sharing how you feel 😊";
/// Shown when a comment write fails
pub const COMMENT_FAILED: &str = "Hey, sorry some issue with my code probably 😂";
/// Shown when a reaction write fails
pub const REACTION_FAILED: &str = "Error updating reaction.";

const HISTORY_LIMIT: usize = 32;

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    /// Confirmation of a write
    Success,
    /// A write was not confirmed
    Error,
}

/// A toast the renderer shows for `duration`
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    /// Severity
    pub level: NotificationLevel,
    /// Text
    pub title: String,
    /// Display lifetime
    #[serde(with = "duration_ms")]
    pub duration: Duration,
    /// When it was raised
    pub issued_at: DateTime<Utc>,
}

/// Publishes notifications to the renderer
#[derive(Clone)]
pub struct Notifier {
    tx: broadcast::Sender<Notification>,
    history: Arc<Mutex<VecDeque<Notification>>>,
    duration: Duration,
}

impl Notifier {
    /// Create a notifier whose toasts last `duration`
    pub fn new(duration: Duration) -> Self {
        let (tx, _rx) = broadcast::channel(HISTORY_LIMIT);
        Self {
            tx,
            history: Arc::new(Mutex::new(VecDeque::with_capacity(HISTORY_LIMIT))),
            duration,
        }
    }

    /// Raise a success notification
    pub fn success(&self, title: impl Into<String>) {
        self.publish(NotificationLevel::Success, title.into());
    }

    /// Raise an error notification
    pub fn error(&self, title: impl Into<String>) {
        self.publish(NotificationLevel::Error, title.into());
    }

    fn publish(&self, level: NotificationLevel, title: String) {
        let notification = Notification {
            level,
            title,
            duration: self.duration,
            issued_at: Utc::now(),
        };

        {
            let mut history = self.history.lock();
            if history.len() == HISTORY_LIMIT {
                history.pop_front();
            }
            history.push_back(notification.clone());
        }

        // No subscriber is fine; history still records it
        let _ = self.tx.send(notification);
    }

    /// Receive notifications raised from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.tx.subscribe()
    }

    /// Notifications raised from now on, as a stream
    pub fn stream(&self) -> Pin<Box<dyn Stream<Item = Notification> + Send + 'static>> {
        let rx = self.tx.subscribe();
        Box::pin(
            tokio_stream::wrappers::BroadcastStream::new(rx)
                .filter_map(|r| async move { r.ok() }),
        )
    }

    /// Most recent notifications, oldest first
    pub fn recent(&self) -> Vec<Notification> {
        self.history.lock().iter().cloned().collect()
    }

    /// Last notification raised, if any
    pub fn last(&self) -> Option<Notification> {
        self.history.lock().back().cloned()
    }
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(duration.as_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_records_without_subscribers() {
        let notifier = Notifier::new(Duration::from_millis(2000));
        notifier.error(REACTION_FAILED);

        let last = notifier.last().unwrap();
        assert_eq!(last.level, NotificationLevel::Error);
        assert_eq!(last.title, REACTION_FAILED);
        assert_eq!(last.duration, Duration::from_millis(2000));
    }

    #[test]
    fn test_history_is_bounded() {
        let notifier = Notifier::new(Duration::from_millis(10));
        for i in 0..(HISTORY_LIMIT + 5) {
            notifier.success(format!("n{i}"));
        }
        let recent = notifier.recent();
        assert_eq!(recent.len(), HISTORY_LIMIT);
        assert_eq!(recent[0].title, "n5");
    }

    #[tokio::test]
    async fn test_stream_delivers() {
        let notifier = Notifier::new(Duration::from_millis(10));
        let mut stream = notifier.stream();
        notifier.success(COMMENT_POSTED);

        let received = stream.next().await.unwrap();
        assert_eq!(received.title, COMMENT_POSTED);
        assert_eq!(received.level, NotificationLevel::Success);
    }

    #[test]
    fn test_serializes_duration_as_millis() {
        let notifier = Notifier::new(Duration::from_millis(2000));
        notifier.success("ok");
        let json = serde_json::to_value(notifier.last().unwrap()).unwrap();
        assert_eq!(json["duration"], 2000);
        assert_eq!(json["level"], "success");
    }
}
