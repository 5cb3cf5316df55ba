use std::{collections::VecDeque, fmt, sync::Arc};

use serde::Serialize;
use time::OffsetDateTime;
use tokio::sync::{
    Mutex, broadcast,
    watch::{self, Receiver, Sender},
};
use tracing::{debug, warn};

const BUS_CAPACITY: usize = 256;
const ACTIVITY_LEN: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    PaymentUpdated,
    PaymentViewed,
    CertificateStatusChanged,
    RecordCreated,
    RecordDeleted,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "topic", rename_all = "snake_case")]
pub enum Event {
    PaymentUpdated { id: String, status: String },
    PaymentViewed { id: String },
    CertificateStatusChanged { id: String, status: String },
    RecordCreated { resource: &'static str },
    RecordDeleted { resource: &'static str, id: String },
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::PaymentUpdated { .. } => Topic::PaymentUpdated,
            Event::PaymentViewed { .. } => Topic::PaymentViewed,
            Event::CertificateStatusChanged { .. } => Topic::CertificateStatusChanged,
            Event::RecordCreated { .. } => Topic::RecordCreated,
            Event::RecordDeleted { .. } => Topic::RecordDeleted,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::PaymentUpdated { id, status } => write!(f, "Payment {id} marked {status}"),
            Event::PaymentViewed { id } => write!(f, "Payment {id} viewed"),
            Event::CertificateStatusChanged { id, status } => {
                write!(f, "Certificate request {id} {status}")
            }
            Event::RecordCreated { resource } => write!(f, "New {resource} added"),
            Event::RecordDeleted { resource, id } => write!(f, "{resource} {id} deleted"),
        }
    }
}

/// In-process publish/subscribe for cross-page notifications.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Event>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(BUS_CAPACITY);
        Self { tx }
    }

    /// Returns the number of subscribers that will see the event.
    pub fn publish(&self, event: Event) -> usize {
        debug!("publish {:?}: {event}", event.topic());
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribes to `topics`; an empty slice means every topic.
    pub fn subscribe(&self, topics: &[Topic]) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            topics: topics.to_vec(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Subscription {
    rx: broadcast::Receiver<Event>,
    topics: Vec<Topic>,
}

impl Subscription {
    /// Next matching event, `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(event) => {
                    if self.topics.is_empty() || self.topics.contains(&event.topic()) {
                        return Some(event);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("subscriber lagged, skipped {skipped} events");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct ActivityEntry {
    pub at: OffsetDateTime,
    pub event: Event,
}

/// Recent events, newest first.
#[derive(Clone)]
pub struct Activity {
    entries: Arc<Mutex<VecDeque<ActivityEntry>>>,
    updated: (Sender<usize>, Receiver<usize>),
}

impl Activity {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::with_capacity(ACTIVITY_LEN))),
            updated: watch::channel(0),
        }
    }

    pub async fn push(&self, event: Event) {
        let mut entries = self.entries.lock().await;
        entries.push_front(ActivityEntry {
            at: OffsetDateTime::now_utc(),
            event,
        });
        entries.truncate(ACTIVITY_LEN);
        let _ = self.updated.0.send(entries.len());
    }

    pub async fn recent(&self) -> Vec<ActivityEntry> {
        self.entries.lock().await.iter().cloned().collect()
    }

    pub fn updates(&self) -> Receiver<usize> {
        self.updated.1.clone()
    }
}

impl Default for Activity {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn run_activity_recorder(mut subscription: Subscription, activity: Activity) {
    while let Some(event) = subscription.recv().await {
        activity.push(event).await;
    }
    debug!("event bus closed, activity recorder stopping");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn test_subscription_filters_topics() {
        let bus = EventBus::new();
        let mut payments = bus.subscribe(&[Topic::PaymentUpdated]);
        bus.publish(Event::RecordCreated { resource: "member" });
        bus.publish(Event::PaymentUpdated {
            id: "7".to_owned(),
            status: "paid".to_owned(),
        });
        assert_eq!(
            payments.recv().await,
            Some(Event::PaymentUpdated {
                id: "7".to_owned(),
                status: "paid".to_owned()
            })
        );
    }

    #[tokio::test]
    async fn test_empty_topic_list_receives_everything() {
        let bus = EventBus::new();
        let mut all = bus.subscribe(&[]);
        bus.publish(Event::PaymentViewed { id: "1".to_owned() });
        bus.publish(Event::RecordCreated { resource: "member" });
        assert_eq!(all.recv().await.map(|e| e.topic()), Some(Topic::PaymentViewed));
        assert_eq!(all.recv().await.map(|e| e.topic()), Some(Topic::RecordCreated));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(Event::PaymentViewed { id: "1".to_owned() }), 0);
    }

    #[tokio::test]
    async fn test_activity_recorder() {
        let bus = EventBus::new();
        let activity = Activity::new();
        let mut updates = activity.updates();
        let handle = tokio::spawn(run_activity_recorder(bus.subscribe(&[]), activity.clone()));

        bus.publish(Event::RecordDeleted {
            resource: "member",
            id: "3".to_owned(),
        });
        timeout(Duration::from_secs(1), updates.changed())
            .await
            .unwrap()
            .unwrap();
        let recent = activity.recent().await;
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].event.to_string(), "member 3 deleted");

        drop(bus);
        timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_activity_is_bounded() {
        let activity = Activity::new();
        for i in 0..(ACTIVITY_LEN + 5) {
            activity
                .push(Event::PaymentViewed { id: i.to_string() })
                .await;
        }
        let recent = activity.recent().await;
        assert_eq!(recent.len(), ACTIVITY_LEN);
        assert_eq!(
            recent[0].event,
            Event::PaymentViewed {
                id: (ACTIVITY_LEN + 4).to_string()
            }
        );
    }
}
