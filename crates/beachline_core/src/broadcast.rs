//! Topic based push fan-out.
//!
//! The registry lives in process memory only. After a restart it is empty and
//! clients have to subscribe again.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::recommendation::{ScoredStation, SearchParams};
use crate::{CongestionReading, CoreError, OccupancyReading, WeatherReading};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriberId(uuid::Uuid);

impl SubscriberId {
    pub fn new() -> Self {
        SubscriberId(uuid::Uuid::new_v4())
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Topic {
    Station(String),
    Alternatives(SearchParams),
    /// Occupancy of every station, for list views
    OccupancyList,
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Station(station_id) => write!(f, "station:{station_id}"),
            Topic::Alternatives(params) => write!(f, "alternatives:{}", params.canonical_key()),
            Topic::OccupancyList => f.write_str("occupancy_list"),
        }
    }
}

/// Everything that can be pushed to a subscriber.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum PushMessage {
    #[serde(rename_all = "camelCase")]
    OccupancyUpdate {
        station_id: String,
        reading: OccupancyReading,
    },
    #[serde(rename_all = "camelCase")]
    WeatherUpdate {
        station_id: String,
        reading: WeatherReading,
    },
    #[serde(rename_all = "camelCase")]
    AlternativesUpdate {
        search_params: SearchParams,
        alternatives: Vec<ScoredStation>,
    },
    #[serde(rename_all = "camelCase")]
    OccupancyListUpdate {
        station_id: String,
        reading: OccupancyReading,
    },
    #[serde(rename_all = "camelCase")]
    CongestionUpdate {
        station_id: String,
        reading: CongestionReading,
    },
}

/// Where a subscriber's messages go, typically one client connection.
pub trait PushSink: Send + Sync {
    fn push(&self, message: &PushMessage) -> Result<(), String>;
}

impl PushSink for tokio::sync::mpsc::UnboundedSender<PushMessage> {
    fn push(&self, message: &PushMessage) -> Result<(), String> {
        self.send(message.clone())
            .map_err(|_| "connection closed".to_string())
    }
}

#[derive(Clone)]
pub struct SubscriberHandle {
    id: SubscriberId,
    sink: Arc<dyn PushSink>,
}

impl SubscriberHandle {
    pub fn new(id: SubscriberId, sink: Arc<dyn PushSink>) -> Self {
        SubscriberHandle { id, sink }
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn deliver(&self, message: &PushMessage) -> Result<(), CoreError> {
        self.sink
            .push(message)
            .map_err(|reason| CoreError::DeliveryFailure {
                subscriber: self.id,
                reason,
            })
    }
}

impl fmt::Debug for SubscriberHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriberHandle")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub failed: Vec<SubscriberId>,
}

/// Registry of topic subscriptions.
#[derive(Debug, Default)]
pub struct UpdateBroadcaster {
    topics: HashMap<String, HashMap<SubscriberId, SubscriberHandle>>,
    /// Search parameters behind each live `alternatives:` topic
    searches: HashMap<String, SearchParams>,
}

impl UpdateBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the handle was already subscribed.
    pub fn subscribe(&mut self, topic: &Topic, handle: SubscriberHandle) -> bool {
        let key = topic.to_string();
        if let Topic::Alternatives(params) = topic {
            self.searches
                .entry(key.clone())
                .or_insert_with(|| params.normalized());
        }
        let subscriber = handle.id();
        let added = self
            .topics
            .entry(key.clone())
            .or_default()
            .insert(subscriber, handle)
            .is_none();
        if added {
            tracing::info!("Subscriber {} joined {}", subscriber, key);
        }
        added
    }

    /// Returns `false` if the subscriber was not part of the topic.
    pub fn unsubscribe(&mut self, topic: &Topic, subscriber: SubscriberId) -> bool {
        let key = topic.to_string();
        let removed = self.remove(&key, subscriber);
        if removed {
            tracing::info!("Subscriber {} left {}", subscriber, key);
        }
        removed
    }

    /// Drop a subscriber from every topic. Returns how many it was part of.
    pub fn disconnect(&mut self, subscriber: SubscriberId) -> usize {
        let keys: Vec<String> = self
            .topics
            .iter()
            .filter(|(_, members)| members.contains_key(&subscriber))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &keys {
            self.remove(key, subscriber);
        }
        tracing::info!(
            "Subscriber {} disconnected from {} topics",
            subscriber,
            keys.len()
        );
        keys.len()
    }

    fn remove(&mut self, key: &str, subscriber: SubscriberId) -> bool {
        let Some(members) = self.topics.get_mut(key) else {
            return false;
        };
        let removed = members.remove(&subscriber).is_some();
        if members.is_empty() {
            self.topics.remove(key);
            self.searches.remove(key);
        }
        removed
    }

    /// Push `message` to every current subscriber of `topic`.
    ///
    /// A failed delivery is logged and reported but never retried, and does
    /// not stop delivery to the remaining subscribers.
    pub fn publish(&self, topic: &Topic, message: &PushMessage) -> PublishReport {
        let key = topic.to_string();
        let mut report = PublishReport::default();
        let Some(members) = self.topics.get(&key) else {
            return report;
        };
        for handle in members.values() {
            match handle.deliver(message) {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    tracing::warn!("Dropping update on {}: {}", key, error);
                    report.failed.push(handle.id());
                }
            }
        }
        tracing::debug!(
            "Published to {}: {} delivered, {} failed",
            key,
            report.delivered,
            report.failed.len()
        );
        report
    }

    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.topics
            .get(&topic.to_string())
            .map_or(0, |members| members.len())
    }

    /// Searches with at least one subscriber.
    pub fn active_searches(&self) -> impl Iterator<Item = &SearchParams> {
        self.searches.values()
    }
}
