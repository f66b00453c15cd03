use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{Movie, Recommendation, Review, ServiceError};

pub mod consumer;

pub use consumer::{process_movie_event, process_recommendation_event, process_review_event};

// ============================================================================
// Event Envelope
// ============================================================================
//
// One generic envelope reused across the three outbound channels, typed per
// destination rather than inspected at runtime. Wire format:
//
//   {"eventType": "CREATE"|"DELETE", "key": <i32>, "data": <payload|null>,
//    "eventCreatedAt": <timestamp>}
//
// DELETE events carry no data. Immutable once constructed.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Create,
    Delete,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Event<K, T> {
    pub event_type: EventType,
    pub key: K,
    pub data: Option<T>,
    pub event_created_at: DateTime<Utc>,
}

/// Events on the movie channel, keyed by movie id.
pub type MovieEvent = Event<i32, Movie>;
/// Events on the recommendation channel, keyed by the owning movie id.
pub type RecommendationEvent = Event<i32, Recommendation>;
/// Events on the review channel, keyed by the owning movie id.
pub type ReviewEvent = Event<i32, Review>;

impl<K, T> Event<K, T> {
    pub fn create(key: K, data: T) -> Self {
        Self {
            event_type: EventType::Create,
            key,
            data: Some(data),
            event_created_at: Utc::now(),
        }
    }

    pub fn delete(key: K) -> Self {
        Self {
            event_type: EventType::Delete,
            key,
            data: None,
            event_created_at: Utc::now(),
        }
    }
}

impl<K, T> Event<K, T>
where
    K: for<'de> Deserialize<'de>,
    T: for<'de> Deserialize<'de>,
{
    /// Decode one message from this event's channel. A payload that does not
    /// parse is an EventProcessing failure for that single message.
    pub fn decode(payload: &str) -> Result<Self, ServiceError> {
        serde_json::from_str(payload)
            .map_err(|e| ServiceError::EventProcessing(format!("Malformed event payload: {}", e)))
    }
}

impl<K, T> Event<K, T>
where
    K: Serialize,
    T: Serialize,
{
    pub fn encode(&self) -> Result<String, ServiceError> {
        serde_json::to_string(self)
            .map_err(|e| ServiceError::EventProcessing(format!("Unencodable event: {}", e)))
    }
}
