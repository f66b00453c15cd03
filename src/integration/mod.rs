use async_trait::async_trait;

use crate::api::{Movie, Recommendation, Review, ServiceError};
use crate::composite::health::HealthStatus;
use crate::event::{MovieEvent, RecommendationEvent, ReviewEvent};

pub mod client;
pub mod messaging;

pub use client::BackendClient;
pub use messaging::RedpandaPublisher;

// ============================================================================
// Integration Seams
// ============================================================================
//
// The aggregator and propagator talk to the outside world only through
// these two traits; production wires in the HTTP client and the Redpanda
// producer, tests wire in stubs.
//
// ============================================================================

/// Synchronous query contract of the three backend services, plus their
/// liveness probes. Implementations are stateless and shared across
/// concurrent requests.
#[async_trait]
pub trait CoreServices: Send + Sync {
    async fn get_movie(&self, movie_id: i32) -> Result<Movie, ServiceError>;
    async fn get_recommendations(&self, movie_id: i32) -> Result<Vec<Recommendation>, ServiceError>;
    async fn get_reviews(&self, movie_id: i32) -> Result<Vec<Review>, ServiceError>;

    async fn movie_health(&self) -> HealthStatus;
    async fn recommendation_health(&self) -> HealthStatus;
    async fn review_health(&self) -> HealthStatus;
}

/// Outbound event channels, one per backend kind. Publishing is
/// at-least-once: the producer retries transient broker errors and never
/// deduplicates; idempotency is the consumer's obligation.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish_movie(&self, event: &MovieEvent) -> Result<(), ServiceError>;
    async fn publish_recommendation(&self, event: &RecommendationEvent)
        -> Result<(), ServiceError>;
    async fn publish_review(&self, event: &ReviewEvent) -> Result<(), ServiceError>;
}
