use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::integration::{CoreServices, EventPublisher};
use crate::metrics::Metrics;
use crate::utils::CircuitBreaker;

// ============================================================================
// Composite Service - the Core of This Process
// ============================================================================
//
// Read path: fan out to the three backends concurrently, apply timeout,
// circuit breaker and fallback to the primary call, swallow secondary
// failures, merge into one aggregate (aggregator.rs).
//
// Write path: decompose one aggregate into 1+N+M independent events and
// publish them per channel with no cross-channel atomicity (propagator.rs).
//
// ============================================================================

pub mod aggregator;
pub mod fallback;
pub mod health;
pub mod propagator;

pub use fallback::FallbackPolicy;
pub use health::{CompositeHealth, HealthAggregator, HealthStatus};

pub struct MovieCompositeService {
    clients: Arc<dyn CoreServices>,
    publisher: Arc<dyn EventPublisher>,
    breaker: CircuitBreaker,
    fallback: FallbackPolicy,
    /// Address this aggregator reports as ServiceAddresses.cmp
    service_address: String,
    /// Bound on each individual fan-out call
    call_timeout: Duration,
    metrics: Arc<Metrics>,
}

impl MovieCompositeService {
    pub fn new(
        clients: Arc<dyn CoreServices>,
        publisher: Arc<dyn EventPublisher>,
        config: &Config,
        metrics: Arc<Metrics>,
    ) -> Self {
        let service_address = config.service_address();
        Self {
            clients,
            publisher,
            breaker: CircuitBreaker::new(config.breaker.clone()),
            fallback: FallbackPolicy::new(config.poison_key, service_address.clone()),
            service_address,
            call_timeout: config.call_timeout,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MovieAggregate, RecommendationSummary, ReviewSummary};
    use crate::event::{MovieEvent, RecommendationEvent, ReviewEvent};
    use crate::testing::{
        composite_with_clients, composite_with_publisher, InMemoryBackends, RecordingPublisher,
        StubCoreServices,
    };

    fn aggregate_body() -> MovieAggregate {
        MovieAggregate {
            movie_id: 1,
            title: "Shrek".to_string(),
            genre: "animation".to_string(),
            recommendations: vec![
                RecommendationSummary {
                    recommendation_id: 1,
                    author: "ann".to_string(),
                    rate: 5,
                    content: "good".to_string(),
                },
                RecommendationSummary {
                    recommendation_id: 2,
                    author: "bob".to_string(),
                    rate: 4,
                    content: "fine".to_string(),
                },
            ],
            reviews: vec![ReviewSummary {
                review_id: 1,
                author: "cay".to_string(),
                subject: "swamp".to_string(),
                content: "green".to_string(),
            }],
            service_addresses: None,
        }
    }

    /// Drain everything the propagator published, push it through the wire
    /// encoding, and apply it to the in-memory backends the way the real
    /// consumers would.
    fn drain_into(publisher: &RecordingPublisher, backends: &InMemoryBackends) {
        for event in publisher.movies.lock().unwrap().drain(..) {
            let decoded = MovieEvent::decode(&event.encode().unwrap()).unwrap();
            backends.apply_movie_event(decoded).unwrap();
        }
        for event in publisher.recommendations.lock().unwrap().drain(..) {
            let decoded = RecommendationEvent::decode(&event.encode().unwrap()).unwrap();
            backends.apply_recommendation_event(decoded).unwrap();
        }
        for event in publisher.reviews.lock().unwrap().drain(..) {
            let decoded = ReviewEvent::decode(&event.encode().unwrap()).unwrap();
            backends.apply_review_event(decoded).unwrap();
        }
    }

    #[tokio::test]
    async fn test_create_consume_read_round_trip() {
        let publisher = Arc::new(RecordingPublisher::default());
        let writer =
            composite_with_publisher(StubCoreServices::all_empty(), publisher.clone(), |_| {});

        let body = aggregate_body();
        writer.create_composite_movie(body.clone()).await.unwrap();

        let backends = Arc::new(InMemoryBackends::default());
        drain_into(&publisher, &backends);

        let reader = composite_with_clients(
            backends,
            Arc::new(RecordingPublisher::default()),
            |_| {},
        );
        let aggregate = reader.get_composite_movie(body.movie_id).await.unwrap();

        // Address fields are backend-assigned and excluded from comparison.
        assert_eq!(aggregate.movie_id, body.movie_id);
        assert_eq!(aggregate.title, body.title);
        assert_eq!(aggregate.genre, body.genre);
        assert_eq!(aggregate.recommendations, body.recommendations);
        assert_eq!(aggregate.reviews, body.reviews);
    }

    #[tokio::test]
    async fn test_duplicate_create_leaves_exactly_one_downstream_record() {
        let backends = InMemoryBackends::default();

        let event = RecommendationEvent::create(
            1,
            crate::api::Recommendation {
                movie_id: 1,
                recommendation_id: 7,
                author: "ann".to_string(),
                rate: 5,
                content: "again".to_string(),
                service_address: String::new(),
            },
        );
        let copy = RecommendationEvent::decode(&event.encode().unwrap()).unwrap();

        backends.apply_recommendation_event(event).unwrap();
        let second = backends.apply_recommendation_event(copy);

        assert!(matches!(
            second,
            Err(crate::api::ServiceError::InvalidInput(_))
        ));
        assert_eq!(backends.recommendation_count(), 1);
    }

    #[tokio::test]
    async fn test_delete_events_clear_downstream_state() {
        let publisher = Arc::new(RecordingPublisher::default());
        let writer =
            composite_with_publisher(StubCoreServices::all_empty(), publisher.clone(), |_| {});
        let backends = Arc::new(InMemoryBackends::default());

        writer.create_composite_movie(aggregate_body()).await.unwrap();
        drain_into(&publisher, &backends);
        assert_eq!(backends.movie_count(), 1);

        writer.delete_composite_movie(1).await.unwrap();
        drain_into(&publisher, &backends);

        assert_eq!(backends.movie_count(), 0);
        assert_eq!(backends.recommendation_count(), 0);
    }
}
