use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::api::{Movie, Recommendation, Review, ServiceError};
use crate::composite::{HealthStatus, MovieCompositeService};
use crate::config::Config;
use crate::event::consumer::{
    process_movie_event, process_recommendation_event, process_review_event, MovieEventHandler,
    RecommendationEventHandler, ReviewEventHandler,
};
use crate::event::{MovieEvent, RecommendationEvent, ReviewEvent};
use crate::integration::{CoreServices, EventPublisher};
use crate::metrics::Metrics;

// ============================================================================
// Test Support - Stub Backends, Recording Publisher, In-Memory Consumers
// ============================================================================

/// One canned response per backend call.
pub enum StubOutcome<T> {
    Value(T),
    NotFound(String),
    Transient(String),
    /// Respond with the value, but only after the delay (for timeout tests)
    Delayed(Duration, T),
}

impl<T: Clone> StubOutcome<T> {
    async fn resolve(&self) -> Result<T, ServiceError> {
        match self {
            StubOutcome::Value(v) => Ok(v.clone()),
            StubOutcome::NotFound(m) => Err(ServiceError::NotFound(m.clone())),
            StubOutcome::Transient(m) => Err(ServiceError::Transient(m.clone())),
            StubOutcome::Delayed(delay, v) => {
                tokio::time::sleep(*delay).await;
                Ok(v.clone())
            }
        }
    }
}

pub struct StubCoreServices {
    pub movie: StubOutcome<Movie>,
    pub recommendations: StubOutcome<Vec<Recommendation>>,
    pub reviews: StubOutcome<Vec<Review>>,
}

impl StubCoreServices {
    /// A backend set that answers every read with an empty/default value;
    /// useful for write-path tests that never touch the read path.
    pub fn all_empty() -> Self {
        Self {
            movie: StubOutcome::Value(Movie {
                movie_id: 1,
                title: String::new(),
                genre: String::new(),
                address: String::new(),
            }),
            recommendations: StubOutcome::Value(Vec::new()),
            reviews: StubOutcome::Value(Vec::new()),
        }
    }
}

#[async_trait]
impl CoreServices for StubCoreServices {
    async fn get_movie(&self, _movie_id: i32) -> Result<Movie, ServiceError> {
        self.movie.resolve().await
    }

    async fn get_recommendations(
        &self,
        _movie_id: i32,
    ) -> Result<Vec<Recommendation>, ServiceError> {
        self.recommendations.resolve().await
    }

    async fn get_reviews(&self, _movie_id: i32) -> Result<Vec<Review>, ServiceError> {
        self.reviews.resolve().await
    }

    async fn movie_health(&self) -> HealthStatus {
        HealthStatus::Up
    }

    async fn recommendation_health(&self) -> HealthStatus {
        HealthStatus::Up
    }

    async fn review_health(&self) -> HealthStatus {
        HealthStatus::Up
    }
}

/// Captures every published event per channel; optionally fails one channel
/// to exercise the no-rollback semantics.
#[derive(Default)]
pub struct RecordingPublisher {
    pub movies: Mutex<Vec<MovieEvent>>,
    pub recommendations: Mutex<Vec<RecommendationEvent>>,
    pub reviews: Mutex<Vec<ReviewEvent>>,
    pub publish_order: Mutex<Vec<&'static str>>,
    fail_recommendations: bool,
}

impl RecordingPublisher {
    pub fn failing_recommendations() -> Self {
        Self {
            fail_recommendations: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish_movie(&self, event: &MovieEvent) -> Result<(), ServiceError> {
        self.publish_order.lock().unwrap().push("movies");
        self.movies.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn publish_recommendation(
        &self,
        event: &RecommendationEvent,
    ) -> Result<(), ServiceError> {
        self.publish_order.lock().unwrap().push("recommendations");
        if self.fail_recommendations {
            return Err(ServiceError::Transient(
                "recommendation channel down".to_string(),
            ));
        }
        self.recommendations.lock().unwrap().push(event.clone());
        Ok(())
    }

    async fn publish_review(&self, event: &ReviewEvent) -> Result<(), ServiceError> {
        self.publish_order.lock().unwrap().push("reviews");
        self.reviews.lock().unwrap().push(event.clone());
        Ok(())
    }
}

pub fn composite_with(
    stubs: StubCoreServices,
    tweak: impl FnOnce(&mut Config),
) -> MovieCompositeService {
    composite_with_publisher(stubs, Arc::new(RecordingPublisher::default()), tweak)
}

pub fn composite_with_publisher(
    stubs: StubCoreServices,
    publisher: Arc<dyn EventPublisher>,
    tweak: impl FnOnce(&mut Config),
) -> MovieCompositeService {
    composite_with_clients(Arc::new(stubs), publisher, tweak)
}

pub fn composite_with_clients(
    clients: Arc<dyn CoreServices>,
    publisher: Arc<dyn EventPublisher>,
    tweak: impl FnOnce(&mut Config),
) -> MovieCompositeService {
    let mut config = Config::from_env();
    config.call_timeout = Duration::from_secs(1);
    tweak(&mut config);

    let metrics = Arc::new(Metrics::new().unwrap());
    MovieCompositeService::new(clients, publisher, &config, metrics)
}

// ============================================================================
// In-Memory Backends
// ============================================================================
//
// Stand-in for all three backend services at once: consumes events under
// the same uniqueness constraints the real backends enforce, and serves the
// read contract back, stamping its own addresses the way a real instance
// would.
//
// ============================================================================

#[derive(Default)]
pub struct InMemoryBackends {
    inner: Mutex<BackendState>,
}

#[derive(Default)]
pub struct BackendState {
    movies: HashMap<i32, Movie>,
    recommendations: BTreeMap<(i32, i32), Recommendation>,
    reviews: BTreeMap<(i32, i32), Review>,
}

impl MovieEventHandler for BackendState {
    fn create_movie(&mut self, mut movie: Movie) -> Result<(), ServiceError> {
        if self.movies.contains_key(&movie.movie_id) {
            return Err(ServiceError::InvalidInput(format!(
                "Duplicate key for movieId: {}",
                movie.movie_id
            )));
        }
        movie.address = "movie-backend:7001".to_string();
        self.movies.insert(movie.movie_id, movie);
        Ok(())
    }

    fn delete_movie(&mut self, movie_id: i32) -> Result<(), ServiceError> {
        self.movies.remove(&movie_id);
        Ok(())
    }
}

impl RecommendationEventHandler for BackendState {
    fn create_recommendation(
        &mut self,
        mut recommendation: Recommendation,
    ) -> Result<(), ServiceError> {
        let key = (recommendation.movie_id, recommendation.recommendation_id);
        if self.recommendations.contains_key(&key) {
            return Err(ServiceError::InvalidInput(format!(
                "Duplicate key: movieId {} recommendationId {}",
                key.0, key.1
            )));
        }
        recommendation.service_address = "recommendation-backend:7002".to_string();
        self.recommendations.insert(key, recommendation);
        Ok(())
    }

    fn delete_recommendations(&mut self, movie_id: i32) -> Result<(), ServiceError> {
        self.recommendations.retain(|(m, _), _| *m != movie_id);
        Ok(())
    }
}

impl ReviewEventHandler for BackendState {
    fn create_review(&mut self, mut review: Review) -> Result<(), ServiceError> {
        let key = (review.movie_id, review.review_id);
        if self.reviews.contains_key(&key) {
            return Err(ServiceError::InvalidInput(format!(
                "Duplicate key: movieId {} reviewId {}",
                key.0, key.1
            )));
        }
        review.service_address = "review-backend:7003".to_string();
        self.reviews.insert(key, review);
        Ok(())
    }

    fn delete_reviews(&mut self, movie_id: i32) -> Result<(), ServiceError> {
        self.reviews.retain(|(m, _), _| *m != movie_id);
        Ok(())
    }
}

impl InMemoryBackends {
    pub fn apply_movie_event(&self, event: MovieEvent) -> Result<(), ServiceError> {
        process_movie_event(&mut *self.inner.lock().unwrap(), event)
    }

    pub fn apply_recommendation_event(
        &self,
        event: RecommendationEvent,
    ) -> Result<(), ServiceError> {
        process_recommendation_event(&mut *self.inner.lock().unwrap(), event)
    }

    pub fn apply_review_event(&self, event: ReviewEvent) -> Result<(), ServiceError> {
        process_review_event(&mut *self.inner.lock().unwrap(), event)
    }

    pub fn movie_count(&self) -> usize {
        self.inner.lock().unwrap().movies.len()
    }

    pub fn recommendation_count(&self) -> usize {
        self.inner.lock().unwrap().recommendations.len()
    }
}

#[async_trait]
impl CoreServices for InMemoryBackends {
    async fn get_movie(&self, movie_id: i32) -> Result<Movie, ServiceError> {
        self.inner
            .lock()
            .unwrap()
            .movies
            .get(&movie_id)
            .cloned()
            .ok_or_else(|| {
                ServiceError::NotFound(format!("No movie found for movieId: {}", movie_id))
            })
    }

    async fn get_recommendations(
        &self,
        movie_id: i32,
    ) -> Result<Vec<Recommendation>, ServiceError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .recommendations
            .values()
            .filter(|r| r.movie_id == movie_id)
            .cloned()
            .collect())
    }

    async fn get_reviews(&self, movie_id: i32) -> Result<Vec<Review>, ServiceError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .reviews
            .values()
            .filter(|r| r.movie_id == movie_id)
            .cloned()
            .collect())
    }

    async fn movie_health(&self) -> HealthStatus {
        HealthStatus::Up
    }

    async fn recommendation_health(&self) -> HealthStatus {
        HealthStatus::Up
    }

    async fn review_health(&self) -> HealthStatus {
        HealthStatus::Up
    }
}
