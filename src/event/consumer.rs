use crate::api::{Movie, Recommendation, Review, ServiceError};
use crate::event::{Event, EventType};

// ============================================================================
// Event Consumption Contract
// ============================================================================
//
// The three consumers live inside the backend services, but the dispatch
// contract is owned here: a channel's payload decodes to its typed event,
// CREATE applies the carried entity, DELETE applies the key. A CREATE with
// no data is an EventProcessing failure for that one message; the caller's
// consumer loop logs it and keeps going.
//
// Delivery is at-least-once and the producer never deduplicates, so every
// handler must be idempotent on its key: the backends enforce a uniqueness
// constraint on movieId / (movieId, itemId) and reject a duplicate CREATE
// as InvalidInput. That rejection stays on the consumer side.
//
// ============================================================================

pub trait MovieEventHandler {
    fn create_movie(&mut self, movie: Movie) -> Result<(), ServiceError>;
    fn delete_movie(&mut self, movie_id: i32) -> Result<(), ServiceError>;
}

pub trait RecommendationEventHandler {
    fn create_recommendation(&mut self, recommendation: Recommendation) -> Result<(), ServiceError>;
    fn delete_recommendations(&mut self, movie_id: i32) -> Result<(), ServiceError>;
}

pub trait ReviewEventHandler {
    fn create_review(&mut self, review: Review) -> Result<(), ServiceError>;
    fn delete_reviews(&mut self, movie_id: i32) -> Result<(), ServiceError>;
}

pub fn process_movie_event<H: MovieEventHandler>(
    handler: &mut H,
    event: Event<i32, Movie>,
) -> Result<(), ServiceError> {
    tracing::info!(key = event.key, created_at = %event.event_created_at, "Processing movie event");

    match event.event_type {
        EventType::Create => {
            let movie = require_data(event.data)?;
            handler.create_movie(movie)
        }
        EventType::Delete => handler.delete_movie(event.key),
    }
}

pub fn process_recommendation_event<H: RecommendationEventHandler>(
    handler: &mut H,
    event: Event<i32, Recommendation>,
) -> Result<(), ServiceError> {
    tracing::info!(key = event.key, created_at = %event.event_created_at, "Processing recommendation event");

    match event.event_type {
        EventType::Create => {
            let recommendation = require_data(event.data)?;
            handler.create_recommendation(recommendation)
        }
        EventType::Delete => handler.delete_recommendations(event.key),
    }
}

pub fn process_review_event<H: ReviewEventHandler>(
    handler: &mut H,
    event: Event<i32, Review>,
) -> Result<(), ServiceError> {
    tracing::info!(key = event.key, created_at = %event.event_created_at, "Processing review event");

    match event.event_type {
        EventType::Create => {
            let review = require_data(event.data)?;
            handler.create_review(review)
        }
        EventType::Delete => handler.delete_reviews(event.key),
    }
}

fn require_data<T>(data: Option<T>) -> Result<T, ServiceError> {
    data.ok_or_else(|| {
        ServiceError::EventProcessing("CREATE event carried no data".to_string())
    })
}
