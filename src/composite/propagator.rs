use std::time::Instant;

use crate::api::{Movie, MovieAggregate, Recommendation, Review, ServiceError};
use crate::composite::MovieCompositeService;
use crate::event::{Event, MovieEvent, RecommendationEvent, ReviewEvent};

// ============================================================================
// Write Propagator - the Write Path
// ============================================================================
//
// One aggregate create/delete decomposes into independent events, published
// per channel: movie first, then recommendations, then reviews. There is no
// atomicity across channels; a failed publish never rolls back the ones
// already sent. Consumer-side application is never awaited.
//
// Every event is keyed by the movie id, the partition key the per-channel
// ordering guarantee hangs on. Consumers must be idempotent on (key) and,
// for items, on (key, itemId).
//
// ============================================================================

impl MovieCompositeService {
    pub async fn create_composite_movie(
        &self,
        body: MovieAggregate,
    ) -> Result<(), ServiceError> {
        let started = Instant::now();

        if body.movie_id < 1 {
            self.metrics
                .record_request("create_composite", "invalid_input", 0.0);
            return Err(ServiceError::InvalidInput(format!(
                "Invalid movieId: {}",
                body.movie_id
            )));
        }

        tracing::debug!(movie_id = body.movie_id, "Decomposing aggregate into create events");

        let result = self.publish_creates(&body).await;

        let outcome = if result.is_ok() { "ok" } else { "error" };
        self.metrics
            .record_request("create_composite", outcome, started.elapsed().as_secs_f64());
        result
    }

    async fn publish_creates(&self, body: &MovieAggregate) -> Result<(), ServiceError> {
        // Address fields are cleared before publish: the caller does not own
        // them, the receiving backend stamps its own on read.
        let movie = Movie {
            movie_id: body.movie_id,
            title: body.title.clone(),
            genre: body.genre.clone(),
            address: String::new(),
        };

        self.publish_movie_event(MovieEvent::create(body.movie_id, movie))
            .await?;

        for summary in &body.recommendations {
            let recommendation = Recommendation {
                movie_id: body.movie_id,
                recommendation_id: summary.recommendation_id,
                author: summary.author.clone(),
                rate: summary.rate,
                content: summary.content.clone(),
                service_address: String::new(),
            };
            self.publish_recommendation_event(RecommendationEvent::create(
                body.movie_id,
                recommendation,
            ))
            .await?;
        }

        for summary in &body.reviews {
            let review = Review {
                movie_id: body.movie_id,
                review_id: summary.review_id,
                author: summary.author.clone(),
                subject: summary.subject.clone(),
                content: summary.content.clone(),
                service_address: String::new(),
            };
            self.publish_review_event(ReviewEvent::create(body.movie_id, review))
                .await?;
        }

        Ok(())
    }

    /// Exactly one DELETE per channel, keyed by the movie id, no payload.
    /// All three channels are attempted even when an earlier one fails; the
    /// first failure is returned afterwards.
    pub async fn delete_composite_movie(&self, movie_id: i32) -> Result<(), ServiceError> {
        let started = Instant::now();

        tracing::debug!(movie_id, "Publishing delete events for all three channels");

        let mut first_failure = None;

        if let Err(e) = self.publish_movie_event(Event::delete(movie_id)).await {
            first_failure.get_or_insert(e);
        }
        if let Err(e) = self
            .publish_recommendation_event(Event::delete(movie_id))
            .await
        {
            first_failure.get_or_insert(e);
        }
        if let Err(e) = self.publish_review_event(Event::delete(movie_id)).await {
            first_failure.get_or_insert(e);
        }

        let outcome = if first_failure.is_none() { "ok" } else { "error" };
        self.metrics
            .record_request("delete_composite", outcome, started.elapsed().as_secs_f64());

        match first_failure {
            None => Ok(()),
            Some(e) => Err(e),
        }
    }

    async fn publish_movie_event(&self, event: MovieEvent) -> Result<(), ServiceError> {
        let event_type = event_type_label(&event);
        match self.publisher.publish_movie(&event).await {
            Ok(()) => {
                self.metrics.record_publish("movies", event_type);
                Ok(())
            }
            Err(e) => {
                self.metrics.record_publish_failure("movies");
                tracing::error!(key = event.key, error = %e, "Movie event publish failed");
                Err(e)
            }
        }
    }

    async fn publish_recommendation_event(
        &self,
        event: RecommendationEvent,
    ) -> Result<(), ServiceError> {
        let event_type = event_type_label(&event);
        match self.publisher.publish_recommendation(&event).await {
            Ok(()) => {
                self.metrics.record_publish("recommendations", event_type);
                Ok(())
            }
            Err(e) => {
                self.metrics.record_publish_failure("recommendations");
                tracing::error!(key = event.key, error = %e, "Recommendation event publish failed");
                Err(e)
            }
        }
    }

    async fn publish_review_event(&self, event: ReviewEvent) -> Result<(), ServiceError> {
        let event_type = event_type_label(&event);
        match self.publisher.publish_review(&event).await {
            Ok(()) => {
                self.metrics.record_publish("reviews", event_type);
                Ok(())
            }
            Err(e) => {
                self.metrics.record_publish_failure("reviews");
                tracing::error!(key = event.key, error = %e, "Review event publish failed");
                Err(e)
            }
        }
    }
}

fn event_type_label<K, T>(event: &Event<K, T>) -> &'static str {
    match event.event_type {
        crate::event::EventType::Create => "create",
        crate::event::EventType::Delete => "delete",
    }
}
