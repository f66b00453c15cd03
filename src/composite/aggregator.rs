use std::time::Instant;

use tokio::time::timeout;

use crate::api::{
    Movie, MovieAggregate, Recommendation, RecommendationSummary, Review, ReviewSummary,
    ServiceAddresses, ServiceError,
};
use crate::composite::MovieCompositeService;
use crate::utils::CircuitBreakerError;

// ============================================================================
// Fan-Out Aggregator - the Read Path
// ============================================================================
//
// One aggregate read fans out into three concurrent sub-queries, each with
// its own timeout:
// - movie (primary): circuit breaker + fallback; the only call whose
//   failure can surface to the caller
// - recommendations, reviews (secondary): any failure, including timeout,
//   collapses to an empty list
//
// No state is shared between requests except the breaker and the stateless
// client handles.
//
// ============================================================================

impl MovieCompositeService {
    pub async fn get_composite_movie(
        &self,
        movie_id: i32,
    ) -> Result<MovieAggregate, ServiceError> {
        if movie_id < 1 {
            return Err(ServiceError::InvalidInput(format!(
                "Invalid movieId: {}",
                movie_id
            )));
        }

        let started = Instant::now();

        let movie_fut = self.primary_movie(movie_id);

        let recommendations_fut = async {
            match timeout(self.call_timeout, self.clients.get_recommendations(movie_id)).await {
                Ok(Ok(items)) => {
                    self.metrics.record_fanout("recommendation", "ok");
                    items
                }
                Ok(Err(e)) => {
                    tracing::warn!(movie_id, error = %e, "Recommendation fetch failed, returning empty list");
                    self.metrics.record_fanout("recommendation", "error");
                    Vec::new()
                }
                Err(_) => {
                    tracing::warn!(movie_id, "Recommendation fetch timed out, returning empty list");
                    self.metrics.record_fanout("recommendation", "timeout");
                    Vec::new()
                }
            }
        };

        let reviews_fut = async {
            match timeout(self.call_timeout, self.clients.get_reviews(movie_id)).await {
                Ok(Ok(items)) => {
                    self.metrics.record_fanout("review", "ok");
                    items
                }
                Ok(Err(e)) => {
                    tracing::warn!(movie_id, error = %e, "Review fetch failed, returning empty list");
                    self.metrics.record_fanout("review", "error");
                    Vec::new()
                }
                Err(_) => {
                    tracing::warn!(movie_id, "Review fetch timed out, returning empty list");
                    self.metrics.record_fanout("review", "timeout");
                    Vec::new()
                }
            }
        };

        let (movie, recommendations, reviews) =
            tokio::join!(movie_fut, recommendations_fut, reviews_fut);

        let duration = started.elapsed().as_secs_f64();
        let movie = match movie {
            Ok(movie) => {
                self.metrics.record_request("get_composite", "ok", duration);
                movie
            }
            Err(e) => {
                let outcome = match &e {
                    ServiceError::NotFound(_) => "not_found",
                    ServiceError::InvalidInput(_) => "invalid_input",
                    _ => "error",
                };
                self.metrics.record_request("get_composite", outcome, duration);
                return Err(e);
            }
        };

        Ok(merge_aggregate(
            movie,
            recommendations,
            reviews,
            &self.service_address,
        ))
    }

    /// The primary lookup: timeout counts as a transient failure feeding the
    /// breaker; an open circuit diverts to the fallback policy; every other
    /// error propagates unchanged.
    async fn primary_movie(&self, movie_id: i32) -> Result<Movie, ServiceError> {
        let outcome = self
            .breaker
            .call(async {
                match timeout(self.call_timeout, self.clients.get_movie(movie_id)).await {
                    Ok(result) => result,
                    Err(_) => Err(ServiceError::Transient(format!(
                        "Movie lookup timed out after {:?}",
                        self.call_timeout
                    ))),
                }
            })
            .await;

        self.metrics.set_breaker_state(self.breaker.state().await);

        match outcome {
            Ok(movie) => {
                self.metrics.record_fanout("movie", "ok");
                Ok(movie)
            }
            Err(CircuitBreakerError::CircuitOpen) => {
                self.metrics.record_fanout("movie", "circuit_open");
                let substituted = self.fallback.movie(movie_id);
                self.metrics.record_fallback(if substituted.is_ok() {
                    "substituted"
                } else {
                    "not_found"
                });
                substituted
            }
            Err(CircuitBreakerError::CallFailed(e)) => {
                self.metrics.record_fanout("movie", "error");
                Err(e)
            }
        }
    }
}

/// Merge the three results into one aggregate. Summary ordering follows the
/// order the backends returned; rec/rev addresses come from the first item
/// of each list, or stay empty for an empty list.
pub fn merge_aggregate(
    movie: Movie,
    recommendations: Vec<Recommendation>,
    reviews: Vec<Review>,
    composite_address: &str,
) -> MovieAggregate {
    let recommendation_address = recommendations
        .first()
        .map(|r| r.service_address.clone())
        .unwrap_or_default();
    let review_address = reviews
        .first()
        .map(|r| r.service_address.clone())
        .unwrap_or_default();

    let recommendation_summaries = recommendations
        .into_iter()
        .map(|r| RecommendationSummary {
            recommendation_id: r.recommendation_id,
            author: r.author,
            rate: r.rate,
            content: r.content,
        })
        .collect();

    let review_summaries = reviews
        .into_iter()
        .map(|r| ReviewSummary {
            review_id: r.review_id,
            author: r.author,
            subject: r.subject,
            content: r.content,
        })
        .collect();

    MovieAggregate {
        movie_id: movie.movie_id,
        title: movie.title,
        genre: movie.genre,
        recommendations: recommendation_summaries,
        reviews: review_summaries,
        service_addresses: Some(ServiceAddresses {
            cmp: composite_address.to_string(),
            mov: movie.address,
            rec: recommendation_address,
            rev: review_address,
        }),
    }
}
