use std::time::Instant;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::api::{HttpErrorInfo, Movie, Recommendation, Review, ServiceError};
use crate::composite::health::HealthStatus;
use crate::config::Config;
use crate::integration::CoreServices;

// ============================================================================
// Backend HTTP Client
// ============================================================================
//
// One logical client covering the three core services. Stateless apart from
// the connection pool, safe to share across concurrent aggregate requests.
//
// Error mapping:
//   404 -> NotFound        (message from the structured error body)
//   422 -> InvalidInput    (message from the structured error body)
//   anything else, connect errors, undecodable bodies -> Transient
//
// ============================================================================

pub struct BackendClient {
    http: reqwest::Client,
    movie_service_url: String,
    recommendation_service_url: String,
    review_service_url: String,
}

impl BackendClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            movie_service_url: config.movie_service_url.clone(),
            recommendation_service_url: config.recommendation_service_url.clone(),
            review_service_url: config.review_service_url.clone(),
        }
    }

    /// Issue one GET and decode the JSON body, logging destination, latency
    /// and outcome for every physical call.
    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ServiceError> {
        tracing::debug!(url, "Calling backend service");
        let started = Instant::now();

        let result = self.fetch(url).await;
        let latency_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => tracing::info!(url, latency_ms, outcome = "ok", "Backend call finished"),
            Err(e) => {
                tracing::warn!(url, latency_ms, outcome = %e, "Backend call failed")
            }
        }

        result
    }

    async fn fetch<T: DeserializeOwned>(&self, url: &str) -> Result<T, ServiceError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ServiceError::Transient(format!("Request to {} failed: {}", url, e)))?;

        let status = response.status();
        if status.is_success() {
            response.json::<T>().await.map_err(|e| {
                ServiceError::Transient(format!("Undecodable body from {}: {}", url, e))
            })
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(map_status_error(status, url, &body))
        }
    }

    async fn probe(&self, base_url: &str) -> HealthStatus {
        let url = format!("{}/health", base_url);
        tracing::debug!(url, "Probing backend health");

        match self.http.get(&url).send().await {
            Ok(response) if response.status().is_success() => HealthStatus::Up,
            Ok(response) => {
                tracing::warn!(url, status = %response.status(), "Health probe rejected");
                HealthStatus::Down
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "Health probe failed");
                HealthStatus::Down
            }
        }
    }
}

#[async_trait]
impl CoreServices for BackendClient {
    async fn get_movie(&self, movie_id: i32) -> Result<Movie, ServiceError> {
        let url = format!("{}/movie/{}", self.movie_service_url, movie_id);
        self.get_json(&url).await
    }

    async fn get_recommendations(&self, movie_id: i32) -> Result<Vec<Recommendation>, ServiceError> {
        // The backend returns an empty array for unknown keys, never an error.
        let url = format!(
            "{}/recommendation?movieId={}",
            self.recommendation_service_url, movie_id
        );
        self.get_json(&url).await
    }

    async fn get_reviews(&self, movie_id: i32) -> Result<Vec<Review>, ServiceError> {
        let url = format!("{}/review?movieId={}", self.review_service_url, movie_id);
        self.get_json(&url).await
    }

    async fn movie_health(&self) -> HealthStatus {
        self.probe(&self.movie_service_url).await
    }

    async fn recommendation_health(&self) -> HealthStatus {
        self.probe(&self.recommendation_service_url).await
    }

    async fn review_health(&self) -> HealthStatus {
        self.probe(&self.review_service_url).await
    }
}

/// Map a non-success status to the error taxonomy. Unmapped statuses are
/// logged and surfaced as Transient with the original status preserved in
/// the message, never silently swallowed.
fn map_status_error(status: StatusCode, url: &str, body: &str) -> ServiceError {
    match status {
        StatusCode::NOT_FOUND => ServiceError::NotFound(error_message(body, url, status)),
        StatusCode::UNPROCESSABLE_ENTITY => {
            ServiceError::InvalidInput(error_message(body, url, status))
        }
        _ => {
            tracing::warn!(url, status = %status, body, "Unexpected HTTP error from backend");
            ServiceError::Transient(format!("Unexpected HTTP status {} from {}", status, url))
        }
    }
}

/// Prefer the message from the backend's structured error body; fall back
/// to a generic description when the body does not parse.
fn error_message(body: &str, url: &str, status: StatusCode) -> String {
    serde_json::from_str::<HttpErrorInfo>(body)
        .map(|info| info.message)
        .unwrap_or_else(|_| format!("HTTP {} from {}", status, url))
}
