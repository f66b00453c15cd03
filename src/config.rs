use std::time::Duration;

use crate::utils::{CircuitBreakerConfig, RetryConfig};

// ============================================================================
// Configuration
// ============================================================================
//
// Everything is an environment variable with a hard default, so the service
// starts with no configuration at all against a local stack. Service
// discovery is outside this process: each logical backend resolves to one
// base URL.
//
// ============================================================================

/// Movie id the fallback refuses to substitute; lets a test environment
/// distinguish "degraded but available" from "degraded and still absent".
pub const DEFAULT_POISON_KEY: i32 = 13;

#[derive(Clone, Debug)]
pub struct Config {
    /// Port the composite REST API listens on
    pub http_port: u16,
    /// Base URL of the movie service, e.g. http://localhost:7001
    pub movie_service_url: String,
    /// Base URL of the recommendation service
    pub recommendation_service_url: String,
    /// Base URL of the review service
    pub review_service_url: String,
    /// Kafka-compatible broker list for outbound events
    pub brokers: String,
    pub movies_topic: String,
    pub recommendations_topic: String,
    pub reviews_topic: String,
    /// Upper bound on each of the three concurrent read calls
    pub call_timeout: Duration,
    /// Movie id for which even the fallback reports NotFound
    pub poison_key: i32,
    pub breaker: CircuitBreakerConfig,
    pub publish_retry: RetryConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            http_port: env_parsed("COMPOSITE_HTTP_PORT", 7000),
            movie_service_url: env_or("MOVIE_SERVICE_URL", "http://localhost:7001"),
            recommendation_service_url: env_or(
                "RECOMMENDATION_SERVICE_URL",
                "http://localhost:7002",
            ),
            review_service_url: env_or("REVIEW_SERVICE_URL", "http://localhost:7003"),
            brokers: env_or("KAFKA_BROKERS", "127.0.0.1:9092"),
            movies_topic: env_or("MOVIES_TOPIC", "movies"),
            recommendations_topic: env_or("RECOMMENDATIONS_TOPIC", "recommendations"),
            reviews_topic: env_or("REVIEWS_TOPIC", "reviews"),
            call_timeout: Duration::from_millis(env_parsed("CALL_TIMEOUT_MS", 2000u64)),
            poison_key: env_parsed("FALLBACK_POISON_KEY", DEFAULT_POISON_KEY),
            breaker: CircuitBreakerConfig {
                failure_threshold: env_parsed("BREAKER_FAILURE_THRESHOLD", 5),
                cooldown: Duration::from_secs(env_parsed("BREAKER_COOLDOWN_SECS", 30u64)),
                success_threshold: env_parsed("BREAKER_SUCCESS_THRESHOLD", 2),
            },
            publish_retry: RetryConfig::default(),
        }
    }

    /// Address this aggregator instance reports in ServiceAddresses.cmp and
    /// stamps on fallback movies.
    pub fn service_address(&self) -> String {
        let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string());
        format!("{}:{}", host, self.http_port)
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
