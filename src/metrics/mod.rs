use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry};

use crate::utils::CircuitState;

// ============================================================================
// Prometheus Metrics
// ============================================================================
//
// Observability for the composite paths:
// - request counters and latency per composite operation
// - per-service fan-out call outcomes
// - fallback invocations (substituted vs. still absent)
// - circuit breaker state
// - outbound event publishes and failures per channel
//
// Scraped via GET /metrics on the main HTTP server.
//
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub composite_requests: IntCounterVec,
    pub request_duration: HistogramVec,
    pub fanout_calls: IntCounterVec,
    pub fallback_invocations: IntCounterVec,
    pub breaker_state: IntGauge,
    pub events_published: IntCounterVec,
    pub publish_failures: IntCounterVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let composite_requests = IntCounterVec::new(
            Opts::new("composite_requests_total", "Composite API requests"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(composite_requests.clone()))?;

        let request_duration = HistogramVec::new(
            HistogramOpts::new(
                "composite_request_duration_seconds",
                "Composite request duration",
            )
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(request_duration.clone()))?;

        let fanout_calls = IntCounterVec::new(
            Opts::new("fanout_calls_total", "Fan-out sub-query outcomes"),
            &["service", "outcome"],
        )?;
        registry.register(Box::new(fanout_calls.clone()))?;

        let fallback_invocations = IntCounterVec::new(
            Opts::new(
                "fallback_invocations_total",
                "Primary-path fallback invocations",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(fallback_invocations.clone()))?;

        let breaker_state = IntGauge::new(
            "circuit_breaker_state",
            "Movie service circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(breaker_state.clone()))?;

        let events_published = IntCounterVec::new(
            Opts::new("events_published_total", "Outbound events accepted by the broker"),
            &["channel", "event_type"],
        )?;
        registry.register(Box::new(events_published.clone()))?;

        let publish_failures = IntCounterVec::new(
            Opts::new("publish_failures_total", "Outbound publishes that failed"),
            &["channel"],
        )?;
        registry.register(Box::new(publish_failures.clone()))?;

        Ok(Self {
            registry,
            composite_requests,
            request_duration,
            fanout_calls,
            fallback_invocations,
            breaker_state,
            events_published,
            publish_failures,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_request(&self, operation: &str, outcome: &str, duration_secs: f64) {
        self.composite_requests
            .with_label_values(&[operation, outcome])
            .inc();
        self.request_duration
            .with_label_values(&[operation])
            .observe(duration_secs);
    }

    pub fn record_fanout(&self, service: &str, outcome: &str) {
        self.fanout_calls.with_label_values(&[service, outcome]).inc();
    }

    pub fn record_fallback(&self, outcome: &str) {
        self.fallback_invocations.with_label_values(&[outcome]).inc();
    }

    pub fn set_breaker_state(&self, state: CircuitState) {
        let value = match state {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        };
        self.breaker_state.set(value);
    }

    pub fn record_publish(&self, channel: &str, event_type: &str) {
        self.events_published
            .with_label_values(&[channel, event_type])
            .inc();
    }

    pub fn record_publish_failure(&self, channel: &str) {
        self.publish_failures.with_label_values(&[channel]).inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_register_without_collisions() {
        let metrics = Metrics::new().unwrap();
        assert!(!metrics.registry().gather().is_empty());
    }

    #[test]
    fn test_record_request_counts_and_observes() {
        let metrics = Metrics::new().unwrap();
        metrics.record_request("get_composite", "ok", 0.02);
        metrics.record_request("get_composite", "not_found", 0.01);

        let gathered = metrics.registry().gather();
        let requests = gathered
            .iter()
            .find(|m| m.name() == "composite_requests_total")
            .unwrap();
        assert_eq!(requests.metric.len(), 2);
    }

    #[test]
    fn test_breaker_state_gauge_tracks_transitions() {
        let metrics = Metrics::new().unwrap();
        metrics.set_breaker_state(CircuitState::Open);

        let gathered = metrics.registry().gather();
        let state = gathered
            .iter()
            .find(|m| m.name() == "circuit_breaker_state")
            .unwrap();
        assert_eq!(state.metric[0].gauge.value, Some(1.0));
    }
}
