use anyhow::Result;
use async_trait::async_trait;
use rdkafka::{
    config::ClientConfig,
    producer::{FutureProducer, FutureRecord},
};
use serde::Serialize;

use crate::api::ServiceError;
use crate::config::Config;
use crate::event::{Event, MovieEvent, RecommendationEvent, ReviewEvent};
use crate::integration::EventPublisher;
use crate::utils::{retry_on_transient, RetryConfig};

// ============================================================================
// Redpanda / Kafka Event Publisher
// ============================================================================
//
// Fire-and-forget beyond the publish step: we wait for the broker to accept
// the record, retry transient broker errors, and never track consumer-side
// application. The record key is the movie id, which is the partition key
// the per-channel ordering guarantee hangs on. No deduplication happens
// here; duplicates are the consumers' problem.
//
// ============================================================================

pub struct RedpandaPublisher {
    producer: FutureProducer,
    movies_topic: String,
    recommendations_topic: String,
    reviews_topic: String,
    retry: RetryConfig,
}

impl RedpandaPublisher {
    pub fn new(config: &Config) -> Result<Self> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("message.timeout.ms", "5000")
            .create()?;

        Ok(Self {
            producer,
            movies_topic: config.movies_topic.clone(),
            recommendations_topic: config.recommendations_topic.clone(),
            reviews_topic: config.reviews_topic.clone(),
            retry: config.publish_retry.clone(),
        })
    }

    async fn send<T: Serialize + Sync>(
        &self,
        topic: &str,
        event: &Event<i32, T>,
    ) -> Result<(), ServiceError> {
        let key = event.key.to_string();
        let payload = event.encode()?;

        retry_on_transient(&self.retry, |_attempt| {
            let key = key.clone();
            let payload = payload.clone();
            async move {
                let record = FutureRecord::to(topic).key(&key).payload(&payload);

                self.producer
                    .send(
                        record,
                        rdkafka::util::Timeout::After(std::time::Duration::from_secs(5)),
                    )
                    .await
                    .map(|_| ())
                    .map_err(|(e, _)| {
                        ServiceError::Transient(format!("Broker rejected record: {}", e))
                    })
            }
        })
        .await?;

        tracing::info!(topic, key = event.key, event_type = ?event.event_type, "Published event");
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for RedpandaPublisher {
    async fn publish_movie(&self, event: &MovieEvent) -> Result<(), ServiceError> {
        self.send(&self.movies_topic, event).await
    }

    async fn publish_recommendation(
        &self,
        event: &RecommendationEvent,
    ) -> Result<(), ServiceError> {
        self.send(&self.recommendations_topic, event).await
    }

    async fn publish_review(&self, event: &ReviewEvent) -> Result<(), ServiceError> {
        self.send(&self.reviews_topic, event).await
    }
}
