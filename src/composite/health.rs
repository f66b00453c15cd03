use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::integration::CoreServices;

// ============================================================================
// Composite Health
// ============================================================================
//
// Probes the three backends' liveness endpoints independently and folds the
// sub-statuses with worst-status-wins: any DOWN makes the composite DOWN.
// Side-effect free apart from the probes themselves.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Up,
    Down,
}

#[derive(Serialize, Clone, Debug)]
pub struct CompositeHealth {
    pub status: HealthStatus,
    pub components: BTreeMap<String, HealthStatus>,
}

pub struct HealthAggregator {
    clients: Arc<dyn CoreServices>,
}

impl HealthAggregator {
    pub fn new(clients: Arc<dyn CoreServices>) -> Self {
        Self { clients }
    }

    pub async fn health(&self) -> CompositeHealth {
        let (movie, recommendation, review) = tokio::join!(
            self.clients.movie_health(),
            self.clients.recommendation_health(),
            self.clients.review_health()
        );

        let mut components = BTreeMap::new();
        components.insert("movie".to_string(), movie);
        components.insert("recommendation".to_string(), recommendation);
        components.insert("review".to_string(), review);

        CompositeHealth {
            status: fold_statuses(components.values().copied()),
            components,
        }
    }
}

/// Worst status wins.
pub fn fold_statuses<I: IntoIterator<Item = HealthStatus>>(statuses: I) -> HealthStatus {
    if statuses.into_iter().any(|s| s == HealthStatus::Down) {
        HealthStatus::Down
    } else {
        HealthStatus::Up
    }
}
