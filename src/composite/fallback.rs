use crate::api::{Movie, ServiceError};

// ============================================================================
// Fallback Policy for the Primary Lookup
// ============================================================================
//
// Invoked only when the movie service call was rejected by an open circuit.
// NotFound and InvalidInput propagate unchanged and never reach this code.
//
// The substitute is stamped with the aggregator's own address so the
// response still says where its data came from. One configurable poison
// key deterministically reports NotFound even here, so a test environment
// can tell "degraded but available" apart from "degraded and still absent".
//
// ============================================================================

pub struct FallbackPolicy {
    poison_key: i32,
    service_address: String,
}

impl FallbackPolicy {
    pub fn new(poison_key: i32, service_address: String) -> Self {
        Self {
            poison_key,
            service_address,
        }
    }

    pub fn movie(&self, movie_id: i32) -> Result<Movie, ServiceError> {
        if movie_id == self.poison_key {
            tracing::warn!(movie_id, "Poison key not found in fallback");
            return Err(ServiceError::NotFound(format!(
                "Movie id: {} not found in fallback cache",
                movie_id
            )));
        }

        tracing::info!(movie_id, "Substituting fallback movie");
        Ok(Movie {
            movie_id,
            title: format!("Fallback movie {}", movie_id),
            genre: "fallback".to_string(),
            address: self.service_address.clone(),
        })
    }
}
