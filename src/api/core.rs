use serde::{Deserialize, Serialize};

// ============================================================================
// Core Entities - Owned by the Three Backend Services
// ============================================================================
//
// The composite service only ever reads these over HTTP or publishes them
// inside events. Address fields are stamped by whichever service instance
// built the value; they are set at construction and never mutated after.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub movie_id: i32,
    pub title: String,
    pub genre: String,
    /// Address of the movie-service instance that answered, or of the
    /// aggregator itself when the value came from fallback.
    #[serde(default)]
    pub address: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub movie_id: i32,
    pub recommendation_id: i32,
    pub author: String,
    pub rate: i32,
    pub content: String,
    #[serde(default)]
    pub service_address: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub movie_id: i32,
    pub review_id: i32,
    pub author: String,
    pub subject: String,
    pub content: String,
    #[serde(default)]
    pub service_address: String,
}
