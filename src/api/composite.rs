use serde::{Deserialize, Serialize};

// ============================================================================
// Composite Aggregate - the Merged Read-Path View
// ============================================================================
//
// Built fresh on every read request, never persisted. Item lists are always
// concrete sequences: an unavailable or empty backend yields an empty list,
// never null.
//
// ============================================================================

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MovieAggregate {
    pub movie_id: i32,
    pub title: String,
    pub genre: String,
    #[serde(default)]
    pub recommendations: Vec<RecommendationSummary>,
    #[serde(default)]
    pub reviews: Vec<ReviewSummary>,
    /// Which service instances answered the three sub-queries. Absent on
    /// create requests since the caller does not own that data.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub service_addresses: Option<ServiceAddresses>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSummary {
    pub recommendation_id: i32,
    pub author: String,
    pub rate: i32,
    #[serde(default)]
    pub content: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub review_id: i32,
    pub author: String,
    pub subject: String,
    #[serde(default)]
    pub content: String,
}

/// cmp = the aggregator itself, mov/rec/rev = the backend instance that
/// answered each sub-query (empty string when the item list was empty).
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ServiceAddresses {
    pub cmp: String,
    pub mov: String,
    pub rec: String,
    pub rev: String,
}
