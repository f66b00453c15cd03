// ============================================================================
// API Layer - Wire-Level Types Shared With the Core Services
// ============================================================================
//
// This module contains the types that cross process boundaries:
// - Core entities (Movie, Recommendation, Review)
// - The composite aggregate returned by the read path
// - The error taxonomy and structured HTTP error body
//
// Field names serialize in camelCase to match the backend services' JSON.
//
// ============================================================================

pub mod composite;
pub mod core;
pub mod error;

pub use composite::*;
pub use core::*;
pub use error::*;
