//! Error types.

use thiserror::Error;

use crate::cache::{CacheEntry, CacheKey};
use crate::location::LocationId;

/// Failure to attempt a query at all.
///
/// Unreachable destinations are not errors; see [`crate::resolver::Resolution`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("unknown location `{location}`")]
    UnknownLocation { location: LocationId },
    #[error("itinerary has no stops")]
    EmptyItinerary,
    #[error("itinerary legs do not join: {0}")]
    Leg(#[from] PathError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("a path needs at least one location")]
    Empty,
    #[error("cannot stitch: prefix ends at `{prefix_tail}` but suffix starts at `{suffix_head}`")]
    BoundaryMismatch {
        prefix_tail: LocationId,
        suffix_head: LocationId,
    },
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("location `{location}` cannot carry the Invalid restriction")]
    InvalidRestriction { location: LocationId },
    #[error("alias `{alias}` points at undeclared location `{target}`")]
    UnknownAliasTarget { alias: LocationId, target: LocationId },
    #[error("alias chain starting at `{alias}` loops")]
    AliasCycle { alias: LocationId },
    #[error("malformed graph table: {0}")]
    Json(#[from] serde_json::Error),
}

/// The same cache key was written twice with different values in one
/// generation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "cache write conflict in generation {generation} for {key}: existing {existing:?}, attempted {attempted:?}"
)]
pub struct CacheWriteConflict {
    pub key: CacheKey,
    pub existing: CacheEntry,
    pub attempted: CacheEntry,
    pub generation: u64,
}
