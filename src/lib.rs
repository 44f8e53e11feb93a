//! macro-router core
//!
//! Location-graph route resolution for building NPC daily schedules: cached
//! breadth-first search between named locations under access restrictions.

pub mod traits;
pub mod location;
pub mod constraint;
pub mod path;
pub mod graph;
pub mod cache;
pub mod workspace;
pub mod resolver;
pub mod error;
