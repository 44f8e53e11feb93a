//! Collaborator traits for the location router.
//!
//! The resolver knows nothing about how locations or their connections are
//! discovered. Host code implements [`NeighborProvider`] over its own map data;
//! [`crate::graph::LocationGraph`] is the table-driven implementation.

use crate::constraint::AccessConstraint;
use crate::location::LocationId;

/// Supplies the location graph to the resolver.
///
/// Implementations must already apply aliasing and denylisting, and must
/// enumerate neighbors in a stable order for the lifetime of a cache
/// generation so repeated searches are reproducible.
pub trait NeighborProvider {
    /// Canonical id for `location`, or `None` when it is unknown or excluded
    /// from travel planning.
    fn resolve_location(&self, location: &LocationId) -> Option<LocationId>;

    /// Locations directly reachable from `location`.
    fn neighbors(&self, location: &LocationId) -> Vec<LocationId>;

    /// Restriction imposed by entering `location` itself.
    fn access_restriction(&self, location: &LocationId) -> AccessConstraint;
}

impl<P: NeighborProvider + ?Sized> NeighborProvider for &P {
    fn resolve_location(&self, location: &LocationId) -> Option<LocationId> {
        (**self).resolve_location(location)
    }

    fn neighbors(&self, location: &LocationId) -> Vec<LocationId> {
        (**self).neighbors(location)
    }

    fn access_restriction(&self, location: &LocationId) -> AccessConstraint {
        (**self).access_restriction(location)
    }
}

impl<P: NeighborProvider + ?Sized> NeighborProvider for std::sync::Arc<P> {
    fn resolve_location(&self, location: &LocationId) -> Option<LocationId> {
        (**self).resolve_location(location)
    }

    fn neighbors(&self, location: &LocationId) -> Vec<LocationId> {
        (**self).neighbors(location)
    }

    fn access_restriction(&self, location: &LocationId) -> AccessConstraint {
        (**self).access_restriction(location)
    }
}
