//! Access constraint lattice.
//!
//! Locations may be gender-locked (locker rooms, bath houses). A route carries
//! the tightest restriction of every location it passes through; two different
//! restrictions on one route make it unusable.

use serde::{Deserialize, Serialize};

/// Restriction attached to a location or accumulated along a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum AccessConstraint {
    /// Anyone may use the route.
    #[default]
    Unconstrained,
    /// Only characters allowed into male-restricted areas.
    Male,
    /// Only characters allowed into female-restricted areas.
    Female,
    /// No character can satisfy the combined restrictions.
    Invalid,
}

impl AccessConstraint {
    /// The restrictions a location may actually carry.
    pub const RESTRICTIONS: [AccessConstraint; 2] = [AccessConstraint::Male, AccessConstraint::Female];

    /// Combine two restrictions into the tightest one satisfying both.
    pub fn tighten(self, other: AccessConstraint) -> AccessConstraint {
        use AccessConstraint::*;
        match (self, other) {
            (Invalid, _) | (_, Invalid) => Invalid,
            (Unconstrained, x) | (x, Unconstrained) => x,
            (a, b) if a == b => a,
            _ => Invalid,
        }
    }

    /// True when some character can satisfy both restrictions.
    pub fn is_compatible(self, other: AccessConstraint) -> bool {
        self.tighten(other).is_valid()
    }

    pub fn is_valid(self) -> bool {
        self != AccessConstraint::Invalid
    }

    pub fn is_unconstrained(self) -> bool {
        self == AccessConstraint::Unconstrained
    }
}

/// Fold a sequence of restrictions, starting from `Unconstrained`.
pub fn tighten_all<I>(constraints: I) -> AccessConstraint
where
    I: IntoIterator<Item = AccessConstraint>,
{
    constraints
        .into_iter()
        .fold(AccessConstraint::Unconstrained, AccessConstraint::tighten)
}
