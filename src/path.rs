//! Materialized location paths and prefix/suffix stitching.

use serde::{Deserialize, Serialize};

use crate::error::PathError;
use crate::location::LocationId;
use crate::traits::NeighborProvider;

/// Ordered, non-empty sequence of locations. Consecutive entries are adjacent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<LocationId>", into = "Vec<LocationId>")]
pub struct Path {
    nodes: Vec<LocationId>,
}

impl Path {
    pub fn new(nodes: Vec<LocationId>) -> Result<Self, PathError> {
        if nodes.is_empty() {
            return Err(PathError::Empty);
        }
        Ok(Self { nodes })
    }

    /// Callers guarantee `nodes` is non-empty.
    pub(crate) fn from_vec_unchecked(nodes: Vec<LocationId>) -> Self {
        debug_assert!(!nodes.is_empty());
        Self { nodes }
    }

    /// A zero-hop path standing at `location`.
    pub fn single(location: LocationId) -> Self {
        Self {
            nodes: vec![location],
        }
    }

    pub fn head(&self) -> &LocationId {
        &self.nodes[0]
    }

    pub fn tail(&self) -> &LocationId {
        &self.nodes[self.nodes.len() - 1]
    }

    /// Number of locations, including both ends.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Paths are never empty; provided for clippy's `len_without_is_empty`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of edges travelled.
    pub fn hops(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn nodes(&self) -> &[LocationId] {
        &self.nodes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LocationId> {
        self.nodes.iter()
    }

    pub fn contains(&self, location: &LocationId) -> bool {
        self.nodes.contains(location)
    }

    /// Sub-path starting at `index`, or `None` when out of range.
    pub fn suffix_from(&self, index: usize) -> Option<Path> {
        if index >= self.nodes.len() {
            return None;
        }
        Some(Self {
            nodes: self.nodes[index..].to_vec(),
        })
    }

    /// True when every consecutive pair is an edge of `provider`.
    pub fn is_walkable<P: NeighborProvider + ?Sized>(&self, provider: &P) -> bool {
        self.nodes
            .windows(2)
            .all(|pair| provider.neighbors(&pair[0]).contains(&pair[1]))
    }
}

/// Concatenate `prefix` with `suffix`, dropping the shared boundary location.
pub fn stitch(prefix: &Path, suffix: &Path) -> Result<Path, PathError> {
    if prefix.tail() != suffix.head() {
        return Err(PathError::BoundaryMismatch {
            prefix_tail: prefix.tail().clone(),
            suffix_head: suffix.head().clone(),
        });
    }
    let mut nodes = Vec::with_capacity(prefix.len() + suffix.len() - 1);
    nodes.extend_from_slice(&prefix.nodes);
    nodes.extend_from_slice(&suffix.nodes[1..]);
    Ok(Path { nodes })
}

impl TryFrom<Vec<LocationId>> for Path {
    type Error = PathError;

    fn try_from(nodes: Vec<LocationId>) -> Result<Self, Self::Error> {
        Path::new(nodes)
    }
}

impl From<Path> for Vec<LocationId> {
    fn from(path: Path) -> Self {
        path.nodes
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a LocationId;
    type IntoIter = std::slice::Iter<'a, LocationId>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}

impl std::fmt::Display for Path {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, node) in self.nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{}", node)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(names: &[&str]) -> Path {
        Path::new(names.iter().map(|n| LocationId::new(n)).collect()).unwrap()
    }

    #[test]
    fn test_empty_path_rejected() {
        assert_eq!(Path::new(Vec::new()), Err(PathError::Empty));
    }

    #[test]
    fn test_head_tail_hops() {
        let p = path(&["Farm", "BusStop", "Town"]);
        assert_eq!(p.head(), &LocationId::new("farm"));
        assert_eq!(p.tail(), &LocationId::new("town"));
        assert_eq!(p.len(), 3);
        assert_eq!(p.hops(), 2);
    }

    #[test]
    fn test_single() {
        let p = Path::single(LocationId::new("Farm"));
        assert_eq!(p.head(), p.tail());
        assert_eq!(p.hops(), 0);
    }

    #[test]
    fn test_stitch_dedupes_boundary() {
        let prefix = path(&["Farm", "BusStop", "Town"]);
        let suffix = path(&["Town", "Saloon"]);
        let joined = stitch(&prefix, &suffix).unwrap();
        assert_eq!(joined, path(&["Farm", "BusStop", "Town", "Saloon"]));
    }

    #[test]
    fn test_stitch_with_single_node_suffix() {
        let prefix = path(&["Farm", "BusStop"]);
        let joined = stitch(&prefix, &Path::single(LocationId::new("BusStop"))).unwrap();
        assert_eq!(joined, prefix);
    }

    #[test]
    fn test_stitch_boundary_mismatch() {
        let err = stitch(&path(&["Farm", "BusStop"]), &path(&["Town", "Saloon"])).unwrap_err();
        assert!(matches!(err, PathError::BoundaryMismatch { .. }));
    }

    #[test]
    fn test_suffix_from() {
        let p = path(&["Farm", "BusStop", "Town"]);
        assert_eq!(p.suffix_from(1), Some(path(&["BusStop", "Town"])));
        assert_eq!(p.suffix_from(2), Some(path(&["Town"])));
        assert_eq!(p.suffix_from(3), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(path(&["Farm", "Town"]).to_string(), "Farm -> Town");
    }

    #[test]
    fn test_deserialize_rejects_empty() {
        assert!(serde_json::from_str::<Path>("[]").is_err());
        let p: Path = serde_json::from_str("[\"Farm\",\"Town\"]").unwrap();
        assert_eq!(p, path(&["Farm", "Town"]));
    }
}
