//! Table-driven location graph.
//!
//! Map data, warp targets and travel exclusions arrive as plain tables rather
//! than special cases in the resolver: aliases canonicalize one id to another
//! (e.g. a festival variant of a map to its everyday map) and the denylist
//! removes locations from travel planning altogether.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::constraint::AccessConstraint;
use crate::error::GraphError;
use crate::location::LocationId;
use crate::traits::NeighborProvider;

/// One declared location and its outgoing links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationEntry {
    pub id: LocationId,
    #[serde(default)]
    pub restriction: AccessConstraint,
    /// Directed links, in the order they should be explored.
    #[serde(default)]
    pub neighbors: Vec<LocationId>,
}

impl LocationEntry {
    pub fn new(id: impl Into<LocationId>) -> Self {
        Self {
            id: id.into(),
            restriction: AccessConstraint::Unconstrained,
            neighbors: Vec::new(),
        }
    }
}

/// Serialized form of a location graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphTable {
    pub locations: Vec<LocationEntry>,
    /// alias -> target
    pub aliases: BTreeMap<LocationId, LocationId>,
    pub denylist: Vec<LocationId>,
}

#[derive(Debug, Clone)]
struct Node {
    restriction: AccessConstraint,
    neighbors: Vec<LocationId>,
}

/// Immutable location graph implementing [`NeighborProvider`].
#[derive(Debug, Clone, Default)]
pub struct LocationGraph {
    nodes: HashMap<LocationId, Node>,
    aliases: HashMap<LocationId, LocationId>,
    denied: HashSet<LocationId>,
}

impl LocationGraph {
    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }

    /// Parse a [`GraphTable`] from JSON and build it.
    pub fn from_json(json: &str) -> Result<Self, GraphError> {
        let table: GraphTable = serde_json::from_str(json)?;
        Self::from_table(table)
    }

    pub fn from_table(table: GraphTable) -> Result<Self, GraphError> {
        let mut order: Vec<LocationId> = Vec::new();
        let mut declared: HashMap<LocationId, Node> = HashMap::new();

        for entry in table.locations {
            if !entry.restriction.is_valid() {
                return Err(GraphError::InvalidRestriction { location: entry.id });
            }
            match declared.get_mut(&entry.id) {
                Some(node) => {
                    if !entry.restriction.is_unconstrained() {
                        node.restriction = entry.restriction;
                    }
                    node.neighbors.extend(entry.neighbors);
                }
                None => {
                    order.push(entry.id.clone());
                    declared.insert(
                        entry.id,
                        Node {
                            restriction: entry.restriction,
                            neighbors: entry.neighbors,
                        },
                    );
                }
            }
        }

        let aliases = resolve_aliases(&table.aliases, &declared)?;
        let canonical = |id: &LocationId| aliases.get(id).cloned().unwrap_or_else(|| id.clone());

        let denied: HashSet<LocationId> = table.denylist.iter().map(canonical).collect();

        // Aliased declarations hand their outgoing links to the target.
        let mut merged: Vec<(LocationId, Node)> = Vec::with_capacity(order.len());
        let mut slot: HashMap<LocationId, usize> = HashMap::new();
        for id in order {
            let Some(node) = declared.remove(&id) else {
                continue;
            };
            let target = canonical(&id);
            match slot.get(&target) {
                Some(&index) => merged[index].1.neighbors.extend(node.neighbors),
                None => {
                    slot.insert(target.clone(), merged.len());
                    merged.push((target, node));
                }
            }
        }
        let known: HashSet<LocationId> = merged.iter().map(|(id, _)| id.clone()).collect();

        let mut nodes = HashMap::with_capacity(merged.len());
        for (id, node) in merged {
            if denied.contains(&id) {
                continue;
            }
            let mut seen = HashSet::new();
            let mut neighbors = Vec::with_capacity(node.neighbors.len());
            for raw in &node.neighbors {
                let target = canonical(raw);
                if target == id || denied.contains(&target) {
                    continue;
                }
                if !known.contains(&target) {
                    tracing::debug!(from = %id, to = %raw, "dropping link to undeclared location");
                    continue;
                }
                if seen.insert(target.clone()) {
                    neighbors.push(target);
                }
            }
            nodes.insert(
                id,
                Node {
                    restriction: node.restriction,
                    neighbors,
                },
            );
        }

        Ok(Self {
            nodes,
            aliases,
            denied,
        })
    }

    fn canonical<'a>(&'a self, location: &'a LocationId) -> &'a LocationId {
        self.aliases.get(location).unwrap_or(location)
    }

    /// Number of locations available for travel planning.
    pub fn location_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, location: &LocationId) -> bool {
        self.resolve_location(location).is_some()
    }
}

/// Follow alias chains to a declared location.
fn resolve_aliases(
    raw: &BTreeMap<LocationId, LocationId>,
    declared: &HashMap<LocationId, Node>,
) -> Result<HashMap<LocationId, LocationId>, GraphError> {
    let mut resolved = HashMap::with_capacity(raw.len());
    for alias in raw.keys() {
        let mut seen = HashSet::new();
        let mut current = alias;
        seen.insert(current.clone());
        while let Some(next) = raw.get(current) {
            if !seen.insert(next.clone()) {
                return Err(GraphError::AliasCycle {
                    alias: alias.clone(),
                });
            }
            current = next;
        }
        if !declared.contains_key(current) {
            return Err(GraphError::UnknownAliasTarget {
                alias: alias.clone(),
                target: current.clone(),
            });
        }
        resolved.insert(alias.clone(), current.clone());
    }
    Ok(resolved)
}

impl NeighborProvider for LocationGraph {
    fn resolve_location(&self, location: &LocationId) -> Option<LocationId> {
        let canonical = self.canonical(location);
        if self.denied.contains(canonical) {
            return None;
        }
        self.nodes.get_key_value(canonical).map(|(id, _)| id.clone())
    }

    fn neighbors(&self, location: &LocationId) -> Vec<LocationId> {
        self.nodes
            .get(self.canonical(location))
            .map(|node| node.neighbors.clone())
            .unwrap_or_default()
    }

    fn access_restriction(&self, location: &LocationId) -> AccessConstraint {
        self.nodes
            .get(self.canonical(location))
            .map(|node| node.restriction)
            .unwrap_or_default()
    }
}

/// Incremental construction of a [`LocationGraph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    table: GraphTable,
    index: HashMap<LocationId, usize>,
}

impl GraphBuilder {
    fn entry(&mut self, id: LocationId) -> &mut LocationEntry {
        let next = self.table.locations.len();
        let index = *self.index.entry(id.clone()).or_insert(next);
        if index == next {
            self.table.locations.push(LocationEntry::new(id));
        }
        &mut self.table.locations[index]
    }

    /// Declare a location with no links.
    pub fn location(mut self, id: impl Into<LocationId>) -> Self {
        self.entry(id.into());
        self
    }

    pub fn restrict(mut self, id: impl Into<LocationId>, restriction: AccessConstraint) -> Self {
        self.entry(id.into()).restriction = restriction;
        self
    }

    /// One-way link, e.g. a warp with no return.
    pub fn link(mut self, from: impl Into<LocationId>, to: impl Into<LocationId>) -> Self {
        let to = to.into();
        self.entry(to.clone());
        self.entry(from.into()).neighbors.push(to);
        self
    }

    /// Two-way link.
    pub fn connect(self, a: impl Into<LocationId>, b: impl Into<LocationId>) -> Self {
        let a = a.into();
        let b = b.into();
        self.link(a.clone(), b.clone()).link(b, a)
    }

    pub fn alias(mut self, alias: impl Into<LocationId>, target: impl Into<LocationId>) -> Self {
        self.table.aliases.insert(alias.into(), target.into());
        self
    }

    pub fn deny(mut self, id: impl Into<LocationId>) -> Self {
        self.table.denylist.push(id.into());
        self
    }

    pub fn into_table(self) -> GraphTable {
        self.table
    }

    pub fn build(self) -> Result<LocationGraph, GraphError> {
        LocationGraph::from_table(self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> LocationId {
        LocationId::new(name)
    }

    fn town() -> LocationGraph {
        LocationGraph::builder()
            .connect("Farm", "BusStop")
            .connect("BusStop", "Town")
            .connect("Town", "Saloon")
            .connect("Town", "Beach")
            .build()
            .unwrap()
    }

    #[test]
    fn test_neighbors_keep_declaration_order() {
        let graph = town();
        assert_eq!(
            graph.neighbors(&id("Town")),
            vec![id("BusStop"), id("Saloon"), id("Beach")]
        );
    }

    #[test]
    fn test_resolve_location_unknown() {
        let graph = town();
        assert_eq!(graph.resolve_location(&id("Desert")), None);
        assert_eq!(graph.resolve_location(&id("town")), Some(id("Town")));
    }

    #[test]
    fn test_aliases_canonicalize_targets() {
        let graph = LocationGraph::builder()
            .connect("Town", "Beach")
            .link("Town", "BeachNightMarket")
            .location("BeachNightMarket")
            .alias("BeachNightMarket", "Beach")
            .build()
            .unwrap();

        assert_eq!(graph.resolve_location(&id("BeachNightMarket")), Some(id("Beach")));
        // The aliased link collapses into the existing one.
        assert_eq!(graph.neighbors(&id("Town")), vec![id("Beach")]);
        assert_eq!(graph.location_count(), 2);
    }

    #[test]
    fn test_alias_chain_followed() {
        let graph = LocationGraph::builder()
            .location("Beach")
            .alias("A", "B")
            .alias("B", "Beach")
            .build()
            .unwrap();
        assert_eq!(graph.resolve_location(&id("A")), Some(id("Beach")));
    }

    #[test]
    fn test_alias_cycle_rejected() {
        let err = LocationGraph::builder()
            .location("Beach")
            .alias("A", "B")
            .alias("B", "A")
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::AliasCycle { .. }));
    }

    #[test]
    fn test_alias_to_undeclared_rejected() {
        let err = LocationGraph::builder()
            .location("Beach")
            .alias("A", "Nowhere")
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::UnknownAliasTarget { .. }));
    }

    #[test]
    fn test_denylist_removes_location_and_links() {
        let graph = LocationGraph::builder()
            .connect("Farm", "BusStop")
            .connect("BusStop", "Backwoods")
            .deny("Backwoods")
            .build()
            .unwrap();
        assert!(!graph.contains(&id("Backwoods")));
        assert_eq!(graph.neighbors(&id("BusStop")), vec![id("Farm")]);
    }

    #[test]
    fn test_invalid_restriction_rejected() {
        let err = LocationGraph::builder()
            .restrict("Locker", AccessConstraint::Invalid)
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidRestriction { .. }));
    }

    #[test]
    fn test_self_loops_and_duplicates_dropped() {
        let graph = LocationGraph::builder()
            .link("Town", "Town")
            .link("Town", "Beach")
            .link("Town", "beach")
            .build()
            .unwrap();
        assert_eq!(graph.neighbors(&id("Town")), vec![id("Beach")]);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{
            "locations": [
                { "id": "Farm", "neighbors": ["Town"] },
                { "id": "Town", "neighbors": ["Farm", "Locker", "Ghost"] },
                { "id": "Locker", "restriction": "Male", "neighbors": ["Town"] }
            ],
            "aliases": { "FarmHouse": "Farm" },
            "denylist": []
        }"#;
        let graph = LocationGraph::from_json(json).unwrap();
        assert_eq!(graph.access_restriction(&id("Locker")), AccessConstraint::Male);
        assert_eq!(graph.neighbors(&id("Town")), vec![id("Farm"), id("Locker")]);
        assert_eq!(graph.resolve_location(&id("FarmHouse")), Some(id("Farm")));
    }

    #[test]
    fn test_from_json_malformed() {
        assert!(matches!(
            LocationGraph::from_json("{ \"locations\": 3 }"),
            Err(GraphError::Json(_))
        ));
    }
}
