//! Scratch state for a single breadth-first search.
//!
//! A [`Workspace`] belongs to exactly one search at a time. Callers that run
//! many searches (one worker building a day's schedules) keep one workspace and
//! hand it to [`crate::resolver::Resolver::resolve_with`]; it is cleared before
//! every search so its allocations are reused without leaking state.

use std::collections::{HashSet, VecDeque};

use crate::constraint::AccessConstraint;
use crate::location::LocationId;
use crate::path::Path;

/// One discovered location. `parent` indexes into the same workspace.
#[derive(Debug, Clone)]
pub(crate) struct FrontierNode {
    pub id: LocationId,
    pub parent: Option<usize>,
    /// Running constraint of the route from the root to this node.
    pub constraint: AccessConstraint,
    /// Restriction of this location alone.
    pub restriction: AccessConstraint,
    pub depth: usize,
}

#[derive(Debug, Default)]
pub struct Workspace {
    nodes: Vec<FrontierNode>,
    queue: VecDeque<usize>,
    visited: HashSet<(LocationId, AccessConstraint)>,
    fresh: Vec<(LocationId, AccessConstraint, AccessConstraint)>,
    searches: u64,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the previous search, keeping allocations.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.queue.clear();
        self.visited.clear();
        self.fresh.clear();
    }

    /// Number of searches this workspace has hosted.
    pub fn searches(&self) -> u64 {
        self.searches
    }

    /// Locations discovered by the current (or last) search.
    pub fn discovered(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn begin(&mut self, root: LocationId, constraint: AccessConstraint, restriction: AccessConstraint) {
        self.clear();
        self.searches += 1;
        self.visited.insert((root.clone(), constraint));
        self.nodes.push(FrontierNode {
            id: root,
            parent: None,
            constraint,
            restriction,
            depth: 0,
        });
        self.queue.push_back(0);
    }

    pub(crate) fn pop(&mut self) -> Option<usize> {
        self.queue.pop_front()
    }

    pub(crate) fn node(&self, index: usize) -> &FrontierNode {
        &self.nodes[index]
    }

    /// True when `location` was already reached under `constraint`, or under
    /// `Unconstrained`, which allows everything a narrower constraint does.
    fn seen(&self, location: &LocationId, constraint: AccessConstraint) -> bool {
        self.visited.contains(&(location.clone(), constraint))
            || self
                .visited
                .contains(&(location.clone(), AccessConstraint::Unconstrained))
    }

    /// Collect the neighbors of `parent` that are neither pruned nor visited,
    /// mark them visited and enqueue them in provider order.
    ///
    /// `restriction` returns the location's own restriction. Returns the number
    /// of neighbors pruned by a constraint conflict.
    pub(crate) fn expand<F>(&mut self, parent: usize, neighbors: Vec<LocationId>, mut restriction: F) -> usize
    where
        F: FnMut(&LocationId) -> AccessConstraint,
    {
        let running = self.nodes[parent].constraint;
        let depth = self.nodes[parent].depth + 1;
        let mut pruned = 0;

        self.fresh.clear();
        for neighbor in neighbors {
            let own = restriction(&neighbor);
            let constraint = running.tighten(own);
            if !constraint.is_valid() {
                pruned += 1;
                continue;
            }
            if self.seen(&neighbor, constraint) {
                continue;
            }
            self.visited.insert((neighbor.clone(), constraint));
            self.fresh.push((neighbor, constraint, own));
        }

        for (id, constraint, own) in self.fresh.drain(..) {
            let index = self.nodes.len();
            self.nodes.push(FrontierNode {
                id,
                parent: Some(parent),
                constraint,
                restriction: own,
                depth,
            });
            self.queue.push_back(index);
        }
        pruned
    }

    /// True when [`Workspace::expand`] would enqueue at least one of
    /// `neighbors`. Nothing is marked visited.
    pub(crate) fn has_unexplored<F>(&self, parent: usize, neighbors: &[LocationId], mut restriction: F) -> bool
    where
        F: FnMut(&LocationId) -> AccessConstraint,
    {
        let running = self.nodes[parent].constraint;
        neighbors.iter().any(|neighbor| {
            let constraint = running.tighten(restriction(neighbor));
            constraint.is_valid() && !self.seen(neighbor, constraint)
        })
    }

    /// Walk parent links from `index` back to the root.
    pub(crate) fn path_to(&self, index: usize) -> Path {
        let mut nodes = Vec::with_capacity(self.nodes[index].depth + 1);
        let mut cursor = Some(index);
        while let Some(i) = cursor {
            nodes.push(self.nodes[i].id.clone());
            cursor = self.nodes[i].parent;
        }
        nodes.reverse();
        Path::from_vec_unchecked(nodes)
    }

    /// Own restrictions along the route to `index`, root first.
    pub(crate) fn restrictions_to(&self, index: usize) -> Vec<AccessConstraint> {
        let mut out = Vec::with_capacity(self.nodes[index].depth + 1);
        let mut cursor = Some(index);
        while let Some(i) = cursor {
            out.push(self.nodes[i].restriction);
            cursor = self.nodes[i].parent;
        }
        out.reverse();
        out
    }
}
