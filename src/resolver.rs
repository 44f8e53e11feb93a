//! Location-graph route resolver.
//!
//! Breadth-first search over a [`NeighborProvider`], memoized in a shared
//! [`PathCache`]. Every route discovered while searching is written back to the
//! cache, and a search that reaches a location with a cached route to the
//! destination stitches onto it instead of exploring further.

use std::collections::HashSet;
use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheEntry, CacheKey, PathCache};
use crate::constraint::{AccessConstraint, tighten_all};
use crate::error::{CacheWriteConflict, ResolveError};
use crate::location::LocationId;
use crate::path::{Path, stitch};
use crate::traits::NeighborProvider;
use crate::workspace::Workspace;

/// What to do when a cache key is written twice with different values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictPolicy {
    Panic,
    Log,
}

impl Default for ConflictPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            ConflictPolicy::Panic
        } else {
            ConflictPolicy::Log
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveOptions {
    /// Maximum number of hops explored. `None` searches the whole graph.
    pub max_depth: Option<usize>,
    /// Cache keys probed, in order, when the caller gives no restriction.
    /// Only a cached route counts; a cached "unreachable" under a narrower
    /// restriction says nothing about the others.
    pub undefined_hint_probes: Vec<AccessConstraint>,
    pub on_conflict: ConflictPolicy,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            undefined_hint_probes: vec![AccessConstraint::Male, AccessConstraint::Female],
            on_conflict: ConflictPolicy::default(),
        }
    }
}

/// A resolved route and the restriction it imposes on whoever travels it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub path: Path,
    pub constraint: AccessConstraint,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Found(Route),
    /// No route exists under the requested restriction. Cached.
    Unreachable,
    /// The depth bound cut the search short. Not cached.
    NotFoundWithinBound,
}

impl Resolution {
    pub fn route(&self) -> Option<&Route> {
        match self {
            Resolution::Found(route) => Some(route),
            _ => None,
        }
    }

    pub fn into_path(self) -> Option<Path> {
        match self {
            Resolution::Found(route) => Some(route.path),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Resolution::Found(_))
    }
}

/// One entry of a batch passed to [`Resolver::resolve_many`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub start: LocationId,
    pub end: LocationId,
    #[serde(default)]
    pub hint: AccessConstraint,
}

impl Query {
    pub fn new(start: impl Into<LocationId>, end: impl Into<LocationId>, hint: AccessConstraint) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            hint,
        }
    }
}

enum Suffix {
    Route(Path, AccessConstraint),
    /// The destination is known to be unreachable from here.
    Dead,
    Unknown,
}

pub struct Resolver<P> {
    provider: P,
    cache: Arc<PathCache>,
    options: ResolveOptions,
}

impl<P: NeighborProvider> Resolver<P> {
    pub fn new(provider: P) -> Self {
        Self::with_options(provider, ResolveOptions::default())
    }

    pub fn with_options(provider: P, options: ResolveOptions) -> Self {
        Self::with_cache(provider, Arc::new(PathCache::new()), options)
    }

    /// Share `cache` with other resolvers over the same graph.
    pub fn with_cache(provider: P, cache: Arc<PathCache>, options: ResolveOptions) -> Self {
        Self {
            provider,
            cache,
            options,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn cache(&self) -> &Arc<PathCache> {
        &self.cache
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Route from `start` to `end`, or `None` for any reason one can't be had.
    ///
    /// Schedule builders treat `None` as "skip this stop".
    pub fn resolve_path(&self, start: &LocationId, end: &LocationId, hint: AccessConstraint) -> Option<Path> {
        match self.resolve(start, end, hint) {
            Ok(resolution) => resolution.into_path(),
            Err(err) => {
                tracing::debug!(%err, "no path");
                None
            }
        }
    }

    pub fn resolve(
        &self,
        start: &LocationId,
        end: &LocationId,
        hint: AccessConstraint,
    ) -> Result<Resolution, ResolveError> {
        let mut workspace = Workspace::new();
        self.resolve_with(&mut workspace, start, end, hint)
    }

    /// Like [`Resolver::resolve`], searching in a caller-owned workspace.
    pub fn resolve_with(
        &self,
        workspace: &mut Workspace,
        start: &LocationId,
        end: &LocationId,
        hint: AccessConstraint,
    ) -> Result<Resolution, ResolveError> {
        if !hint.is_valid() {
            let key = CacheKey::new(self.locate(start)?, self.locate(end)?, hint);
            if self.cache.get(&key).is_none() {
                tracing::debug!(%key, "restriction hint can never be met");
                self.record(key, None, true);
            }
            return Ok(Resolution::Unreachable);
        }
        if let Some(hit) = self.lookup(start, end, hint) {
            tracing::debug!(%start, %end, ?hint, "path cache hit");
            return Ok(hit);
        }

        let canonical_start = self.locate(start)?;
        let canonical_end = self.locate(end)?;
        if canonical_start != *start || canonical_end != *end {
            if let Some(hit) = self.lookup(&canonical_start, &canonical_end, hint) {
                tracing::debug!(start = %canonical_start, end = %canonical_end, ?hint, "path cache hit after canonicalizing");
                return Ok(hit);
            }
        }

        tracing::debug!(start = %canonical_start, end = %canonical_end, ?hint, "path cache miss, searching");
        Ok(self.search(workspace, &canonical_start, &canonical_end, hint))
    }

    /// Route visiting every stop in order. Restrictions picked up on one leg
    /// carry over to the following legs.
    pub fn resolve_itinerary(&self, stops: &[LocationId], hint: AccessConstraint) -> Result<Resolution, ResolveError> {
        let (first, rest) = stops.split_first().ok_or(ResolveError::EmptyItinerary)?;
        if rest.is_empty() {
            return self.resolve(first, first, hint);
        }

        let mut workspace = Workspace::new();
        let mut running = hint;
        let mut joined: Option<Path> = None;
        let mut previous = first;
        for stop in rest {
            let route = match self.resolve_with(&mut workspace, previous, stop, running)? {
                Resolution::Found(route) => route,
                other => {
                    tracing::debug!(from = %previous, to = %stop, ?other, "itinerary leg failed");
                    return Ok(other);
                }
            };
            running = running.tighten(route.constraint);
            joined = Some(match joined {
                None => route.path,
                Some(so_far) => stitch(&so_far, &route.path)?,
            });
            previous = stop;
        }

        Ok(match joined {
            Some(path) => Resolution::Found(Route {
                path,
                constraint: running,
            }),
            None => Resolution::Unreachable,
        })
    }

    /// Drop every cached route. Called once per scheduling generation or after
    /// the world graph changes.
    pub fn invalidate_cache(&self) -> usize {
        let dropped = self.cache.invalidate_all();
        tracing::info!(dropped, generation = self.cache.generation(), "path cache invalidated");
        dropped
    }

    fn locate(&self, location: &LocationId) -> Result<LocationId, ResolveError> {
        self.provider.resolve_location(location).ok_or_else(|| {
            tracing::warn!(%location, "unknown location");
            ResolveError::UnknownLocation {
                location: location.clone(),
            }
        })
    }

    /// Constraints whose cache keys [`Resolver::lookup`] consults for `hint`.
    fn probe_order(&self, hint: AccessConstraint) -> Vec<AccessConstraint> {
        let mut order = vec![AccessConstraint::Unconstrained];
        if hint.is_unconstrained() {
            order.extend(
                self.options
                    .undefined_hint_probes
                    .iter()
                    .copied()
                    .filter(|c| c.is_valid() && !c.is_unconstrained()),
            );
        } else {
            order.push(hint);
        }
        order
    }

    fn lookup(&self, start: &LocationId, end: &LocationId, hint: AccessConstraint) -> Option<Resolution> {
        for constraint in self.probe_order(hint) {
            let key = CacheKey::new(start.clone(), end.clone(), constraint);
            // Fallback probes for an unrestricted query only accept routes.
            let conclusive = constraint.is_unconstrained() || constraint == hint;
            match self.cache.get(&key) {
                Some(Some(path)) => return Some(Resolution::Found(Route { path, constraint })),
                Some(None) if conclusive => return Some(Resolution::Unreachable),
                _ => {}
            }
        }
        None
    }

    /// Cached continuation from `node` to `end` for a route whose running
    /// constraint is `running`.
    fn cached_suffix(&self, node: &LocationId, end: &LocationId, running: AccessConstraint) -> Suffix {
        for constraint in self.probe_order(running) {
            let key = CacheKey::new(node.clone(), end.clone(), constraint);
            let conclusive = constraint.is_unconstrained() || constraint == running;
            match self.cache.get(&key) {
                Some(Some(path)) => return Suffix::Route(path, running.tighten(constraint)),
                Some(None) if conclusive => return Suffix::Dead,
                _ => {}
            }
        }
        Suffix::Unknown
    }

    fn search(
        &self,
        workspace: &mut Workspace,
        start: &LocationId,
        end: &LocationId,
        hint: AccessConstraint,
    ) -> Resolution {
        let query_key = CacheKey::new(start.clone(), end.clone(), hint);
        let probed = self.probe_order(hint);

        let root_restriction = self.provider.access_restriction(start);
        let root_constraint = hint.tighten(root_restriction);
        if !root_constraint.is_valid() {
            tracing::debug!(%start, %end, ?hint, "start location conflicts with restriction");
            self.record(query_key, None, true);
            return Resolution::Unreachable;
        }
        if start == end {
            return Resolution::Found(Route {
                path: Path::single(start.clone()),
                constraint: root_constraint,
            });
        }

        workspace.begin(start.clone(), root_constraint, root_restriction);
        let mut truncated = false;
        let mut pruned = 0;

        while let Some(index) = workspace.pop() {
            let node = workspace.node(index).clone();

            if node.depth > 0 {
                let prefix = workspace.path_to(index);

                if node.id == *end && node.constraint.is_compatible(hint) {
                    self.cache_suffixes(workspace, index, &prefix, hint);
                    let key = CacheKey::new(start.clone(), end.clone(), node.constraint);
                    let strict = probed.contains(&node.constraint);
                    self.record(key, Some(prefix.clone()), strict);
                    tracing::debug!(%start, %end, hops = prefix.hops(), discovered = workspace.discovered(), "route found");
                    return Resolution::Found(Route {
                        path: prefix,
                        constraint: node.constraint,
                    });
                }

                self.record(
                    CacheKey::new(start.clone(), node.id.clone(), node.constraint),
                    Some(prefix.clone()),
                    false,
                );

                match self.cached_suffix(&node.id, end, node.constraint) {
                    Suffix::Route(suffix, constraint) if self.within_bound(prefix.hops() + suffix.hops()) => {
                        if let Some(path) = self.join(&prefix, &suffix) {
                            let key = CacheKey::new(start.clone(), end.clone(), constraint);
                            let strict = probed.contains(&constraint);
                            self.record(key, Some(path.clone()), strict);
                            tracing::debug!(%start, %end, via = %node.id, hops = path.hops(), "route stitched from cache");
                            return Resolution::Found(Route { path, constraint });
                        }
                    }
                    Suffix::Dead => continue,
                    Suffix::Route(..) | Suffix::Unknown => {}
                }
            }

            let neighbors = self.provider.neighbors(&node.id);
            if !self.within_bound(node.depth + 1) {
                // Only a node with somewhere new to go leaves the search incomplete.
                if workspace.has_unexplored(index, &neighbors, |n| self.provider.access_restriction(n)) {
                    truncated = true;
                }
                continue;
            }
            tracing::trace!(location = %node.id, depth = node.depth, neighbors = neighbors.len(), "expanding");
            pruned += workspace.expand(index, neighbors, |n| self.provider.access_restriction(n));
        }

        if truncated {
            tracing::debug!(%start, %end, ?hint, max_depth = ?self.options.max_depth, "not found within depth bound");
            return Resolution::NotFoundWithinBound;
        }
        tracing::debug!(%start, %end, ?hint, pruned, "unreachable");
        self.record(query_key, None, true);
        Resolution::Unreachable
    }

    fn within_bound(&self, hops: usize) -> bool {
        self.options.max_depth.is_none_or(|max_depth| hops <= max_depth)
    }

    /// Stitch `prefix` onto a cached `suffix`, refusing joins that would
    /// revisit a location.
    fn join(&self, prefix: &Path, suffix: &Path) -> Option<Path> {
        let seen: HashSet<&LocationId> = prefix.iter().collect();
        if suffix.iter().skip(1).any(|location| seen.contains(location)) {
            return None;
        }
        stitch(prefix, suffix).ok()
    }

    /// Every proper suffix of a shortest route is itself a shortest route to
    /// the same destination.
    fn cache_suffixes(&self, workspace: &Workspace, index: usize, path: &Path, hint: AccessConstraint) {
        let restrictions = workspace.restrictions_to(index);
        let end = path.tail();
        for i in 1..path.len() - 1 {
            let Some(suffix) = path.suffix_from(i) else {
                break;
            };
            let constraint = hint.tighten(tighten_all(restrictions[i..].iter().copied()));
            self.record(
                CacheKey::new(suffix.head().clone(), end.clone(), constraint),
                Some(suffix),
                false,
            );
        }
    }

    /// Write to the cache. Non-strict writes land only on a vacant key;
    /// strict writes always reach the first-writer-wins check.
    fn record(&self, key: CacheKey, entry: CacheEntry, strict: bool) {
        tracing::trace!(%key, found = entry.is_some(), strict, "caching");
        if !strict {
            self.cache.put_if_absent(key, entry);
            return;
        }
        if let Err(conflict) = self.cache.put(key, entry) {
            self.report(conflict);
        }
    }

    fn report(&self, conflict: CacheWriteConflict) {
        match self.options.on_conflict {
            ConflictPolicy::Panic => panic!("{conflict}"),
            ConflictPolicy::Log => tracing::error!(%conflict, "path cache write conflict"),
        }
    }
}

impl<P: NeighborProvider + Sync> Resolver<P> {
    /// Resolve a batch in parallel. Each rayon worker searches in its own
    /// workspace; all of them share the cache. Results keep query order.
    pub fn resolve_many(&self, queries: &[Query]) -> Vec<Result<Resolution, ResolveError>> {
        queries
            .par_iter()
            .map_init(Workspace::new, |workspace, query| {
                self.resolve_with(workspace, &query.start, &query.end, query.hint)
            })
            .collect()
    }
}
