//! Test fixtures for macro-router.
//!
//! Provides:
//! - small named location graphs (the saloon corridor, a whole valley)
//! - a provider wrapper that counts every call the resolver makes

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use macro_router::constraint::AccessConstraint;
use macro_router::graph::LocationGraph;
use macro_router::location::LocationId;
use macro_router::traits::NeighborProvider;

pub fn id(name: &str) -> LocationId {
    LocationId::new(name)
}

pub fn ids(names: &[&str]) -> Vec<LocationId> {
    names.iter().map(|name| id(name)).collect()
}

/// Install a fmt subscriber that writes through the test harness.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// `Farm <-> Town <-> Saloon <-> Locker`, with the locker male-only.
pub fn saloon_graph() -> LocationGraph {
    LocationGraph::builder()
        .connect("Farm", "Town")
        .connect("Town", "Saloon")
        .connect("Saloon", "Locker")
        .restrict("Locker", AccessConstraint::Male)
        .build()
        .expect("saloon graph")
}

/// A whole valley: one-way warps, gender-locked changing rooms, a denylisted
/// area, an alias and an island nobody can reach.
pub fn valley_graph() -> LocationGraph {
    LocationGraph::builder()
        .connect("Farm", "BusStop")
        .connect("BusStop", "Town")
        .link("BusStop", "Desert")
        .connect("Town", "Saloon")
        .connect("Town", "Beach")
        .connect("Town", "Mountain")
        .connect("Mountain", "Mine")
        .connect("Mountain", "Backwoods")
        .connect("Backwoods", "Farm")
        .connect("Town", "BathHouse")
        .connect("BathHouse", "MensLocker")
        .connect("BathHouse", "WomensLocker")
        .connect("MensLocker", "Pool")
        .connect("WomensLocker", "Pool")
        .restrict("MensLocker", AccessConstraint::Male)
        .restrict("WomensLocker", AccessConstraint::Female)
        .location("Island")
        .deny("Backwoods")
        .alias("BeachNightMarket", "Beach")
        .build()
        .expect("valley graph")
}

pub const VALLEY: [&str; 13] = [
    "Farm",
    "BusStop",
    "Town",
    "Desert",
    "Saloon",
    "Beach",
    "Mountain",
    "Mine",
    "BathHouse",
    "MensLocker",
    "WomensLocker",
    "Pool",
    "Island",
];

/// Wraps a provider and records every call made through it.
#[derive(Debug)]
pub struct CountingProvider<P> {
    inner: P,
    neighbor_calls: AtomicUsize,
    lookup_calls: AtomicUsize,
    restriction_calls: AtomicUsize,
    expanded: Mutex<Vec<LocationId>>,
}

impl<P> CountingProvider<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            neighbor_calls: AtomicUsize::new(0),
            lookup_calls: AtomicUsize::new(0),
            restriction_calls: AtomicUsize::new(0),
            expanded: Mutex::new(Vec::new()),
        }
    }

    pub fn neighbor_calls(&self) -> usize {
        self.neighbor_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.neighbor_calls.load(Ordering::SeqCst)
            + self.lookup_calls.load(Ordering::SeqCst)
            + self.restriction_calls.load(Ordering::SeqCst)
    }

    /// Locations whose neighbors were requested, in call order.
    pub fn expanded(&self) -> Vec<LocationId> {
        self.expanded.lock().expect("expanded log").clone()
    }

    pub fn reset(&self) {
        self.neighbor_calls.store(0, Ordering::SeqCst);
        self.lookup_calls.store(0, Ordering::SeqCst);
        self.restriction_calls.store(0, Ordering::SeqCst);
        self.expanded.lock().expect("expanded log").clear();
    }
}

impl<P: NeighborProvider> NeighborProvider for CountingProvider<P> {
    fn resolve_location(&self, location: &LocationId) -> Option<LocationId> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve_location(location)
    }

    fn neighbors(&self, location: &LocationId) -> Vec<LocationId> {
        self.neighbor_calls.fetch_add(1, Ordering::SeqCst);
        self.expanded
            .lock()
            .expect("expanded log")
            .push(location.clone());
        self.inner.neighbors(location)
    }

    fn access_restriction(&self, location: &LocationId) -> AccessConstraint {
        self.restriction_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.access_restriction(location)
    }
}
