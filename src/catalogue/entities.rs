use std::{collections::HashMap, sync::Arc};

use crate::shared::geo::Coordinate;

/// A single catalogued stop.
///
/// An entry is allocated at the first mention of its name; `defined` stays
/// false while the stop is known only as a road-distance neighbor or a route
/// waypoint and flips when the real definition arrives.
#[derive(Debug, Default, Clone)]
pub struct Stop {
    /// The internal index used for O(1) array lookups in the catalogue.
    pub index: u32,
    /// The unique stop name.
    pub name: Arc<str>,
    pub coordinate: Coordinate,
    /// False for placeholder entries awaiting their definition.
    pub defined: bool,
    /// Indices of buses calling at this stop, in registration order.
    pub buses: Vec<u32>,
    /// Declared road distances to neighboring stops, in meters. Asymmetric:
    /// the reverse direction may be declared separately or not at all.
    pub distances: HashMap<u32, f64>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BusKind {
    /// Traversed forward, then back in reverse.
    #[default]
    Linear,
    /// Traversed once; first and last stop coincide by convention.
    Circular,
}

/// A named bus route over an ordered stop sequence.
#[derive(Debug, Default, Clone)]
pub struct Bus {
    pub index: u32,
    pub name: Arc<str>,
    pub kind: BusKind,
    /// Stop indices in route order.
    pub stops: Vec<u32>,
}

/// Externalized stop view handed to the request driver.
#[derive(Debug, Clone)]
pub struct StopInfo {
    pub name: Arc<str>,
    pub coordinate: Coordinate,
    /// Names of buses calling here, lexicographically sorted.
    pub buses: Vec<Arc<str>>,
}

/// Externalized bus view handed to the request driver.
#[derive(Debug, Clone)]
pub struct BusInfo {
    pub name: Arc<str>,
    pub kind: BusKind,
    pub stops: Vec<Arc<str>>,
}

/// Derived per-bus statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BusStats {
    /// Stops visited over the effective traversal: `2N-1` for a linear bus
    /// of `N` stops, `N` for a circular one.
    pub stop_count: usize,
    pub unique_stop_count: usize,
    /// Road length of the effective traversal, meters.
    pub route_length: f64,
    /// Road length divided by geodesic length.
    pub curvature: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommonMetric {
    pub stop_count: usize,
    pub bus_count: usize,
}
