//! The catalogue data model: deduplicated stop and bus arenas with
//! cross-references by dense index, late binding of stops referenced before
//! they are defined, and the directional road-distance fallback.

mod entities;

pub use entities::*;

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use crate::shared::geo::Coordinate;

/// The in-memory transport catalogue.
///
/// Stops and buses live in arenas indexed by `u32`; names resolve through
/// lookup maps. Arena order is insertion order and stays stable for the
/// whole run; snapshot indices and graph vertex assignment rely on it.
#[derive(Debug, Default)]
pub struct Catalogue {
    stops: Vec<Stop>,
    buses: Vec<Bus>,
    stop_lookup: HashMap<Arc<str>, u32>,
    bus_lookup: HashMap<Arc<str>, u32>,
}

impl Catalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the named stop, allocating a placeholder entry on first
    /// mention.
    fn intern_stop(&mut self, name: &str) -> u32 {
        if let Some(index) = self.stop_lookup.get(name) {
            return *index;
        }
        let index = self.stops.len() as u32;
        let name: Arc<str> = Arc::from(name);
        self.stops.push(Stop {
            index,
            name: name.clone(),
            ..Default::default()
        });
        self.stop_lookup.insert(name, index);
        index
    }

    /// Registers a stop definition.
    ///
    /// Upgrades a placeholder in place, keeping any buses already recorded
    /// there. A second definition of an already defined name is ignored.
    /// Neighbors named in `distances` that do not exist yet become
    /// placeholders.
    pub fn add_stop(&mut self, name: &str, coordinate: Coordinate, distances: &[(String, f64)]) {
        let index = self.intern_stop(name);
        let resolved: Vec<(u32, f64)> = distances
            .iter()
            .map(|(neighbor, meters)| (self.intern_stop(neighbor), *meters))
            .collect();

        let stop = &mut self.stops[index as usize];
        if stop.defined {
            return;
        }
        stop.defined = true;
        stop.coordinate = coordinate;
        for (neighbor, meters) in resolved {
            stop.distances.entry(neighbor).or_insert(meters);
        }
    }

    /// Registers a bus route. A second bus with the same name is ignored.
    /// Every referenced stop (auto-created as a placeholder if unknown)
    /// records the bus in its `buses` set.
    pub fn add_bus(&mut self, name: &str, kind: BusKind, stop_names: &[String]) {
        if self.bus_lookup.contains_key(name) {
            return;
        }
        let stops: Vec<u32> = stop_names
            .iter()
            .map(|stop_name| self.intern_stop(stop_name))
            .collect();
        let index = self.buses.len() as u32;
        for &stop_index in &stops {
            let buses = &mut self.stops[stop_index as usize].buses;
            if !buses.contains(&index) {
                buses.push(index);
            }
        }
        let name: Arc<str> = Arc::from(name);
        self.buses.push(Bus {
            index,
            name: name.clone(),
            kind,
            stops,
        });
        self.bus_lookup.insert(name, index);
    }

    /// Stop view for the request driver. `None` both for names never
    /// mentioned and for placeholders that never received a definition.
    pub fn stop_info(&self, name: &str) -> Option<StopInfo> {
        let stop = self.stop_by_name(name)?;
        if !stop.defined {
            return None;
        }
        let mut buses: Vec<Arc<str>> = stop
            .buses
            .iter()
            .map(|&index| self.buses[index as usize].name.clone())
            .collect();
        buses.sort();
        Some(StopInfo {
            name: stop.name.clone(),
            coordinate: stop.coordinate,
            buses,
        })
    }

    /// Bus view for the request driver; `None` when the name is unknown.
    pub fn bus_info(&self, name: &str) -> Option<BusInfo> {
        let bus = self.bus_by_name(name)?;
        Some(BusInfo {
            name: bus.name.clone(),
            kind: bus.kind,
            stops: bus
                .stops
                .iter()
                .map(|&index| self.stops[index as usize].name.clone())
                .collect(),
        })
    }

    /// Road and geodesic distance between two neighboring stops.
    ///
    /// The geodesic component is 0 for a stop paired with itself and while
    /// either endpoint is still a placeholder. The road component falls back
    /// from the declared a->b distance to the declared b->a distance to the
    /// geodesic value. Unknown names yield `(0, 0)`.
    pub fn neighbor_distance(&self, from: &str, to: &str) -> (f64, f64) {
        let (Some(from), Some(to)) = (self.stop_by_name(from), self.stop_by_name(to)) else {
            return (0.0, 0.0);
        };
        self.neighbor_distance_between(from, to)
    }

    pub(crate) fn neighbor_distance_idx(&self, from: u32, to: u32) -> (f64, f64) {
        self.neighbor_distance_between(&self.stops[from as usize], &self.stops[to as usize])
    }

    fn neighbor_distance_between(&self, from: &Stop, to: &Stop) -> (f64, f64) {
        let geodesic = if from.index != to.index && from.defined && to.defined {
            from.coordinate.distance(&to.coordinate)
        } else {
            0.0
        };
        let road = from
            .distances
            .get(&to.index)
            .or_else(|| to.distances.get(&from.index))
            .copied()
            .unwrap_or(geodesic);
        (road, geodesic)
    }

    /// Statistics over the effective traversal of the named bus.
    pub fn bus_stats(&self, name: &str) -> Option<BusStats> {
        let bus = self.bus_by_name(name)?;
        let unique: HashSet<u32> = bus.stops.iter().copied().collect();

        let mut route_length = 0.0;
        let mut geodesic_length = 0.0;
        for pair in bus.stops.windows(2) {
            let (road, geodesic) = self.neighbor_distance_idx(pair[0], pair[1]);
            route_length += road;
            geodesic_length += geodesic;
        }
        let stop_count = match bus.kind {
            BusKind::Linear => {
                // Road distances are asymmetric, so the return leg is summed
                // separately.
                for pair in bus.stops.windows(2) {
                    let (road, geodesic) = self.neighbor_distance_idx(pair[1], pair[0]);
                    route_length += road;
                    geodesic_length += geodesic;
                }
                (bus.stops.len() * 2).saturating_sub(1)
            }
            BusKind::Circular => bus.stops.len(),
        };

        Some(BusStats {
            stop_count,
            unique_stop_count: unique.len(),
            route_length,
            curvature: route_length / geodesic_length,
        })
    }

    pub fn common_metric(&self) -> CommonMetric {
        CommonMetric {
            stop_count: self.stops.len(),
            bus_count: self.buses.len(),
        }
    }

    /// All stops in arena order.
    pub fn stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.iter()
    }

    /// All buses in arena order.
    pub fn buses(&self) -> impl Iterator<Item = &Bus> {
        self.buses.iter()
    }

    pub fn stop_at(&self, index: u32) -> &Stop {
        &self.stops[index as usize]
    }

    pub fn try_stop_at(&self, index: u32) -> Option<&Stop> {
        self.stops.get(index as usize)
    }

    pub fn try_bus_at(&self, index: u32) -> Option<&Bus> {
        self.buses.get(index as usize)
    }

    pub fn stop_index(&self, name: &str) -> Option<u32> {
        self.stop_lookup.get(name).copied()
    }

    pub fn bus_index(&self, name: &str) -> Option<u32> {
        self.bus_lookup.get(name).copied()
    }

    fn stop_by_name(&self, name: &str) -> Option<&Stop> {
        let index = self.stop_lookup.get(name)?;
        Some(&self.stops[*index as usize])
    }

    fn bus_by_name(&self, name: &str) -> Option<&Bus> {
        let index = self.bus_lookup.get(name)?;
        Some(&self.buses[*index as usize])
    }

    /// Reassembles a catalogue from snapshot arenas. Lookup maps are rebuilt
    /// from the entity names; indices must already be dense and in arena
    /// order.
    pub(crate) fn from_parts(stops: Vec<Stop>, buses: Vec<Bus>) -> Self {
        let stop_lookup = stops
            .iter()
            .map(|stop| (stop.name.clone(), stop.index))
            .collect();
        let bus_lookup = buses
            .iter()
            .map(|bus| (bus.name.clone(), bus.index))
            .collect();
        Self {
            stops,
            buses,
            stop_lookup,
            bus_lookup,
        }
    }
}
