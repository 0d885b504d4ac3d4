//! Compiles the catalogue into a time-weighted routing graph and decodes
//! optimal itineraries back into semantic wait/ride events.
//!
//! Every stop owns two vertices: an *enter* vertex (where rides arrive) and
//! an *exit* vertex (where rides depart). The only edge between them is the
//! boarding wait, so every itinerary pays the wait before each ride.

pub mod graph;
pub mod routing;

use std::{collections::HashMap, sync::Arc, time::Instant};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalogue::{BusKind, Catalogue};
use graph::{Edge, Graph, VertexId};
use routing::RoutingTable;

/// Routing parameters from `routing_settings`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Boarding wait at every stop, minutes.
    pub bus_wait_time: f64,
    /// Bus velocity, km/h.
    pub bus_velocity: f64,
}

/// Semantic description of one graph edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeKind {
    /// The boarding wait at a stop: enter vertex -> exit vertex.
    Transfer { stop: Arc<str> },
    /// A ride of `span` hops on one bus without leaving the vehicle.
    Stage {
        from: Arc<str>,
        to: Arc<str>,
        bus: Arc<str>,
        span: u32,
    },
}

/// One leg of a reconstructed itinerary. Times are minutes.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteItem {
    Wait { stop: Arc<str>, time: f64 },
    Ride { bus: Arc<str>, span: u32, time: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteResult {
    pub total_time: f64,
    pub items: Vec<RouteItem>,
}

/// The compiled routing engine. Owns its graph, table and descriptors; the
/// catalogue is only needed at build time.
pub struct BusRouter {
    config: RoutingConfig,
    graph: Graph,
    table: RoutingTable,
    /// Edge id -> semantic descriptor, parallel to the graph's edge list.
    descriptors: Vec<EdgeKind>,
    enter_vertex: HashMap<Arc<str>, VertexId>,
    exit_vertex: HashMap<Arc<str>, VertexId>,
}

impl BusRouter {
    /// Compiles the catalogue into a graph and precomputes the routing
    /// table.
    pub fn build(catalogue: &Catalogue, config: RoutingConfig) -> Self {
        let started = Instant::now();

        // Two consecutive vertex ids per stop, in catalogue order.
        let mut enter_vertex = HashMap::new();
        let mut exit_vertex = HashMap::new();
        let mut vertex_count: usize = 0;
        for stop in catalogue.stops() {
            enter_vertex.insert(stop.name.clone(), vertex_count as VertexId);
            exit_vertex.insert(stop.name.clone(), vertex_count as VertexId + 1);
            vertex_count += 2;
        }

        let mut graph = Graph::new(vertex_count);
        let mut descriptors = Vec::new();

        // The uniform boarding penalty between the two vertices of a stop.
        for stop in catalogue.stops() {
            graph.add_edge(Edge {
                from: enter_vertex[&stop.name],
                to: exit_vertex[&stop.name],
                weight: config.bus_wait_time,
            });
            descriptors.push(EdgeKind::Transfer {
                stop: stop.name.clone(),
            });
        }

        // A ride edge for every ordered stop pair of every bus, with road
        // sums accumulated incrementally. Linear buses also ride backwards,
        // and the reverse sum may differ because road distances are
        // asymmetric.
        let meters_per_minute = config.bus_velocity * 1000.0 / 60.0;
        for bus in catalogue.buses() {
            if bus.stops.len() < 2 {
                continue;
            }
            for i in 0..bus.stops.len() - 1 {
                let mut forward = 0.0;
                let mut reverse = 0.0;
                for j in i + 1..bus.stops.len() {
                    forward += catalogue
                        .neighbor_distance_idx(bus.stops[j - 1], bus.stops[j])
                        .0;
                    reverse += catalogue
                        .neighbor_distance_idx(bus.stops[j], bus.stops[j - 1])
                        .0;
                    let from = &catalogue.stop_at(bus.stops[i]).name;
                    let to = &catalogue.stop_at(bus.stops[j]).name;
                    let span = (j - i) as u32;
                    graph.add_edge(Edge {
                        from: exit_vertex[from],
                        to: enter_vertex[to],
                        weight: forward / meters_per_minute,
                    });
                    descriptors.push(EdgeKind::Stage {
                        from: from.clone(),
                        to: to.clone(),
                        bus: bus.name.clone(),
                        span,
                    });
                    if bus.kind == BusKind::Linear {
                        graph.add_edge(Edge {
                            from: exit_vertex[to],
                            to: enter_vertex[from],
                            weight: reverse / meters_per_minute,
                        });
                        descriptors.push(EdgeKind::Stage {
                            from: to.clone(),
                            to: from.clone(),
                            bus: bus.name.clone(),
                            span,
                        });
                    }
                }
            }
        }

        let table = RoutingTable::new(&graph);
        debug!(
            "Compiled routing graph: {} vertices, {} edges in {:?}",
            graph.vertex_count(),
            graph.edge_count(),
            started.elapsed()
        );

        Self {
            config,
            graph,
            table,
            descriptors,
            enter_vertex,
            exit_vertex,
        }
    }

    /// The optimal itinerary between two stops, or `None` when either name
    /// is unknown or no path exists. Travel starts and ends at enter
    /// vertices, so the first item is always a wait.
    pub fn route(&self, from: &str, to: &str) -> Option<RouteResult> {
        let from = *self.enter_vertex.get(from)?;
        let to = *self.enter_vertex.get(to)?;
        let (total_time, edges) = self.table.build_route(&self.graph, from, to)?;

        let items = edges
            .iter()
            .map(|&edge_id| {
                let time = self.graph.edge(edge_id).weight;
                match &self.descriptors[edge_id as usize] {
                    EdgeKind::Transfer { stop } => RouteItem::Wait {
                        stop: stop.clone(),
                        time,
                    },
                    EdgeKind::Stage { bus, span, .. } => RouteItem::Ride {
                        bus: bus.clone(),
                        span: *span,
                        time,
                    },
                }
            })
            .collect();

        Some(RouteResult { total_time, items })
    }

    pub fn config(&self) -> RoutingConfig {
        self.config
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    pub fn descriptors(&self) -> &[EdgeKind] {
        &self.descriptors
    }

    pub fn enter_vertices(&self) -> &HashMap<Arc<str>, VertexId> {
        &self.enter_vertex
    }

    pub fn exit_vertices(&self) -> &HashMap<Arc<str>, VertexId> {
        &self.exit_vertex
    }

    /// Reassembles a router from snapshot parts, without recomputation.
    pub(crate) fn from_parts(
        config: RoutingConfig,
        graph: Graph,
        table: RoutingTable,
        descriptors: Vec<EdgeKind>,
        enter_vertex: HashMap<Arc<str>, VertexId>,
        exit_vertex: HashMap<Arc<str>, VertexId>,
    ) -> Self {
        Self {
            config,
            graph,
            table,
            descriptors,
            enter_vertex,
            exit_vertex,
        }
    }
}
