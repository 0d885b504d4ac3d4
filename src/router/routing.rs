//! Precomputed all-pairs shortest paths over a [`Graph`].
//!
//! Construction pays O(V^3) once so that every query afterwards costs only
//! the length of the reconstructed path. Weights must be non-negative.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::graph::{EdgeId, Graph, VertexId};

/// One cell of the all-pairs table: the best known total weight from the row
/// source to the column target, and the last edge of that path (`None` on
/// the diagonal).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteData {
    pub weight: f64,
    pub prev_edge: Option<EdgeId>,
}

/// Dense V x V table of optional [`RouteData`] cells; a cell is present iff
/// a path exists.
#[derive(Debug, Default, Clone)]
pub struct RoutingTable {
    cells: Vec<Vec<Option<RouteData>>>,
}

impl RoutingTable {
    pub fn new(graph: &Graph) -> Self {
        let vertex_count = graph.vertex_count();
        let mut cells = vec![vec![None; vertex_count]; vertex_count];
        for (vertex, row) in cells.iter_mut().enumerate() {
            row[vertex] = Some(RouteData {
                weight: 0.0,
                prev_edge: None,
            });
        }
        // Seed with the lightest direct edge per vertex pair. Strictly-less
        // comparison keeps the first minimal edge id, which keeps the table
        // reproducible across runs.
        for (id, edge) in graph.edges().iter().enumerate() {
            let cell = &mut cells[edge.from as usize][edge.to as usize];
            let improves = match cell {
                Some(existing) => edge.weight < existing.weight,
                None => true,
            };
            if improves {
                *cell = Some(RouteData {
                    weight: edge.weight,
                    prev_edge: Some(id as EdgeId),
                });
            }
        }
        // Relax through every intermediate vertex. For a fixed vertex the
        // source rows are independent, so they relax in parallel; each row
        // is still processed by a single thread in index order.
        for through in 0..vertex_count {
            let through_row = cells[through].clone();
            cells.par_iter_mut().for_each(|row| {
                let Some(to_through) = row[through] else {
                    return;
                };
                for (target, via) in through_row.iter().enumerate() {
                    let Some(via) = via else {
                        continue;
                    };
                    let candidate = to_through.weight + via.weight;
                    let improves = match &row[target] {
                        Some(existing) => candidate < existing.weight,
                        None => true,
                    };
                    if improves {
                        row[target] = Some(RouteData {
                            weight: candidate,
                            prev_edge: via.prev_edge.or(to_through.prev_edge),
                        });
                    }
                }
            });
        }
        Self { cells }
    }

    /// The best route between two vertices, as the total weight plus the
    /// edge sequence in traversal order. `None` when no path exists;
    /// `from == to` yields weight 0 and no edges.
    pub fn build_route(
        &self,
        graph: &Graph,
        from: VertexId,
        to: VertexId,
    ) -> Option<(f64, Vec<EdgeId>)> {
        let row = self.cells.get(from as usize)?;
        let total = (*row.get(to as usize)?)?.weight;

        let mut edges = Vec::new();
        let mut cursor = to;
        while let Some(edge_id) =
            self.cells[from as usize][cursor as usize].and_then(|cell| cell.prev_edge)
        {
            edges.push(edge_id);
            cursor = graph.edge(edge_id).from;
        }
        edges.reverse();
        Some((total, edges))
    }

    pub fn cells(&self) -> &[Vec<Option<RouteData>>] {
        &self.cells
    }

    /// Reassembles a table from snapshot cells.
    pub(crate) fn from_cells(cells: Vec<Vec<Option<RouteData>>>) -> Self {
        Self { cells }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::graph::Edge;

    fn edge(from: VertexId, to: VertexId, weight: f64) -> Edge {
        Edge { from, to, weight }
    }

    #[test]
    fn picks_the_lighter_path() {
        let mut graph = Graph::new(4);
        graph.add_edge(edge(0, 1, 1.0));
        graph.add_edge(edge(1, 2, 1.0));
        graph.add_edge(edge(0, 2, 5.0));
        graph.add_edge(edge(2, 3, 1.0));
        let table = RoutingTable::new(&graph);

        let (weight, edges) = table.build_route(&graph, 0, 3).unwrap();
        assert_eq!(weight, 3.0);
        assert_eq!(edges, vec![0, 1, 3]);
    }

    #[test]
    fn reports_missing_paths() {
        let mut graph = Graph::new(3);
        graph.add_edge(edge(0, 1, 1.0));
        let table = RoutingTable::new(&graph);
        assert!(table.build_route(&graph, 1, 0).is_none());
        assert!(table.build_route(&graph, 0, 2).is_none());
    }

    #[test]
    fn trivial_route_is_empty() {
        let graph = Graph::new(2);
        let table = RoutingTable::new(&graph);
        let (weight, edges) = table.build_route(&graph, 1, 1).unwrap();
        assert_eq!(weight, 0.0);
        assert!(edges.is_empty());
    }

    #[test]
    fn equal_weight_tie_is_deterministic() {
        // Two parallel edges of equal weight: the first id wins, every run.
        let mut graph = Graph::new(2);
        graph.add_edge(edge(0, 1, 2.0));
        graph.add_edge(edge(0, 1, 2.0));
        let table = RoutingTable::new(&graph);
        let (_, edges) = table.build_route(&graph, 0, 1).unwrap();
        assert_eq!(edges, vec![0]);

        let again = RoutingTable::new(&graph);
        assert_eq!(table.cells(), again.cells());
    }
}
