//! Binary snapshot of the whole phase-one state: catalogue, routing and
//! rendering configuration, and the compiled routing graph with its
//! precomputed table.
//!
//! Name-keyed relationships are flattened into dense integer indices at
//! write time (stop and bus indices are their arena positions), and the
//! pointer-linked catalogue is rebuilt in two passes at read time: scalar
//! fields first, cross-references second. Graph structures are only decoded
//! after all entities exist, so descriptors can resolve indices to names.

use std::{collections::HashMap, fs, io, path::Path, sync::Arc, time::Instant};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::catalogue::{Bus, BusKind, Catalogue, Stop};
use crate::render::RenderConfig;
use crate::router::{
    BusRouter, EdgeKind, RoutingConfig,
    graph::{Edge, Graph},
    routing::RouteData,
};
use crate::shared::geo::Coordinate;
use crate::svg::{Color, Point};

#[derive(Error, Debug)]
pub enum Error {
    #[error("snapshot I/O: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot encoding: {0}")]
    Encode(#[from] bincode::error::EncodeError),
    #[error("snapshot decoding: {0}")]
    Decode(#[from] bincode::error::DecodeError),
    #[error("snapshot references stop index {0} out of range")]
    StopIndex(u32),
    #[error("snapshot references bus index {0} out of range")]
    BusIndex(u32),
    #[error("snapshot edge descriptors do not cover a dense edge id range")]
    DescriptorGap,
    #[error("graph references unknown stop {0:?}")]
    UnknownStop(String),
    #[error("graph references unknown bus {0:?}")]
    UnknownBus(String),
}

/// Everything a snapshot restores.
pub struct State {
    pub catalogue: Catalogue,
    pub routing: RoutingConfig,
    pub render: RenderConfig,
    pub router: Option<BusRouter>,
}

// ── Records ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRecord {
    stops: Vec<StopRecord>,
    buses: Vec<BusRecord>,
    routing: RoutingConfig,
    render: RenderRecord,
    graph: Option<GraphRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StopRecord {
    defined: bool,
    name: String,
    latitude: f64,
    longitude: f64,
    /// Indices into `buses`.
    buses: Vec<u32>,
    /// `(stop index, meters)` pairs, sorted by index for reproducibility.
    distances: Vec<(u32, f64)>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BusRecord {
    kind: BusKind,
    name: String,
    /// Indices into `stops`.
    stops: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum ColorRecord {
    Unset,
    Named(String),
    Rgb(u8, u8, u8),
    Rgba(u8, u8, u8, f64),
}

impl From<&Color> for ColorRecord {
    fn from(value: &Color) -> Self {
        match value {
            Color::Unset => ColorRecord::Unset,
            Color::Named(name) => ColorRecord::Named(name.clone()),
            Color::Rgb(red, green, blue) => ColorRecord::Rgb(*red, *green, *blue),
            Color::Rgba(red, green, blue, opacity) => {
                ColorRecord::Rgba(*red, *green, *blue, *opacity)
            }
        }
    }
}

impl From<ColorRecord> for Color {
    fn from(value: ColorRecord) -> Self {
        match value {
            ColorRecord::Unset => Color::Unset,
            ColorRecord::Named(name) => Color::Named(name),
            ColorRecord::Rgb(red, green, blue) => Color::Rgb(red, green, blue),
            ColorRecord::Rgba(red, green, blue, opacity) => Color::Rgba(red, green, blue, opacity),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct RenderRecord {
    width: f64,
    height: f64,
    padding: f64,
    line_width: f64,
    stop_radius: f64,
    bus_label_font_size: u32,
    bus_label_offset: (f64, f64),
    stop_label_font_size: u32,
    stop_label_offset: (f64, f64),
    underlayer_color: ColorRecord,
    underlayer_width: f64,
    color_palette: Vec<ColorRecord>,
}

impl From<&RenderConfig> for RenderRecord {
    fn from(config: &RenderConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            padding: config.padding,
            line_width: config.line_width,
            stop_radius: config.stop_radius,
            bus_label_font_size: config.bus_label_font_size,
            bus_label_offset: (config.bus_label_offset.x, config.bus_label_offset.y),
            stop_label_font_size: config.stop_label_font_size,
            stop_label_offset: (config.stop_label_offset.x, config.stop_label_offset.y),
            underlayer_color: (&config.underlayer_color).into(),
            underlayer_width: config.underlayer_width,
            color_palette: config.color_palette.iter().map(Into::into).collect(),
        }
    }
}

impl From<RenderRecord> for RenderConfig {
    fn from(record: RenderRecord) -> Self {
        Self {
            width: record.width,
            height: record.height,
            padding: record.padding,
            line_width: record.line_width,
            stop_radius: record.stop_radius,
            bus_label_font_size: record.bus_label_font_size,
            bus_label_offset: Point::new(record.bus_label_offset.0, record.bus_label_offset.1),
            stop_label_font_size: record.stop_label_font_size,
            stop_label_offset: Point::new(record.stop_label_offset.0, record.stop_label_offset.1),
            underlayer_color: record.underlayer_color.into(),
            underlayer_width: record.underlayer_width,
            color_palette: record.color_palette.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
enum DescriptorRecord {
    Transfer {
        stop: u32,
    },
    Stage {
        from: u32,
        to: u32,
        bus: u32,
        span: u32,
    },
}

#[derive(Debug, Serialize, Deserialize)]
struct GraphRecord {
    /// `(stop index, vertex id)` pairs in stop order.
    enter_vertices: Vec<(u32, u32)>,
    exit_vertices: Vec<(u32, u32)>,
    /// `(edge id, descriptor)` pairs covering every edge.
    descriptors: Vec<(u32, DescriptorRecord)>,
    edges: Vec<Edge>,
    incidence_lists: Vec<Vec<u32>>,
    /// The V x V shortest-path table.
    table: Vec<Vec<Option<RouteData>>>,
}

// ── Serialization ────────────────────────────────────────────────────────

/// Writes the complete state to `path`.
pub fn save(
    path: &Path,
    catalogue: &Catalogue,
    routing: &RoutingConfig,
    render: &RenderConfig,
    router: Option<&BusRouter>,
) -> Result<(), Error> {
    let started = Instant::now();
    let record = SnapshotRecord {
        stops: catalogue.stops().map(stop_record).collect(),
        buses: catalogue.buses().map(bus_record).collect(),
        routing: *routing,
        render: render.into(),
        graph: router
            .map(|router| graph_record(catalogue, router))
            .transpose()?,
    };
    let bytes = bincode::serde::encode_to_vec(&record, bincode::config::standard())?;
    fs::write(path, &bytes)?;
    debug!(
        "Saved snapshot to {:?}: {} bytes in {:?}",
        path,
        bytes.len(),
        started.elapsed()
    );
    Ok(())
}

fn stop_record(stop: &Stop) -> StopRecord {
    let mut distances: Vec<(u32, f64)> = stop
        .distances
        .iter()
        .map(|(&neighbor, &meters)| (neighbor, meters))
        .collect();
    // The distance map is unordered; sorting keeps snapshot bytes identical
    // across runs.
    distances.sort_by_key(|&(neighbor, _)| neighbor);
    StopRecord {
        defined: stop.defined,
        name: stop.name.to_string(),
        latitude: stop.coordinate.latitude,
        longitude: stop.coordinate.longitude,
        buses: stop.buses.clone(),
        distances,
    }
}

fn bus_record(bus: &Bus) -> BusRecord {
    BusRecord {
        kind: bus.kind,
        name: bus.name.to_string(),
        stops: bus.stops.clone(),
    }
}

fn graph_record(catalogue: &Catalogue, router: &BusRouter) -> Result<GraphRecord, Error> {
    let stop_index = |name: &str| {
        catalogue
            .stop_index(name)
            .ok_or_else(|| Error::UnknownStop(name.to_string()))
    };
    let bus_index = |name: &str| {
        catalogue
            .bus_index(name)
            .ok_or_else(|| Error::UnknownBus(name.to_string()))
    };

    let mut enter_vertices = Vec::new();
    let mut exit_vertices = Vec::new();
    for stop in catalogue.stops() {
        if let Some(&vertex) = router.enter_vertices().get(&stop.name) {
            enter_vertices.push((stop.index, vertex));
        }
        if let Some(&vertex) = router.exit_vertices().get(&stop.name) {
            exit_vertices.push((stop.index, vertex));
        }
    }

    let mut descriptors = Vec::with_capacity(router.descriptors().len());
    for (edge_id, descriptor) in router.descriptors().iter().enumerate() {
        let record = match descriptor {
            EdgeKind::Transfer { stop } => DescriptorRecord::Transfer {
                stop: stop_index(stop)?,
            },
            EdgeKind::Stage {
                from,
                to,
                bus,
                span,
            } => DescriptorRecord::Stage {
                from: stop_index(from)?,
                to: stop_index(to)?,
                bus: bus_index(bus)?,
                span: *span,
            },
        };
        descriptors.push((edge_id as u32, record));
    }

    Ok(GraphRecord {
        enter_vertices,
        exit_vertices,
        descriptors,
        edges: router.graph().edges().to_vec(),
        incidence_lists: router.graph().incidence_lists().to_vec(),
        table: router.table().cells().to_vec(),
    })
}

// ── Deserialization ──────────────────────────────────────────────────────

/// Reads and reconstructs the complete state from `path`.
pub fn load(path: &Path) -> Result<State, Error> {
    let started = Instant::now();
    let bytes = fs::read(path)?;
    let (record, _): (SnapshotRecord, usize) =
        bincode::serde::decode_from_slice(&bytes, bincode::config::standard())?;

    let catalogue = decode_catalogue(&record)?;
    let routing = record.routing;
    let render: RenderConfig = record.render.into();
    let router = record
        .graph
        .map(|graph| decode_router(graph, &catalogue, routing))
        .transpose()?;

    let metric = catalogue.common_metric();
    debug!(
        "Loaded snapshot from {:?}: {} stops, {} buses in {:?}",
        path,
        metric.stop_count,
        metric.bus_count,
        started.elapsed()
    );
    Ok(State {
        catalogue,
        routing,
        render,
        router,
    })
}

fn decode_catalogue(record: &SnapshotRecord) -> Result<Catalogue, Error> {
    let stop_count = record.stops.len() as u32;
    let bus_count = record.buses.len() as u32;
    let check_stop = |index: u32| {
        if index < stop_count {
            Ok(index)
        } else {
            Err(Error::StopIndex(index))
        }
    };
    let check_bus = |index: u32| {
        if index < bus_count {
            Ok(index)
        } else {
            Err(Error::BusIndex(index))
        }
    };

    // Pass one: entities with scalar fields only, indices by position.
    let mut stops: Vec<Stop> = record
        .stops
        .iter()
        .enumerate()
        .map(|(index, stop)| Stop {
            index: index as u32,
            name: Arc::from(stop.name.as_str()),
            coordinate: Coordinate {
                latitude: stop.latitude,
                longitude: stop.longitude,
            },
            defined: stop.defined,
            buses: Vec::new(),
            distances: HashMap::new(),
        })
        .collect();
    let mut buses: Vec<Bus> = record
        .buses
        .iter()
        .enumerate()
        .map(|(index, bus)| Bus {
            index: index as u32,
            name: Arc::from(bus.name.as_str()),
            kind: bus.kind,
            stops: Vec::new(),
        })
        .collect();

    // Pass two: cross-references, now that every index resolves.
    for (index, stop) in record.stops.iter().enumerate() {
        for &bus in &stop.buses {
            stops[index].buses.push(check_bus(bus)?);
        }
        for &(neighbor, meters) in &stop.distances {
            stops[index].distances.insert(check_stop(neighbor)?, meters);
        }
    }
    for (index, bus) in record.buses.iter().enumerate() {
        for &stop in &bus.stops {
            buses[index].stops.push(check_stop(stop)?);
        }
    }

    Ok(Catalogue::from_parts(stops, buses))
}

fn decode_router(
    record: GraphRecord,
    catalogue: &Catalogue,
    config: RoutingConfig,
) -> Result<BusRouter, Error> {
    let stop_name = |index: u32| {
        catalogue
            .try_stop_at(index)
            .map(|stop| stop.name.clone())
            .ok_or(Error::StopIndex(index))
    };
    let bus_name = |index: u32| {
        catalogue
            .try_bus_at(index)
            .map(|bus| bus.name.clone())
            .ok_or(Error::BusIndex(index))
    };

    let mut enter_vertex = HashMap::with_capacity(record.enter_vertices.len());
    for (stop, vertex) in record.enter_vertices {
        enter_vertex.insert(stop_name(stop)?, vertex);
    }
    let mut exit_vertex = HashMap::with_capacity(record.exit_vertices.len());
    for (stop, vertex) in record.exit_vertices {
        exit_vertex.insert(stop_name(stop)?, vertex);
    }

    let mut pairs = record.descriptors;
    pairs.sort_by_key(|&(edge_id, _)| edge_id);
    let mut descriptors = Vec::with_capacity(pairs.len());
    for (position, (edge_id, descriptor)) in pairs.into_iter().enumerate() {
        if edge_id as usize != position {
            return Err(Error::DescriptorGap);
        }
        descriptors.push(match descriptor {
            DescriptorRecord::Transfer { stop } => EdgeKind::Transfer {
                stop: stop_name(stop)?,
            },
            DescriptorRecord::Stage {
                from,
                to,
                bus,
                span,
            } => EdgeKind::Stage {
                from: stop_name(from)?,
                to: stop_name(to)?,
                bus: bus_name(bus)?,
                span,
            },
        });
    }

    let graph = Graph::from_parts(record.edges, record.incidence_lists);
    let table = crate::router::routing::RoutingTable::from_cells(record.table);
    Ok(BusRouter::from_parts(
        config,
        graph,
        table,
        descriptors,
        enter_vertex,
        exit_vertex,
    ))
}
