//! The request driver: parses the input document, feeds base requests to the
//! catalogue, dispatches stat requests, and orchestrates the two phases.
//!
//! Requests with an unknown `type` (or no usable `type`/`id`) are skipped
//! silently for forward compatibility; requests of a known type with broken
//! fields are an input-shape error and abort the batch.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use crate::catalogue::{BusKind, Catalogue};
use crate::json::{Builder, BuilderError};
use crate::render::{MapRenderer, RenderConfig};
use crate::router::{BusRouter, RouteItem, RoutingConfig};
use crate::shared::geo::Coordinate;
use crate::snapshot;

#[derive(Error, Debug)]
pub enum Error {
    #[error("malformed input document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("missing or mistyped field {0:?} in a stat request")]
    MissingField(&'static str),
    #[error("response assembly: {0}")]
    Builder(#[from] BuilderError),
    #[error("snapshot: {0}")]
    Snapshot(#[from] snapshot::Error),
    #[error("input document has no serialization_settings.file")]
    MissingSnapshotPath,
}

/// The root input document. Unknown sections are ignored; request arrays
/// stay untyped so that unknown request kinds can be skipped element-wise.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InputDocument {
    pub base_requests: Vec<Value>,
    pub stat_requests: Vec<Value>,
    pub render_settings: Option<RenderConfig>,
    pub routing_settings: Option<RoutingConfig>,
    pub serialization_settings: Option<SnapshotSettings>,
}

/// One file name shared between both phases.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotSettings {
    pub file: PathBuf,
}

impl InputDocument {
    pub fn parse(input: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(input)?)
    }

    fn snapshot_path(&self) -> Result<&PathBuf, Error> {
        self.serialization_settings
            .as_ref()
            .map(|settings| &settings.file)
            .ok_or(Error::MissingSnapshotPath)
    }
}

#[derive(Debug, Deserialize)]
struct StopRequest {
    name: String,
    latitude: f64,
    longitude: f64,
    road_distances: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
struct BusRequest {
    name: String,
    stops: Vec<String>,
    is_roundtrip: bool,
}

/// Applies a batch of base requests to the catalogue.
pub fn ingest(catalogue: &mut Catalogue, base_requests: &[Value]) -> Result<(), Error> {
    for request in base_requests {
        let Some(object) = request.as_object() else {
            continue;
        };
        let Some(kind) = object.get("type").and_then(Value::as_str) else {
            continue;
        };
        match kind {
            "Stop" => {
                let stop: StopRequest = serde_json::from_value(request.clone())?;
                let distances: Vec<(String, f64)> = stop.road_distances.into_iter().collect();
                catalogue.add_stop(
                    &stop.name,
                    Coordinate {
                        latitude: stop.latitude,
                        longitude: stop.longitude,
                    },
                    &distances,
                );
            }
            "Bus" => {
                let bus: BusRequest = serde_json::from_value(request.clone())?;
                let kind = if bus.is_roundtrip {
                    BusKind::Circular
                } else {
                    BusKind::Linear
                };
                catalogue.add_bus(&bus.name, kind, &bus.stops);
            }
            _ => {}
        }
    }
    let metric = catalogue.common_metric();
    debug!(
        "Ingested {} stops, {} buses",
        metric.stop_count, metric.bus_count
    );
    Ok(())
}

/// Stat-request dispatcher over a loaded (or freshly built) state.
pub struct RequestDriver {
    catalogue: Catalogue,
    routing: RoutingConfig,
    render: RenderConfig,
    router: Option<BusRouter>,
}

impl RequestDriver {
    pub fn new(
        catalogue: Catalogue,
        routing: RoutingConfig,
        render: RenderConfig,
        router: Option<BusRouter>,
    ) -> Self {
        Self {
            catalogue,
            routing,
            render,
            router,
        }
    }

    /// Answers a batch of stat requests, returning the response array in
    /// request order.
    pub fn process(&mut self, stat_requests: &[Value]) -> Result<Value, Error> {
        let mut responses = Builder::new();
        responses.start_array()?;
        for request in stat_requests {
            let Some(object) = request.as_object() else {
                continue;
            };
            let Some(kind) = object.get("type").and_then(Value::as_str) else {
                continue;
            };
            let Some(id) = object.get("id").and_then(Value::as_i64) else {
                continue;
            };

            responses.start_object()?;
            match kind {
                "Bus" => self.answer_bus(object, &mut responses)?,
                "Stop" => self.answer_stop(object, &mut responses)?,
                "Map" => {
                    let map = MapRenderer::new(&self.render)
                        .render(&self.catalogue)
                        .render();
                    responses.key("map")?.value(map)?;
                }
                "Route" => self.answer_route(object, &mut responses)?,
                _ => {}
            }
            responses.key("request_id")?.value(id)?.end_object()?;
        }
        responses.end_array()?;
        Ok(responses.finish()?)
    }

    fn answer_bus(&self, request: &Map<String, Value>, out: &mut Builder) -> Result<(), Error> {
        let name = field_str(request, "name")?;
        match self.catalogue.bus_stats(name) {
            None => {
                out.key("error_message")?.value("not found")?;
            }
            Some(stats) => {
                out.key("stop_count")?
                    .value(stats.stop_count as i64)?
                    .key("unique_stop_count")?
                    .value(stats.unique_stop_count as i64)?
                    .key("route_length")?
                    .value(stats.route_length)?
                    .key("curvature")?
                    .value(stats.curvature)?;
            }
        }
        Ok(())
    }

    fn answer_stop(&self, request: &Map<String, Value>, out: &mut Builder) -> Result<(), Error> {
        let name = field_str(request, "name")?;
        match self.catalogue.stop_info(name) {
            None => {
                out.key("error_message")?.value("not found")?;
            }
            Some(info) => {
                out.key("buses")?.start_array()?;
                for bus in &info.buses {
                    out.value(bus.as_ref())?;
                }
                out.end_array()?;
            }
        }
        Ok(())
    }

    fn answer_route(
        &mut self,
        request: &Map<String, Value>,
        out: &mut Builder,
    ) -> Result<(), Error> {
        let from = field_str(request, "from")?.to_owned();
        let to = field_str(request, "to")?.to_owned();
        let router = self
            .router
            .get_or_insert_with(|| BusRouter::build(&self.catalogue, self.routing));

        match router.route(&from, &to) {
            None => {
                out.key("error_message")?.value("not found")?;
            }
            Some(result) => {
                out.key("total_time")?
                    .value(result.total_time)?
                    .key("items")?
                    .start_array()?;
                for item in &result.items {
                    match item {
                        RouteItem::Wait { stop, time } => {
                            out.start_object()?
                                .key("type")?
                                .value("Wait")?
                                .key("stop_name")?
                                .value(stop.as_ref())?
                                .key("time")?
                                .value(*time)?
                                .end_object()?;
                        }
                        RouteItem::Ride { bus, span, time } => {
                            out.start_object()?
                                .key("type")?
                                .value("Bus")?
                                .key("bus")?
                                .value(bus.as_ref())?
                                .key("span_count")?
                                .value(*span as i64)?
                                .key("time")?
                                .value(*time)?
                                .end_object()?;
                        }
                    }
                }
                out.end_array()?;
            }
        }
        Ok(())
    }
}

fn field_str<'a>(
    request: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, Error> {
    request
        .get(field)
        .and_then(Value::as_str)
        .ok_or(Error::MissingField(field))
}

/// Phase one: ingest the document, compile the router and write the
/// snapshot to `serialization_settings.file`.
pub fn make_base(input: &str) -> Result<(), Error> {
    let document = InputDocument::parse(input)?;
    let path = document.snapshot_path()?.clone();

    let mut catalogue = Catalogue::new();
    ingest(&mut catalogue, &document.base_requests)?;
    let routing = document.routing_settings.unwrap_or_default();
    let render = document.render_settings.unwrap_or_default();
    let router = BusRouter::build(&catalogue, routing);

    snapshot::save(&path, &catalogue, &routing, &render, Some(&router))?;
    let metric = catalogue.common_metric();
    info!(
        "Built base with {} stops, {} buses; snapshot at {:?}",
        metric.stop_count, metric.bus_count, path
    );
    Ok(())
}

/// Phase two: restore the snapshot named by the document and answer its
/// stat batch.
pub fn process_requests(input: &str) -> Result<Value, Error> {
    let document = InputDocument::parse(input)?;
    let path = document.snapshot_path()?.clone();

    let state = snapshot::load(&path)?;
    let mut driver = RequestDriver::new(state.catalogue, state.routing, state.render, state.router);
    driver.process(&document.stat_requests)
}
