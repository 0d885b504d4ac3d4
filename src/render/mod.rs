//! SVG map rendering: a projection from geographic coordinates onto the
//! canvas, and the four z-ordered layers (route lines, route labels, stop
//! circles, stop labels).

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;

use crate::catalogue::{Bus, BusKind, Catalogue};
use crate::shared::geo::Coordinate;
use crate::svg::{self, Color, Point, StrokeLineCap, StrokeLineJoin};

/// Coordinate spans below this are treated as degenerate and get zoom 0.
const SPAN_TOLERANCE: f64 = 1e-6;

/// Rendering parameters from `render_settings`.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct RenderConfig {
    pub width: f64,
    pub height: f64,
    pub padding: f64,
    pub line_width: f64,
    pub stop_radius: f64,
    pub bus_label_font_size: u32,
    pub bus_label_offset: Point,
    pub stop_label_font_size: u32,
    pub stop_label_offset: Point,
    pub underlayer_color: Color,
    pub underlayer_width: f64,
    pub color_palette: Vec<Color>,
}

/// Maps geographic coordinates onto the canvas: longitude grows right,
/// latitude grows up, both scaled by a single zoom factor inside the
/// padding.
#[derive(Debug, Clone, Copy)]
struct Projection {
    min_longitude: f64,
    max_latitude: f64,
    zoom: f64,
    padding: f64,
}

impl Projection {
    fn new<'a>(
        coordinates: impl Iterator<Item = &'a Coordinate>,
        width: f64,
        height: f64,
        padding: f64,
    ) -> Self {
        let mut min_longitude = f64::INFINITY;
        let mut max_longitude = f64::NEG_INFINITY;
        let mut min_latitude = f64::INFINITY;
        let mut max_latitude = f64::NEG_INFINITY;
        for coordinate in coordinates {
            min_longitude = min_longitude.min(coordinate.longitude);
            max_longitude = max_longitude.max(coordinate.longitude);
            min_latitude = min_latitude.min(coordinate.latitude);
            max_latitude = max_latitude.max(coordinate.latitude);
        }

        let zoom_x = if max_longitude - min_longitude > SPAN_TOLERANCE {
            (width - 2.0 * padding) / (max_longitude - min_longitude)
        } else {
            0.0
        };
        let zoom_y = if max_latitude - min_latitude > SPAN_TOLERANCE {
            (height - 2.0 * padding) / (max_latitude - min_latitude)
        } else {
            0.0
        };

        Self {
            min_longitude,
            max_latitude,
            zoom: zoom_x.min(zoom_y),
            padding,
        }
    }

    fn project(&self, coordinate: Coordinate) -> Point {
        Point {
            x: (coordinate.longitude - self.min_longitude) * self.zoom + self.padding,
            y: (self.max_latitude - coordinate.latitude) * self.zoom + self.padding,
        }
    }
}

pub struct MapRenderer<'a> {
    config: &'a RenderConfig,
}

impl<'a> MapRenderer<'a> {
    pub fn new(config: &'a RenderConfig) -> Self {
        Self { config }
    }

    /// Renders the catalogue into an SVG document. Buses with no stops are
    /// skipped everywhere; everything else draws in lexicographic name
    /// order.
    pub fn render(&self, catalogue: &Catalogue) -> svg::Document {
        let mut buses: Vec<&Bus> = catalogue
            .buses()
            .filter(|bus| !bus.stops.is_empty())
            .collect();
        buses.sort_by(|a, b| a.name.cmp(&b.name));

        // Stops that appear on any non-empty bus, keyed by name so the
        // circle and label layers come out sorted.
        let mut stop_coords: BTreeMap<Arc<str>, Coordinate> = BTreeMap::new();
        for bus in &buses {
            for &stop_index in &bus.stops {
                let stop = catalogue.stop_at(stop_index);
                stop_coords.insert(stop.name.clone(), stop.coordinate);
            }
        }

        let projection = Projection::new(
            stop_coords.values(),
            self.config.width,
            self.config.height,
            self.config.padding,
        );

        let mut document = svg::Document::new();

        // Layer 1: route polylines, forward then reversed for linear buses.
        for (number, bus) in buses.iter().enumerate() {
            let mut polyline = svg::Polyline::new();
            for &stop_index in &bus.stops {
                polyline = polyline.point(projection.project(catalogue.stop_at(stop_index).coordinate));
            }
            if bus.kind == BusKind::Linear {
                for &stop_index in bus.stops.iter().rev().skip(1) {
                    polyline =
                        polyline.point(projection.project(catalogue.stop_at(stop_index).coordinate));
                }
            }
            document.add(
                polyline
                    .fill(Color::named("none"))
                    .stroke(self.palette_color(number))
                    .stroke_width(self.config.line_width)
                    .line_cap(StrokeLineCap::Round)
                    .line_join(StrokeLineJoin::Round),
            );
        }

        // Layer 2: bus name labels at the first stop, and at the last stop
        // of a linear bus whose endpoints differ.
        for (number, bus) in buses.iter().enumerate() {
            let color = self.palette_color(number);
            let first = catalogue.stop_at(bus.stops[0]);
            let anchor = projection.project(first.coordinate);
            document.add(self.bus_caption(anchor, &bus.name, color.clone(), true));
            document.add(self.bus_caption(anchor, &bus.name, color.clone(), false));

            let last = catalogue.stop_at(bus.stops[bus.stops.len() - 1]);
            if bus.kind == BusKind::Linear && first.index != last.index {
                let anchor = projection.project(last.coordinate);
                document.add(self.bus_caption(anchor, &bus.name, color.clone(), true));
                document.add(self.bus_caption(anchor, &bus.name, color, false));
            }
        }

        // Layer 3: stop circles.
        for coordinate in stop_coords.values() {
            document.add(
                svg::Circle::new(projection.project(*coordinate), self.config.stop_radius)
                    .fill(Color::named("white")),
            );
        }

        // Layer 4: stop name labels.
        for (name, coordinate) in &stop_coords {
            let anchor = projection.project(*coordinate);
            document.add(self.stop_caption(anchor, name, true));
            document.add(self.stop_caption(anchor, name, false));
        }

        document
    }

    fn palette_color(&self, number: usize) -> Color {
        if self.config.color_palette.is_empty() {
            return Color::Unset;
        }
        self.config.color_palette[number % self.config.color_palette.len()].clone()
    }

    fn bus_caption(&self, anchor: Point, content: &str, color: Color, underlay: bool) -> svg::Text {
        let text = svg::Text::new(anchor, content)
            .offset(self.config.bus_label_offset)
            .font_size(self.config.bus_label_font_size)
            .font_family("Verdana")
            .font_weight("bold");
        if underlay {
            text.fill(self.config.underlayer_color.clone())
                .stroke(self.config.underlayer_color.clone())
                .stroke_width(self.config.underlayer_width)
                .line_cap(StrokeLineCap::Round)
                .line_join(StrokeLineJoin::Round)
        } else {
            text.fill(color)
        }
    }

    fn stop_caption(&self, anchor: Point, content: &str, underlay: bool) -> svg::Text {
        let text = svg::Text::new(anchor, content)
            .offset(self.config.stop_label_offset)
            .font_size(self.config.stop_label_font_size)
            .font_family("Verdana");
        if underlay {
            text.fill(self.config.underlayer_color.clone())
                .stroke(self.config.underlayer_color.clone())
                .stroke_width(self.config.underlayer_width)
                .line_cap(StrokeLineCap::Round)
                .line_join(StrokeLineJoin::Round)
        } else {
            text.fill(Color::named("black"))
        }
    }
}
