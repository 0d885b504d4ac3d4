//! Minimal SVG document emitter: circles, polylines and text with the path
//! properties the map renderer needs. Output is one element per line inside
//! a fixed header and trailer.

use serde::Deserialize;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(from = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<[f64; 2]> for Point {
    fn from(value: [f64; 2]) -> Self {
        Self {
            x: value[0],
            y: value[1],
        }
    }
}

/// A fill or stroke color in one of the three wire encodings, or unset.
/// Unset colors render as nothing and their attribute is suppressed.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Color {
    #[default]
    Unset,
    Named(String),
    Rgb(u8, u8, u8),
    Rgba(u8, u8, u8, f64),
}

impl Color {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn is_set(&self) -> bool {
        *self != Self::Unset
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::Unset => Ok(()),
            Color::Named(name) => f.write_str(name),
            Color::Rgb(red, green, blue) => write!(f, "rgb({red},{green},{blue})"),
            Color::Rgba(red, green, blue, opacity) => {
                write!(f, "rgba({red},{green},{blue},{opacity})")
            }
        }
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Encoded {
            Named(String),
            Channels(Vec<f64>),
        }

        match Encoded::deserialize(deserializer)? {
            Encoded::Named(name) => Ok(Color::Named(name)),
            Encoded::Channels(channels) => match channels.as_slice() {
                [red, green, blue] => Ok(Color::Rgb(*red as u8, *green as u8, *blue as u8)),
                [red, green, blue, opacity] => Ok(Color::Rgba(
                    *red as u8,
                    *green as u8,
                    *blue as u8,
                    *opacity,
                )),
                _ => Err(serde::de::Error::invalid_length(
                    channels.len(),
                    &"a color array of 3 or 4 channels",
                )),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeLineCap {
    Butt,
    Round,
    Square,
}

impl StrokeLineCap {
    fn as_str(self) -> &'static str {
        match self {
            StrokeLineCap::Butt => "butt",
            StrokeLineCap::Round => "round",
            StrokeLineCap::Square => "square",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrokeLineJoin {
    Arcs,
    Bevel,
    Miter,
    MiterClip,
    Round,
}

impl StrokeLineJoin {
    fn as_str(self) -> &'static str {
        match self {
            StrokeLineJoin::Arcs => "arcs",
            StrokeLineJoin::Bevel => "bevel",
            StrokeLineJoin::Miter => "miter",
            StrokeLineJoin::MiterClip => "miter-clip",
            StrokeLineJoin::Round => "round",
        }
    }
}

/// Optional presentation attributes shared by every primitive.
#[derive(Debug, Clone, Default)]
struct PathProps {
    fill: Color,
    stroke: Color,
    stroke_width: f64,
    line_cap: Option<StrokeLineCap>,
    line_join: Option<StrokeLineJoin>,
}

impl PathProps {
    fn write(&self, out: &mut String) {
        if self.fill.is_set() {
            out.push_str(&format!(" fill=\"{}\"", self.fill));
        }
        if self.stroke.is_set() {
            out.push_str(&format!(" stroke=\"{}\"", self.stroke));
        }
        if self.stroke_width > 0.0 {
            out.push_str(&format!(" stroke-width=\"{}\"", self.stroke_width));
        }
        if let Some(cap) = self.line_cap {
            out.push_str(&format!(" stroke-linecap=\"{}\"", cap.as_str()));
        }
        if let Some(join) = self.line_join {
            out.push_str(&format!(" stroke-linejoin=\"{}\"", join.as_str()));
        }
    }
}

macro_rules! path_props {
    ($owner:ident) => {
        impl $owner {
            pub fn fill(mut self, color: Color) -> Self {
                self.props.fill = color;
                self
            }

            pub fn stroke(mut self, color: Color) -> Self {
                self.props.stroke = color;
                self
            }

            pub fn stroke_width(mut self, width: f64) -> Self {
                self.props.stroke_width = width;
                self
            }

            pub fn line_cap(mut self, cap: StrokeLineCap) -> Self {
                self.props.line_cap = Some(cap);
                self
            }

            pub fn line_join(mut self, join: StrokeLineJoin) -> Self {
                self.props.line_join = Some(join);
                self
            }
        }
    };
}

#[derive(Debug, Clone, Default)]
pub struct Circle {
    center: Point,
    radius: f64,
    props: PathProps,
}

path_props!(Circle);

impl Circle {
    pub fn new(center: Point, radius: f64) -> Self {
        Self {
            center,
            radius,
            ..Default::default()
        }
    }

    fn write(&self, out: &mut String) {
        out.push_str(&format!(
            "<circle cx=\"{}\" cy=\"{}\" r=\"{}\"",
            self.center.x, self.center.y, self.radius
        ));
        self.props.write(out);
        out.push_str("/>");
    }
}

#[derive(Debug, Clone, Default)]
pub struct Polyline {
    points: Vec<Point>,
    props: PathProps,
}

path_props!(Polyline);

impl Polyline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the next vertex of the polyline.
    pub fn point(mut self, point: Point) -> Self {
        self.points.push(point);
        self
    }

    fn write(&self, out: &mut String) {
        out.push_str("<polyline points=\"");
        for (number, point) in self.points.iter().enumerate() {
            if number > 0 {
                out.push(' ');
            }
            out.push_str(&format!("{},{}", point.x, point.y));
        }
        out.push('"');
        self.props.write(out);
        out.push_str("/>");
    }
}

#[derive(Debug, Clone, Default)]
pub struct Text {
    position: Point,
    offset: Point,
    font_size: u32,
    font_family: String,
    font_weight: String,
    content: String,
    props: PathProps,
}

path_props!(Text);

impl Text {
    pub fn new(position: Point, content: impl Into<String>) -> Self {
        Self {
            position,
            content: content.into(),
            ..Default::default()
        }
    }

    /// Offset relative to the anchor point (`dx`/`dy` attributes).
    pub fn offset(mut self, offset: Point) -> Self {
        self.offset = offset;
        self
    }

    pub fn font_size(mut self, size: u32) -> Self {
        self.font_size = size;
        self
    }

    pub fn font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    pub fn font_weight(mut self, weight: impl Into<String>) -> Self {
        self.font_weight = weight.into();
        self
    }

    fn write(&self, out: &mut String) {
        out.push_str(&format!(
            "<text x=\"{}\" y=\"{}\" dx=\"{}\" dy=\"{}\"",
            self.position.x, self.position.y, self.offset.x, self.offset.y
        ));
        if self.font_size > 0 {
            out.push_str(&format!(" font-size=\"{}\"", self.font_size));
        }
        if !self.font_family.is_empty() {
            out.push_str(&format!(" font-family=\"{}\"", self.font_family));
        }
        if !self.font_weight.is_empty() {
            out.push_str(&format!(" font-weight=\"{}\"", self.font_weight));
        }
        self.props.write(out);
        out.push('>');
        out.push_str(&escape_xml(&self.content));
        out.push_str("</text>");
    }
}

/// Escapes the five XML-reserved characters in text content.
pub fn escape_xml(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[derive(Debug, Clone)]
pub enum Element {
    Circle(Circle),
    Polyline(Polyline),
    Text(Text),
}

impl From<Circle> for Element {
    fn from(value: Circle) -> Self {
        Self::Circle(value)
    }
}

impl From<Polyline> for Element {
    fn from(value: Polyline) -> Self {
        Self::Polyline(value)
    }
}

impl From<Text> for Element {
    fn from(value: Text) -> Self {
        Self::Text(value)
    }
}

/// An SVG document; elements render in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Document {
    elements: Vec<Element>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, element: impl Into<Element>) {
        self.elements.push(element.into());
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" ?>\n");
        out.push_str("<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\">\n");
        for element in &self.elements {
            match element {
                Element::Circle(circle) => circle.write(&mut out),
                Element::Polyline(polyline) => polyline.write(&mut out),
                Element::Text(text) => text.write(&mut out),
            }
            out.push('\n');
        }
        out.push_str("</svg>\n");
        out
    }
}
