//! Plain values stored in entity fields.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A color in the ABGR layout used by KML viewers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeoColor(u32);

impl GeoColor {
    pub fn from_abgr(value: u32) -> Self {
        GeoColor(value)
    }

    pub fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        GeoColor(u32::from_be_bytes([a, b, g, r]))
    }

    pub fn abgr(self) -> u32 {
        self.0
    }

    /// Returns the components in `(r, g, b, a)` order.
    pub fn rgba(self) -> (u8, u8, u8, u8) {
        let [a, b, g, r] = self.0.to_be_bytes();
        (r, g, b, a)
    }
}

impl fmt::Display for GeoColor {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{:08x}", self.0)
    }
}

/// A position as longitude, latitude and an optional altitude in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinates {
    pub lon: f64,
    pub lat: f64,
    pub alt: Option<f64>,
}

impl GeoCoordinates {
    pub fn new(lon: f64, lat: f64) -> Self {
        GeoCoordinates {
            lon,
            lat,
            alt: None,
        }
    }

    pub fn with_alt(self, alt: f64) -> Self {
        GeoCoordinates {
            alt: Some(alt),
            ..self
        }
    }
}

impl fmt::Display for GeoCoordinates {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{},{}", self.lon, self.lat)?;

        if let Some(alt) = self.alt {
            write!(formatter, ",{}", alt)?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Units {
    Fraction,
    Pixels,
    InsetPixels,
}

impl Units {
    pub fn as_str(self) -> &'static str {
        match self {
            Units::Fraction => "fraction",
            Units::Pixels => "pixels",
            Units::InsetPixels => "insetPixels",
        }
    }
}

/// A point in screen or image space, such as an icon's hot spot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
    pub x_units: Units,
    pub y_units: Units,
}

impl Vec2 {
    pub fn fraction(x: f64, y: f64) -> Self {
        Vec2 {
            x,
            y,
            x_units: Units::Fraction,
            y_units: Units::Fraction,
        }
    }
}

/// The value held by one field of an entity.
///
/// Enumerated fields hold `Text` values that are checked against the field's
/// symbol set when assigned.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Color(GeoColor),
    Coordinates(Vec<GeoCoordinates>),
    Vec2(Vec2),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            FieldValue::Int(value) => Some(value as f64),
            FieldValue::Float(value) => Some(value),
            _ => None,
        }
    }

    /// The element text this value renders to, if it renders as text at all.
    pub fn text(&self) -> Option<String> {
        match self {
            FieldValue::Text(text) => Some(text.clone()),
            FieldValue::Bool(value) => Some(if *value { "1" } else { "0" }.to_owned()),
            FieldValue::Int(value) => Some(value.to_string()),
            FieldValue::Float(value) => Some(value.to_string()),
            FieldValue::Color(color) => Some(color.to_string()),
            FieldValue::Coordinates(points) => Some(
                points
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            FieldValue::Vec2(_) => None,
        }
    }

    /// The element attributes this value renders to.
    pub fn attributes(&self) -> Vec<(&'static str, String)> {
        match self {
            FieldValue::Vec2(vec) => vec![
                ("x", vec.x.to_string()),
                ("y", vec.y.to_string()),
                ("xunits", vec.x_units.as_str().to_owned()),
                ("yunits", vec.y_units.as_str().to_owned()),
            ],
            _ => Vec::new(),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value.into())
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<GeoColor> for FieldValue {
    fn from(value: GeoColor) -> Self {
        FieldValue::Color(value)
    }
}

impl From<GeoCoordinates> for FieldValue {
    fn from(value: GeoCoordinates) -> Self {
        FieldValue::Coordinates(vec![value])
    }
}

impl From<Vec<GeoCoordinates>> for FieldValue {
    fn from(value: Vec<GeoCoordinates>) -> Self {
        FieldValue::Coordinates(value)
    }
}

impl From<Vec2> for FieldValue {
    fn from(value: Vec2) -> Self {
        FieldValue::Vec2(value)
    }
}
