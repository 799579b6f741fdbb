#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Corridor line sources.
//!
//! The analysis only needs an ordered list of WGS84 vertices. Where they
//! come from is behind the [`LineSource`] trait: [`cache::GeoJsonFileSource`]
//! reads a previously saved line, [`interactive::InteractiveSource`] asks an
//! operator to enter one. [`cache::save_corridor`] writes a line back so the
//! next run can load it.

pub mod cache;
pub mod interactive;

use branch_corridor_spatial_models::Crs;
use geo::{Coord, LineString};
use thiserror::Error;

/// Errors that can occur while obtaining or persisting a corridor.
#[derive(Debug, Error)]
pub enum CorridorError {
    /// No cached corridor exists at the given path.
    #[error("Corridor cache not found at {path}; draw a corridor first")]
    MissingCacheFile {
        /// Path that was tried.
        path: String,
    },

    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The cache file is not valid JSON or not a `GeoJSON` object.
    #[error("Invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The cache file holds no `LineString` geometry.
    #[error("No LineString geometry found in {path}")]
    NoLineString {
        /// Path of the file that was read.
        path: String,
    },

    /// The cache file declares a coordinate system other than WGS84.
    #[error("Unsupported corridor CRS '{name}': expected WGS84 longitude/latitude")]
    UnsupportedCrs {
        /// CRS name as declared in the file.
        name: String,
    },

    /// A corridor needs at least two vertices.
    #[error("A corridor needs at least 2 vertices, got {count}")]
    TooFewVertices {
        /// Number of vertices supplied.
        count: usize,
    },

    /// A vertex is not a finite longitude/latitude pair.
    #[error("Invalid vertex ({x}, {y}): expected longitude in [-180, 180] and latitude in [-90, 90]")]
    InvalidVertex {
        /// Longitude as supplied.
        x: f64,
        /// Latitude as supplied.
        y: f64,
    },

    /// The terminal prompt failed.
    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
}

/// An ordered path of WGS84 `(lng, lat)` vertices.
///
/// Always has at least two vertices, all within the valid angular range.
#[derive(Debug, Clone, PartialEq)]
pub struct CorridorLine {
    line: LineString<f64>,
}

impl CorridorLine {
    /// CRS of every corridor line.
    pub const CRS: Crs = Crs::Geographic;

    /// Validates and wraps a vertex list.
    ///
    /// # Errors
    ///
    /// Returns [`CorridorError::TooFewVertices`] for fewer than two vertices
    /// or [`CorridorError::InvalidVertex`] for a coordinate outside WGS84
    /// bounds.
    pub fn new(vertices: Vec<Coord<f64>>) -> Result<Self, CorridorError> {
        if vertices.len() < 2 {
            return Err(CorridorError::TooFewVertices {
                count: vertices.len(),
            });
        }
        if let Some(bad) = vertices.iter().find(|c| !is_lng_lat(**c)) {
            return Err(CorridorError::InvalidVertex { x: bad.x, y: bad.y });
        }

        Ok(Self {
            line: LineString::new(vertices),
        })
    }

    /// The underlying line.
    #[must_use]
    pub const fn line(&self) -> &LineString<f64> {
        &self.line
    }

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.line.0.len()
    }
}

impl TryFrom<LineString<f64>> for CorridorLine {
    type Error = CorridorError;

    fn try_from(value: LineString<f64>) -> Result<Self, Self::Error> {
        Self::new(value.0)
    }
}

fn is_lng_lat(c: Coord<f64>) -> bool {
    c.x.is_finite() && c.y.is_finite() && c.x.abs() <= 180.0 && c.y.abs() <= 90.0
}

/// Something that can produce a corridor line.
pub trait LineSource {
    /// Human-readable description of the source, for logs.
    fn name(&self) -> &str;

    /// Produces the corridor line.
    ///
    /// # Errors
    ///
    /// Returns [`CorridorError`] if no valid line can be obtained.
    fn load(&self) -> Result<CorridorLine, CorridorError>;
}
