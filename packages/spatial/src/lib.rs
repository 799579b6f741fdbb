#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geometry for corridor analysis.
//!
//! Three stages live here:
//!
//! * [`projection`] moves geometries between WGS84 and a UTM zone.
//! * [`buffer`] widens a corridor line into a polygon by a distance in
//!   metres, measured in the planar system.
//! * [`containment`] finds which points fall inside that polygon, using an
//!   R-tree to skip points outside its bounding box.

pub mod buffer;
pub mod containment;
pub mod projection;

pub use branch_corridor_spatial_models::{BoundaryRule, Crs, PlanarCrs};

use thiserror::Error;

/// Errors that can occur during spatial operations.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// Buffer distance was zero, negative or not finite.
    #[error("Buffer distance must be a positive number of metres, got {distance}")]
    DegenerateBufferDistance {
        /// The rejected distance.
        distance: f64,
    },

    /// A coordinate cannot be represented in the target UTM zone.
    #[error("Coordinate ({lng}, {lat}) is outside the usable range of {crs}")]
    OutOfProjectionRange {
        /// Target system.
        crs: Crs,
        /// Longitude in degrees.
        lng: f64,
        /// Latitude in degrees.
        lat: f64,
    },

    /// The geometry has no coordinates to work with.
    #[error("Geometry is empty")]
    EmptyGeometry,
}
