//! Corridor buffering.
//!
//! A line in WGS84 is projected into a UTM zone, buffered there by a
//! distance in metres (round joins and caps), and the result projected back
//! to WGS84 so it can be tested against geographic points.
//!
//! Round arcs are polygonised with vertices pushed slightly outward, so the
//! outline circumscribes the exact buffer: every point within the distance
//! of the line is inside, and the outline overshoots by at most
//! `1 / cos(ARC_STEP_RAD / 2) - 1` of the distance (about 0.005%).

use geo::algorithm::buffer::{BufferStyle, LineCap, LineJoin};
use geo::{Area as _, Buffer as _, Centroid as _, LineString, MultiPolygon};

use crate::projection::reproject;
use crate::{Crs, PlanarCrs, SpatialError};

/// Angular step between vertices on round caps and joins.
const ARC_STEP_RAD: f64 = 0.02;

/// Round-cap, round-join style whose chords never cut inside `distance`.
fn enclosing_style(distance: f64) -> BufferStyle<f64> {
    BufferStyle::new(distance / (ARC_STEP_RAD / 2.0).cos())
        .line_cap(LineCap::Round(ARC_STEP_RAD))
        .line_join(LineJoin::Round(ARC_STEP_RAD))
}

/// A buffered corridor.
#[derive(Debug, Clone, PartialEq)]
pub struct CorridorPolygon {
    /// Corridor outline in WGS84 `(lng, lat)`.
    pub geometry: MultiPolygon<f64>,
    /// Planar system the buffer was computed in.
    pub planar: Crs,
    /// Buffer distance in metres.
    pub distance_meters: f64,
    /// Corridor area in square metres, measured in [`Self::planar`].
    pub planar_area_sq_m: f64,
}

/// Resolves the planar system to buffer `line` in.
///
/// # Errors
///
/// Returns [`SpatialError::EmptyGeometry`] if `planar` is
/// [`PlanarCrs::Auto`] and the line has no centroid.
pub fn resolve_planar(planar: PlanarCrs, line: &LineString<f64>) -> Result<Crs, SpatialError> {
    match planar {
        PlanarCrs::Fixed(crs) => Ok(crs),
        PlanarCrs::Auto => {
            let centroid = line.centroid().ok_or(SpatialError::EmptyGeometry)?;
            let crs = Crs::utm_for(centroid.x(), centroid.y());
            log::debug!(
                "Selected {crs} for corridor centred on ({:.5}, {:.5})",
                centroid.x(),
                centroid.y()
            );
            Ok(crs)
        }
    }
}

/// Buffers a WGS84 line by `distance_meters`.
///
/// # Errors
///
/// * [`SpatialError::DegenerateBufferDistance`] if the distance is not a
///   positive finite number.
/// * [`SpatialError::EmptyGeometry`] if the line has fewer than two
///   vertices.
/// * [`SpatialError::OutOfProjectionRange`] if the line does not fit the
///   planar system.
pub fn buffer_line(
    line: &LineString<f64>,
    distance_meters: f64,
    planar: PlanarCrs,
) -> Result<CorridorPolygon, SpatialError> {
    if !distance_meters.is_finite() || distance_meters <= 0.0 {
        return Err(SpatialError::DegenerateBufferDistance {
            distance: distance_meters,
        });
    }
    if line.0.len() < 2 {
        return Err(SpatialError::EmptyGeometry);
    }

    let planar = resolve_planar(planar, line)?;
    let projected = reproject(line, Crs::Geographic, planar)?;

    let buffered = projected.buffer_with_style(enclosing_style(distance_meters));
    if buffered.0.is_empty() {
        return Err(SpatialError::EmptyGeometry);
    }
    let planar_area_sq_m = buffered.unsigned_area();

    let geometry = reproject(&buffered, planar, Crs::Geographic)?;

    log::info!(
        "Buffered {}-vertex corridor by {distance_meters} m in {planar}: {} polygon(s), {:.3} km²",
        line.0.len(),
        geometry.0.len(),
        planar_area_sq_m / 1_000_000.0,
    );

    Ok(CorridorPolygon {
        geometry,
        planar,
        distance_meters,
        planar_area_sq_m,
    })
}
