//! WGS84 <-> UTM transverse Mercator.
//!
//! Uses the third-order Krüger series, which is accurate to about a
//! millimetre within a zone and a few centimetres several degrees outside
//! it. Inputs more than [`MAX_CENTRAL_OFFSET_DEG`] from the zone's central
//! meridian or beyond [`MAX_LATITUDE_DEG`] are rejected.

use geo::{Coord, MapCoords};

use crate::{Crs, SpatialError};

/// WGS84 semi-major axis in metres.
const WGS84_A: f64 = 6_378_137.0;
/// WGS84 flattening.
const WGS84_F: f64 = 1.0 / 298.257_223_563;
/// UTM scale factor on the central meridian.
const K0: f64 = 0.9996;
/// UTM false easting.
const FALSE_EASTING: f64 = 500_000.0;
/// UTM false northing for southern zones.
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

/// Furthest longitude from the central meridian accepted for projection.
pub const MAX_CENTRAL_OFFSET_DEG: f64 = 20.0;
/// Highest absolute latitude accepted for projection.
pub const MAX_LATITUDE_DEG: f64 = 84.5;

/// Series coefficients derived from the WGS84 flattening.
struct Series {
    /// Rectifying radius.
    a: f64,
    /// Eccentricity.
    e: f64,
    alpha: [f64; 3],
    beta: [f64; 3],
    delta: [f64; 3],
}

impl Series {
    fn wgs84() -> Self {
        let n = WGS84_F / (2.0 - WGS84_F);
        let n2 = n * n;
        let n3 = n2 * n;

        Self {
            a: WGS84_A / (1.0 + n) * (1.0 + n2 / 4.0 + n2 * n2 / 64.0),
            e: 2.0 * n.sqrt() / (1.0 + n),
            alpha: [
                n / 2.0 - 2.0 * n2 / 3.0 + 5.0 * n3 / 16.0,
                13.0 * n2 / 48.0 - 3.0 * n3 / 5.0,
                61.0 * n3 / 240.0,
            ],
            beta: [
                n / 2.0 - 2.0 * n2 / 3.0 + 37.0 * n3 / 96.0,
                n2 / 48.0 + n3 / 15.0,
                17.0 * n3 / 480.0,
            ],
            delta: [
                2.0 * n - 2.0 * n2 / 3.0 - 2.0 * n3,
                7.0 * n2 / 3.0 - 8.0 * n3 / 5.0,
                56.0 * n3 / 15.0,
            ],
        }
    }
}

fn central_meridian(zone: u8) -> f64 {
    f64::from(zone) * 6.0 - 183.0
}

#[allow(clippy::cast_precision_loss)]
fn harmonic(j: usize) -> f64 {
    2.0 * (j + 1) as f64
}

/// Projects a `(lng, lat)` coordinate in degrees into UTM metres.
///
/// # Errors
///
/// Returns [`SpatialError::OutOfProjectionRange`] if the coordinate is too
/// far from the zone or too close to a pole.
pub fn utm_forward(coord: Coord<f64>, zone: u8, north: bool) -> Result<Coord<f64>, SpatialError> {
    let d_lng = coord.x - central_meridian(zone);
    if coord.y.abs() > MAX_LATITUDE_DEG || d_lng.abs() > MAX_CENTRAL_OFFSET_DEG {
        return Err(SpatialError::OutOfProjectionRange {
            crs: Crs::Utm { zone, north },
            lng: coord.x,
            lat: coord.y,
        });
    }

    let s = Series::wgs84();
    let phi = coord.y.to_radians();
    let lambda = d_lng.to_radians();

    let sin_phi = phi.sin();
    let t = (sin_phi.atanh() - s.e * (s.e * sin_phi).atanh()).sinh();
    let xi_p = t.atan2(lambda.cos());
    let eta_p = (lambda.sin() / t.hypot(1.0)).atanh();

    let mut xi = xi_p;
    let mut eta = eta_p;
    for (j, alpha) in s.alpha.iter().enumerate() {
        let k = harmonic(j);
        xi += alpha * (k * xi_p).sin() * (k * eta_p).cosh();
        eta += alpha * (k * xi_p).cos() * (k * eta_p).sinh();
    }

    let false_northing = if north { 0.0 } else { FALSE_NORTHING_SOUTH };

    Ok(Coord {
        x: FALSE_EASTING + K0 * s.a * eta,
        y: false_northing + K0 * s.a * xi,
    })
}

/// Converts UTM metres back to `(lng, lat)` in degrees.
#[must_use]
pub fn utm_inverse(coord: Coord<f64>, zone: u8, north: bool) -> Coord<f64> {
    let s = Series::wgs84();
    let false_northing = if north { 0.0 } else { FALSE_NORTHING_SOUTH };

    let xi = (coord.y - false_northing) / (K0 * s.a);
    let eta = (coord.x - FALSE_EASTING) / (K0 * s.a);

    let mut xi_p = xi;
    let mut eta_p = eta;
    for (j, beta) in s.beta.iter().enumerate() {
        let k = harmonic(j);
        xi_p -= beta * (k * xi).sin() * (k * eta).cosh();
        eta_p -= beta * (k * xi).cos() * (k * eta).sinh();
    }

    let chi = (xi_p.sin() / eta_p.cosh()).asin();
    let mut phi = chi;
    for (j, delta) in s.delta.iter().enumerate() {
        phi += delta * (harmonic(j) * chi).sin();
    }

    let lambda = eta_p.sinh().atan2(xi_p.cos());

    Coord {
        x: central_meridian(zone) + lambda.to_degrees(),
        y: phi.to_degrees(),
    }
}

/// Converts one coordinate between two systems.
///
/// # Errors
///
/// Returns [`SpatialError::OutOfProjectionRange`] if the target is a UTM
/// zone the coordinate cannot be projected into.
pub fn transform_coord(coord: Coord<f64>, from: Crs, to: Crs) -> Result<Coord<f64>, SpatialError> {
    if from == to {
        return Ok(coord);
    }

    let geographic = match from {
        Crs::Geographic => coord,
        Crs::Utm { zone, north } => utm_inverse(coord, zone, north),
    };

    match to {
        Crs::Geographic => Ok(geographic),
        Crs::Utm { zone, north } => utm_forward(geographic, zone, north),
    }
}

/// Reprojects every coordinate of a geometry.
///
/// # Errors
///
/// Returns [`SpatialError::OutOfProjectionRange`] if any coordinate cannot
/// be projected into `to`.
pub fn reproject<G>(geometry: &G, from: Crs, to: Crs) -> Result<G::Output, SpatialError>
where
    G: MapCoords<f64, f64>,
{
    geometry.try_map_coords(|coord| transform_coord(coord, from, to))
}
