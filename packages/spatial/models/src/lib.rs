#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Coordinate reference system and containment rule types.
//!
//! Geographic data is always longitude/latitude on WGS84 (`EPSG:4326`).
//! Metric work happens in a UTM zone, identified by its EPSG code
//! (`EPSG:326zz` north, `EPSG:327zz` south).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// EPSG code of the geographic WGS84 system.
pub const EPSG_WGS84: u32 = 4326;

/// Error returned when a CRS identifier cannot be understood.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CrsParseError {
    /// The string is not of the form `EPSG:<code>`.
    #[error("Invalid CRS identifier '{0}': expected EPSG:<code>")]
    Malformed(String),

    /// The EPSG code is neither WGS84 nor a WGS84 UTM zone.
    #[error("Unsupported EPSG code {0}: only 4326 and 32601-32660/32701-32760 are supported")]
    Unsupported(u32),
}

/// A coordinate reference system known to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Crs {
    /// Longitude/latitude in degrees on WGS84.
    Geographic,
    /// Universal Transverse Mercator on WGS84, in metres.
    Utm {
        /// Zone number, 1 through 60.
        zone: u8,
        /// Northern hemisphere (false offsets northings by 10,000 km).
        north: bool,
    },
}

impl Crs {
    /// Returns the EPSG code for this system.
    #[must_use]
    pub fn epsg(self) -> u32 {
        match self {
            Self::Geographic => EPSG_WGS84,
            Self::Utm { zone, north: true } => 32600 + u32::from(zone),
            Self::Utm { zone, north: false } => 32700 + u32::from(zone),
        }
    }

    /// Builds a CRS from an EPSG code.
    ///
    /// # Errors
    ///
    /// Returns [`CrsParseError::Unsupported`] for codes other than WGS84 or
    /// a WGS84 UTM zone.
    pub fn from_epsg(code: u32) -> Result<Self, CrsParseError> {
        match code {
            EPSG_WGS84 => Ok(Self::Geographic),
            32601..=32660 => Ok(Self::Utm {
                zone: zone_number(code - 32600),
                north: true,
            }),
            32701..=32760 => Ok(Self::Utm {
                zone: zone_number(code - 32700),
                north: false,
            }),
            _ => Err(CrsParseError::Unsupported(code)),
        }
    }

    /// Selects the UTM zone containing `(lng, lat)`.
    ///
    /// Applies the standard exceptions for south-west Norway and Svalbard.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn utm_for(lng: f64, lat: f64) -> Self {
        let lng = lng.clamp(-180.0, 180.0);
        let mut zone = (((lng + 180.0) / 6.0).floor() as u8 + 1).min(60);

        if (56.0..64.0).contains(&lat) && (3.0..12.0).contains(&lng) {
            zone = 32;
        } else if (72.0..=84.0).contains(&lat) {
            zone = match lng {
                x if (0.0..9.0).contains(&x) => 31,
                x if (9.0..21.0).contains(&x) => 33,
                x if (21.0..33.0).contains(&x) => 35,
                x if (33.0..42.0).contains(&x) => 37,
                _ => zone,
            };
        }

        Self::Utm {
            zone,
            north: lat >= 0.0,
        }
    }

    /// Returns `true` if coordinates in this system are metres.
    #[must_use]
    pub const fn is_planar(self) -> bool {
        matches!(self, Self::Utm { .. })
    }
}

#[allow(clippy::cast_possible_truncation)]
const fn zone_number(offset: u32) -> u8 {
    offset as u8
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

impl FromStr for Crs {
    type Err = CrsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s
            .trim()
            .strip_prefix("EPSG:")
            .or_else(|| s.trim().strip_prefix("epsg:"))
            .and_then(|c| c.parse::<u32>().ok())
            .ok_or_else(|| CrsParseError::Malformed(s.to_string()))?;
        Self::from_epsg(code)
    }
}

impl TryFrom<String> for Crs {
    type Error = CrsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Crs> for String {
    fn from(value: Crs) -> Self {
        value.to_string()
    }
}

/// How the planar system used for buffering is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PlanarCrs {
    /// UTM zone of the geometry's centroid.
    #[default]
    Auto,
    /// An explicit projected system.
    Fixed(Crs),
}

impl FromStr for PlanarCrs {
    type Err = CrsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        let crs: Crs = s.parse()?;
        if !crs.is_planar() {
            return Err(CrsParseError::Unsupported(crs.epsg()));
        }
        Ok(Self::Fixed(crs))
    }
}

impl fmt::Display for PlanarCrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Fixed(crs) => crs.fmt(f),
        }
    }
}

impl TryFrom<String> for PlanarCrs {
    type Error = CrsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PlanarCrs> for String {
    fn from(value: PlanarCrs) -> Self {
        value.to_string()
    }
}

/// Whether a point lying exactly on a polygon edge counts as contained.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BoundaryRule {
    /// Interior only; edge points are outside (OGC `contains`).
    #[default]
    Exclusive,
    /// Interior plus boundary (OGC `intersects`).
    Inclusive,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_epsg_identifiers() {
        assert_eq!("EPSG:4326".parse::<Crs>().unwrap(), Crs::Geographic);
        assert_eq!(
            "EPSG:32618".parse::<Crs>().unwrap(),
            Crs::Utm {
                zone: 18,
                north: true
            }
        );
        assert_eq!(
            "epsg:32733".parse::<Crs>().unwrap(),
            Crs::Utm {
                zone: 33,
                north: false
            }
        );
    }

    #[test]
    fn rejects_unknown_identifiers() {
        assert!(matches!(
            "EPSG:3857".parse::<Crs>(),
            Err(CrsParseError::Unsupported(3857))
        ));
        assert!(matches!(
            "EPSG:32661".parse::<Crs>(),
            Err(CrsParseError::Unsupported(32661))
        ));
        assert!(matches!(
            "UTM18N".parse::<Crs>(),
            Err(CrsParseError::Malformed(_))
        ));
    }

    #[test]
    fn epsg_round_trips_through_display() {
        for code in [4326, 32601, 32618, 32660, 32701, 32760] {
            let crs = Crs::from_epsg(code).unwrap();
            assert_eq!(crs.epsg(), code);
            assert_eq!(crs.to_string().parse::<Crs>().unwrap(), crs);
        }
    }

    #[test]
    fn selects_utm_zone_from_location() {
        // The Bronx
        assert_eq!(
            Crs::utm_for(-73.9, 40.85),
            Crs::Utm {
                zone: 18,
                north: true
            }
        );
        // Sydney
        assert_eq!(
            Crs::utm_for(151.2, -33.87),
            Crs::Utm {
                zone: 56,
                north: false
            }
        );
        // Bergen falls in the widened zone 32.
        assert_eq!(
            Crs::utm_for(5.32, 60.39),
            Crs::Utm {
                zone: 32,
                north: true
            }
        );
        assert_eq!(
            Crs::utm_for(180.0, 10.0),
            Crs::Utm {
                zone: 60,
                north: true
            }
        );
    }

    #[test]
    fn planar_crs_parsing() {
        assert_eq!("auto".parse::<PlanarCrs>().unwrap(), PlanarCrs::Auto);
        assert_eq!(
            "EPSG:32618".parse::<PlanarCrs>().unwrap(),
            PlanarCrs::Fixed(Crs::Utm {
                zone: 18,
                north: true
            })
        );
        assert!("EPSG:4326".parse::<PlanarCrs>().is_err());
    }

    #[test]
    fn boundary_rule_names() {
        assert_eq!(BoundaryRule::default(), BoundaryRule::Exclusive);
        assert_eq!(
            "inclusive".parse::<BoundaryRule>().unwrap(),
            BoundaryRule::Inclusive
        );
        assert_eq!(BoundaryRule::Exclusive.to_string(), "exclusive");
    }
}
