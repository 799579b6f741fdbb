//! `GeoJSON` persistence for corridor lines.
//!
//! A saved corridor is a `FeatureCollection` with one `LineString` feature
//! and a legacy `crs` member naming CRS84, the form most GIS tools write
//! for WGS84 data. Saving always replaces the previous file.

use std::io::BufReader;
use std::path::{Path, PathBuf};

use geo::MultiPolygon;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject};

use crate::{CorridorError, CorridorLine, LineSource};

/// CRS names accepted as WGS84 longitude/latitude.
const WGS84_NAMES: &[&str] = &[
    "urn:ogc:def:crs:OGC:1.3:CRS84",
    "urn:ogc:def:crs:EPSG::4326",
    "EPSG:4326",
    "CRS84",
];

/// Loads a corridor line from a `GeoJSON` file.
pub struct GeoJsonFileSource {
    path: PathBuf,
    label: String,
}

impl GeoJsonFileSource {
    /// Creates a source reading from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = format!("cached corridor at {}", path.display());
        Self { path, label }
    }

    /// Path this source reads from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LineSource for GeoJsonFileSource {
    fn name(&self) -> &str {
        &self.label
    }

    fn load(&self) -> Result<CorridorLine, CorridorError> {
        load_corridor(&self.path)
    }
}

/// Reads the first `LineString` from a `GeoJSON` file.
///
/// # Errors
///
/// * [`CorridorError::MissingCacheFile`] if the file does not exist.
/// * [`CorridorError::Json`] if it cannot be parsed.
/// * [`CorridorError::UnsupportedCrs`] if it declares a non-WGS84 CRS.
/// * [`CorridorError::NoLineString`] if it holds no line.
pub fn load_corridor(path: &Path) -> Result<CorridorLine, CorridorError> {
    let file = match std::fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CorridorError::MissingCacheFile {
                path: path.display().to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    let geojson = GeoJson::from_reader(BufReader::new(file))?;

    let geometries: Vec<Geometry> = match geojson {
        GeoJson::FeatureCollection(fc) => {
            check_crs(fc.foreign_members.as_ref())?;
            fc.features.into_iter().filter_map(|f| f.geometry).collect()
        }
        GeoJson::Feature(f) => {
            check_crs(f.foreign_members.as_ref())?;
            f.geometry.into_iter().collect()
        }
        GeoJson::Geometry(g) => {
            check_crs(g.foreign_members.as_ref())?;
            vec![g]
        }
    };

    let line = geometries
        .into_iter()
        .find_map(|g| match geo::Geometry::<f64>::try_from(g) {
            Ok(geo::Geometry::LineString(ls)) => Some(ls),
            _ => None,
        })
        .ok_or_else(|| CorridorError::NoLineString {
            path: path.display().to_string(),
        })?;

    let corridor = CorridorLine::try_from(line)?;
    log::info!(
        "Loaded {}-vertex corridor from {}",
        corridor.vertex_count(),
        path.display()
    );
    Ok(corridor)
}

fn check_crs(members: Option<&JsonObject>) -> Result<(), CorridorError> {
    let Some(name) = members
        .and_then(|m| m.get("crs"))
        .and_then(|crs| crs.pointer("/properties/name"))
        .and_then(serde_json::Value::as_str)
    else {
        return Ok(());
    };

    if WGS84_NAMES.contains(&name) {
        Ok(())
    } else {
        Err(CorridorError::UnsupportedCrs {
            name: name.to_string(),
        })
    }
}

fn crs84_member() -> JsonObject {
    let mut members = JsonObject::new();
    members.insert(
        "crs".to_string(),
        serde_json::json!({
            "type": "name",
            "properties": { "name": WGS84_NAMES[0] },
        }),
    );
    members
}

/// Writes `geometries` as a `FeatureCollection`, replacing any file at
/// `path`.
///
/// The collection is written to a sibling temporary file first and renamed
/// into place, so a failed write leaves the previous file intact.
fn write_collection(path: &Path, geometries: Vec<Geometry>) -> Result<(), CorridorError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let collection = FeatureCollection {
        bbox: None,
        features: geometries.into_iter().map(Feature::from).collect(),
        foreign_members: Some(crs84_member()),
    };

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    std::fs::write(&tmp, GeoJson::from(collection).to_string())?;
    std::fs::rename(&tmp, path)?;

    Ok(())
}

/// Saves a corridor line, replacing any previous cache at `path`.
///
/// # Errors
///
/// Returns [`CorridorError::Io`] if the file cannot be written.
pub fn save_corridor(line: &CorridorLine, path: &Path) -> Result<(), CorridorError> {
    write_collection(
        path,
        vec![Geometry::new(geojson::Value::from(line.line()))],
    )?;
    log::info!(
        "Saved {}-vertex corridor to {}",
        line.vertex_count(),
        path.display()
    );
    Ok(())
}

/// Writes a buffered corridor polygon for inspection in a GIS tool.
///
/// # Errors
///
/// Returns [`CorridorError::Io`] if the file cannot be written.
pub fn save_polygon(polygon: &MultiPolygon<f64>, path: &Path) -> Result<(), CorridorError> {
    write_collection(path, vec![Geometry::new(geojson::Value::from(polygon))])?;
    log::info!("Saved corridor polygon to {}", path.display());
    Ok(())
}
