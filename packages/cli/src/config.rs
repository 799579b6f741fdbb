//! Analysis run configuration.
//!
//! A run is described by a TOML file; command-line flags override
//! individual keys. Every key is optional and falls back to
//! [`AnalysisConfig::default`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use branch_corridor_records::RecordError;
use branch_corridor_records::filter::AttributeFilter;
use branch_corridor_spatial::{BoundaryRule, PlanarCrs};
use serde::{Deserialize, Serialize};

/// Config file read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_PATH: &str = "branch_corridor.toml";

/// Errors that can occur while loading a config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error (file read).
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// Config file path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The file is not a valid analysis config.
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// A filter names an unknown record field.
    #[error(transparent)]
    Filter(#[from] RecordError),

    /// `unparseable_warn_ratio` is outside `[0, 1]`.
    #[error("unparseable_warn_ratio must be between 0 and 1, got {0}")]
    InvalidWarnRatio(f64),
}

/// Where reports are written. Each output is skipped when unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Flat per-period CSV.
    pub csv: Option<PathBuf>,
    /// Full comparison as JSON.
    pub json: Option<PathBuf>,
    /// Buffered corridor polygon as `GeoJSON`.
    pub polygon: Option<PathBuf>,
}

/// One corridor-versus-reference analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub records_path: PathBuf,
    pub corridor_path: PathBuf,
    pub buffer_meters: f64,
    pub boundary: BoundaryRule,
    pub planar_crs: PlanarCrs,
    /// Warn when more than this fraction of deposit values are unusable.
    pub unparseable_warn_ratio: f64,
    /// Applied to located records before the spatial filter.
    pub corridor_filter: BTreeMap<String, String>,
    /// Selects the reference population from all records.
    pub reference_filter: BTreeMap<String, String>,
    pub output: OutputConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            records_path: PathBuf::from("data/branches.csv"),
            corridor_path: PathBuf::from("data/corridor.geojson"),
            buffer_meters: 800.0,
            boundary: BoundaryRule::default(),
            planar_crs: PlanarCrs::default(),
            unparseable_warn_ratio: 0.5,
            corridor_filter: BTreeMap::new(),
            reference_filter: BTreeMap::new(),
            output: OutputConfig::default(),
        }
    }
}

/// Values given on the command line, applied on top of the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub records_path: Option<PathBuf>,
    pub corridor_path: Option<PathBuf>,
    pub buffer_meters: Option<f64>,
    pub boundary: Option<BoundaryRule>,
    pub planar_crs: Option<PlanarCrs>,
}

impl AnalysisConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not a valid config.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the config at `path`, or [`DEFAULT_CONFIG_PATH`] if it exists,
    /// or the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicitly named file cannot be read or
    /// any file read is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !fallback.exists() {
                    log::debug!("No {DEFAULT_CONFIG_PATH} found, using defaults");
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        log::info!("Using config {}", path.display());
        Self::parse(&text)
    }

    /// Replaces every key that has an override.
    #[must_use]
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(v) = overrides.records_path {
            self.records_path = v;
        }
        if let Some(v) = overrides.corridor_path {
            self.corridor_path = v;
        }
        if let Some(v) = overrides.buffer_meters {
            self.buffer_meters = v;
        }
        if let Some(v) = overrides.boundary {
            self.boundary = v;
        }
        if let Some(v) = overrides.planar_crs {
            self.planar_crs = v;
        }
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.unparseable_warn_ratio) {
            return Err(ConfigError::InvalidWarnRatio(self.unparseable_warn_ratio));
        }
        self.filters()?;
        Ok(())
    }

    /// Resolves the corridor and reference predicates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Filter`] if a predicate names an unknown field.
    pub fn filters(&self) -> Result<(AttributeFilter, AttributeFilter), ConfigError> {
        Ok((
            AttributeFilter::from_map(&self.corridor_filter)?,
            AttributeFilter::from_map(&self.reference_filter)?,
        ))
    }
}
