//! Corridor analysis orchestration.
//!
//! Threads one loaded [`RecordSet`] through attribute filtering, buffering,
//! containment, aggregation and comparison. The commands in `main.rs` only
//! decide where records and the corridor line come from and where the
//! results go.

use std::time::Instant;

use branch_corridor_analytics::aggregate::{deposits_by_year, warn_if_mostly_excluded};
use branch_corridor_analytics::compare::compare;
use branch_corridor_analytics::report;
use branch_corridor_analytics_models::{Comparison, Population};
use branch_corridor_cli_utils::{IndicatifProgress, MultiProgress};
use branch_corridor_corridor::cache::{GeoJsonFileSource, save_corridor, save_polygon};
use branch_corridor_corridor::interactive::InteractiveSource;
use branch_corridor_corridor::{CorridorLine, LineSource};
use branch_corridor_records::BankRecord;
use branch_corridor_records::loader::{RecordSet, load_csv};
use branch_corridor_spatial::buffer::{CorridorPolygon, buffer_line};
use branch_corridor_spatial::containment::PointIndex;

use crate::config::AnalysisConfig;

/// Everything one analysis produced.
#[derive(Debug)]
pub struct Analysis {
    pub corridor: CorridorPolygon,
    /// Records inside the corridor, as indices into [`RecordSet::records`].
    pub corridor_records: Vec<usize>,
    pub reference_records: usize,
    pub comparison: Comparison,
}

/// Runs the analysis on already-loaded records and an already-obtained
/// corridor line.
///
/// # Errors
///
/// Returns an error if a filter names an unknown field or the corridor
/// cannot be buffered.
pub fn analyze(
    records: &RecordSet,
    line: &CorridorLine,
    config: &AnalysisConfig,
) -> Result<Analysis, Box<dyn std::error::Error>> {
    let (corridor_filter, reference_filter) = config.filters()?;

    let corridor = buffer_line(line.line(), config.buffer_meters, config.planar_crs)?;

    let candidates: Vec<_> = records
        .located
        .iter()
        .filter(|l| corridor_filter.matches(&records.records[l.index]))
        .collect();
    if !corridor_filter.is_empty() {
        log::info!(
            "{} of {} located records match {corridor_filter}",
            candidates.len(),
            records.located.len()
        );
    }

    let points: Vec<_> = candidates.iter().map(|l| l.point).collect();
    let index = PointIndex::new(&points);

    let corridor_records: Vec<usize> = index
        .contained(&corridor.geometry, config.boundary)
        .into_iter()
        .map(|i| candidates[i].index)
        .collect();
    log::info!(
        "{} of {} candidate records inside the {} m corridor",
        corridor_records.len(),
        candidates.len(),
        config.buffer_meters
    );

    let reference: Vec<&BankRecord> = reference_filter.apply(&records.records);
    log::info!(
        "{} of {} records in the reference population",
        reference.len(),
        records.records.len()
    );

    let corridor_series = deposits_by_year(
        Population::Corridor,
        corridor_records.iter().map(|&i| &records.records[i]),
    );
    let reference_series = deposits_by_year(Population::Reference, reference.iter().copied());

    warn_if_mostly_excluded(&corridor_series, config.unparseable_warn_ratio);
    warn_if_mostly_excluded(&reference_series, config.unparseable_warn_ratio);

    let comparison = compare(&corridor_series, &reference_series);

    Ok(Analysis {
        corridor,
        corridor_records,
        reference_records: reference.len(),
        comparison,
    })
}

/// Loads the records table with a progress bar.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn load_records(
    multi: &MultiProgress,
    config: &AnalysisConfig,
) -> Result<RecordSet, Box<dyn std::error::Error>> {
    let progress = IndicatifProgress::bytes_bar(multi, "Loading branch records");
    let records = load_csv(&config.records_path, &progress)?;
    if records.malformed_rows > 0 {
        log::warn!(
            "Skipped {} malformed rows in {}",
            records.malformed_rows,
            config.records_path.display()
        );
    }
    Ok(records)
}

/// Asks the operator for a corridor, with the located records as context,
/// and saves it to the configured cache path.
///
/// # Errors
///
/// Returns an error if the prompt fails or the line cannot be saved.
pub fn draw_corridor(
    records: Option<&RecordSet>,
    config: &AnalysisConfig,
) -> Result<CorridorLine, Box<dyn std::error::Error>> {
    let markers = records.map(RecordSet::points).unwrap_or_default();
    let line = obtain_line(&InteractiveSource::new(markers))?;
    save_corridor(&line, &config.corridor_path)?;
    Ok(line)
}

fn obtain_line(source: &dyn LineSource) -> Result<CorridorLine, Box<dyn std::error::Error>> {
    log::info!("Obtaining corridor from {}", source.name());
    Ok(source.load()?)
}

/// Full run: load records, obtain the corridor, analyze and report.
///
/// # Errors
///
/// Returns an error if any stage fails. A missing corridor cache is fatal;
/// pass `draw` to capture a new corridor instead.
pub fn run(
    multi: &MultiProgress,
    config: &AnalysisConfig,
    draw: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let start = Instant::now();

    let records = load_records(multi, config)?;

    let line = if draw {
        draw_corridor(Some(&records), config)?
    } else {
        obtain_line(&GeoJsonFileSource::new(&config.corridor_path))?
    };

    let analysis = analyze(&records, &line, config)?;

    println!();
    println!(
        "Corridor: {} m around a {}-vertex line ({}), {} branch-years inside",
        config.buffer_meters,
        line.vertex_count(),
        analysis.corridor.planar,
        analysis.corridor_records.len()
    );
    println!("Reference: {} branch-years", analysis.reference_records);
    println!();
    print!("{}", report::render_table(&analysis.comparison));

    write_outputs(&analysis, config)?;

    log::info!("Analysis finished in {:.1?}", start.elapsed());
    Ok(())
}

fn write_outputs(
    analysis: &Analysis,
    config: &AnalysisConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = &config.output.csv {
        report::write_csv(&analysis.comparison, path)?;
    }
    if let Some(path) = &config.output.json {
        report::write_json(&analysis.comparison, path)?;
    }
    if let Some(path) = &config.output.polygon {
        save_polygon(&analysis.corridor.geometry, path)?;
    }
    Ok(())
}

/// Buffers the cached corridor and writes the polygon for inspection.
///
/// # Errors
///
/// Returns an error if the cache is missing or the polygon cannot be
/// written.
pub fn buffer_only(
    config: &AnalysisConfig,
    output: &std::path::Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let line = obtain_line(&GeoJsonFileSource::new(&config.corridor_path))?;
    let corridor = buffer_line(line.line(), config.buffer_meters, config.planar_crs)?;
    save_polygon(&corridor.geometry, output)?;

    println!(
        "Wrote {} m corridor ({:.3} km² in {}) to {}",
        config.buffer_meters,
        corridor.planar_area_sq_m / 1_000_000.0,
        corridor.planar,
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use branch_corridor_analytics_models::PeriodValue;
    use branch_corridor_spatial::BoundaryRule;
    use geo::Coord;

    use super::*;

    fn record(id: &str, county: &str, lat: f64, lng: f64, deposits: &str) -> BankRecord {
        BankRecord {
            year: 2020,
            branch_id: id.to_string(),
            full_name: format!("Bank {id}"),
            address: String::new(),
            city: "Bronx".to_string(),
            county_name: county.to_string(),
            state_abbrev: "NY".to_string(),
            zip_code: String::new(),
            deposit_sum: deposits.to_string(),
            city2: String::new(),
            name2: String::new(),
            state_name: "New York".to_string(),
            latitude: Some(lat.to_string()),
            longitude: Some(lng.to_string()),
        }
    }

    /// An east-west line along latitude 40.85.
    fn corridor_line() -> CorridorLine {
        CorridorLine::new(vec![
            Coord { x: -73.92, y: 40.85 },
            Coord { x: -73.88, y: 40.85 },
        ])
        .unwrap()
    }

    fn five_branches() -> RecordSet {
        RecordSet::from_records(vec![
            record("A", "Bronx", 40.85, -73.91, "$100"),
            record("B", "Bronx", 40.851, -73.90, "$100"),
            record("C", "Bronx", 40.849, -73.89, "$100"),
            record("D", "Bronx", 40.90, -73.90, "$100"),
            record("E", "Bronx", 40.80, -73.90, "$100"),
        ])
    }

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            buffer_meters: 300.0,
            ..AnalysisConfig::default()
        }
    }

    #[test]
    fn three_of_five_branches_inside_corridor() {
        let records = five_branches();

        let analysis = analyze(&records, &corridor_line(), &config()).unwrap();

        assert_eq!(analysis.corridor_records, vec![0, 1, 2]);
        assert_eq!(analysis.reference_records, 5);

        let row = &analysis.comparison.rows[0];
        assert_eq!(row.period, 2020);
        assert_eq!(row.corridor, PeriodValue::Sum(300.0));
        assert_eq!(row.reference, PeriodValue::Sum(500.0));
        assert!((row.corridor_share.unwrap() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn corridor_filter_applies_before_containment() {
        let mut records = five_branches().records;
        records[1].county_name = "Westchester".to_string();
        let records = RecordSet::from_records(records);

        let config = AnalysisConfig {
            corridor_filter: BTreeMap::from([("countyName".to_string(), "Bronx".to_string())]),
            reference_filter: BTreeMap::from([("countyName".to_string(), "Bronx".to_string())]),
            ..config()
        };

        let analysis = analyze(&records, &corridor_line(), &config).unwrap();

        assert_eq!(analysis.corridor_records, vec![0, 2]);
        assert_eq!(analysis.reference_records, 4);
        assert_eq!(
            analysis.comparison.rows[0].corridor,
            PeriodValue::Sum(200.0)
        );
    }

    #[test]
    fn unlocated_records_count_in_reference_only() {
        let mut records = five_branches().records;
        let mut unlocated = record("F", "Bronx", 40.85, -73.90, "$100");
        unlocated.latitude = None;
        records.push(unlocated);
        let records = RecordSet::from_records(records);

        let analysis = analyze(&records, &corridor_line(), &config()).unwrap();

        assert_eq!(analysis.corridor_records.len(), 3);
        assert_eq!(
            analysis.comparison.rows[0].reference,
            PeriodValue::Sum(600.0)
        );
    }

    #[test]
    fn larger_buffer_never_loses_records() {
        let records = five_branches();
        let line = corridor_line();

        let mut previous = 0;
        for meters in [50.0, 300.0, 6_000.0] {
            let config = AnalysisConfig {
                buffer_meters: meters,
                boundary: BoundaryRule::Inclusive,
                ..AnalysisConfig::default()
            };
            let inside = analyze(&records, &line, &config)
                .unwrap()
                .corridor_records
                .len();
            assert!(inside >= previous);
            previous = inside;
        }
        assert_eq!(previous, 5);
    }

    #[test]
    fn non_positive_buffer_is_rejected() {
        let config = AnalysisConfig {
            buffer_meters: 0.0,
            ..AnalysisConfig::default()
        };

        assert!(analyze(&five_branches(), &corridor_line(), &config).is_err());
    }

    #[test]
    fn writes_configured_outputs() {
        let dir = std::env::temp_dir().join("branch_corridor_pipeline_tests");
        let config = AnalysisConfig {
            output: crate::config::OutputConfig {
                csv: Some(dir.join("comparison.csv")),
                json: Some(dir.join("comparison.json")),
                polygon: Some(dir.join("polygon.geojson")),
            },
            ..config()
        };

        let analysis = analyze(&five_branches(), &corridor_line(), &config).unwrap();
        write_outputs(&analysis, &config).unwrap();

        assert!(dir.join("comparison.csv").exists());
        assert!(dir.join("comparison.json").exists());
        assert!(dir.join("polygon.geojson").exists());
    }
}
