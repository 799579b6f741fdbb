//! Renders a [`Comparison`] for people and for downstream tools.
//!
//! The text table is for the terminal. CSV output is one flat row per period
//! with undefined values written as `undefined`. JSON output is the full
//! comparison with undefined values as `null`.

use std::path::Path;

use branch_corridor_analytics_models::{Comparison, PercentChange, Period, PeriodChange};
use serde::Serialize;

use crate::AnalyticsError;

const UNDEFINED: &str = "undefined";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow {
    period: Period,
    corridor: String,
    reference: String,
    corridor_share: String,
    corridor_change: String,
    reference_change: String,
}

fn number(value: Option<f64>) -> String {
    value.map_or_else(|| UNDEFINED.to_string(), |v| v.to_string())
}

fn change_cell(change: PercentChange) -> String {
    number(change.fraction())
}

fn summary_line(label: &str, change: Option<&PeriodChange>) -> String {
    match change {
        Some(c) => format!(
            "{label} change {}-{}: {}",
            c.from_period, c.to_period, c.change
        ),
        None => format!("{label} change: no data"),
    }
}

/// Renders the comparison as an aligned text table followed by the
/// earliest-to-latest change for each population.
#[must_use]
pub fn render_table(comparison: &Comparison) -> String {
    let mut lines = vec![
        format!(
            "{:>6}  {:>16}  {:>16}  {:>8}  {:>12}  {:>12}",
            "Year", "Corridor", "Reference", "Share", "Corr. chg", "Ref. chg"
        ),
        "-".repeat(82),
    ];

    lines.extend(comparison.rows.iter().map(|row| {
        let share = row
            .corridor_share
            .map_or_else(|| "-".to_string(), |s| format!("{:.2}%", s * 100.0));
        format!(
            "{:>6}  {:>16}  {:>16}  {:>8}  {:>12}  {:>12}",
            row.period,
            row.corridor.to_string(),
            row.reference.to_string(),
            share,
            row.corridor_change.to_string(),
            row.reference_change.to_string(),
        )
    }));

    lines.push(String::new());
    lines.push(summary_line(
        "Corridor",
        comparison.corridor_change.as_ref(),
    ));
    lines.push(summary_line(
        "Reference",
        comparison.reference_change.as_ref(),
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn ensure_parent(path: &Path) -> Result<(), AnalyticsError> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Writes one CSV row per period.
///
/// # Errors
///
/// Returns [`AnalyticsError::Io`] or [`AnalyticsError::Csv`] if the file
/// cannot be written.
pub fn write_csv(comparison: &Comparison, path: &Path) -> Result<(), AnalyticsError> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;

    for row in &comparison.rows {
        writer.serialize(CsvRow {
            period: row.period,
            corridor: number(row.corridor.value()),
            reference: number(row.reference.value()),
            corridor_share: number(row.corridor_share),
            corridor_change: change_cell(row.corridor_change),
            reference_change: change_cell(row.reference_change),
        })?;
    }

    writer.flush()?;
    log::info!(
        "Wrote {} comparison rows to {}",
        comparison.rows.len(),
        path.display()
    );
    Ok(())
}

/// Writes the full comparison as pretty-printed JSON.
///
/// # Errors
///
/// Returns [`AnalyticsError::Io`] or [`AnalyticsError::Json`] if the file
/// cannot be written.
pub fn write_json(comparison: &Comparison, path: &Path) -> Result<(), AnalyticsError> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(comparison)?;
    std::fs::write(path, json)?;
    log::info!("Wrote comparison JSON to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use branch_corridor_analytics_models::{ComparisonRow, PeriodValue, Population};

    use super::*;

    fn sample() -> Comparison {
        Comparison {
            rows: vec![
                ComparisonRow {
                    period: 2019,
                    corridor: PeriodValue::Sum(0.0),
                    reference: PeriodValue::Sum(1_000.0),
                    corridor_share: Some(0.0),
                    corridor_change: PercentChange::Defined(0.0),
                    reference_change: PercentChange::Defined(0.0),
                },
                ComparisonRow {
                    period: 2020,
                    corridor: PeriodValue::Sum(500.0),
                    reference: PeriodValue::Sum(1_100.0),
                    corridor_share: Some(500.0 / 1_100.0),
                    corridor_change: PercentChange::Undefined,
                    reference_change: PercentChange::Defined(0.1),
                },
            ],
            corridor_change: Some(PeriodChange {
                population: Population::Corridor,
                from_period: 2019,
                to_period: 2020,
                change: PercentChange::Undefined,
            }),
            reference_change: Some(PeriodChange {
                population: Population::Reference,
                from_period: 2019,
                to_period: 2020,
                change: PercentChange::Defined(0.1),
            }),
        }
    }

    fn temp_dir() -> std::path::PathBuf {
        std::env::temp_dir().join("branch_corridor_report_tests")
    }

    #[test]
    fn table_shows_undefined_and_summary() {
        let table = render_table(&sample());

        assert!(table.contains("2019"));
        assert!(table.contains("undefined"));
        assert!(table.contains("Reference change 2019-2020: +10.00%"));
        assert!(table.contains("Corridor change 2019-2020: undefined"));
    }

    #[test]
    fn table_layout_has_header_rows_then_summaries() {
        let table = render_table(&sample());
        let lines: Vec<&str> = table.lines().collect();

        assert!(table.ends_with('\n'));
        assert_eq!(lines.len(), 7);
        assert!(lines[0].trim_start().starts_with("Year"));
        assert_eq!(lines[1], "-".repeat(82));
        assert!(lines[2].trim_start().starts_with("2019"));
        assert!(lines[3].trim_start().starts_with("2020"));
        assert!(lines[3].contains("45.45%"));
        assert!(lines[4].is_empty());
        assert!(lines[5].starts_with("Corridor change"));
        assert!(lines[6].starts_with("Reference change"));
    }

    #[test]
    fn table_without_changes_says_no_data() {
        let table = render_table(&Comparison {
            rows: vec![],
            corridor_change: None,
            reference_change: None,
        });

        assert!(table.contains("Corridor change: no data"));
    }

    #[test]
    fn csv_has_one_row_per_period() {
        let path = temp_dir().join("nested").join("comparison.csv");
        write_csv(&sample(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "period,corridor,reference,corridorShare,corridorChange,referenceChange"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[2].starts_with("2020,500,1100,"));
        assert!(lines[2].contains(",undefined,0.1"));
    }

    #[test]
    fn json_uses_null_for_undefined() {
        let path = temp_dir().join("comparison.json");
        write_json(&sample(), &path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();

        assert!(json["rows"][1]["corridorChange"].is_null());
        assert_eq!(json["rows"][1]["referenceChange"], 0.1);
        assert!(json["corridorChange"]["change"].is_null());
        assert_eq!(json["referenceChange"]["population"], "reference");
    }
}
