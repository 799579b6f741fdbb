//! Reads the branch table and attaches geographic points.
//!
//! Every well-formed row becomes a [`BankRecord`]. Rows whose coordinates
//! are missing or unusable stay in [`RecordSet::records`] but get no entry
//! in [`RecordSet::located`], so spatial stages never see them.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use branch_corridor_records_models::BankRecord;
use branch_corridor_spatial_models::Crs;
use geo::Point;

use crate::RecordError;
use crate::progress::ProgressCallback;

/// A record that has a usable location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocatedRecord {
    /// Index into [`RecordSet::records`].
    pub index: usize,
    /// Location as `(lng, lat)` in [`RecordSet::crs`].
    pub point: Point<f64>,
}

/// The loaded table plus the geometric view over it.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    /// All well-formed records, in file order.
    pub records: Vec<BankRecord>,
    /// Records with coordinates, in file order.
    pub located: Vec<LocatedRecord>,
    /// Number of rows that could not be read as a record at all.
    pub malformed_rows: usize,
}

impl RecordSet {
    /// CRS of every point in [`Self::located`].
    pub const CRS: Crs = Crs::Geographic;

    /// Builds a record set from already-materialized records.
    #[must_use]
    pub fn from_records(records: Vec<BankRecord>) -> Self {
        let located = locate(&records);
        Self {
            records,
            located,
            malformed_rows: 0,
        }
    }

    /// Points of all located records, in the same order as [`Self::located`].
    #[must_use]
    pub fn points(&self) -> Vec<Point<f64>> {
        self.located.iter().map(|l| l.point).collect()
    }

    /// Number of records excluded from spatial operations.
    #[must_use]
    pub fn unlocated_count(&self) -> usize {
        self.records.len() - self.located.len()
    }
}

/// Loads records from a CSV file with a header row.
///
/// # Errors
///
/// Returns [`RecordError::Io`] if the file cannot be opened, or
/// [`RecordError::Csv`] if the header cannot be read.
pub fn load_csv(
    path: &Path,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<RecordSet, RecordError> {
    log::info!("Loading branch records from {}", path.display());
    let file = std::fs::File::open(path)?;
    progress.set_total(file.metadata()?.len());
    read_csv(file, progress)
}

/// Reports every chunk pulled through it as progress, in bytes.
struct CountingReader<'a, R> {
    inner: R,
    progress: &'a dyn ProgressCallback,
}

impl<R: Read> Read for CountingReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.progress.inc(n as u64);
        Ok(n)
    }
}

/// Reads records from any CSV source with a header row.
///
/// Rows that fail to deserialize are skipped and counted in
/// [`RecordSet::malformed_rows`]. Progress advances by the number of bytes
/// consumed from `reader`.
///
/// # Errors
///
/// Returns [`RecordError::Csv`] if the header row cannot be read.
pub fn read_csv<R: Read>(
    reader: R,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<RecordSet, RecordError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(CountingReader {
            inner: reader,
            progress: progress.as_ref(),
        });

    // Surface a bad header as a hard error rather than one skipped row per line.
    rdr.headers()?;

    let mut records = Vec::new();
    let mut malformed_rows = 0_usize;

    for (line, row) in rdr.deserialize::<BankRecord>().enumerate() {
        match row {
            Ok(record) => records.push(record),
            Err(e) => {
                malformed_rows += 1;
                log::warn!("Skipping malformed row {}: {e}", line + 2);
            }
        }
    }

    let located = locate(&records);

    log::info!(
        "Loaded {} records ({} located, {} without coordinates, {malformed_rows} malformed)",
        records.len(),
        located.len(),
        records.len() - located.len(),
    );
    progress.finish(format!("Loaded {} records", records.len()));

    Ok(RecordSet {
        records,
        located,
        malformed_rows,
    })
}

fn locate(records: &[BankRecord]) -> Vec<LocatedRecord> {
    let located: Vec<LocatedRecord> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            record.lng_lat().map(|(lng, lat)| LocatedRecord {
                index,
                point: Point::new(lng, lat),
            })
        })
        .collect();

    log::debug!(
        "Dropped {} records without usable coordinates from the spatial set",
        records.len() - located.len()
    );

    located
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;
    use crate::progress::null_progress;

    #[derive(Default)]
    struct RecordingProgress {
        total: AtomicU64,
        consumed: AtomicU64,
        finished: Mutex<Option<String>>,
    }

    impl ProgressCallback for RecordingProgress {
        fn set_total(&self, total: u64) {
            self.total.store(total, Ordering::SeqCst);
        }

        fn inc(&self, delta: u64) {
            self.consumed.fetch_add(delta, Ordering::SeqCst);
        }

        fn finish(&self, msg: String) {
            *self.finished.lock().unwrap() = Some(msg);
        }
    }

    const HEADER: &str = "year,branchId,fullName,address,city,countyName,stateAbbrev,zipCode,depositSum,city2,name2,stateName,latitude,longitude";

    fn csv_with(rows: &[&str]) -> String {
        let mut s = String::from(HEADER);
        for row in rows {
            s.push('\n');
            s.push_str(row);
        }
        s
    }

    #[test]
    fn loads_rows_and_locates_those_with_coordinates() {
        let data = csv_with(&[
            "2020,B1,First Bank,1 Main St,Bronx,Bronx,NY,10451,\"$1,000\",BRONX,FIRST,New York,40.82,-73.92",
            "2020,B2,Second Bank,2 Main St,Bronx,Bronx,NY,10452,$500,BRONX,SECOND,New York,,",
            "2021,B3,Third Bank,3 Main St,Bronx,Bronx,NY,10453,$250,BRONX,THIRD,New York,abc,-73.90",
        ]);

        let set = read_csv(data.as_bytes(), &null_progress()).unwrap();

        assert_eq!(set.records.len(), 3);
        assert_eq!(set.located.len(), 1);
        assert_eq!(set.located[0].index, 0);
        assert_eq!(set.unlocated_count(), 2);
        assert!(set.located.len() <= set.records.len());
        assert!((set.located[0].point.x() - -73.92).abs() < f64::EPSILON);
        assert!((set.located[0].point.y() - 40.82).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_coordinates_keep_tabular_record() {
        let data = csv_with(&[
            "2020,B2,Second Bank,2 Main St,Bronx,Bronx,NY,10452,$500,BRONX,SECOND,New York,,",
        ]);

        let set = read_csv(data.as_bytes(), &null_progress()).unwrap();

        assert_eq!(set.records.len(), 1);
        assert!(set.located.is_empty());
        assert_eq!(set.records[0].deposit_sum, "$500");
        assert!(set.records[0].latitude.is_none());
    }

    #[test]
    fn skips_rows_with_bad_year() {
        let data = csv_with(&[
            "twenty,B1,First Bank,1 Main St,Bronx,Bronx,NY,10451,$1,BRONX,FIRST,New York,40.82,-73.92",
            "2021,B3,Third Bank,3 Main St,Bronx,Bronx,NY,10453,$250,BRONX,THIRD,New York,40.83,-73.90",
        ]);

        let set = read_csv(data.as_bytes(), &null_progress()).unwrap();

        assert_eq!(set.malformed_rows, 1);
        assert_eq!(set.records.len(), 1);
        assert_eq!(set.records[0].branch_id, "B3");
        assert_eq!(set.located[0].index, 0);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let path = std::env::temp_dir().join("branch_corridor_missing_records.csv");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            load_csv(&path, &null_progress()),
            Err(RecordError::Io(_))
        ));
    }

    #[test]
    fn from_records_builds_located_view() {
        let data = csv_with(&[
            "2020,B1,First Bank,1 Main St,Bronx,Bronx,NY,10451,$1,BRONX,FIRST,New York,40.82,-73.92",
            "2020,B2,Second Bank,2 Main St,Bronx,Bronx,NY,10452,$500,BRONX,SECOND,New York,,",
        ]);
        let loaded = read_csv(data.as_bytes(), &null_progress()).unwrap();

        let rebuilt = RecordSet::from_records(loaded.records.clone());

        assert_eq!(rebuilt.located, loaded.located);
        assert_eq!(rebuilt.points().len(), 1);
        assert_eq!(RecordSet::CRS, Crs::Geographic);
    }

    #[test]
    fn progress_counts_every_byte_read() {
        let data = csv_with(&[
            "2020,B1,First Bank,1 Main St,Bronx,Bronx,NY,10451,$1,BRONX,FIRST,New York,40.82,-73.92",
            "2021,B3,Third Bank,3 Main St,Bronx,Bronx,NY,10453,$250,BRONX,THIRD,New York,40.83,-73.90",
        ]);
        let recorder = Arc::new(RecordingProgress::default());
        let progress: Arc<dyn ProgressCallback> = recorder.clone();

        read_csv(data.as_bytes(), &progress).unwrap();

        assert_eq!(
            recorder.consumed.load(Ordering::SeqCst),
            data.len() as u64
        );
        assert_eq!(
            recorder.finished.lock().unwrap().as_deref(),
            Some("Loaded 2 records")
        );
    }

    #[test]
    fn load_csv_sets_total_to_file_size() {
        let data = csv_with(&[
            "2020,B1,First Bank,1 Main St,Bronx,Bronx,NY,10451,$1,BRONX,FIRST,New York,40.82,-73.92",
        ]);
        let path = std::env::temp_dir().join("branch_corridor_progress_records.csv");
        std::fs::write(&path, &data).unwrap();
        let recorder = Arc::new(RecordingProgress::default());
        let progress: Arc<dyn ProgressCallback> = recorder.clone();

        let set = load_csv(&path, &progress).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(set.records.len(), 1);
        assert_eq!(recorder.total.load(Ordering::SeqCst), data.len() as u64);
        assert_eq!(
            recorder.consumed.load(Ordering::SeqCst),
            recorder.total.load(Ordering::SeqCst)
        );
    }
}
