//! Per-period sums.
//!
//! Records are partitioned by a period key and a numeric value is summed
//! within each partition. Values that cannot be parsed are skipped and
//! counted, not treated as zero. A partition where every value was skipped
//! is [`PeriodValue::NoData`].

use branch_corridor_analytics_models::{
    AggregateSeries, Period, PeriodAggregate, PeriodValue, Population,
};
use branch_corridor_records_models::BankRecord;

/// Sums `value` per `key` period over `records`.
pub fn aggregate<'a, I, K, V>(
    population: Population,
    records: I,
    key: K,
    value: V,
) -> AggregateSeries
where
    I: IntoIterator<Item = &'a BankRecord>,
    K: Fn(&BankRecord) -> Period,
    V: Fn(&BankRecord) -> Option<f64>,
{
    let mut series = AggregateSeries::new(population);

    for record in records {
        let entry = series
            .periods
            .entry(key(record))
            .or_insert_with(PeriodAggregate::default);

        match value(record) {
            Some(v) => {
                entry.value = PeriodValue::Sum(entry.value.value().unwrap_or(0.0) + v);
                entry.included += 1;
            }
            None => entry.excluded += 1,
        }
    }

    log::info!(
        "Aggregated {} population: {} periods, {} values summed, {} excluded",
        series.population,
        series.periods.len(),
        series.included(),
        series.excluded(),
    );

    series
}

/// Sums parsed deposit amounts per year.
pub fn deposits_by_year<'a, I>(population: Population, records: I) -> AggregateSeries
where
    I: IntoIterator<Item = &'a BankRecord>,
{
    aggregate(population, records, |r| r.year, BankRecord::deposits)
}

/// Logs a warning if more than `max_ratio` of the series' values were
/// unusable. Returns `true` if the warning fired.
pub fn warn_if_mostly_excluded(series: &AggregateSeries, max_ratio: f64) -> bool {
    let ratio = series.excluded_ratio();
    if ratio > max_ratio {
        log::warn!(
            "{:.1}% of {} deposit values could not be parsed ({} of {})",
            ratio * 100.0,
            series.population,
            series.excluded(),
            series.included() + series.excluded(),
        );
        true
    } else {
        false
    }
}
