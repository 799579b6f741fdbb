//! Joins corridor and reference series and computes percent changes.
//!
//! Changes are `(latest - earliest) / earliest` between the earliest and
//! latest periods present in a series. A zero or missing baseline yields
//! [`PercentChange::Undefined`] instead of an infinite or NaN value.

use std::collections::BTreeSet;

use branch_corridor_analytics_models::{
    AggregateSeries, Comparison, ComparisonRow, PercentChange, Period, PeriodChange, PeriodValue,
};

/// Relative change from `earliest` to `latest`.
#[must_use]
pub fn percent_change(earliest: PeriodValue, latest: PeriodValue) -> PercentChange {
    match (earliest.value(), latest.value()) {
        (Some(base), Some(value)) if base != 0.0 => PercentChange::from(Some((value - base) / base)),
        _ => PercentChange::Undefined,
    }
}

/// Relative change of `series` between two given periods.
#[must_use]
pub fn change_between(series: &AggregateSeries, from: Period, to: Period) -> PercentChange {
    percent_change(series.value(from), series.value(to))
}

/// Change of `series` from its earliest to its latest period with data.
///
/// Periods that are [`PeriodValue::NoData`] are skipped when picking the
/// endpoints. Returns `None` if no period has data. A series with a single
/// such period has an [`PercentChange::Undefined`] change since there is no
/// pair to compare.
#[must_use]
pub fn series_change(series: &AggregateSeries) -> Option<PeriodChange> {
    let mut observed = series
        .periods
        .iter()
        .filter(|(_, aggregate)| aggregate.value.value().is_some())
        .map(|(period, _)| *period);

    let from_period = observed.next()?;
    let to_period = observed.next_back().unwrap_or(from_period);

    let change = if from_period == to_period {
        PercentChange::Undefined
    } else {
        change_between(series, from_period, to_period)
    };

    Some(PeriodChange {
        population: series.population.clone(),
        from_period,
        to_period,
        change,
    })
}

fn share(part: PeriodValue, whole: PeriodValue) -> Option<f64> {
    match (part.value(), whole.value()) {
        (Some(p), Some(w)) if w != 0.0 => Some(p / w),
        _ => None,
    }
}

/// Outer-joins two series on period.
///
/// Each row carries both aggregates (missing sides are
/// [`PeriodValue::NoData`]), the corridor's share of the reference, and each
/// series' change since the first period of the join.
#[must_use]
pub fn compare(corridor: &AggregateSeries, reference: &AggregateSeries) -> Comparison {
    let periods: BTreeSet<Period> = corridor
        .periods
        .keys()
        .chain(reference.periods.keys())
        .copied()
        .collect();

    let baseline = periods.first().copied();

    let rows: Vec<ComparisonRow> = periods
        .iter()
        .map(|&period| {
            let c = corridor.value(period);
            let r = reference.value(period);
            ComparisonRow {
                period,
                corridor: c,
                reference: r,
                corridor_share: share(c, r),
                corridor_change: baseline
                    .map_or(PercentChange::Undefined, |b| change_between(corridor, b, period)),
                reference_change: baseline
                    .map_or(PercentChange::Undefined, |b| change_between(reference, b, period)),
            }
        })
        .collect();

    let comparison = Comparison {
        rows,
        corridor_change: series_change(corridor),
        reference_change: series_change(reference),
    };

    for change in [&comparison.corridor_change, &comparison.reference_change]
        .into_iter()
        .flatten()
    {
        log::info!(
            "{} change {}-{}: {}",
            change.population,
            change.from_period,
            change.to_period,
            change.change
        );
    }

    comparison
}
