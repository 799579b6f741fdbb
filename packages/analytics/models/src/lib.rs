#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Aggregate series and period comparison types.
//!
//! A period with no usable values is [`PeriodValue::NoData`], never a
//! zero sum, and a percent change against a zero or missing baseline is
//! [`PercentChange::Undefined`]. Both serialize as JSON `null`.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A reporting period (calendar year).
pub type Period = i32;

/// The population an aggregate series describes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Population {
    /// Records inside the buffered corridor.
    Corridor,
    /// Records of the wider reference region.
    Reference,
    /// Any other labelled population.
    Named(String),
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corridor => write!(f, "corridor"),
            Self::Reference => write!(f, "reference"),
            Self::Named(name) => write!(f, "{name}"),
        }
    }
}

impl From<Population> for String {
    fn from(value: Population) -> Self {
        value.to_string()
    }
}

impl From<String> for Population {
    fn from(value: String) -> Self {
        match value.as_str() {
            "corridor" => Self::Corridor,
            "reference" => Self::Reference,
            _ => Self::Named(value),
        }
    }
}

/// The summed value for one period.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(into = "Option<f64>", from = "Option<f64>")]
pub enum PeriodValue {
    /// Sum of at least one valid value.
    Sum(f64),
    /// The period had records but none with a usable value.
    #[default]
    NoData,
}

impl PeriodValue {
    /// The sum, if there is one.
    #[must_use]
    pub const fn value(self) -> Option<f64> {
        match self {
            Self::Sum(v) => Some(v),
            Self::NoData => None,
        }
    }
}

impl From<PeriodValue> for Option<f64> {
    fn from(value: PeriodValue) -> Self {
        value.value()
    }
}

impl From<Option<f64>> for PeriodValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::NoData, Self::Sum)
    }
}

impl fmt::Display for PeriodValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sum(v) => write!(f, "{v:.0}"),
            Self::NoData => write!(f, "no data"),
        }
    }
}

/// Aggregate for one period plus the record counts behind it.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodAggregate {
    /// Summed value.
    pub value: PeriodValue,
    /// Records whose value was summed.
    pub included: usize,
    /// Records whose value could not be parsed.
    pub excluded: usize,
}

/// One value per period for a named population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateSeries {
    /// Which population this series describes.
    pub population: Population,
    /// Aggregates keyed by period, in ascending order.
    pub periods: BTreeMap<Period, PeriodAggregate>,
}

impl AggregateSeries {
    /// Creates an empty series.
    #[must_use]
    pub const fn new(population: Population) -> Self {
        Self {
            population,
            periods: BTreeMap::new(),
        }
    }

    /// Value for `period`, or [`PeriodValue::NoData`] if the period is absent.
    #[must_use]
    pub fn value(&self, period: Period) -> PeriodValue {
        self.periods
            .get(&period)
            .map_or(PeriodValue::NoData, |p| p.value)
    }

    /// Earliest period present.
    #[must_use]
    pub fn earliest(&self) -> Option<Period> {
        self.periods.keys().next().copied()
    }

    /// Latest period present.
    #[must_use]
    pub fn latest(&self) -> Option<Period> {
        self.periods.keys().next_back().copied()
    }

    /// Total records whose value was summed.
    #[must_use]
    pub fn included(&self) -> usize {
        self.periods.values().map(|p| p.included).sum()
    }

    /// Total records whose value was unusable.
    #[must_use]
    pub fn excluded(&self) -> usize {
        self.periods.values().map(|p| p.excluded).sum()
    }

    /// Fraction of records whose value was unusable (0 for an empty series).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn excluded_ratio(&self) -> f64 {
        let total = self.included() + self.excluded();
        if total == 0 {
            0.0
        } else {
            self.excluded() as f64 / total as f64
        }
    }

    /// Returns `true` if no period is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }
}

/// Relative change between two periods, as a fraction (`0.1` is +10%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "Option<f64>", from = "Option<f64>")]
pub enum PercentChange {
    /// A finite change.
    Defined(f64),
    /// The baseline was zero or missing.
    Undefined,
}

impl PercentChange {
    /// The change as a fraction, if defined.
    #[must_use]
    pub const fn fraction(self) -> Option<f64> {
        match self {
            Self::Defined(v) => Some(v),
            Self::Undefined => None,
        }
    }

    /// The change in percent, if defined.
    #[must_use]
    pub fn percent(self) -> Option<f64> {
        self.fraction().map(|v| v * 100.0)
    }
}

impl From<PercentChange> for Option<f64> {
    fn from(value: PercentChange) -> Self {
        value.fraction()
    }
}

impl From<Option<f64>> for PercentChange {
    fn from(value: Option<f64>) -> Self {
        value
            .filter(|v| v.is_finite())
            .map_or(Self::Undefined, Self::Defined)
    }
}

impl fmt::Display for PercentChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.percent() {
            Some(p) => write!(f, "{p:+.2}%"),
            None => write!(f, "undefined"),
        }
    }
}

/// Change of one series between its earliest and latest periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodChange {
    /// Series the change was computed for.
    pub population: Population,
    /// Baseline period.
    pub from_period: Period,
    /// Comparison period.
    pub to_period: Period,
    /// Relative change.
    pub change: PercentChange,
}

/// One period of the corridor/reference join.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonRow {
    /// Period.
    pub period: Period,
    /// Corridor aggregate.
    pub corridor: PeriodValue,
    /// Reference aggregate.
    pub reference: PeriodValue,
    /// Corridor aggregate as a fraction of the reference aggregate, if
    /// both exist and the reference is non-zero.
    pub corridor_share: Option<f64>,
    /// Corridor change since the first period of the join.
    pub corridor_change: PercentChange,
    /// Reference change since the first period of the join.
    pub reference_change: PercentChange,
}

/// Full comparison of a corridor against its reference region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comparison {
    /// Joined rows, one per period present in either series.
    pub rows: Vec<ComparisonRow>,
    /// Corridor change from earliest to latest period.
    pub corridor_change: Option<PeriodChange>,
    /// Reference change from earliest to latest period.
    pub reference_change: Option<PeriodChange>,
}
