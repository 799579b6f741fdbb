#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Bank branch record types and field parsing.
//!
//! A [`BankRecord`] is one branch observation for one year, exactly as it
//! appears in the source table. Deposit amounts and coordinates are kept as
//! raw strings; [`parse_currency`] and [`parse_lat_lng`] turn them into
//! numbers when a pipeline stage needs them.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// One bank branch observation for a single year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankRecord {
    /// Reporting year.
    pub year: i32,
    /// Unique branch identifier.
    pub branch_id: String,
    /// Full institution name.
    pub full_name: String,
    /// Street address.
    pub address: String,
    /// City as reported by the institution.
    pub city: String,
    /// County name (e.g. "Bronx").
    pub county_name: String,
    /// Two-letter state abbreviation.
    pub state_abbrev: String,
    /// Postal code.
    pub zip_code: String,
    /// Deposit total, usually currency formatted (e.g. `"$1,234,567"`).
    pub deposit_sum: String,
    /// Normalized city name.
    #[serde(default)]
    pub city2: String,
    /// Normalized branch name.
    #[serde(default)]
    pub name2: String,
    /// Full state name (e.g. "New York").
    pub state_name: String,
    /// Raw latitude, possibly empty.
    #[serde(default)]
    pub latitude: Option<String>,
    /// Raw longitude, possibly empty.
    #[serde(default)]
    pub longitude: Option<String>,
}

/// Columns of a [`BankRecord`], named as they appear in the source header.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum RecordField {
    /// Reporting year.
    Year,
    /// Branch identifier.
    BranchId,
    /// Institution name.
    FullName,
    /// Street address.
    Address,
    /// City.
    City,
    /// County name.
    CountyName,
    /// State abbreviation.
    StateAbbrev,
    /// Postal code.
    ZipCode,
    /// Deposit total.
    DepositSum,
    /// Normalized city.
    City2,
    /// Normalized branch name.
    Name2,
    /// Full state name.
    StateName,
    /// Latitude.
    Latitude,
    /// Longitude.
    Longitude,
}

impl BankRecord {
    /// Returns the value of `field` as a string, the form compared by
    /// attribute predicates.
    ///
    /// Missing coordinates are returned as an empty string.
    #[must_use]
    pub fn field(&self, field: RecordField) -> Cow<'_, str> {
        match field {
            RecordField::Year => Cow::Owned(self.year.to_string()),
            RecordField::BranchId => Cow::Borrowed(&self.branch_id),
            RecordField::FullName => Cow::Borrowed(&self.full_name),
            RecordField::Address => Cow::Borrowed(&self.address),
            RecordField::City => Cow::Borrowed(&self.city),
            RecordField::CountyName => Cow::Borrowed(&self.county_name),
            RecordField::StateAbbrev => Cow::Borrowed(&self.state_abbrev),
            RecordField::ZipCode => Cow::Borrowed(&self.zip_code),
            RecordField::DepositSum => Cow::Borrowed(&self.deposit_sum),
            RecordField::City2 => Cow::Borrowed(&self.city2),
            RecordField::Name2 => Cow::Borrowed(&self.name2),
            RecordField::StateName => Cow::Borrowed(&self.state_name),
            RecordField::Latitude => Cow::Borrowed(self.latitude.as_deref().unwrap_or("")),
            RecordField::Longitude => Cow::Borrowed(self.longitude.as_deref().unwrap_or("")),
        }
    }

    /// Parsed deposit amount, or `None` if the raw value is not a number.
    #[must_use]
    pub fn deposits(&self) -> Option<f64> {
        parse_currency(&self.deposit_sum)
    }

    /// Parsed `(longitude, latitude)`, or `None` if either is unusable.
    #[must_use]
    pub fn lng_lat(&self) -> Option<(f64, f64)> {
        parse_lat_lng(self.latitude.as_deref(), self.longitude.as_deref())
            .map(|(lat, lng)| (lng, lat))
    }
}

/// Parses a currency-formatted amount such as `"$1,234,567"`.
///
/// Dollar signs, thousands separators and surrounding whitespace are
/// stripped. Returns `None` for empty or non-numeric input rather than
/// coercing it to zero.
#[must_use]
pub fn parse_currency(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses latitude/longitude strings into `(lat, lng)`.
///
/// Returns `None` if either value is missing, unparseable, non-finite,
/// outside the valid angular range, or if both are exactly zero (the
/// null-island placeholder some sources emit for unknown locations).
#[must_use]
pub fn parse_lat_lng(lat: Option<&str>, lng: Option<&str>) -> Option<(f64, f64)> {
    let latitude = lat?.trim().parse::<f64>().ok()?;
    let longitude = lng?.trim().parse::<f64>().ok()?;

    if !latitude.is_finite() || !longitude.is_finite() {
        return None;
    }
    if latitude.abs() > 90.0 || longitude.abs() > 180.0 {
        return None;
    }
    if latitude == 0.0 && longitude == 0.0 {
        return None;
    }

    Some((latitude, longitude))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr as _;

    use strum::IntoEnumIterator as _;

    use super::*;

    fn record() -> BankRecord {
        BankRecord {
            year: 2021,
            branch_id: "B-1".to_string(),
            full_name: "First Bank".to_string(),
            address: "1 Grand Concourse".to_string(),
            city: "Bronx".to_string(),
            county_name: "Bronx".to_string(),
            state_abbrev: "NY".to_string(),
            zip_code: "10451".to_string(),
            deposit_sum: "$1,234,567".to_string(),
            city2: "BRONX".to_string(),
            name2: "FIRST BANK".to_string(),
            state_name: "New York".to_string(),
            latitude: Some("40.8176".to_string()),
            longitude: Some("-73.9227".to_string()),
        }
    }

    #[test]
    fn parses_currency_with_separators() {
        assert!((parse_currency("$1,234.00").unwrap() - 1234.0).abs() < f64::EPSILON);
        assert!((parse_currency(" $500 ").unwrap() - 500.0).abs() < f64::EPSILON);
        assert!((parse_currency("1,234,567").unwrap() - 1_234_567.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_empty_and_non_numeric_currency() {
        assert!(parse_currency("").is_none());
        assert!(parse_currency("   ").is_none());
        assert!(parse_currency("$").is_none());
        assert!(parse_currency("n/a").is_none());
        assert!(parse_currency("NaN").is_none());
    }

    #[test]
    fn parses_lat_lng() {
        let (lat, lng) = parse_lat_lng(Some("40.8176"), Some("-73.9227")).unwrap();
        assert!((lat - 40.8176).abs() < f64::EPSILON);
        assert!((lng - -73.9227).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_missing_or_invalid_lat_lng() {
        assert!(parse_lat_lng(None, Some("-73.9")).is_none());
        assert!(parse_lat_lng(Some(""), Some("-73.9")).is_none());
        assert!(parse_lat_lng(Some("abc"), Some("-73.9")).is_none());
        assert!(parse_lat_lng(Some("91.0"), Some("-73.9")).is_none());
        assert!(parse_lat_lng(Some("40.0"), Some("-181.0")).is_none());
        assert!(parse_lat_lng(Some("0"), Some("0")).is_none());
    }

    #[test]
    fn lng_lat_swaps_order() {
        let (lng, lat) = record().lng_lat().unwrap();
        assert!((lng - -73.9227).abs() < f64::EPSILON);
        assert!((lat - 40.8176).abs() < f64::EPSILON);
    }

    #[test]
    fn field_names_round_trip_through_strum() {
        for field in RecordField::iter() {
            let name = field.to_string();
            assert_eq!(RecordField::from_str(&name).unwrap(), field);
        }
        assert_eq!(
            RecordField::from_str("countyName").unwrap(),
            RecordField::CountyName
        );
        assert!(RecordField::from_str("CountyName").is_err());
    }

    #[test]
    fn field_accessor_returns_string_forms() {
        let r = record();
        assert_eq!(r.field(RecordField::Year), "2021");
        assert_eq!(r.field(RecordField::StateName), "New York");
        assert_eq!(r.field(RecordField::Latitude), "40.8176");

        let mut missing = r;
        missing.longitude = None;
        assert_eq!(missing.field(RecordField::Longitude), "");
    }
}
