//! Exact-match attribute filtering.
//!
//! An [`AttributeFilter`] is a conjunction of `field == value` predicates.
//! Comparison is case-sensitive string equality against
//! [`BankRecord::field`]; a filter with no predicates matches everything.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr as _;

use branch_corridor_records_models::{BankRecord, RecordField};

use crate::RecordError;

/// A set of exact-match predicates, all of which must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeFilter {
    predicates: Vec<(RecordField, String)>,
}

impl AttributeFilter {
    /// Creates an empty filter that matches every record.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    /// Adds a `field == value` predicate.
    #[must_use]
    pub fn with(mut self, field: RecordField, value: impl Into<String>) -> Self {
        self.predicates.push((field, value.into()));
        self
    }

    /// Builds a filter from field names (as they appear in the source
    /// header) to expected values.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::UnknownField`] if a key is not a record column.
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, RecordError> {
        let predicates = map
            .iter()
            .map(|(name, value)| {
                RecordField::from_str(name)
                    .map(|field| (field, value.clone()))
                    .map_err(|_| RecordError::UnknownField { name: name.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { predicates })
    }

    /// Returns `true` if the filter has no predicates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Returns `true` if every predicate holds for `record`.
    #[must_use]
    pub fn matches(&self, record: &BankRecord) -> bool {
        self.predicates
            .iter()
            .all(|(field, value)| record.field(*field) == value.as_str())
    }

    /// Returns the records that satisfy every predicate, in input order.
    #[must_use]
    pub fn apply<'a>(&self, records: &'a [BankRecord]) -> Vec<&'a BankRecord> {
        let matched: Vec<&BankRecord> = records.iter().filter(|r| self.matches(r)).collect();
        log::debug!("Filter [{self}] matched {}/{} records", matched.len(), records.len());
        matched
    }
}

impl fmt::Display for AttributeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.predicates.is_empty() {
            return write!(f, "all");
        }
        for (i, (field, value)) in self.predicates.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{field} = {value:?}")?;
        }
        Ok(())
    }
}
