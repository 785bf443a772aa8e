//! Fuzzy field filters for exporting subsets of the store.

use crate::normalize::fuzzy_match;
use crate::types::ListingRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Errors raised while filtering an export.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// A non-empty filter kept no record.
    #[error("no listings found for filters: {0}")]
    NoMatch(ExportFilter),
}

/// Field name → value filter. Every entry must fuzzy-match for a record to pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportFilter {
    fields: BTreeMap<String, String>,
}

impl ExportFilter {
    /// Filter that keeps everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field filter. Empty values are ignored, so optional CLI flags
    /// can be passed straight through.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        if !value.trim().is_empty() {
            self.fields.insert(field.into(), value);
        }
        self
    }

    /// Add a field filter when `value` is present.
    #[must_use]
    pub fn with_opt(self, field: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.with(field, value),
            None => self,
        }
    }

    /// Whether no field filter is set.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Whether `record` passes every field filter.
    ///
    /// Filters naming a field the record doesn't have never match.
    pub fn matches(&self, record: &ListingRecord) -> bool {
        self.fields.iter().all(|(field, wanted)| {
            record
                .field_value(field)
                .is_some_and(|actual| fuzzy_match(&actual, wanted))
        })
    }

    /// Keep the records that pass. An empty filter keeps everything;
    /// zero survivors is reported as [`FilterError::NoMatch`].
    pub fn apply<T, I>(&self, records: I) -> Result<Vec<T>, FilterError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<ListingRecord>,
    {
        let kept: Vec<T> = records
            .into_iter()
            .filter(|r| self.matches(r.as_ref()))
            .collect();

        if kept.is_empty() {
            return Err(FilterError::NoMatch(self.clone()));
        }

        tracing::debug!(filters = %self, kept = kept.len(), "applied export filter");
        Ok(kept)
    }
}

impl AsRef<ListingRecord> for ListingRecord {
    fn as_ref(&self) -> &ListingRecord {
        self
    }
}

impl fmt::Display for ExportFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.fields.is_empty() {
            return write!(f, "{{}}");
        }
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|(k, v)| format!("{k}={v:?}"))
            .collect();
        write!(f, "{{{}}}", parts.join(", "))
    }
}
