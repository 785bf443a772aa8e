//! Shared types used across the listing miner.
//!
//! This module defines the listing record produced by extraction, the
//! natural key used to reconcile it against the store, and the validated
//! name under which marketplace sources are registered.

use crate::error::MinerError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Sentinel stored for city and neighborhood when the location text cannot be split.
pub const UNKNOWN_LOCATION: &str = "N/A";

/// Newtype for marketplace source names with validation.
///
/// Source names are lowercase alphanumeric with hyphens, 2-30 characters.
/// Construction lowercases the input so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceName(String);

impl SourceName {
    /// Create a new `SourceName` from a string.
    ///
    /// # Errors
    /// Returns error if the lowercased name doesn't match the required format.
    pub fn new(name: impl Into<String>) -> Result<Self, MinerError> {
        let name = name.into().trim().to_lowercase();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Get the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(name: &str) -> Result<(), MinerError> {
        static SOURCE_REGEX: OnceLock<Regex> = OnceLock::new();
        let regex = SOURCE_REGEX
            .get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9-]{0,28}[a-z0-9]$").expect("valid regex"));

        if regex.is_match(name) {
            Ok(())
        } else {
            Err(MinerError::Validation(format!(
                "invalid source name: must be 2-30 lowercase alphanumeric characters or hyphens, got '{name}'"
            )))
        }
    }
}

impl fmt::Display for SourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One marketplace listing extracted from a rendered page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    /// Ad headline, diacritics stripped
    pub title: String,
    /// Listing kind as used by the marketplace URL (e.g. "venda", "aluguel")
    pub kind: String,
    /// Asking price; comma is the decimal separator on the source site
    pub price: f64,
    /// City, diacritics stripped
    pub city: String,
    /// Neighborhood, diacritics stripped
    pub neighborhood: String,
    /// Number of bedrooms
    pub bedroom_count: u32,
    /// Number of parking spaces
    pub parking_count: u32,
    /// Number of bathrooms
    pub bathroom_count: u32,
    /// Area in square meters, best-effort
    pub area_sqm: u32,
    /// Canonical URL of the ad
    pub link: String,
}

impl ListingRecord {
    /// Names accepted by [`ListingRecord::field_value`].
    pub const FIELD_NAMES: [&'static str; 10] = [
        "title",
        "kind",
        "price",
        "city",
        "neighborhood",
        "bedroom_count",
        "parking_count",
        "bathroom_count",
        "area_sqm",
        "link",
    ];

    /// Natural identity of this record.
    #[must_use]
    pub fn dedup_key(&self) -> DedupKey<'_> {
        DedupKey {
            city: &self.city,
            neighborhood: &self.neighborhood,
            title: &self.title,
            bedroom_count: self.bedroom_count,
            parking_count: self.parking_count,
            bathroom_count: self.bathroom_count,
            kind: &self.kind,
        }
    }

    /// String view of a field by name, `None` for unknown names.
    #[must_use]
    pub fn field_value(&self, field: &str) -> Option<String> {
        let value = match field {
            "title" => self.title.clone(),
            "kind" => self.kind.clone(),
            "price" => self.price.to_string(),
            "city" => self.city.clone(),
            "neighborhood" => self.neighborhood.clone(),
            "bedroom_count" => self.bedroom_count.to_string(),
            "parking_count" => self.parking_count.to_string(),
            "bathroom_count" => self.bathroom_count.to_string(),
            "area_sqm" => self.area_sqm.to_string(),
            "link" => self.link.clone(),
            _ => return None,
        };
        Some(value)
    }
}

/// Composite natural key deciding insert vs. update.
///
/// Compared by exact, case-sensitive equality. Price and link are not part
/// of the key, so two ads differing only in those are the same entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub struct DedupKey<'a> {
    pub city: &'a str,
    pub neighborhood: &'a str,
    pub title: &'a str,
    pub bedroom_count: u32,
    pub parking_count: u32,
    pub bathroom_count: u32,
    pub kind: &'a str,
}

impl fmt::Display for DedupKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{} ({}q {}v {}b, {})",
            self.city,
            self.neighborhood,
            self.title,
            self.bedroom_count,
            self.parking_count,
            self.bathroom_count,
            self.kind
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ListingRecord {
        ListingRecord {
            title: "Apartamento".to_string(),
            kind: "venda".to_string(),
            price: 250_000.0,
            city: "Sao Paulo".to_string(),
            neighborhood: "Vila Mariana".to_string(),
            bedroom_count: 3,
            parking_count: 2,
            bathroom_count: 0,
            area_sqm: 70,
            link: "https://sp.olx.com.br/imoveis/1".to_string(),
        }
    }

    #[test]
    fn test_source_name_valid() {
        for name in ["olx", "zap-imoveis", "OLX", " vivareal "] {
            assert!(SourceName::new(name).is_ok(), "Failed for: {name}");
        }
        assert_eq!(SourceName::new("OLX").expect("valid").as_str(), "olx");
    }

    #[test]
    fn test_source_name_invalid() {
        let too_long = "a".repeat(31);
        for name in ["", "x", "-olx", "olx-", "olx imoveis", "olx_br", too_long.as_str()] {
            assert!(SourceName::new(name).is_err(), "Should fail for: {name}");
        }
    }

    #[test]
    fn test_dedup_key_ignores_price_and_link() {
        let a = sample();
        let mut b = sample();
        b.price = 1.0;
        b.link = "https://elsewhere".to_string();
        b.area_sqm = 999;
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_dedup_key_is_case_sensitive() {
        let a = sample();
        let mut b = sample();
        b.city = "sao paulo".to_string();
        assert_ne!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_field_value() {
        let record = sample();
        assert_eq!(record.field_value("city").as_deref(), Some("Sao Paulo"));
        assert_eq!(record.field_value("bedroom_count").as_deref(), Some("3"));
        assert_eq!(record.field_value("price").as_deref(), Some("250000"));
        assert!(record.field_value("address").is_none());

        for name in ListingRecord::FIELD_NAMES {
            assert!(record.field_value(name).is_some(), "missing field {name}");
        }
    }

    #[test]
    fn test_record_serialization() {
        let record = sample();
        let json = serde_json::to_string(&record).expect("serialize record");
        assert!(json.contains("\"neighborhood\":\"Vila Mariana\""));

        let parsed: ListingRecord = serde_json::from_str(&json).expect("deserialize record");
        assert_eq!(parsed, record);
    }
}
