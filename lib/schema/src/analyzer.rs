//! Property analysis
//!
//! A single pass over every record collects the observed values of each
//! property and decides, globally, whether the property is numeric.

use serde::{Deserialize, Serialize};
use simthings_core::RawRecord;
use std::collections::BTreeMap;
use tracing::debug;

/// Summaries keyed by property name, in name order
pub type PropertyMap = BTreeMap<String, PropertySummary>;

/// Everything observed about one property across the record set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySummary {
    /// True iff every observed value parses as a finite real number
    pub is_numeric: bool,

    /// Weight applied to the property's feature slots (default 1.0)
    #[serde(default = "default_weight")]
    pub weight: f64,

    /// Raw observed values, one per record that bound the property
    pub values: Vec<String>,
}

fn default_weight() -> f64 {
    1.0
}

impl PropertySummary {
    fn new() -> Self {
        Self {
            is_numeric: true,
            weight: default_weight(),
            values: Vec::new(),
        }
    }

    fn observe(&mut self, value: &str) {
        // One non-numeric value anywhere demotes the property for good
        if self.is_numeric && parse_numeric(value).is_none() {
            self.is_numeric = false;
        }
        self.values.push(value.to_string());
    }

    /// Observed values parsed as numbers. Empty for categorical properties.
    pub fn numeric_values(&self) -> Vec<f64> {
        if !self.is_numeric {
            return Vec::new();
        }
        self.values.iter().filter_map(|v| parse_numeric(v)).collect()
    }
}

/// Parse a raw value as a real number.
///
/// Surrounding whitespace is ignored. `NaN` and infinities are rejected so
/// they classify the property as categorical instead of poisoning the median.
pub fn parse_numeric(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Scans raw records and classifies their properties
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyAnalyzer;

impl PropertyAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Build one summary per property observed in at least one record
    pub fn analyze(&self, records: &[RawRecord]) -> PropertyMap {
        let mut summaries = PropertyMap::new();

        for record in records {
            for (name, value) in record.properties() {
                summaries
                    .entry(name.to_string())
                    .or_insert_with(PropertySummary::new)
                    .observe(value);
            }
        }

        debug!(
            records = records.len(),
            properties = summaries.len(),
            numeric = summaries.values().filter(|s| s.is_numeric).count(),
            "analyzed properties"
        );

        summaries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(subject: &str, props: &[(&str, &str)]) -> RawRecord {
        props
            .iter()
            .fold(RawRecord::new(subject), |r, (k, v)| r.with_property(*k, *v))
    }

    #[test]
    fn test_parse_numeric() {
        assert_eq!(parse_numeric("3"), Some(3.0));
        assert_eq!(parse_numeric(" -2.5e1 "), Some(-25.0));
        assert_eq!(parse_numeric("red"), None);
        assert_eq!(parse_numeric("NaN"), None);
        assert_eq!(parse_numeric("inf"), None);
        assert_eq!(parse_numeric(""), None);
    }

    #[test]
    fn test_all_numeric_values_classify_numeric() {
        let records = vec![
            record("a", &[("size", "1")]),
            record("b", &[("size", "2.5")]),
        ];
        let summaries = PropertyAnalyzer::new().analyze(&records);

        let size = &summaries["size"];
        assert!(size.is_numeric);
        assert_eq!(size.values, vec!["1", "2.5"]);
        assert_eq!(size.numeric_values(), vec![1.0, 2.5]);
        assert_eq!(size.weight, 1.0);
    }

    #[test]
    fn test_single_non_numeric_value_demotes_globally() {
        let records = vec![
            record("a", &[("year", "1999")]),
            record("b", &[("year", "unknown")]),
            record("c", &[("year", "2001")]),
        ];
        let summaries = PropertyAnalyzer::new().analyze(&records);

        let year = &summaries["year"];
        assert!(!year.is_numeric);
        assert_eq!(year.values.len(), 3);
        assert!(year.numeric_values().is_empty());
    }

    #[test]
    fn test_missing_values_are_absent_not_errors() {
        let records = vec![
            record("a", &[("color", "red")]),
            record("b", &[]),
            record("c", &[("size", "4")]),
        ];
        let summaries = PropertyAnalyzer::new().analyze(&records);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries["color"].values, vec!["red"]);
        assert_eq!(summaries["size"].values, vec!["4"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(PropertyAnalyzer::new().analyze(&[]).is_empty());
    }
}
