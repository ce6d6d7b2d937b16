//! Provenance for generated outputs
//!
//! A run is identified by a hash of its dataset and inputs; the same id
//! names the record cache and the tabular output.

use crate::sparql_json::DEFAULT_SUBJECT_VAR;
use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use simthings_schema::WeightOverrides;

/// Describes where a result set came from
#[derive(Debug, Clone)]
pub struct Provenance {
    pub generator: String,
    pub dataset: String,
    pub inputs: Vec<String>,
    /// Result variable the records were keyed on
    pub subject_var: String,
    pub weights: Option<String>,
    pub created: DateTime<Utc>,
}

impl Provenance {
    pub fn new(dataset: impl Into<String>, inputs: Vec<String>) -> Self {
        Self {
            generator: format!("simthings {}", env!("CARGO_PKG_VERSION")),
            dataset: dataset.into(),
            inputs,
            subject_var: DEFAULT_SUBJECT_VAR.to_string(),
            weights: None,
            created: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_subject_var(mut self, subject_var: impl Into<String>) -> Self {
        self.subject_var = subject_var.into();
        self
    }

    #[must_use]
    pub fn with_weights(mut self, weights: &WeightOverrides) -> Self {
        self.weights = (!weights.is_empty()).then(|| weights.to_string());
        self
    }

    /// Stable id for this dataset, input list and subject variable
    pub fn source_id(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.dataset.as_bytes());
        hasher.update(b"\t");
        hasher.update(self.inputs.join("\t").as_bytes());
        hasher.update(b"\n?");
        hasher.update(self.subject_var.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Comment body lines, without the format's comment marker
    pub fn header_lines(&self, resource_count: usize) -> Vec<String> {
        let mut lines = vec![
            format!("Similar resources generated by {}", self.generator),
            format!(
                "Date: {}",
                self.created.to_rfc3339_opts(SecondsFormat::Secs, true)
            ),
            format!("Source dataset: {}", self.dataset),
        ];
        lines.extend(self.inputs.iter().map(|input| format!("Input: {}", input)));
        lines.push(format!("Found {} distinct resources", resource_count));
        if let Some(weights) = &self.weights {
            lines.push(format!("Weights: {}", weights));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_is_stable_and_input_sensitive() {
        let a = Provenance::new("books", vec!["q1.json".to_string()]);
        let b = Provenance::new("books", vec!["q1.json".to_string()]);
        let c = Provenance::new("books", vec!["q2.json".to_string()]);

        assert_eq!(a.source_id(), b.source_id());
        assert_ne!(a.source_id(), c.source_id());
        assert_eq!(a.source_id().len(), 64);
    }

    #[test]
    fn test_source_id_depends_on_subject_var() {
        let inputs = vec!["q1.json".to_string()];
        let default = Provenance::new("books", inputs.clone());
        let explicit = Provenance::new("books", inputs.clone()).with_subject_var("s");
        let other = Provenance::new("books", inputs).with_subject_var("book");

        assert_eq!(default.source_id(), explicit.source_id());
        assert_ne!(default.source_id(), other.source_id());
    }

    #[test]
    fn test_header_lines() {
        let weights = WeightOverrides::parse_all(["p1=5"]).unwrap();
        let provenance = Provenance::new("books", vec!["q1.json".to_string()]).with_weights(&weights);
        let lines = provenance.header_lines(42);

        assert!(lines[0].starts_with("Similar resources generated by simthings"));
        assert!(lines[1].starts_with("Date: "));
        assert_eq!(lines[2], "Source dataset: books");
        assert_eq!(lines[3], "Input: q1.json");
        assert_eq!(lines[4], "Found 42 distinct resources");
        assert_eq!(lines[5], "Weights: p1=5");
    }

    #[test]
    fn test_no_weights_line_without_overrides() {
        let provenance = Provenance::new("d", vec![]).with_weights(&WeightOverrides::new());
        assert!(provenance
            .header_lines(1)
            .iter()
            .all(|l| !l.starts_with("Weights")));
    }
}
