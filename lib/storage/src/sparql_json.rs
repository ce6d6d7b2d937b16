//! SPARQL 1.1 Query Results JSON reader
//!
//! Each binding row becomes one [`RawRecord`]: the subject variable gives the
//! subject, every other bound variable becomes a property. Only the `value`
//! of a term is used; literals, IRIs and blank nodes all compare as text.

use anyhow::{Context, Result};
use serde::Deserialize;
use simthings_core::RawRecord;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{info, warn};

/// Default name of the variable that carries the resource subject
pub const DEFAULT_SUBJECT_VAR: &str = "s";

#[derive(Debug, Deserialize)]
struct ResultsDocument {
    results: Results,
}

#[derive(Debug, Deserialize)]
struct Results {
    #[serde(default)]
    bindings: Vec<HashMap<String, ResultTerm>>,
}

/// One RDF term in a result binding
#[derive(Debug, Clone, Deserialize)]
pub struct ResultTerm {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

impl ResultTerm {
    /// Subject form: blank nodes get their `_:` prefix back
    fn subject(&self) -> String {
        if self.kind == "bnode" && !self.value.starts_with("_:") {
            format!("_:{}", self.value)
        } else {
            self.value.clone()
        }
    }
}

/// Loads raw records from SPARQL JSON result documents
#[derive(Debug, Clone)]
pub struct SparqlJsonLoader {
    subject_var: String,
}

impl Default for SparqlJsonLoader {
    fn default() -> Self {
        Self::new(DEFAULT_SUBJECT_VAR)
    }
}

impl SparqlJsonLoader {
    pub fn new(subject_var: impl Into<String>) -> Self {
        Self {
            subject_var: subject_var.into(),
        }
    }

    pub fn subject_var(&self) -> &str {
        &self.subject_var
    }

    /// Parse one results document
    pub fn from_reader<R: Read>(&self, reader: R) -> Result<Vec<RawRecord>> {
        let document: ResultsDocument =
            serde_json::from_reader(reader).context("Invalid SPARQL JSON results document")?;

        let mut records = Vec::with_capacity(document.results.bindings.len());
        let mut unbound = 0usize;

        for binding in document.results.bindings {
            let Some(subject) = binding.get(&self.subject_var) else {
                unbound += 1;
                continue;
            };

            let mut record = RawRecord::new(subject.subject());
            for (var, term) in binding {
                if var != self.subject_var {
                    record.insert(var, term.value);
                }
            }
            records.push(record);
        }

        if unbound > 0 {
            warn!(
                "Skipped {} bindings without ?{} bound",
                unbound, self.subject_var
            );
        }

        Ok(records)
    }

    /// Parse a results file
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<RawRecord>> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open results file {}", path.display()))?;
        let records = self
            .from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to read results file {}", path.display()))?;
        info!("Read {} rows from {}", records.len(), path.display());
        Ok(records)
    }

    /// Parse several result files and concatenate their rows in order
    pub fn load_files<P: AsRef<Path>>(&self, paths: &[P]) -> Result<Vec<RawRecord>> {
        let mut records = Vec::new();
        for path in paths {
            records.extend(self.load_file(path)?);
        }
        Ok(records)
    }
}
