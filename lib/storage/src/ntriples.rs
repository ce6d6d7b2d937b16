//! N-Triples writer for neighbor lists
//!
//! Each resource with a neighbor list gets a node (an `rdf:Seq`) linked by
//! `similarThings`; the node's `rdf:_1`, `rdf:_2`, ... members are the
//! neighbors in rank order.

use crate::provenance::Provenance;
use anyhow::{bail, Context, Result};
use sha2::{Digest, Sha256};
use simthings_similarity::NeighborList;
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

pub const SIMILAR_THINGS: &str = "http://vocab.org/terms/similarThings";
pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";

/// Default node pattern: a blank node per resource
pub const DEFAULT_URI_PATTERN: &str = "_:%s";

/// A subject or object position in a triple
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Iri(String),
    Blank(String),
}

impl Term {
    /// `_:label` is a blank node, anything else an IRI
    pub fn parse(s: &str) -> Self {
        match s.strip_prefix("_:") {
            Some(label) => Term::Blank(blank_label(label)),
            None => Term::Iri(s.to_string()),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Iri(iri) => write!(f, "<{}>", escape_iri(iri)),
            Term::Blank(label) => write!(f, "_:{}", label),
        }
    }
}

/// Writes neighbor lists as N-Triples
#[derive(Debug, Clone)]
pub struct NTriplesWriter {
    uri_pattern: String,
}

impl Default for NTriplesWriter {
    fn default() -> Self {
        Self {
            uri_pattern: DEFAULT_URI_PATTERN.to_string(),
        }
    }
}

impl NTriplesWriter {
    /// `uri_pattern` must contain `%s`, replaced by a hash of the subject
    pub fn new(uri_pattern: impl Into<String>) -> Result<Self> {
        let uri_pattern = uri_pattern.into();
        if !uri_pattern.contains("%s") {
            bail!("URI pattern '{}' must contain %s", uri_pattern);
        }
        Ok(Self { uri_pattern })
    }

    /// Sequence node for a resource
    pub fn node_for(&self, subject: &str) -> Term {
        let digest = format!("{:x}", Sha256::digest(subject.as_bytes()));
        Term::parse(&self.uri_pattern.replacen("%s", &digest, 1))
    }

    pub fn write<W: Write>(
        &self,
        writer: &mut W,
        provenance: &Provenance,
        lists: &[NeighborList],
    ) -> Result<()> {
        for line in provenance.header_lines(lists.len()) {
            writeln!(writer, "# {}", line)?;
        }

        let similar_things = Term::Iri(SIMILAR_THINGS.to_string());
        let rdf_type = Term::Iri(format!("{}type", RDF_NS));
        let rdf_seq = Term::Iri(format!("{}Seq", RDF_NS));

        for list in lists {
            let resource = Term::parse(&list.subject);
            let node = self.node_for(&list.subject);

            writeln!(writer, "{} {} {} .", resource, similar_things, node)?;
            writeln!(writer, "{} {} {} .", node, rdf_type, rdf_seq)?;
            for (rank, neighbor) in list.subjects().enumerate() {
                writeln!(
                    writer,
                    "{} <{}_{}> {} .",
                    node,
                    RDF_NS,
                    rank + 1,
                    Term::parse(neighbor)
                )?;
            }
        }

        Ok(())
    }

    pub fn write_file<P: AsRef<Path>>(
        &self,
        path: P,
        provenance: &Provenance,
        lists: &[NeighborList],
    ) -> Result<()> {
        let path = path.as_ref();
        info!("Writing results to {}", path.display());

        let file = File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        self.write(&mut writer, provenance, lists)?;
        writer.flush()?;
        Ok(())
    }
}

/// Escape an IRI for the N-Triples IRIREF production
fn escape_iri(iri: &str) -> String {
    let mut escaped = String::with_capacity(iri.len());
    for c in iri.chars() {
        match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
                escaped.push_str(&format!("\\u{:04X}", c as u32))
            }
            c if (c as u32) <= 0x20 => escaped.push_str(&format!("\\u{:04X}", c as u32)),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Blank node label using only characters N-Triples accepts unquoted.
///
/// ASCII letters and digits pass through, as does `-` after the first
/// character. `_` doubles to `__` and anything else becomes `_u<hex>_`, so
/// distinct labels never collide. The empty label maps to `_e`.
fn blank_label(label: &str) -> String {
    if label.is_empty() {
        return "_e".to_string();
    }

    let mut encoded = String::with_capacity(label.len());
    for (i, c) in label.chars().enumerate() {
        match c {
            c if c.is_ascii_alphanumeric() => encoded.push(c),
            '-' if i > 0 => encoded.push(c),
            '_' => encoded.push_str("__"),
            c => encoded.push_str(&format!("_u{:x}_", c as u32)),
        }
    }
    encoded
}
