//! # simthings Storage
//!
//! Everything that touches files: reading SPARQL JSON results, caching the
//! parsed records, and writing the feature table (ARFF) and neighbor lists
//! (N-Triples).

pub mod arff;
pub mod cache;
pub mod ntriples;
pub mod provenance;
pub mod sparql_json;

pub use arff::{write_arff, write_arff_file};
pub use cache::RecordCache;
pub use ntriples::{NTriplesWriter, Term, DEFAULT_URI_PATTERN, SIMILAR_THINGS};
pub use provenance::Provenance;
pub use sparql_json::{SparqlJsonLoader, DEFAULT_SUBJECT_VAR};
