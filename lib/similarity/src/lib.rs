//! # simthings Similarity
//!
//! Exact all-pairs nearest neighbors over assembled feature vectors.
//!
//! - [`DistanceEngine`] builds the full symmetric distance matrix
//!   (Manhattan by default) and ranks every row
//! - [`NeighborSelector`] bounds each ranking to at most `K` neighbors,
//!   stopping at the first one further than the closest neighbor plus the
//!   matrix-wide standard deviation
//! - [`Pipeline`] chains analysis, schema, assembly, distances and selection
//!
//! ## Example
//!
//! ```rust
//! use simthings_core::RawRecord;
//! use simthings_similarity::{Pipeline, PipelineConfig};
//!
//! let records = vec![
//!     RawRecord::new("a").with_property("size", "1"),
//!     RawRecord::new("b").with_property("size", "2"),
//!     RawRecord::new("c").with_property("size", "9"),
//! ];
//!
//! let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
//! let output = pipeline.run(&records).unwrap();
//! let of_a: Vec<_> = output.neighbors_of("a").unwrap().subjects().collect();
//! assert_eq!(of_a.first(), Some(&"b"));
//! ```
//!
//! ## Cost
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  N vectors  │────>│  N×N matrix │────>│  rankings   │
//! │ (F features)│     │ O(N²·F) time│     │ O(N² log N) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                                                │
//!                                         ┌──────┴──────┐
//!                                         │  ≤ K per    │
//!                                         │  resource   │
//!                                         └─────────────┘
//! ```
//!
//! The whole matrix lives in memory: 8·N² bytes for the distances plus the
//! rankings. That is the practical limit on resource count.

pub mod distance;
pub mod neighbors;
pub mod pipeline;

// Re-export main types for convenience
pub use distance::{DistanceEngine, DistanceMatrix, Metric, NeighborRanking};
pub use neighbors::{
    NamedNeighbor, Neighbor, NeighborList, NeighborSelector, NeighborStats, DEFAULT_MAX_NEIGHBORS,
};
pub use pipeline::{Pipeline, PipelineConfig, PipelineOutput};
