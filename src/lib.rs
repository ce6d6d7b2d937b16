//! # simthings
//!
//! Finds similar things among sparsely described resources.
//!
//! Each resource is a subject plus a handful of property values. simthings
//! classifies every property as numeric or categorical, turns each resource
//! into a dense feature vector, computes the exact all-pairs distance matrix,
//! and keeps for every resource a short, variance-gated list of its nearest
//! neighbors.
//!
//! ## Quick Start
//!
//! ### As a Command
//!
//! ```bash
//! simthings --dataset books --input results.json --file similar.nt -w p1=5
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use simthings::prelude::*;
//!
//! let records = vec![
//!     RawRecord::new("http://example.com/a").with_property("pages", "120").with_property("genre", "crime"),
//!     RawRecord::new("http://example.com/b").with_property("pages", "130").with_property("genre", "crime"),
//!     RawRecord::new("http://example.com/c").with_property("pages", "900").with_property("genre", "history"),
//! ];
//!
//! let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
//! let output = pipeline.run(&records).unwrap();
//!
//! let similar: Vec<_> = output.neighbors_of("http://example.com/a").unwrap().subjects().collect();
//! assert_eq!(similar[0], "http://example.com/b");
//! ```
//!
//! ## Crate Structure
//!
//! - [`simthings-core`](https://docs.rs/simthings-core) - records, feature vectors, distance kernels
//! - [`simthings-schema`](https://docs.rs/simthings-schema) - property analysis, feature schema, vector assembly
//! - [`simthings-similarity`](https://docs.rs/simthings-similarity) - distance matrix, neighbor selection, pipeline
//! - [`simthings-storage`](https://docs.rs/simthings-storage) - SPARQL JSON input, cache, ARFF and N-Triples output

// Re-export core types
pub use simthings_core::{Error, FeatureVector, RawRecord, ResourceIndex, Result};

// Re-export schema
pub use simthings_schema::{
    FeatureSchema, FeatureVectorAssembler, PropertyAnalyzer, PropertyEncoding, PropertySummary,
    WeightOverrides,
};

// Re-export similarity
pub use simthings_similarity::{
    DistanceEngine, DistanceMatrix, Metric, NeighborList, NeighborRanking, NeighborSelector,
    NeighborStats, Pipeline, PipelineConfig, PipelineOutput,
};

// Re-export storage
pub use simthings_storage::{NTriplesWriter, Provenance, RecordCache, SparqlJsonLoader};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        DistanceEngine, DistanceMatrix, Error, FeatureSchema, FeatureVector,
        FeatureVectorAssembler, Metric, NeighborList, NeighborSelector, Pipeline,
        PipelineConfig, PipelineOutput, PropertyAnalyzer, RawRecord, ResourceIndex, Result,
        WeightOverrides,
    };
}

/// SIMD-optimized distance kernels
pub mod simd {
    pub use simthings_core::simd::{l2_distance_simd, manhattan_distance_simd};
}
