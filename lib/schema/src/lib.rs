//! # simthings Schema
//!
//! Feature engineering for sparse resource records.
//!
//! 1. [`PropertyAnalyzer`] scans every record and classifies each property as
//!    numeric (every observed value parses as a real number) or categorical.
//! 2. [`FeatureSchema`] assigns feature slots: one per numeric property, one
//!    per distinct value of a categorical property. Numeric slots carry the
//!    median and mean absolute deviation used for normalization.
//! 3. [`FeatureVectorAssembler`] builds a dense vector per distinct subject.
//!
//! ```rust
//! use simthings_core::RawRecord;
//! use simthings_schema::{FeatureSchema, FeatureVectorAssembler, PropertyAnalyzer};
//!
//! let records = vec![
//!     RawRecord::new("a").with_property("size", "1").with_property("color", "red"),
//!     RawRecord::new("b").with_property("size", "2").with_property("color", "blue"),
//!     RawRecord::new("c").with_property("size", "3").with_property("color", "red"),
//! ];
//!
//! let summaries = PropertyAnalyzer::new().analyze(&records);
//! let schema = FeatureSchema::build(&summaries, None);
//! assert_eq!(schema.feature_count(), 3);
//!
//! let mut assembler = FeatureVectorAssembler::new(&schema);
//! assembler.add_all(&records).unwrap();
//! let features = assembler.finish();
//! assert_eq!(features.vectors.len(), 3);
//! ```
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Records   │────>│  Analyzer   │────>│   Schema    │
//! │ (raw values)│     │ (summaries) │     │   (slots)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!       │                                        │
//!       │              ┌─────────────┐           │
//!       └─────────────>│  Assembler  │<──────────┘
//!                      │ (vectors)   │
//!                      └─────────────┘
//! ```

pub mod analyzer;
pub mod assembler;
pub mod schema;

// Re-export main types
pub use analyzer::{parse_numeric, PropertyAnalyzer, PropertyMap, PropertySummary};
pub use assembler::{AssembledFeatures, FeatureVectorAssembler};
pub use schema::{
    CategoricalSlots,
    FeatureSchema,
    NumericStats,
    PropertyEncoding,
    PropertyFeature,
    SchemaError,
    WeightOverride,
    WeightOverrides,
};
