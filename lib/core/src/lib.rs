//! # simthings Core
//!
//! Core types shared by the simthings crates.
//!
//! - [`RawRecord`] - one resource's observed property values
//! - [`FeatureVector`] - dense numeric representation of a resource
//! - [`ResourceIndex`] - subject <-> row table
//! - [`simd`] - coordinate-wise distance kernels
//!
//! ## Example
//!
//! ```rust
//! use simthings_core::{FeatureVector, RawRecord, ResourceIndex};
//!
//! let record = RawRecord::new("http://example.com/a").with_property("size", "3");
//! assert_eq!(record.get("size"), Some("3"));
//!
//! let mut index = ResourceIndex::new();
//! let (row, fresh) = index.get_or_insert(&record.subject);
//! assert_eq!((row, fresh), (0, true));
//!
//! let a = FeatureVector::new(vec![0.0, 1.0]);
//! let b = FeatureVector::new(vec![2.0, -1.0]);
//! assert_eq!(a.manhattan_distance(&b).unwrap(), 4.0);
//! ```

pub mod error;
pub mod index;
pub mod record;
pub mod vector;

/// SIMD-optimized distance kernels
///
/// - AVX2 on x86_64
/// - NEON on ARM64/Apple Silicon
/// - scalar fallback elsewhere
pub mod simd;

pub use error::{Error, Result};
pub use index::ResourceIndex;
pub use record::RawRecord;
pub use vector::FeatureVector;
