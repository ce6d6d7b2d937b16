use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Dense feature vector, one per resource
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FeatureVector {
    data: Vec<f64>,
}

impl FeatureVector {
    #[inline]
    #[must_use]
    pub fn new(data: Vec<f64>) -> Self {
        Self { data }
    }

    /// All-zero vector of the given length
    #[inline]
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self {
            data: vec![0.0; dim],
        }
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    #[inline]
    pub fn get(&self, slot: usize) -> Option<f64> {
        self.data.get(slot).copied()
    }

    /// Write one slot
    #[inline]
    pub fn set(&mut self, slot: usize, value: f64) -> Result<()> {
        let feature_count = self.data.len();
        match self.data.get_mut(slot) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::SlotOutOfRange { slot, feature_count }),
        }
    }

    /// Number of populated (non-zero) slots
    pub fn nonzero_count(&self) -> usize {
        self.data.iter().filter(|v| **v != 0.0).count()
    }

    /// Compute Manhattan (L1) distance
    /// Uses SIMD-optimized absolute difference accumulation
    #[inline]
    pub fn manhattan_distance(&self, other: &FeatureVector) -> Result<f64> {
        self.check_dim(other)?;
        Ok(crate::simd::manhattan_distance_simd(&self.data, &other.data))
    }

    /// Compute Euclidean (L2) distance
    #[inline]
    pub fn euclidean_distance(&self, other: &FeatureVector) -> Result<f64> {
        self.check_dim(other)?;
        Ok(crate::simd::l2_distance_simd(&self.data, &other.data))
    }

    #[inline]
    fn check_dim(&self, other: &FeatureVector) -> Result<()> {
        if self.dim() != other.dim() {
            return Err(Error::InvalidDimension {
                expected: self.dim(),
                actual: other.dim(),
            });
        }
        Ok(())
    }
}

impl From<Vec<f64>> for FeatureVector {
    fn from(data: Vec<f64>) -> Self {
        Self::new(data)
    }
}
