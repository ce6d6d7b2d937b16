//! All-pairs distance computation
//!
//! Builds the full symmetric N×N distance matrix over a set of feature
//! vectors and ranks every row by ascending distance. This is the O(N²)
//! part of the pipeline; rows are independent, so the work is split across
//! rayon workers one row per task with no shared writes.

use ordered_float::OrderedFloat;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use simthings_core::{simd, Error, FeatureVector, Result};
use tracing::debug;

/// Coordinate-wise distance metric
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Sum of absolute coordinate differences
    #[default]
    Manhattan,
    /// Square root of the sum of squared coordinate differences
    Euclidean,
}

impl Metric {
    #[inline]
    pub fn distance(self, a: &[f64], b: &[f64]) -> f64 {
        match self {
            Metric::Manhattan => simd::manhattan_distance_simd(a, b),
            Metric::Euclidean => simd::l2_distance_simd(a, b),
        }
    }
}

impl std::str::FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "manhattan" | "l1" | "cityblock" => Ok(Metric::Manhattan),
            "euclidean" | "l2" => Ok(Metric::Euclidean),
            other => Err(Error::InvalidConfig(format!("unknown metric '{}'", other))),
        }
    }
}

/// Dense, row-major, symmetric N×N matrix with a zero diagonal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    n: usize,
    #[serde(default)]
    features: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Number of resources (rows)
    #[inline]
    pub fn len(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Feature count of the vectors the matrix was computed from
    #[inline]
    pub fn features(&self) -> usize {
        self.features
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.n + col]
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.n..(row + 1) * self.n]
    }

    /// Every cell, row-major
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Population standard deviation over all N² cells, diagonal included
    pub fn std_dev(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        let count = self.data.len() as f64;
        let mean = self.data.iter().sum::<f64>() / count;
        let variance = self
            .data
            .iter()
            .map(|d| {
                let delta = d - mean;
                delta * delta
            })
            .sum::<f64>()
            / count;
        variance.sqrt()
    }

    /// Exact symmetry and zero diagonal
    pub fn is_symmetric(&self) -> bool {
        (0..self.n).all(|i| {
            self.get(i, i) == 0.0 && (i + 1..self.n).all(|j| self.get(i, j) == self.get(j, i))
        })
    }
}

/// Per row, every row index ordered by ascending distance. Position 0 is the
/// row itself; ties among the others keep row-index order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NeighborRanking {
    rows: Vec<Vec<usize>>,
}

impl NeighborRanking {
    /// Ranking for one row, self first
    #[inline]
    pub fn row(&self, row: usize) -> &[usize] {
        &self.rows[row]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Computes distance matrices and rankings
#[derive(Debug, Clone, Copy)]
pub struct DistanceEngine {
    metric: Metric,
    parallel: bool,
}

impl Default for DistanceEngine {
    fn default() -> Self {
        Self {
            metric: Metric::Manhattan,
            parallel: true,
        }
    }
}

impl DistanceEngine {
    pub fn new(metric: Metric) -> Self {
        Self {
            metric,
            ..Self::default()
        }
    }

    /// Spread rows across the rayon pool
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Full pairwise distance matrix.
    ///
    /// Fails on an empty input, on vectors of differing length, and when the
    /// N² cells cannot be allocated.
    pub fn compute(&self, vectors: &[FeatureVector]) -> Result<DistanceMatrix> {
        let n = vectors.len();
        if n == 0 {
            return Err(Error::EmptyResourceSet);
        }

        let features = vectors[0].dim();
        if let Some(bad) = vectors.iter().find(|v| v.dim() != features) {
            return Err(Error::InvalidDimension {
                expected: features,
                actual: bad.dim(),
            });
        }

        let cells = n.checked_mul(n).ok_or(Error::MatrixTooLarge {
            resources: n,
            features,
        })?;
        let mut data: Vec<f64> = try_buffer(cells, n, features)?;
        data.resize(cells, 0.0);

        let metric = self.metric;
        let fill_row = |(i, row): (usize, &mut [f64])| {
            for (j, cell) in row.iter_mut().enumerate() {
                if i != j {
                    // Always evaluate the pair in (low, high) order so both
                    // halves of the matrix hold bit-identical values
                    let (lo, hi) = if i < j { (i, j) } else { (j, i) };
                    *cell = metric.distance(vectors[lo].as_slice(), vectors[hi].as_slice());
                }
            }
        };

        if self.parallel {
            data.par_chunks_mut(n).enumerate().for_each(fill_row);
        } else {
            data.chunks_mut(n).enumerate().for_each(fill_row);
        }

        debug!(resources = n, features, metric = ?metric, "computed distance matrix");

        Ok(DistanceMatrix { n, features, data })
    }

    /// Rank every row of `matrix` by ascending distance.
    ///
    /// The ranking holds another N² indices, so its rows are reserved
    /// fallibly like the matrix itself.
    pub fn rank(&self, matrix: &DistanceMatrix) -> Result<NeighborRanking> {
        let n = matrix.len();
        let features = matrix.features();

        let rank_row = |i: usize| -> Result<Vec<usize>> {
            let distances = matrix.row(i);
            let mut ranked: Vec<usize> = try_buffer(n, n, features)?;
            ranked.push(i);
            ranked.extend((0..n).filter(|&j| j != i));
            // stable: equal distances stay in row order
            ranked[1..].sort_by_key(|&j| OrderedFloat(distances[j]));
            Ok(ranked)
        };

        let rows = if self.parallel {
            (0..n).into_par_iter().map(rank_row).collect::<Result<Vec<_>>>()?
        } else {
            (0..n).map(rank_row).collect::<Result<Vec<_>>>()?
        };

        Ok(NeighborRanking { rows })
    }
}

/// Empty buffer with room for `len` items, or `MatrixTooLarge` when the
/// allocator refuses
fn try_buffer<T>(len: usize, resources: usize, features: usize) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| Error::MatrixTooLarge {
            resources,
            features,
        })?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vectors(rows: &[&[f64]]) -> Vec<FeatureVector> {
        rows.iter().map(|r| FeatureVector::new(r.to_vec())).collect()
    }

    #[test]
    fn test_manhattan_matrix() {
        let engine = DistanceEngine::new(Metric::Manhattan);
        let matrix = engine
            .compute(&vectors(&[&[0.0, 0.0], &[1.0, 2.0], &[-1.0, 0.5]]))
            .unwrap();

        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix.get(0, 1), 3.0);
        assert_eq!(matrix.get(0, 2), 1.5);
        assert_eq!(matrix.get(1, 2), 3.5);
        assert!(matrix.is_symmetric());
    }

    #[test]
    fn test_euclidean_matrix() {
        let engine = DistanceEngine::new(Metric::Euclidean);
        let matrix = engine.compute(&vectors(&[&[0.0, 0.0], &[3.0, 4.0]])).unwrap();
        assert!((matrix.get(0, 1) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_identical_vectors_have_zero_distance() {
        let engine = DistanceEngine::default();
        let matrix = engine.compute(&vectors(&[&[1.0, 2.0], &[1.0, 2.0]])).unwrap();
        assert_eq!(matrix.get(0, 1), 0.0);
        assert_eq!(matrix.get(1, 0), 0.0);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let input: Vec<FeatureVector> = (0..37)
            .map(|i| {
                FeatureVector::new(
                    (0..19).map(|j| ((i * 31 + j * 7) % 13) as f64 * 0.37 - 2.0).collect(),
                )
            })
            .collect();

        let parallel = DistanceEngine::default().compute(&input).unwrap();
        let sequential = DistanceEngine::default()
            .with_parallel(false)
            .compute(&input)
            .unwrap();

        assert_eq!(parallel, sequential);
        assert!(parallel.is_symmetric());
        assert!(parallel.as_slice().iter().all(|d| *d >= 0.0));
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let result = DistanceEngine::default().compute(&[]);
        assert!(matches!(result, Err(Error::EmptyResourceSet)));
    }

    #[test]
    fn test_dimension_mismatch_is_an_error() {
        let result = DistanceEngine::default().compute(&vectors(&[&[0.0, 0.0], &[1.0]]));
        assert!(matches!(
            result,
            Err(Error::InvalidDimension { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_ranking_puts_self_first_and_breaks_ties_by_row() {
        let engine = DistanceEngine::default();
        // rows 0 and 2 are identical, row 1 is equidistant from 3 and 0
        let matrix = engine
            .compute(&vectors(&[&[0.0], &[5.0], &[0.0], &[10.0]]))
            .unwrap();
        let ranking = engine.rank(&matrix).unwrap();

        assert_eq!(ranking.len(), 4);
        assert_eq!(ranking.row(0), &[0, 2, 1, 3]);
        assert_eq!(ranking.row(2), &[2, 0, 1, 3]);
        assert_eq!(ranking.row(1), &[1, 0, 2, 3]);
        assert_eq!(ranking.row(3), &[3, 1, 0, 2]);
    }

    #[test]
    fn test_matrix_remembers_feature_count() {
        let matrix = DistanceEngine::default()
            .compute(&vectors(&[&[0.0, 1.0, 2.0], &[1.0, 1.0, 1.0]]))
            .unwrap();
        assert_eq!(matrix.features(), 3);
    }

    #[test]
    fn test_refused_buffer_reports_counts() {
        let result = try_buffer::<usize>(usize::MAX / 2, 70_000, 12);
        assert!(matches!(
            result,
            Err(Error::MatrixTooLarge { resources: 70_000, features: 12 })
        ));
    }

    #[test]
    fn test_sequential_ranking_matches_parallel() {
        let matrix = DistanceEngine::default()
            .compute(&vectors(&[&[3.0], &[1.0], &[4.0], &[1.0], &[5.0]]))
            .unwrap();
        let parallel = DistanceEngine::default().rank(&matrix).unwrap();
        let sequential = DistanceEngine::default()
            .with_parallel(false)
            .rank(&matrix)
            .unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_std_dev_includes_diagonal() {
        let engine = DistanceEngine::default();
        let matrix = engine.compute(&vectors(&[&[0.0], &[2.0]])).unwrap();
        // cells: 0, 2, 2, 0 -> mean 1, variance 1
        assert!((matrix.std_dev() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_metric_from_str() {
        assert_eq!("manhattan".parse::<Metric>().unwrap(), Metric::Manhattan);
        assert_eq!("L2".parse::<Metric>().unwrap(), Metric::Euclidean);
        assert!("cosine".parse::<Metric>().is_err());
    }
}
