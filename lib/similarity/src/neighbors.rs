//! Variance-gated neighbor selection
//!
//! Each resource keeps at most `K` neighbors. Walking its ranking from the
//! closest non-self entry, selection stops at the first neighbor whose
//! distance exceeds `base + tolerance`, where `base` is the closest
//! neighbor's distance and `tolerance` defaults to the population standard
//! deviation of the whole distance matrix.

use crate::distance::{DistanceMatrix, NeighborRanking};
use serde::Serialize;
use simthings_core::ResourceIndex;

/// Default maximum neighbor count
pub const DEFAULT_MAX_NEIGHBORS: usize = 10;

/// One admitted neighbor of a row
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    pub row: usize,
    pub distance: f64,
}

/// A resource's bounded neighbor list, resolved to subjects
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighborList {
    pub subject: String,
    pub row: usize,
    pub neighbors: Vec<NamedNeighbor>,
}

/// Neighbor with its subject identifier, in rank order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedNeighbor {
    pub subject: String,
    pub distance: f64,
}

impl NeighborList {
    /// Attach subjects from the resource index
    pub fn resolve(row: usize, neighbors: &[Neighbor], index: &ResourceIndex) -> Self {
        Self {
            subject: index.subject(row).unwrap_or_default().to_string(),
            row,
            neighbors: neighbors
                .iter()
                .map(|n| NamedNeighbor {
                    subject: index.subject(n.row).unwrap_or_default().to_string(),
                    distance: n.distance,
                })
                .collect(),
        }
    }

    /// Neighbor subjects in rank order
    pub fn subjects(&self) -> impl Iterator<Item = &str> {
        self.neighbors.iter().map(|n| n.subject.as_str())
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}

/// Truncates rankings to bounded neighbor lists
#[derive(Debug, Clone, Copy)]
pub struct NeighborSelector {
    max_neighbors: usize,
}

impl Default for NeighborSelector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NEIGHBORS)
    }
}

impl NeighborSelector {
    pub fn new(max_neighbors: usize) -> Self {
        Self { max_neighbors }
    }

    pub fn max_neighbors(&self) -> usize {
        self.max_neighbors
    }

    /// Select neighbors for every row, gated by the matrix's standard deviation
    pub fn select(&self, matrix: &DistanceMatrix, ranking: &NeighborRanking) -> Vec<Vec<Neighbor>> {
        self.select_with_tolerance(matrix, ranking, matrix.std_dev())
    }

    /// Select neighbors for every row with an explicit tolerance above the
    /// closest-neighbor distance
    pub fn select_with_tolerance(
        &self,
        matrix: &DistanceMatrix,
        ranking: &NeighborRanking,
        tolerance: f64,
    ) -> Vec<Vec<Neighbor>> {
        (0..matrix.len())
            .map(|row| self.select_row(matrix, ranking.row(row), row, tolerance))
            .collect()
    }

    fn select_row(
        &self,
        matrix: &DistanceMatrix,
        ranked: &[usize],
        row: usize,
        tolerance: f64,
    ) -> Vec<Neighbor> {
        let limit = self.max_neighbors.min(matrix.len().saturating_sub(1));
        if limit == 0 {
            return Vec::new();
        }

        let cutoff = matrix.get(row, ranked[1]) + tolerance;
        let mut selected = Vec::with_capacity(limit);

        for &other in &ranked[1..=limit] {
            let distance = matrix.get(row, other);
            // hard stop, later entries are never reconsidered
            if distance > cutoff {
                break;
            }
            selected.push(Neighbor { row: other, distance });
        }

        selected
    }
}

/// Summary statistics over a set of neighbor lists
#[derive(Debug, Clone, Serialize)]
pub struct NeighborStats {
    /// Number of resources
    pub resources: usize,
    /// Total admitted neighbors
    pub neighbors: usize,
    /// Average list length
    pub avg_neighbors: f64,
    /// Resources with no admitted neighbor
    pub isolated: usize,
    /// Smallest nearest-neighbor distance, if any
    pub closest_distance: Option<f64>,
}

impl NeighborStats {
    pub fn compute(lists: &[NeighborList]) -> Self {
        let neighbors: usize = lists.iter().map(NeighborList::len).sum();
        let closest_distance = lists
            .iter()
            .filter_map(|l| l.neighbors.first().map(|n| n.distance))
            .min_by(f64::total_cmp);

        Self {
            resources: lists.len(),
            neighbors,
            avg_neighbors: if lists.is_empty() {
                0.0
            } else {
                neighbors as f64 / lists.len() as f64
            },
            isolated: lists.iter().filter(|l| l.is_empty()).count(),
            closest_distance,
        }
    }
}
