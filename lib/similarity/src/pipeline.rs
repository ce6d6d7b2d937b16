//! End-to-end similarity pipeline
//!
//! Runs the stages strictly in sequence, each one consuming the complete
//! output of the previous:
//! analyze -> schema -> assemble -> distances -> ranking -> neighbor selection.
//! Everything, including the N×N matrix, is held in memory at once.

use crate::distance::{DistanceEngine, DistanceMatrix, Metric, NeighborRanking};
use crate::neighbors::{NeighborList, NeighborSelector, DEFAULT_MAX_NEIGHBORS};
use serde::{Deserialize, Serialize};
use simthings_core::{Error, FeatureVector, RawRecord, ResourceIndex, Result};
use simthings_schema::{FeatureSchema, FeatureVectorAssembler, PropertyAnalyzer, WeightOverrides};
use tracing::info;

/// Configuration for a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Maximum neighbors kept per resource
    #[serde(default = "default_max_neighbors")]
    pub max_neighbors: usize,

    #[serde(default)]
    pub metric: Metric,

    /// Per-property weight overrides
    #[serde(default)]
    pub weights: WeightOverrides,

    /// Apply property weights to normalized numeric scores too
    #[serde(default)]
    pub weight_numeric: bool,

    /// Compute distance rows on the rayon pool
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_max_neighbors() -> usize {
    DEFAULT_MAX_NEIGHBORS
}

fn default_parallel() -> bool {
    true
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_neighbors: DEFAULT_MAX_NEIGHBORS,
            metric: Metric::Manhattan,
            weights: WeightOverrides::new(),
            weight_numeric: false,
            parallel: true,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_neighbors == 0 {
            return Err(Error::InvalidConfig(
                "max_neighbors must be at least 1".to_string(),
            ));
        }
        self.weights
            .validate()
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

/// Everything a pipeline run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub schema: FeatureSchema,
    pub index: ResourceIndex,
    /// Feature vectors in row order
    pub vectors: Vec<FeatureVector>,
    pub matrix: DistanceMatrix,
    pub ranking: NeighborRanking,
    /// Standard deviation of the distance matrix, the selection tolerance
    pub std_dev: f64,
    /// Neighbor lists in row order
    pub neighbors: Vec<NeighborList>,
}

impl PipelineOutput {
    /// Number of distinct resources
    pub fn resource_count(&self) -> usize {
        self.index.len()
    }

    /// (subject, feature vector) pairs in row order
    pub fn rows(&self) -> impl Iterator<Item = (&str, &FeatureVector)> {
        self.index.subjects().iter().map(String::as_str).zip(self.vectors.iter())
    }

    /// Neighbor list for a subject
    pub fn neighbors_of(&self, subject: &str) -> Option<&NeighborList> {
        self.index.row(subject).and_then(|row| self.neighbors.get(row))
    }
}

/// Similarity pipeline over raw records
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn run(&self, records: &[RawRecord]) -> Result<PipelineOutput> {
        info!("Read {} rows of data in total", records.len());

        let summaries = PropertyAnalyzer::new().analyze(records);
        let weights = (!self.config.weights.is_empty()).then_some(&self.config.weights);
        let schema = FeatureSchema::build(&summaries, weights);
        drop(summaries);
        info!("Found {} features", schema.feature_count());

        let mut assembler =
            FeatureVectorAssembler::new(&schema).with_numeric_weighting(self.config.weight_numeric);
        assembler.add_all(records)?;
        let assembled = assembler.finish();
        if assembled.index.is_empty() {
            return Err(Error::EmptyResourceSet);
        }
        info!("Found {} distinct resources", assembled.index.len());

        let engine = DistanceEngine::new(self.config.metric).with_parallel(self.config.parallel);
        info!("Computing distances");
        let matrix = engine.compute(&assembled.vectors)?;
        let ranking = engine.rank(&matrix)?;
        let std_dev = matrix.std_dev();

        let selector = NeighborSelector::new(self.config.max_neighbors);
        let neighbors = selector
            .select_with_tolerance(&matrix, &ranking, std_dev)
            .iter()
            .enumerate()
            .map(|(row, selected)| NeighborList::resolve(row, selected, &assembled.index))
            .collect();

        Ok(PipelineOutput {
            schema,
            index: assembled.index,
            vectors: assembled.vectors,
            matrix,
            ranking,
            std_dev,
            neighbors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(subject: &str, value: &str) -> RawRecord {
        RawRecord::new(subject).with_property("score", value)
    }

    #[test]
    fn test_default_config() {
        let config = PipelineConfig::default();
        assert_eq!(config.max_neighbors, 10);
        assert_eq!(config.metric, Metric::Manhattan);
        assert!(!config.weight_numeric);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_neighbors_rejected() {
        let config = PipelineConfig {
            max_neighbors: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(Pipeline::new(config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_config_file_weights_rejected() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"weights": {"color": -3.0, "shape": 0.0}}"#).unwrap();
        assert!(matches!(Pipeline::new(config), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_extreme_values_keep_cutoff_active() {
        let records = vec![numeric("a", "-1e308"), numeric("b", "1e308"), numeric("c", "1e308")];
        let output = Pipeline::default().run(&records).unwrap();

        assert!(output.vectors.iter().all(|v| v.as_slice().iter().all(|x| x.is_finite())));
        assert!(output.matrix.as_slice().iter().all(|d| d.is_finite() && *d >= 0.0));
        assert!(output.std_dev.is_finite());
        // a is far from both b and c, which coincide
        assert_eq!(output.neighbors_of("b").unwrap().neighbors[0].subject, "c");
        assert_eq!(output.neighbors_of("b").unwrap().len(), 1);
    }

    #[test]
    fn test_config_from_json_fills_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"weights": {"color": 3.0}, "metric": "euclidean"}"#).unwrap();
        assert_eq!(config.max_neighbors, 10);
        assert_eq!(config.metric, Metric::Euclidean);
        assert_eq!(config.weights.get("color"), Some(3.0));
        assert!(config.parallel);
    }

    #[test]
    fn test_empty_records() {
        let pipeline = Pipeline::default();
        assert!(matches!(pipeline.run(&[]), Err(Error::EmptyResourceSet)));
    }

    #[test]
    fn test_four_numeric_resources() {
        let records = vec![
            numeric("zero", "0"),
            numeric("ten", "10"),
            numeric("eleven", "11"),
            numeric("fifty", "50"),
        ];
        let output = Pipeline::default().run(&records).unwrap();

        assert_eq!(output.resource_count(), 4);
        assert!(output.matrix.is_symmetric());

        // 10 and 11 are the closest pair in the whole matrix
        let (ten, eleven) = (1, 2);
        let closest = output.matrix.get(ten, eleven);
        for i in 0..4 {
            for j in 0..4 {
                if i != j {
                    assert!(output.matrix.get(i, j) >= closest);
                }
            }
        }

        let of_ten: Vec<_> = output.neighbors_of("ten").unwrap().subjects().collect();
        let of_eleven: Vec<_> = output.neighbors_of("eleven").unwrap().subjects().collect();
        assert_eq!(of_ten.first(), Some(&"eleven"));
        assert_eq!(of_eleven.first(), Some(&"ten"));
        assert!(!of_ten.contains(&"fifty"));
        assert!(!of_eleven.contains(&"fifty"));
    }

    #[test]
    fn test_rows_pair_subjects_with_vectors() {
        let records = vec![
            RawRecord::new("a").with_property("color", "red"),
            RawRecord::new("b").with_property("color", "blue"),
        ];
        let output = Pipeline::default().run(&records).unwrap();
        let rows: Vec<_> = output.rows().map(|(s, v)| (s.to_string(), v.as_slice().to_vec())).collect();

        assert_eq!(rows, vec![
            ("a".to_string(), vec![1.0, 0.0]),
            ("b".to_string(), vec![0.0, 1.0]),
        ]);
    }
}
