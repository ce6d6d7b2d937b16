//! Feature vector assembly
//!
//! Turns raw records into dense feature vectors laid out by a [`FeatureSchema`],
//! and assigns each distinct subject a row while doing so.

use crate::analyzer::parse_numeric;
use crate::schema::{FeatureSchema, PropertyEncoding};
use simthings_core::{FeatureVector, RawRecord, ResourceIndex, Result};
use tracing::debug;

/// Assembles feature vectors for a record set against a fixed schema
#[derive(Debug, Clone)]
pub struct FeatureVectorAssembler<'a> {
    schema: &'a FeatureSchema,
    weight_numeric: bool,
    index: ResourceIndex,
    vectors: Vec<FeatureVector>,
    skipped: usize,
}

/// Output of assembly: one vector per distinct subject, in row order
#[derive(Debug, Clone)]
pub struct AssembledFeatures {
    pub index: ResourceIndex,
    pub vectors: Vec<FeatureVector>,
    /// Property values that had no slot in the schema
    pub skipped_values: usize,
}

impl<'a> FeatureVectorAssembler<'a> {
    pub fn new(schema: &'a FeatureSchema) -> Self {
        Self {
            schema,
            weight_numeric: false,
            index: ResourceIndex::new(),
            vectors: Vec::new(),
            skipped: 0,
        }
    }

    /// Multiply normalized numeric scores by the property weight as well.
    /// Off by default: only categorical slots carry the weight.
    #[must_use]
    pub fn with_numeric_weighting(mut self, enabled: bool) -> Self {
        self.weight_numeric = enabled;
        self
    }

    /// Get a reference to the schema
    pub fn schema(&self) -> &FeatureSchema {
        self.schema
    }

    /// Vector for a single record, detached from any row bookkeeping
    pub fn assemble(&self, record: &RawRecord) -> Result<FeatureVector> {
        let mut vector = FeatureVector::zeros(self.schema.feature_count());
        self.populate(&mut vector, record)?;
        Ok(vector)
    }

    /// Fold a record into its subject's row. A repeated subject keeps its row
    /// and gains the newly bound slots.
    pub fn add(&mut self, record: &RawRecord) -> Result<usize> {
        let (row, fresh) = self.index.get_or_insert(&record.subject);
        if fresh {
            self.vectors.push(FeatureVector::zeros(self.schema.feature_count()));
        }
        let mut vector = std::mem::take(&mut self.vectors[row]);
        let populated = self.populate(&mut vector, record);
        self.vectors[row] = vector;
        self.skipped += populated?;
        Ok(row)
    }

    pub fn add_all<'r, I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = &'r RawRecord>,
    {
        for record in records {
            self.add(record)?;
        }
        Ok(())
    }

    pub fn finish(self) -> AssembledFeatures {
        debug!(
            resources = self.vectors.len(),
            features = self.schema.feature_count(),
            skipped = self.skipped,
            "assembled feature vectors"
        );
        AssembledFeatures {
            index: self.index,
            vectors: self.vectors,
            skipped_values: self.skipped,
        }
    }

    /// Write the record's slots into `vector`; returns how many values had no slot.
    /// Fails when the schema hands out a slot beyond its own feature count.
    fn populate(&self, vector: &mut FeatureVector, record: &RawRecord) -> Result<usize> {
        let mut skipped = 0;

        for (name, value) in record.properties() {
            let Some(property) = self.schema.property(name) else {
                skipped += 1;
                continue;
            };

            let cell = match &property.encoding {
                PropertyEncoding::Categorical(slots) => {
                    slots.slot(value).map(|slot| (slot, property.weight))
                }
                PropertyEncoding::Numeric { slot, stats } => parse_numeric(value).map(|v| {
                    let score = stats.normalize(v);
                    let score = if self.weight_numeric { score * property.weight } else { score };
                    (*slot, score)
                }),
            };

            match cell {
                Some((slot, score)) => vector.set(slot, score)?,
                None => {
                    debug!(property = %name, value = %value, "no feature slot for value, skipping");
                    skipped += 1;
                }
            }
        }

        Ok(skipped)
    }
}
