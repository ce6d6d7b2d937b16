//! Feature schema definitions
//!
//! Maps the raw property space onto feature-vector coordinates. Numeric
//! properties get one slot plus normalization parameters, categorical
//! properties get one slot per distinct observed value. The schema is built
//! once from the property summaries and is immutable afterwards.

use crate::analyzer::PropertyMap;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Feature schema version 1
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureSchema {
    /// Schema version for future compatibility
    #[serde(default = "default_version")]
    pub version: u32,

    /// Properties in slot order
    properties: Vec<PropertyFeature>,

    /// Property name -> position in `properties`
    #[serde(skip)]
    lookup: AHashMap<String, usize>,

    feature_count: usize,
}

fn default_version() -> u32 {
    1
}

impl FeatureSchema {
    /// Build the schema from analyzed properties.
    ///
    /// Properties are visited in name order, so slot assignment is
    /// deterministic for a given record set. Weight resolution: an override
    /// if supplied, otherwise the summary's own weight (1.0 unless changed).
    pub fn build(summaries: &PropertyMap, overrides: Option<&WeightOverrides>) -> Self {
        let mut properties = Vec::with_capacity(summaries.len());
        let mut next_slot = 0usize;

        for (name, summary) in summaries {
            let weight = overrides
                .and_then(|o| o.get(name))
                .unwrap_or(summary.weight);

            let numeric = if summary.is_numeric {
                NumericStats::from_values(summary.numeric_values())
            } else {
                None
            };

            let encoding = match numeric {
                Some(stats) => {
                    if stats.is_degenerate() {
                        warn!(
                            property = %name,
                            median = stats.median,
                            "numeric property has zero deviation, its normalized value is pinned to 0"
                        );
                    }
                    let slot = next_slot;
                    next_slot += 1;
                    PropertyEncoding::Numeric { slot, stats }
                }
                None => {
                    let slots = CategoricalSlots::allocate(&summary.values, next_slot);
                    next_slot += slots.len();
                    PropertyEncoding::Categorical(slots)
                }
            };

            properties.push(PropertyFeature {
                name: name.clone(),
                weight,
                encoding,
            });
        }

        if let Some(overrides) = overrides {
            for name in overrides.names() {
                if !summaries.contains_key(name) {
                    warn!(property = %name, "weight given for a property that was never observed");
                }
            }
        }

        let mut schema = Self {
            version: 1,
            properties,
            lookup: AHashMap::new(),
            feature_count: next_slot,
        };
        schema.rebuild_lookup();

        debug!(
            properties = schema.properties.len(),
            features = schema.feature_count,
            "built feature schema"
        );

        schema
    }

    /// Restore the lookup tables after deserialization
    pub fn rebuild_lookup(&mut self) {
        self.lookup = self
            .properties
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.clone(), i))
            .collect();
        for property in &mut self.properties {
            if let PropertyEncoding::Categorical(slots) = &mut property.encoding {
                slots.rebuild_lookup();
            }
        }
    }

    /// Total feature-vector length
    #[inline]
    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    /// Properties in slot order
    pub fn properties(&self) -> &[PropertyFeature] {
        &self.properties
    }

    /// Get a property's feature mapping by name
    pub fn property(&self, name: &str) -> Option<&PropertyFeature> {
        self.lookup.get(name).map(|&i| &self.properties[i])
    }

    /// Human readable label for every slot, indexed by slot.
    /// Numeric slots are labelled `name`, categorical slots `name=value`.
    pub fn slot_labels(&self) -> Vec<String> {
        let mut labels = vec![String::new(); self.feature_count];
        for property in &self.properties {
            match &property.encoding {
                PropertyEncoding::Numeric { slot, .. } => {
                    labels[*slot] = property.name.clone();
                }
                PropertyEncoding::Categorical(slots) => {
                    for (value, slot) in slots.iter() {
                        labels[slot] = format!("{}={}", property.name, value);
                    }
                }
            }
        }
        labels
    }

    /// Names of numeric properties whose deviation is zero
    pub fn degenerate_properties(&self) -> Vec<&str> {
        self.properties
            .iter()
            .filter(|p| matches!(&p.encoding, PropertyEncoding::Numeric { stats, .. } if stats.is_degenerate()))
            .map(|p| p.name.as_str())
            .collect()
    }
}

/// Feature mapping for a single property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PropertyFeature {
    pub name: String,

    /// Resolved weight
    pub weight: f64,

    pub encoding: PropertyEncoding,
}

/// How a property is laid out in the feature vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase", tag = "type")]
pub enum PropertyEncoding {
    /// One slot holding the normalized score
    Numeric { slot: usize, stats: NumericStats },
    /// One slot per distinct observed value
    Categorical(CategoricalSlots),
}

impl PropertyEncoding {
    pub fn slot_count(&self) -> usize {
        match self {
            PropertyEncoding::Numeric { .. } => 1,
            PropertyEncoding::Categorical(slots) => slots.len(),
        }
    }
}

/// Normalization parameters for a numeric property
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct NumericStats {
    /// Element at position `len / 2` of the sorted values
    pub median: f64,
    /// Mean of `|v - median|` over all values
    pub mean_absolute_deviation: f64,
}

impl NumericStats {
    /// Compute median and mean absolute deviation. `None` for no values.
    pub fn from_values(mut values: Vec<f64>) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        values.sort_by(f64::total_cmp);

        let median = values[values.len() / 2];
        let total: f64 = values.iter().map(|v| (v - median).abs()).sum();
        let mut mean_absolute_deviation = total / values.len() as f64;

        if !mean_absolute_deviation.is_finite() {
            // differences overflow f64, so average them at half scale
            let half = values.iter().enumerate().fold(0.0, |mean: f64, (i, v)| {
                mean + ((v * 0.5 - median * 0.5).abs() - mean) / (i + 1) as f64
            });
            mean_absolute_deviation = (half * 2.0).min(f64::MAX);
        }

        Some(Self {
            median,
            mean_absolute_deviation,
        })
    }

    /// All observed values were identical
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.mean_absolute_deviation == 0.0
    }

    /// Modified standard score `(v - median) / mad`, or 0 for a degenerate property
    #[inline]
    pub fn normalize(&self, value: f64) -> f64 {
        if self.is_degenerate() {
            0.0
        } else {
            // half scale keeps the difference finite for any finite inputs
            (value * 0.5 - self.median * 0.5) / (self.mean_absolute_deviation * 0.5)
        }
    }
}

/// Distinct categorical values and their slots, in first-seen order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CategoricalSlots {
    values: Vec<String>,
    first_slot: usize,
    #[serde(skip)]
    lookup: AHashMap<String, usize>,
}

impl CategoricalSlots {
    fn allocate(observed: &[String], first_slot: usize) -> Self {
        let mut slots = Self {
            values: Vec::new(),
            first_slot,
            lookup: AHashMap::new(),
        };
        for value in observed {
            if !slots.lookup.contains_key(value) {
                slots.lookup.insert(value.clone(), first_slot + slots.values.len());
                slots.values.push(value.clone());
            }
        }
        slots
    }

    /// Slot for an exact value, if it was observed
    #[inline]
    pub fn slot(&self, value: &str) -> Option<usize> {
        self.lookup.get(value).copied()
    }

    fn rebuild_lookup(&mut self) {
        let first_slot = self.first_slot;
        self.lookup = self
            .values
            .iter()
            .enumerate()
            .map(|(i, v)| (v.clone(), first_slot + i))
            .collect();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// (value, slot) pairs in slot order
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.values
            .iter()
            .enumerate()
            .map(move |(i, v)| (v.as_str(), self.first_slot + i))
    }
}

/// A single `name=weight` override
#[derive(Debug, Clone, PartialEq)]
pub struct WeightOverride {
    pub name: String,
    pub weight: f64,
}

impl FromStr for WeightOverride {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, weight) = s
            .split_once('=')
            .ok_or_else(|| SchemaError::MalformedWeight(s.to_string()))?;
        let name = name.trim();
        if name.is_empty() || weight.contains('=') {
            return Err(SchemaError::MalformedWeight(s.to_string()));
        }
        let weight: f64 = weight
            .trim()
            .parse()
            .map_err(|_| SchemaError::MalformedWeight(s.to_string()))?;
        validate_weight(name, weight)?;

        Ok(Self {
            name: name.to_string(),
            weight,
        })
    }
}

/// User-supplied per-property weights
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct WeightOverrides {
    weights: HashMap<String, f64>,
}

impl WeightOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a list of `name=weight` strings; later entries win
    pub fn parse_all<I, S>(pairs: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut overrides = Self::new();
        for pair in pairs {
            let parsed: WeightOverride = pair.as_ref().parse()?;
            overrides.weights.insert(parsed.name, parsed.weight);
        }
        Ok(overrides)
    }

    pub fn insert(&mut self, name: impl Into<String>, weight: f64) -> Result<(), SchemaError> {
        let name = name.into();
        validate_weight(&name, weight)?;
        self.weights.insert(name, weight);
        Ok(())
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.weights.get(name).copied()
    }

    /// Check every weight; deserialized overrides bypass `insert`
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut entries: Vec<_> = self.weights.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        for (name, weight) in entries {
            validate_weight(name, *weight)?;
        }
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.weights.keys()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl fmt::Display for WeightOverrides {
    /// `a=2, b=0.5` in name order
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.weights.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));
        let joined: Vec<String> = entries.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        write!(f, "{}", joined.join(", "))
    }
}

fn validate_weight(name: &str, weight: f64) -> Result<(), SchemaError> {
    if !weight.is_finite() || weight <= 0.0 {
        return Err(SchemaError::InvalidWeight(name.to_string(), weight));
    }
    Ok(())
}

/// Errors that can occur while configuring a schema
#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaError {
    #[error("Weight '{0}' must be in the format name=number")]
    MalformedWeight(String),

    #[error("Property '{0}' has invalid weight {1}: weights must be positive and finite")]
    InvalidWeight(String, f64),
}
