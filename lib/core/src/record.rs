use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One observed resource: a subject identifier plus its bound property values.
///
/// Values are kept as the raw strings the retrieval side produced, numeric
/// looking or not. Classification happens later, over the whole record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord {
    pub subject: String,
    #[serde(default)]
    properties: BTreeMap<String, String>,
}

impl RawRecord {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Builder-style property binding. A second binding of the same name replaces the first.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Iterate bound properties in name order
    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[inline]
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
