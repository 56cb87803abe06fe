//! Prior configuration.
//!
//! A [`PriorConfig`] names the label inventory, the background label and the
//! log-weight table an [`EmpiricalPrior`](crate::prior::EmpiricalPrior) scores
//! with. It round-trips through JSON and can be assembled with builder methods.
//!
//! # Example
//!
//! ```rust
//! use anno_prior::PriorConfig;
//!
//! let config = PriorConfig::new()
//!     .with_labels(["O", "PER", "ORG"])
//!     .with_weight("PER", "ORG", true, -3.0)
//!     .with_unlabeled(-0.5);
//! config.validate().unwrap();
//!
//! let json = config.to_json_string().unwrap();
//! let back = PriorConfig::from_json_str(&json).unwrap();
//! assert_eq!(back, config);
//! ```

use crate::labels::LabelIndex;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// An explicit log weight for one ordered label pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightEntry {
    /// Label of the entity being scored.
    pub label: String,
    /// Label of the entity found at its other occurrence.
    pub other: String,
    /// Whether the two entities have the same length.
    pub exact: bool,
    /// Log weight added per such occurrence.
    pub weight: f64,
}

/// Configuration for an entity-consistency prior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorConfig {
    /// Label inventory in code order.
    pub labels: Vec<String>,
    /// Name of the background label.
    pub background: String,
    /// Explicit weights; pairs not listed fall back to the defaults below.
    pub weights: Vec<WeightEntry>,
    /// Same label, same length.
    pub same_type_exact: f64,
    /// Same label, different length.
    pub same_type_partial: f64,
    /// Different labels, same length.
    pub different_type_exact: f64,
    /// Different labels, different length.
    pub different_type_partial: f64,
    /// Occurrence not covered by any entity.
    pub unlabeled: f64,
}

impl Default for PriorConfig {
    fn default() -> Self {
        Self {
            labels: ["O", "PER", "LOC", "ORG", "MISC"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            background: "O".to_string(),
            weights: Vec::new(),
            same_type_exact: 0.0,
            same_type_partial: -1.0,
            different_type_exact: -2.0,
            different_type_partial: -1.5,
            unlabeled: -1.0,
        }
    }
}

impl PriorConfig {
    /// Create a configuration with CoNLL labels and default weights.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the label inventory.
    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    /// Set the background label.
    pub fn with_background(mut self, background: impl Into<String>) -> Self {
        self.background = background.into();
        self
    }

    /// Add an explicit weight for an ordered label pair.
    pub fn with_weight(
        mut self,
        label: impl Into<String>,
        other: impl Into<String>,
        exact: bool,
        weight: f64,
    ) -> Self {
        self.weights.push(WeightEntry {
            label: label.into(),
            other: other.into(),
            exact,
            weight,
        });
        self
    }

    /// Set fallback weights for occurrences labeled with the same type.
    pub fn with_same_type(mut self, exact: f64, partial: f64) -> Self {
        self.same_type_exact = exact;
        self.same_type_partial = partial;
        self
    }

    /// Set fallback weights for occurrences labeled with a different type.
    pub fn with_different_type(mut self, exact: f64, partial: f64) -> Self {
        self.different_type_exact = exact;
        self.different_type_partial = partial;
        self
    }

    /// Set the weight for occurrences left unlabeled.
    pub fn with_unlabeled(mut self, weight: f64) -> Self {
        self.unlabeled = weight;
        self
    }

    /// Check the configuration for internal consistency.
    pub fn validate(&self) -> Result<()> {
        if self.labels.is_empty() {
            return Err(Error::config("label inventory is empty"));
        }
        let known: HashSet<&str> = self.labels.iter().map(String::as_str).collect();
        if known.len() != self.labels.len() {
            return Err(Error::config("label inventory contains duplicates"));
        }
        if !known.contains(self.background.as_str()) {
            return Err(Error::config(format!(
                "background label {:?} is not in the inventory",
                self.background
            )));
        }
        let defaults = [
            ("same_type_exact", self.same_type_exact),
            ("same_type_partial", self.same_type_partial),
            ("different_type_exact", self.different_type_exact),
            ("different_type_partial", self.different_type_partial),
            ("unlabeled", self.unlabeled),
        ];
        for (name, weight) in defaults {
            if !weight.is_finite() {
                return Err(Error::config(format!("{} must be finite", name)));
            }
        }
        for entry in &self.weights {
            for name in [&entry.label, &entry.other] {
                if !known.contains(name.as_str()) {
                    return Err(Error::config(format!(
                        "weight entry names unknown label {:?}",
                        name
                    )));
                }
            }
            if !entry.weight.is_finite() {
                return Err(Error::config(format!(
                    "weight for ({}, {}) must be finite",
                    entry.label, entry.other
                )));
            }
        }
        Ok(())
    }

    /// Build the label index for this inventory.
    pub fn label_index(&self) -> Result<LabelIndex> {
        LabelIndex::new(self.labels.iter().cloned())
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
