//! Weight-table prior.

use super::{occurrence_pairs, SequencePrior};
use crate::cache::EntityIndex;
use crate::config::PriorConfig;
use crate::labels::{Label, LabelIndex};
use crate::Result;
use std::collections::HashMap;

/// Prior that looks up a log weight per (label, other label, same length) triple.
///
/// Explicit entries from the configuration take precedence; any other pair
/// falls back to one of four defaults depending on whether the labels and the
/// lengths agree. Recurrences left entirely unlabeled add the `unlabeled`
/// weight.
///
/// # Example
///
/// ```rust
/// use anno_prior::{Document, EntityIndex, PriorConfig, SequencePrior};
/// use anno_prior::prior::EmpiricalPrior;
///
/// let config = PriorConfig::new()
///     .with_labels(["O", "PER", "ORG"])
///     .with_weight("PER", "ORG", true, -4.0)
///     .with_weight("ORG", "PER", true, -4.0);
/// let prior = EmpiricalPrior::from_config(&config).unwrap();
///
/// let doc = Document::from_whitespace("Jordan met Jordan");
/// let index = EntityIndex::new(&doc, vec![1, 0, 2], 0).unwrap();
/// assert_eq!(prior.score(&index), -8.0);
/// ```
#[derive(Debug, Clone)]
pub struct EmpiricalPrior {
    labels: LabelIndex,
    table: HashMap<(Label, Label, bool), f64>,
    same_type_exact: f64,
    same_type_partial: f64,
    different_type_exact: f64,
    different_type_partial: f64,
    unlabeled: f64,
}

impl EmpiricalPrior {
    /// Build the weight table from a validated configuration.
    pub fn from_config(config: &PriorConfig) -> Result<Self> {
        config.validate()?;
        let labels = config.label_index()?;
        let mut table = HashMap::with_capacity(config.weights.len());
        for entry in &config.weights {
            let key = (
                labels.require(&entry.label)?,
                labels.require(&entry.other)?,
                entry.exact,
            );
            if table.insert(key, entry.weight).is_some() {
                log::warn!(
                    "duplicate weight for ({}, {}, exact={}); keeping {}",
                    entry.label,
                    entry.other,
                    entry.exact,
                    entry.weight
                );
            }
        }
        Ok(Self {
            labels,
            table,
            same_type_exact: config.same_type_exact,
            same_type_partial: config.same_type_partial,
            different_type_exact: config.different_type_exact,
            different_type_partial: config.different_type_partial,
            unlabeled: config.unlabeled,
        })
    }

    /// Label inventory the table is keyed by.
    #[must_use]
    pub fn labels(&self) -> &LabelIndex {
        &self.labels
    }

    /// Log weight for an entity labeled `label` recurring as one labeled `other`.
    #[must_use]
    pub fn weight(&self, label: Label, other: Label, exact: bool) -> f64 {
        if let Some(&weight) = self.table.get(&(label, other, exact)) {
            return weight;
        }
        match (label == other, exact) {
            (true, true) => self.same_type_exact,
            (true, false) => self.same_type_partial,
            (false, true) => self.different_type_exact,
            (false, false) => self.different_type_partial,
        }
    }

    /// Log weight for a recurrence with no entity on it.
    #[must_use]
    pub fn unlabeled_weight(&self) -> f64 {
        self.unlabeled
    }
}

impl SequencePrior for EmpiricalPrior {
    fn score(&self, index: &EntityIndex<'_>) -> f64 {
        occurrence_pairs(index)
            .map(|(entity, other)| match other {
                Some(other) => self.weight(entity.label(), other.label(), other.len() == entity.len()),
                None => self.unlabeled,
            })
            .sum()
    }
}
