//! Sampler-facing sequence model backed by an entity index.

use super::SequencePrior;
use crate::cache::{EditKind, EntityIndex};
use crate::config::PriorConfig;
use crate::document::Document;
use crate::labels::{Label, LabelIndex};
use crate::{Error, Result};
use std::fmt;

/// A [`SequencePrior`] together with the entity index it scores.
///
/// This is the surface a Gibbs-style sampler drives: it seeds the model with
/// an initial labeling, asks for [`scores_of`](Self::scores_of) or
/// [`conditional_distribution`](Self::conditional_distribution) at a position,
/// picks a label and reports the choice through
/// [`update_sequence_element`](Self::update_sequence_element) or
/// [`relabel`](Self::relabel).
///
/// The prior depends on every entity in the document, so the model is not
/// Markovian: both windows are unbounded.
///
/// # Example
///
/// ```rust
/// use anno_prior::{Document, EntityPriorModel, LabelIndex, PriorConfig};
/// use anno_prior::prior::EmpiricalPrior;
///
/// let config = PriorConfig::new().with_labels(["O", "PER", "ORG"]);
/// let prior = EmpiricalPrior::from_config(&config).unwrap();
/// let doc = Document::from_whitespace("Acme hired Acme");
///
/// let mut model = EntityPriorModel::new(&doc, config.label_index().unwrap(), "O", prior).unwrap();
/// model.set_initial_sequence(vec![2, 0, 0]).unwrap();
///
/// let dist = model.conditional_distribution(2).unwrap();
/// assert!((dist.iter().sum::<f64>() - 1.0).abs() < 1e-9);
/// // Labeling the second "Acme" as an organization is the most likely choice.
/// let best = (0..dist.len()).max_by(|&a, &b| dist[a].total_cmp(&dist[b])).unwrap();
/// assert_eq!(best, 2);
/// ```
#[derive(Debug, Clone)]
pub struct EntityPriorModel<'d, P> {
    index: EntityIndex<'d>,
    labels: LabelIndex,
    prior: P,
    possible: Vec<Label>,
}

impl<'d, P: SequencePrior> EntityPriorModel<'d, P> {
    /// Create a model whose labels and background come from `config`.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the configuration does not validate.
    pub fn from_config(doc: &'d Document, config: &PriorConfig, prior: P) -> Result<Self> {
        config.validate()?;
        Self::new(doc, config.label_index()?, &config.background, prior)
    }

    /// Create a model over `doc` with every position labeled `background`.
    pub fn new(doc: &'d Document, labels: LabelIndex, background: &str, prior: P) -> Result<Self> {
        let background = labels.require(background)?;
        let index = EntityIndex::new(doc, vec![background; doc.len()], background)?;
        let possible = (0..labels.len()).collect();
        Ok(Self {
            index,
            labels,
            prior,
            possible,
        })
    }

    /// Number of token positions.
    #[must_use]
    pub fn length(&self) -> usize {
        self.index.len()
    }

    /// Number of labels.
    #[must_use]
    pub fn num_classes(&self) -> usize {
        self.labels.len()
    }

    /// Positions to the left a score depends on.
    #[must_use]
    pub fn left_window(&self) -> usize {
        usize::MAX
    }

    /// Positions to the right a score depends on.
    #[must_use]
    pub fn right_window(&self) -> usize {
        usize::MAX
    }

    /// Labels a position may take: every label in the inventory.
    #[must_use]
    pub fn possible_values(&self, _position: usize) -> &[Label] {
        &self.possible
    }

    /// The label inventory.
    #[must_use]
    pub fn label_index(&self) -> &LabelIndex {
        &self.labels
    }

    /// The entity index in its current state.
    #[must_use]
    pub fn index(&self) -> &EntityIndex<'d> {
        &self.index
    }

    /// The prior.
    #[must_use]
    pub fn prior(&self) -> &P {
        &self.prior
    }

    fn check_label(&self, label: Label) -> Result<()> {
        if self.labels.contains(label) {
            Ok(())
        } else {
            Err(Error::unknown_label(label.to_string()))
        }
    }

    /// Replace the labeling wholesale.
    pub fn set_initial_sequence(&mut self, sequence: Vec<Label>) -> Result<()> {
        for &label in &sequence {
            self.check_label(label)?;
        }
        self.index.set_initial_sequence(sequence)
    }

    /// Record that the caller changed `sequence[position]` from `old_label`.
    pub fn update_sequence_element(
        &mut self,
        sequence: &[Label],
        position: usize,
        old_label: Label,
    ) -> Result<EditKind> {
        let label = sequence.get(position).copied().ok_or(Error::PositionOutOfRange {
            position,
            len: sequence.len(),
        })?;
        self.check_label(label)?;
        self.index.apply(sequence, position, old_label)
    }

    /// Set the label at `position`, returning the old label.
    pub fn relabel(&mut self, position: usize, label: Label) -> Result<Label> {
        self.check_label(label)?;
        self.index.relabel(position, label)
    }

    /// The prior's score of the current labeling.
    #[must_use]
    pub fn score(&self) -> f64 {
        self.prior.score(&self.index)
    }

    /// Score of the labeling obtained by setting `position` to each label in turn.
    ///
    /// The original label is put back before this returns, also when a
    /// candidate edit fails.
    pub fn scores_of(&mut self, position: usize) -> Result<Vec<f64>> {
        let original = self.index.label(position).ok_or(Error::PositionOutOfRange {
            position,
            len: self.index.len(),
        })?;
        let probed = self.score_candidates(position);
        let restored = self.index.relabel(position, original);
        let scores = probed?;
        restored?;
        Ok(scores)
    }

    fn score_candidates(&mut self, position: usize) -> Result<Vec<f64>> {
        let mut scores = Vec::with_capacity(self.labels.len());
        for label in 0..self.labels.len() {
            self.index.relabel(position, label)?;
            scores.push(self.prior.score(&self.index));
        }
        Ok(scores)
    }

    /// Score of the current label at `position`, computed like [`scores_of`](Self::scores_of).
    pub fn score_of(&mut self, position: usize) -> Result<f64> {
        let scores = self.scores_of(position)?;
        let current = self.index.labels()[position];
        scores
            .get(current)
            .copied()
            .ok_or_else(|| Error::unknown_label(current.to_string()))
    }

    /// Distribution over labels at `position`, the other positions held fixed.
    pub fn conditional_distribution(&mut self, position: usize) -> Result<Vec<f64>> {
        let mut scores = self.scores_of(position)?;
        log_normalize(&mut scores);
        for score in &mut scores {
            *score = score.exp();
        }
        Ok(scores)
    }
}

impl<P> fmt::Display for EntityPriorModel<'_, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.index.dump(&self.labels))
    }
}

/// Shift log scores so they exponentiate to a probability distribution.
///
/// If every score is negative infinity the result is uniform.
pub fn log_normalize(scores: &mut [f64]) {
    if scores.is_empty() {
        return;
    }
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        let uniform = -(scores.len() as f64).ln();
        scores.iter_mut().for_each(|s| *s = uniform);
        return;
    }
    let total = max + scores.iter().map(|s| (s - max).exp()).sum::<f64>().ln();
    for score in scores.iter_mut() {
        *score -= total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::EntityId;
    use crate::prior::UniformPrior;

    #[test]
    fn test_log_normalize() {
        let mut scores = vec![0.0, 0.0, 2.0f64.ln()];
        log_normalize(&mut scores);
        let probs: Vec<f64> = scores.iter().map(|s| s.exp()).collect();
        assert!((probs.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        assert!((probs[2] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_log_normalize_all_impossible() {
        let mut scores = vec![f64::NEG_INFINITY; 4];
        log_normalize(&mut scores);
        assert!(scores.iter().all(|s| (s.exp() - 0.25).abs() < 1e-12));
    }

    #[test]
    fn test_uniform_distribution() {
        let doc = Document::from_whitespace("a b c");
        let labels = LabelIndex::new(["O", "PER", "ORG", "LOC"]).unwrap();
        let mut model = EntityPriorModel::new(&doc, labels, "O", UniformPrior).unwrap();
        let dist = model.conditional_distribution(1).unwrap();
        assert_eq!(dist.len(), 4);
        assert!(dist.iter().all(|p| (p - 0.25).abs() < 1e-12));
        assert_eq!(model.left_window(), usize::MAX);
        assert_eq!(model.possible_values(0), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_failed_candidate_restores_label() {
        let doc = Document::from_whitespace("a b c");
        let labels = LabelIndex::new(["O", "PER"]).unwrap();
        let mut model = EntityPriorModel::new(&doc, labels, "O", UniformPrior).unwrap();
        model.set_initial_sequence(vec![0, 0, 1]).unwrap();
        model.index.set_handle(2, Some(EntityId(7)));

        // Label 0 leaves position 1 alone; label 1 runs into the dangling handle.
        let err = model.scores_of(1).unwrap_err();
        assert!(matches!(err, Error::Inconsistent(_)));
        assert_eq!(model.index().labels(), &[0, 0, 1]);
        assert_eq!(model.index().entity_at(1), None);
    }

    #[test]
    fn test_unknown_labels_rejected() {
        let doc = Document::from_whitespace("a b");
        let labels = LabelIndex::new(["O", "PER"]).unwrap();
        assert!(EntityPriorModel::new(&doc, labels.clone(), "X", UniformPrior).is_err());

        let mut model = EntityPriorModel::new(&doc, labels, "O", UniformPrior).unwrap();
        assert!(matches!(
            model.set_initial_sequence(vec![0, 5]),
            Err(Error::UnknownLabel(_))
        ));
        assert!(model.relabel(0, 2).is_err());
    }
}
