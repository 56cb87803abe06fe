//! Entity-consistency priors over an [`EntityIndex`].
//!
//! A prior scores a labeling by comparing every entity with whatever is
//! labeled at the other places its words recur: a document that calls
//! "Acme Corp" an organization in one sentence and a person in the next is
//! less plausible than one that labels both the same way.
//!
//! Priors are read-only consumers of the index. The sampler-facing surface,
//! which probes candidate labels by editing the index, is [`EntityPriorModel`].

mod empirical;
mod model;

pub use empirical::EmpiricalPrior;
pub use model::{log_normalize, EntityPriorModel};

use crate::cache::{Entity, EntityIndex};

/// A log-probability contribution computed from an entity index.
pub trait SequencePrior {
    /// Score the index's current labeling.
    fn score(&self, index: &EntityIndex<'_>) -> f64;
}

impl<P: SequencePrior + ?Sized> SequencePrior for &P {
    fn score(&self, index: &EntityIndex<'_>) -> f64 {
        (**self).score(index)
    }
}

impl<P: SequencePrior + ?Sized> SequencePrior for Box<P> {
    fn score(&self, index: &EntityIndex<'_>) -> f64 {
        (**self).score(index)
    }
}

/// A prior that is indifferent to every labeling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UniformPrior;

impl SequencePrior for UniformPrior {
    fn score(&self, _index: &EntityIndex<'_>) -> f64 {
        0.0
    }
}

/// Every (entity, other occurrence) pair in `index`.
///
/// Each entity is visited once. For each position where its words recur, the
/// second element is the first entity covering any token of that recurrence,
/// or `None` if the recurrence is entirely background.
pub fn occurrence_pairs<'a>(
    index: &'a EntityIndex<'_>,
) -> impl Iterator<Item = (&'a Entity, Option<&'a Entity>)> + 'a {
    index.entities().flat_map(move |entity| {
        entity.other_occurrences().iter().map(move |&position| {
            let end = (position + entity.len()).min(index.len());
            let other = (position..end).find_map(|p| index.entity_at(p));
            (entity, other)
        })
    })
}
