//! Incrementally maintained entity index.
//!
//! [`EntityIndex`] tracks, for a label sequence over a fixed [`Document`],
//! every maximal run of same-labeled non-background tokens (an [`Entity`]) and
//! the other places in the document where each entity's words recur.
//!
//! Samplers change one label at a time, many times per position and sweep.
//! Rebuilding the index after each change would cost a full document pass per
//! proposal, so [`EntityIndex::apply`] instead classifies the edit into an
//! [`EditKind`] and only touches the position and its two neighbor entities.
//!
//! # Example
//!
//! ```rust
//! use anno_prior::{Document, EntityIndex};
//!
//! const O: usize = 0;
//! const PER: usize = 1;
//!
//! let doc = Document::from_whitespace("New York City and new york");
//! let mut index = EntityIndex::new(&doc, vec![PER, O, PER, O, O, O], O).unwrap();
//! assert_eq!(index.entity_count(), 2);
//!
//! // Relabeling the gap merges both entities into one.
//! index.relabel(1, PER).unwrap();
//! let merged = index.entity_at(0).unwrap();
//! assert_eq!(merged.words(), ["New", "York", "City"]);
//! assert!(merged.other_occurrences().is_empty());
//! ```

mod edit;
mod entity;

pub use edit::{EditKind, Side};
pub use entity::{Entity, EntityId};

use crate::document::Document;
use crate::labels::{Label, LabelIndex};
use crate::{Error, Result};
use std::fmt;

/// Entity index over one document's label sequence.
///
/// Entities live in an arena of slots addressed by [`EntityId`]; every token
/// position holds the handle of the entity covering it, or `None` for
/// background. Removed entities are dropped and their slots reused.
///
/// The index keeps its own copy of the label sequence. Edits go through
/// [`relabel`](Self::relabel), or through [`apply`](Self::apply) for callers
/// that own the sequence and write the new label themselves first.
///
/// Cloning is cheap relative to rebuilding and shares the borrowed document,
/// which makes disposable copies suitable for speculative scoring.
#[derive(Debug, Clone)]
pub struct EntityIndex<'d> {
    doc: &'d Document,
    background: Label,
    labels: Vec<Label>,
    at: Vec<Option<EntityId>>,
    slots: Vec<Option<Entity>>,
    free: Vec<usize>,
}

impl<'d> EntityIndex<'d> {
    /// Build the index for `labels` over `doc`.
    ///
    /// # Errors
    ///
    /// [`Error::LengthMismatch`] if `labels` and `doc` differ in length.
    pub fn new(doc: &'d Document, labels: Vec<Label>, background: Label) -> Result<Self> {
        let mut index = Self {
            doc,
            background,
            labels: Vec::new(),
            at: Vec::new(),
            slots: Vec::new(),
            free: Vec::new(),
        };
        index.set_initial_sequence(labels)?;
        Ok(index)
    }

    /// Discard all state and index `labels` from scratch.
    pub fn set_initial_sequence(&mut self, labels: Vec<Label>) -> Result<()> {
        if labels.len() != self.doc.len() {
            return Err(Error::LengthMismatch {
                expected: self.doc.len(),
                actual: labels.len(),
            });
        }
        self.labels = labels;
        self.at = vec![None; self.labels.len()];
        self.slots.clear();
        self.free.clear();

        let mut position = 0;
        while position < self.labels.len() {
            let label = self.labels[position];
            if label == self.background {
                position += 1;
                continue;
            }
            let end = self.labels[position..]
                .iter()
                .position(|&l| l != label)
                .map_or(self.labels.len(), |run| position + run);
            let entity = self.build(position, end, label);
            self.insert(entity);
            position = end;
        }

        log::debug!(
            "indexed {} entities over {} tokens",
            self.slots.len(),
            self.labels.len()
        );
        Ok(())
    }

    /// Record that the caller changed the label at `position` from `old_label`.
    ///
    /// `sequence` is the caller's label sequence, which must already hold the
    /// new label at `position`. Only that position is read from it.
    ///
    /// # Errors
    ///
    /// Fails before touching any state if `position` is out of range,
    /// `sequence` has the wrong length, or `old_label` is not the label the
    /// index last saw at `position`. [`Error::Inconsistent`] signals a broken
    /// index: the label mirror keeps `old_label`, but entities may be left
    /// half-updated and the index should be rebuilt.
    pub fn apply(
        &mut self,
        sequence: &[Label],
        position: usize,
        old_label: Label,
    ) -> Result<EditKind> {
        self.check_position(position)?;
        if sequence.len() != self.labels.len() {
            return Err(Error::LengthMismatch {
                expected: self.labels.len(),
                actual: sequence.len(),
            });
        }
        if self.labels[position] != old_label {
            return Err(Error::StaleLabel {
                position,
                expected: self.labels[position],
                actual: old_label,
            });
        }
        self.check_entry(position)?;
        self.labels[position] = sequence[position];
        self.update_or_restore(position, old_label)
    }

    /// Set the label at `position` and update the index, returning the old label.
    pub fn relabel(&mut self, position: usize, label: Label) -> Result<Label> {
        self.check_position(position)?;
        self.check_entry(position)?;
        let old_label = std::mem::replace(&mut self.labels[position], label);
        self.update_or_restore(position, old_label)?;
        Ok(old_label)
    }

    /// Run the update, putting `old_label` back in the mirror if it fails.
    fn update_or_restore(&mut self, position: usize, old_label: Label) -> Result<EditKind> {
        self.update(position, old_label).map_err(|err| {
            self.labels[position] = old_label;
            err
        })
    }

    fn check_position(&self, position: usize) -> Result<()> {
        if position >= self.labels.len() {
            return Err(Error::PositionOutOfRange {
                position,
                len: self.labels.len(),
            });
        }
        Ok(())
    }

    /// The entity handle at `position` must agree with the label mirror.
    fn check_entry(&self, position: usize) -> Result<()> {
        let label = self.labels[position];
        let consistent = match self.at[position] {
            None => label == self.background,
            Some(id) => {
                let entity = self.get(id)?;
                entity.label == label && entity.contains(position)
            }
        };
        if consistent {
            Ok(())
        } else {
            Err(Error::inconsistent(format!(
                "entity at position {} disagrees with label {}",
                position, label
            )))
        }
    }

    fn update(&mut self, position: usize, old_label: Label) -> Result<EditKind> {
        let label = self.labels[position];
        let here = self.at[position];
        let kind = self.classify(position)?;
        log::trace!(
            "position {}: {} -> {}: {}",
            position,
            old_label,
            label,
            kind
        );

        match kind {
            EditKind::NoChange => {}
            EditKind::Join { left, right } => {
                self.release_unless(here, &[left, right]);
                self.join(left, right, position, label)?;
            }
            EditKind::Split { entity } => {
                self.split(entity, position)?;
                if label == self.background {
                    self.at[position] = None;
                } else {
                    self.insert_fresh(position, position + 1, label);
                }
            }
            EditKind::Prepend { right, trim } => {
                if trim.is_none() {
                    self.release_unless(here, &[right]);
                }
                let right_entity = self.take(right)?;
                let mut words = Vec::with_capacity(right_entity.len() + 1);
                words.push(self.word(position));
                words.extend(right_entity.words);
                self.insert_words(position, words, label);
                if let Some(prev) = trim {
                    self.trim(prev, Side::Back)?;
                }
            }
            EditKind::Append { left, trim } => {
                if trim.is_none() {
                    self.release_unless(here, &[left]);
                }
                let mut extended = self.take(left)?;
                extended.words.push(self.word(position));
                extended.label = label;
                let (start, len) = (extended.start, extended.len());
                let occurrences = self.doc.occurrence_index();
                extended
                    .other_occurrences
                    .retain(|&q| occurrences.matches_at(start, len, q));
                self.insert(extended);
                if let Some(next) = trim {
                    self.trim(next, Side::Front)?;
                }
            }
            EditKind::Singleton { trim } => {
                if trim.is_none() {
                    self.release_unless(here, &[]);
                }
                self.insert_fresh(position, position + 1, label);
                if let Some((neighbor, side)) = trim {
                    self.trim(neighbor, side)?;
                }
            }
            EditKind::Shrink { entity, side } => {
                self.trim(entity, side)?;
                self.at[position] = None;
            }
            EditKind::Clear => {
                self.release_unless(here, &[]);
                self.at[position] = None;
            }
        }
        debug_assert!(self.check_entry(position).is_ok());
        Ok(kind)
    }

    fn join(&mut self, left: EntityId, right: EntityId, position: usize, label: Label) -> Result<()> {
        let mut merged = self.take(left)?;
        let right_entity = self.take(right)?;
        let offset = merged.len() + 1;

        // Every recurrence of the merged words is a recurrence of either half,
        // so filter whichever half has fewer candidates.
        let candidates: Vec<usize> =
            if right_entity.other_occurrences.len() < merged.other_occurrences.len() {
                right_entity
                    .other_occurrences
                    .iter()
                    .filter_map(|&q| q.checked_sub(offset))
                    .collect()
            } else {
                std::mem::take(&mut merged.other_occurrences)
            };

        merged.words.push(self.word(position));
        merged.words.extend(right_entity.words);
        merged.label = label;
        let (start, len) = (merged.start, merged.len());
        let occurrences = self.doc.occurrence_index();
        merged.other_occurrences = candidates
            .into_iter()
            .filter(|&q| occurrences.matches_at(start, len, q))
            .collect();
        self.insert(merged);
        Ok(())
    }

    /// Replace `id` by the two runs on either side of `position`.
    fn split(&mut self, id: EntityId, position: usize) -> Result<()> {
        let entity = self.take(id)?;
        let cut = position
            .checked_sub(entity.start)
            .filter(|&cut| cut > 0 && cut + 1 < entity.len())
            .ok_or_else(|| {
                Error::inconsistent(format!(
                    "cannot split {} at position {}",
                    entity, position
                ))
            })?;
        let mut head = entity.words;
        let tail = head.split_off(cut + 1);
        head.truncate(cut);
        self.insert_words(entity.start, head, entity.label);
        self.insert_words(position + 1, tail, entity.label);
        Ok(())
    }

    /// Drop one token from `side` of `id` and refresh its occurrences.
    fn trim(&mut self, id: EntityId, side: Side) -> Result<()> {
        let doc = self.doc;
        let entity = self.get_mut(id)?;
        if entity.len() < 2 {
            return Err(Error::inconsistent(format!(
                "cannot trim {:?} of one-token {}",
                side, entity
            )));
        }
        match side {
            Side::Front => {
                entity.words.remove(0);
                entity.start += 1;
            }
            Side::Back => {
                entity.words.pop();
            }
        }
        entity.other_occurrences = doc
            .occurrence_index()
            .occurrences(entity.start, entity.len());
        Ok(())
    }

    // =========================================================================
    // Arena
    // =========================================================================

    fn word(&self, position: usize) -> String {
        self.doc.tokens()[position].clone()
    }

    /// A fresh entity over `start..end` with occurrences from a full lookup.
    fn build(&self, start: usize, end: usize, label: Label) -> Entity {
        Entity {
            start,
            words: self.doc.tokens()[start..end].to_vec(),
            label,
            other_occurrences: self.doc.occurrence_index().occurrences(start, end - start),
        }
    }

    fn insert_fresh(&mut self, start: usize, end: usize, label: Label) -> EntityId {
        let entity = self.build(start, end, label);
        self.insert(entity)
    }

    fn insert_words(&mut self, start: usize, words: Vec<String>, label: Label) -> EntityId {
        let other_occurrences = self.doc.occurrence_index().occurrences(start, words.len());
        self.insert(Entity {
            start,
            words,
            label,
            other_occurrences,
        })
    }

    /// Store `entity` and point every position it covers at it.
    fn insert(&mut self, entity: Entity) -> EntityId {
        let span = entity.span();
        let id = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(entity);
                EntityId(slot)
            }
            None => {
                self.slots.push(Some(entity));
                EntityId(self.slots.len() - 1)
            }
        };
        for handle in &mut self.at[span] {
            *handle = Some(id);
        }
        id
    }

    /// Remove `id` from the arena. Positions still pointing at it must be
    /// restamped by the caller.
    fn take(&mut self, id: EntityId) -> Result<Entity> {
        let entity = self
            .slots
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or_else(|| Error::inconsistent(format!("dangling entity handle {}", id)))?;
        self.free.push(id.0);
        Ok(entity)
    }

    /// Drop the entity previously at the edited position unless it is one of `kept`.
    fn release_unless(&mut self, here: Option<EntityId>, kept: &[EntityId]) {
        if let Some(id) = here.filter(|id| !kept.contains(id)) {
            if let Some(slot) = self.slots.get_mut(id.0) {
                if slot.take().is_some() {
                    self.free.push(id.0);
                }
            }
        }
    }

    fn get(&self, id: EntityId) -> Result<&Entity> {
        self.entity(id)
            .ok_or_else(|| Error::inconsistent(format!("dangling entity handle {}", id)))
    }

    fn get_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::inconsistent(format!("dangling entity handle {}", id)))
    }

    /// Overwrite the handle at `position`, bypassing every invariant.
    #[cfg(test)]
    pub(crate) fn set_handle(&mut self, position: usize, id: Option<EntityId>) {
        self.at[position] = id;
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The document being labeled.
    #[must_use]
    pub fn document(&self) -> &'d Document {
        self.doc
    }

    /// The background label.
    #[must_use]
    pub fn background(&self) -> Label {
        self.background
    }

    /// Current label sequence.
    #[must_use]
    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    /// Current label at `position`.
    #[must_use]
    pub fn label(&self, position: usize) -> Option<Label> {
        self.labels.get(position).copied()
    }

    /// Number of token positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True if the document is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Entity covering `position`, if it is not background.
    #[must_use]
    pub fn entity_at(&self, position: usize) -> Option<&Entity> {
        self.entity_id_at(position).and_then(|id| self.entity(id))
    }

    /// Handle of the entity covering `position`.
    #[must_use]
    pub fn entity_id_at(&self, position: usize) -> Option<EntityId> {
        self.at.get(position).copied().flatten()
    }

    /// Entity named by `id`, if it is still live.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// All entities with their handles, left to right.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> + '_ {
        self.at.iter().enumerate().filter_map(move |(position, id)| {
            let id = (*id)?;
            let entity = self.entity(id)?;
            (entity.start == position).then_some((id, entity))
        })
    }

    /// All entities, left to right.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.iter().map(|(_, entity)| entity)
    }

    /// Number of live entities.
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }

    /// True iff the document tokens starting at `candidate` equal the words
    /// of `entity`, compared case-insensitively over the full length.
    #[must_use]
    pub fn matches(&self, entity: &Entity, candidate: usize) -> bool {
        self.doc
            .occurrence_index()
            .matches_at(entity.start, entity.len(), candidate)
    }

    /// Recompute the other occurrences of `entity` from the document.
    #[must_use]
    pub fn other_occurrences_of(&self, entity: &Entity) -> Vec<usize> {
        self.doc
            .occurrence_index()
            .occurrences(entity.start, entity.len())
    }

    /// Verify every structural invariant of the index.
    ///
    /// Occurrences are checked against a naive scan that does not use the
    /// document's inverted index. Costs O(N * E); meant for tests and debugging.
    pub fn check_invariants(&self) -> Result<()> {
        let n = self.doc.len();
        if self.labels.len() != n || self.at.len() != n {
            return Err(Error::inconsistent("state length differs from document"));
        }
        for position in 0..n {
            let label = self.labels[position];
            match (self.at[position], label == self.background) {
                (None, true) => {}
                (None, false) => {
                    return Err(Error::inconsistent(format!(
                        "labeled position {} has no entity",
                        position
                    )))
                }
                (Some(_), true) => {
                    return Err(Error::inconsistent(format!(
                        "background position {} has an entity",
                        position
                    )))
                }
                (Some(id), false) => {
                    let entity = self.get(id)?;
                    if !entity.contains(position) || entity.label != label {
                        return Err(Error::inconsistent(format!(
                            "position {} points at {} which does not cover it",
                            position, entity
                        )));
                    }
                    if entity.words[position - entity.start] != self.doc.tokens()[position] {
                        return Err(Error::inconsistent(format!(
                            "words of {} disagree with the document at {}",
                            entity, position
                        )));
                    }
                }
            }
            if position > 0 && self.labels[position - 1] == label && label != self.background {
                if self.at[position - 1] != self.at[position] {
                    return Err(Error::inconsistent(format!(
                        "positions {} and {} share label {} but not an entity",
                        position - 1,
                        position,
                        label
                    )));
                }
            }
        }

        let folded: Vec<String> = self.doc.tokens().iter().map(|t| t.to_lowercase()).collect();
        for (slot, entity) in self.slots.iter().enumerate() {
            let Some(entity) = entity else { continue };
            if entity.is_empty() || entity.end() > n {
                return Err(Error::inconsistent(format!("entity {} is out of bounds", entity)));
            }
            if entity.span().any(|p| self.at[p] != Some(EntityId(slot))) {
                return Err(Error::inconsistent(format!(
                    "entity {} is not referenced by all of its positions",
                    entity
                )));
            }
            let len = entity.len();
            let expected: Vec<usize> = (0..n)
                .filter(|&q| q != entity.start && q + len <= n)
                .filter(|&q| (0..len).all(|j| folded[q + j] == folded[entity.start + j]))
                .collect();
            if entity.other_occurrences != expected {
                return Err(Error::inconsistent(format!(
                    "entity {} should recur at {:?}",
                    entity, expected
                )));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Dumps
    // =========================================================================

    /// One line per token: position, word, label name and covering entity.
    #[must_use]
    pub fn dump(&self, labels: &LabelIndex) -> String {
        let mut out = String::new();
        for position in 0..self.len() {
            self.write_row(&mut out, position, Some(labels));
        }
        out
    }

    /// Like [`dump`](Self::dump), restricted to positions within `radius` of `position`.
    #[must_use]
    pub fn window(&self, position: usize, radius: usize, labels: &LabelIndex) -> String {
        let mut out = String::new();
        let end = position.saturating_add(radius).saturating_add(1).min(self.len());
        for p in position.saturating_sub(radius)..end {
            self.write_row(&mut out, p, Some(labels));
        }
        out
    }

    fn write_row(&self, out: &mut String, position: usize, labels: Option<&LabelIndex>) {
        let label = self.labels[position];
        let name = labels.map_or_else(|| label.to_string(), |l| l.display_name(label));
        out.push_str(&format!(
            "{}\t{}\t{}",
            position,
            self.doc.tokens()[position],
            name
        ));
        if let Some(entity) = self.entity_at(position) {
            let summary = labels.map_or_else(|| entity.to_string(), |l| entity.describe(l));
            out.push('\t');
            out.push_str(&summary);
        }
        out.push('\n');
    }
}

impl PartialEq for EntityIndex<'_> {
    /// Structural equality: same tokens, labels and entities, regardless of
    /// which arena slots the entities occupy.
    fn eq(&self, other: &Self) -> bool {
        self.background == other.background
            && self.labels == other.labels
            && self.doc.tokens() == other.doc.tokens()
            && (0..self.len()).all(|p| self.entity_at(p) == other.entity_at(p))
    }
}

impl fmt::Display for EntityIndex<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        for position in 0..self.len() {
            self.write_row(&mut out, position, None);
        }
        f.write_str(&out)
    }
}
