//! Cached entities.

use crate::labels::{Label, LabelIndex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Handle of an entity inside an [`EntityIndex`](super::EntityIndex).
///
/// Two positions belong to the same entity exactly when their handles are
/// equal. Handles are only meaningful for the index that issued them, and a
/// handle may be reissued once the entity it named has been removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) usize);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// A maximal run of adjacent tokens sharing one non-background label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub(crate) start: usize,
    pub(crate) words: Vec<String>,
    pub(crate) label: Label,
    /// Start positions of the other places this word sequence occurs.
    pub(crate) other_occurrences: Vec<usize>,
}

impl Entity {
    /// First token position.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// One past the last token position.
    #[must_use]
    pub fn end(&self) -> usize {
        self.start + self.words.len()
    }

    /// Token positions covered.
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Number of tokens covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always false for an entity held by an index.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// True if `position` falls inside this entity.
    #[must_use]
    pub fn contains(&self, position: usize) -> bool {
        self.span().contains(&position)
    }

    /// Token texts covered, in order.
    #[must_use]
    pub fn words(&self) -> &[String] {
        &self.words
    }

    /// Label shared by every token of the entity.
    #[must_use]
    pub fn label(&self) -> Label {
        self.label
    }

    /// Positions other than [`start`](Self::start) where the same words begin,
    /// compared case-insensitively, in ascending order.
    #[must_use]
    pub fn other_occurrences(&self) -> &[usize] {
        &self.other_occurrences
    }

    /// Words joined by single spaces.
    #[must_use]
    pub fn text(&self) -> String {
        self.words.join(" ")
    }

    /// Render with label names resolved through `labels`.
    #[must_use]
    pub fn describe(&self, labels: &LabelIndex) -> String {
        format!(
            "\"{}\" start: {} type: {} other_occurrences: {:?}",
            self.text(),
            self.start,
            labels.display_name(self.label),
            self.other_occurrences
        )
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\"{}\" start: {} type: {} other_occurrences: {:?}",
            self.text(),
            self.start,
            self.label,
            self.other_occurrences
        )
    }
}
