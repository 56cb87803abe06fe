//! Classification of single-position label edits.
//!
//! An edit at position `p` can only change entity membership at `p` and in the
//! entities immediately to its left and right. [`EditKind`] names every way
//! those three can interact. It is computed once per edit from the neighbor
//! structure as it was before the edit, then matched on to perform the update.

use super::{EntityId, EntityIndex};
use crate::labels::Label;
use crate::{Error, Result};
use std::fmt;

/// Which end of an entity loses a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// The first token is removed and the entity starts one position later.
    Front,
    /// The last token is removed.
    Back,
}

/// Structural effect of relabeling one position.
///
/// Variants are listed in classification priority: the first that applies
/// wins. Entity handles refer to the entities as they were before the edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    /// A neighbor with the new label already shared its entity with the position.
    NoChange,
    /// The position now bridges two distinct entities of its new label.
    Join {
        /// Entity ending just before the position.
        left: EntityId,
        /// Entity starting just after the position.
        right: EntityId,
    },
    /// The position was interior to `entity`, which is cut in two.
    Split {
        /// Entity spanning both neighbors.
        entity: EntityId,
    },
    /// The position becomes the new first token of the entity to its right.
    Prepend {
        /// Entity starting just after the position.
        right: EntityId,
        /// Entity to the left that used to end at the position, now one shorter.
        trim: Option<EntityId>,
    },
    /// The position becomes the new last token of the entity to its left.
    Append {
        /// Entity ending just before the position.
        left: EntityId,
        /// Entity to the right that used to start at the position, now one shorter.
        trim: Option<EntityId>,
    },
    /// The position becomes a one-token entity.
    Singleton {
        /// Neighbor entity the position used to belong to, and the end it loses.
        trim: Option<(EntityId, Side)>,
    },
    /// The position turns background and shrinks the entity it was the edge of.
    Shrink {
        /// The shrinking entity.
        entity: EntityId,
        /// End that loses the position.
        side: Side,
    },
    /// The position turns background without touching any other entity.
    Clear,
}

impl EditKind {
    /// Short lowercase name, stable for logging and test output.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            EditKind::NoChange => "no-change",
            EditKind::Join { .. } => "join",
            EditKind::Split { .. } => "split",
            EditKind::Prepend { .. } => "prepend",
            EditKind::Append { .. } => "append",
            EditKind::Singleton { .. } => "singleton",
            EditKind::Shrink { .. } => "shrink",
            EditKind::Clear => "clear",
        }
    }
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditKind::Prepend { trim: Some(e), .. } | EditKind::Append { trim: Some(e), .. } => {
                write!(f, "{} (trimming {})", self.name(), e)
            }
            EditKind::Singleton {
                trim: Some((e, side)),
            }
            | EditKind::Shrink { entity: e, side } => {
                write!(f, "{} (trimming {:?} of {})", self.name(), side, e)
            }
            _ => f.write_str(self.name()),
        }
    }
}

/// Label and entity handle of a neighboring position.
#[derive(Debug, Clone, Copy)]
struct Neighbor {
    position: usize,
    label: Label,
    id: Option<EntityId>,
}

impl<'d> EntityIndex<'d> {
    fn neighbor(&self, position: usize) -> Neighbor {
        Neighbor {
            position,
            label: self.labels[position],
            id: self.at[position],
        }
    }

    /// Entity handle a non-background neighbor must carry.
    fn expect_id(&self, neighbor: Neighbor) -> Result<EntityId> {
        neighbor.id.ok_or_else(|| {
            Error::inconsistent(format!(
                "position {} has label {} but no entity",
                neighbor.position, neighbor.label
            ))
        })
    }

    /// Left neighbor's entity, if it extends over `position`.
    fn overlapping_left(&self, left: Option<Neighbor>, position: usize) -> Result<Option<EntityId>> {
        match left {
            Some(n) if n.label != self.background => {
                let id = self.expect_id(n)?;
                Ok((self.get(id)?.end() > position).then_some(id))
            }
            _ => Ok(None),
        }
    }

    /// Right neighbor's entity, if it extends over `position`.
    fn overlapping_right(
        &self,
        right: Option<Neighbor>,
        position: usize,
    ) -> Result<Option<EntityId>> {
        match right {
            Some(n) if n.label != self.background => {
                let id = self.expect_id(n)?;
                Ok((self.get(id)?.start() <= position).then_some(id))
            }
            _ => Ok(None),
        }
    }

    /// Classify the edit at `position`.
    ///
    /// `self.labels[position]` must already hold the new label while every
    /// entity handle still describes the state before the edit.
    pub(super) fn classify(&self, position: usize) -> Result<EditKind> {
        let label = self.labels[position];
        let here = self.at[position];
        let background = self.background;
        let left = position.checked_sub(1).map(|q| self.neighbor(q));
        let right = (position + 1 < self.labels.len()).then(|| self.neighbor(position + 1));

        if left
            .iter()
            .chain(right.iter())
            .any(|n| n.label == label && n.id == here)
        {
            return Ok(EditKind::NoChange);
        }

        if let (Some(l), Some(r)) = (left, right) {
            if label != background && l.label == label && r.label == label {
                let (left_id, right_id) = (self.expect_id(l)?, self.expect_id(r)?);
                if left_id == right_id {
                    return Err(Error::inconsistent(format!(
                        "neighbors of {} share {} but the position does not",
                        position, left_id
                    )));
                }
                return Ok(EditKind::Join {
                    left: left_id,
                    right: right_id,
                });
            }
            if let (Some(a), Some(b)) = (l.id, r.id) {
                if a == b {
                    return Ok(EditKind::Split { entity: a });
                }
            }
        }

        if let Some(r) = right {
            if let (Some(right_id), true) = (r.id, r.label == label) {
                return Ok(EditKind::Prepend {
                    right: right_id,
                    trim: self.overlapping_left(left, position)?,
                });
            }
        }

        if let Some(l) = left {
            if let (Some(left_id), true) = (l.id, l.label == label) {
                if self.get(left_id)?.end() == position {
                    return Ok(EditKind::Append {
                        left: left_id,
                        trim: self.overlapping_right(right, position)?,
                    });
                }
            }
        }

        let trailing = self.overlapping_left(left, position)?;
        let leading = self.overlapping_right(right, position)?;

        if label != background
            && left.map_or(true, |n| n.label != label)
            && right.map_or(true, |n| n.label != label)
        {
            let trim = trailing
                .map(|id| (id, Side::Back))
                .or_else(|| leading.map(|id| (id, Side::Front)));
            return Ok(EditKind::Singleton { trim });
        }

        if let Some(entity) = trailing {
            return Ok(EditKind::Shrink {
                entity,
                side: Side::Back,
            });
        }
        if let Some(entity) = leading {
            return Ok(EditKind::Shrink {
                entity,
                side: Side::Front,
            });
        }
        Ok(EditKind::Clear)
    }
}
