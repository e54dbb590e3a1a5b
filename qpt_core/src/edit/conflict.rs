//! Conflict taxonomy.
//!
//! Four kinds of conflict can block an edit. None of them is a defect: each
//! carries exactly the context a resolver needs, and the editor routes every
//! one of them to its [`ConflictResolver`](super::ConflictResolver).

use serde::{Deserialize, Serialize};

use crate::models::{Alloc, Timestamp};

/// Why an alloc cannot be added to a set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddConflict {
    /// The set already holds a visit of the same observation starting at the
    /// same step.
    #[error("there is already a visit starting at step {} of {}", .new_alloc.first_step() + 1, .new_alloc.obs())]
    Collision { old_alloc: Alloc, new_alloc: Alloc },

    /// The visit does not start at step 0 and the visit ending on the step
    /// before it is absent.
    #[error("{alloc} requires a predecessor which is not present")]
    MissingPredecessor { alloc: Alloc },

    /// The visit starts before its predecessor ends.
    #[error("{alloc} must start after its predecessor, no earlier than {earliest_start_time}")]
    Ordering {
        alloc: Alloc,
        earliest_start_time: Timestamp,
    },
}

/// Why an alloc cannot be removed from a set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoveConflict {
    /// Removing the visit would leave its successor without a predecessor.
    #[error("{alloc} has a successor and cannot be removed")]
    AbandonedSuccessor { alloc: Alloc },
}

/// Any conflict the editor can hand to a resolver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Conflict {
    #[error(transparent)]
    Add(#[from] AddConflict),
    #[error(transparent)]
    Remove(#[from] RemoveConflict),
}

/// Discriminant of a [`Conflict`], used to key policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictKind {
    Collision,
    MissingPredecessor,
    Ordering,
    AbandonedSuccessor,
}

impl ConflictKind {
    pub const ALL: [ConflictKind; 4] = [
        ConflictKind::Collision,
        ConflictKind::MissingPredecessor,
        ConflictKind::Ordering,
        ConflictKind::AbandonedSuccessor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictKind::Collision => "collision",
            ConflictKind::MissingPredecessor => "missing_predecessor",
            ConflictKind::Ordering => "ordering",
            ConflictKind::AbandonedSuccessor => "abandoned_successor",
        }
    }

    /// Dialog title used when the conflict is presented to a person.
    pub fn title(&self) -> &'static str {
        match self {
            ConflictKind::Collision => "Resolve Collision",
            ConflictKind::MissingPredecessor => "Resolve Missing Predecessor",
            ConflictKind::Ordering => "Resolve Ordering Problem",
            ConflictKind::AbandonedSuccessor => "Resolve Abandoned Successor",
        }
    }

    /// Resolutions that may be chosen for this kind, in presentation order.
    pub fn choices(&self) -> &'static [Resolution] {
        match self {
            ConflictKind::Collision => &[Resolution::Replace, Resolution::Skip, Resolution::Cancel],
            ConflictKind::MissingPredecessor => &[Resolution::Skip, Resolution::Cancel],
            ConflictKind::Ordering => &[Resolution::Move, Resolution::Skip, Resolution::Cancel],
            ConflictKind::AbandonedSuccessor => &[Resolution::Skip, Resolution::Cancel],
        }
    }

    /// The preselected choice.
    pub fn default_choice(&self) -> Resolution {
        self.choices()[0]
    }

    pub fn allows(&self, resolution: Resolution) -> bool {
        self.choices().contains(&resolution)
    }
}

impl std::fmt::Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolver's answer to a conflict.
///
/// Only the choices listed by [`ConflictKind::choices`] are valid for a
/// given conflict; anything else is a programmer error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Remove the colliding alloc and add the new one in its place.
    Replace,
    /// Re-stamp the alloc to the earliest legal start and add it.
    Move,
    /// Leave this alloc out and carry on with the rest.
    Skip,
    /// Abandon the whole operation.
    Cancel,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Replace => "replace",
            Resolution::Move => "move",
            Resolution::Skip => "skip",
            Resolution::Cancel => "cancel",
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AddConflict {
    pub fn kind(&self) -> ConflictKind {
        match self {
            AddConflict::Collision { .. } => ConflictKind::Collision,
            AddConflict::MissingPredecessor { .. } => ConflictKind::MissingPredecessor,
            AddConflict::Ordering { .. } => ConflictKind::Ordering,
        }
    }

    /// The alloc being added.
    pub fn alloc(&self) -> &Alloc {
        match self {
            AddConflict::Collision { new_alloc, .. } => new_alloc,
            AddConflict::MissingPredecessor { alloc } => alloc,
            AddConflict::Ordering { alloc, .. } => alloc,
        }
    }
}

impl RemoveConflict {
    pub fn kind(&self) -> ConflictKind {
        ConflictKind::AbandonedSuccessor
    }

    pub fn alloc(&self) -> &Alloc {
        match self {
            RemoveConflict::AbandonedSuccessor { alloc } => alloc,
        }
    }
}

impl Conflict {
    pub fn kind(&self) -> ConflictKind {
        match self {
            Conflict::Add(c) => c.kind(),
            Conflict::Remove(c) => c.kind(),
        }
    }

    /// The alloc the conflict is about.
    pub fn alloc(&self) -> &Alloc {
        match self {
            Conflict::Add(c) => c.alloc(),
            Conflict::Remove(c) => c.alloc(),
        }
    }

    pub fn choices(&self) -> &'static [Resolution] {
        self.kind().choices()
    }

    pub fn default_choice(&self) -> Resolution {
        self.kind().default_choice()
    }
}
