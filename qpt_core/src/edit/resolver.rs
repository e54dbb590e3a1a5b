//! Conflict resolution contract.
//!
//! The editor does not know whether a person is being asked or a policy is
//! being applied: it hands each [`Conflict`] to a [`ConflictResolver`] and
//! receives one of the [`Resolution`]s that conflict offers.

use std::collections::HashMap;

use log::debug;

use super::conflict::{Conflict, ConflictKind, Resolution};
use crate::error::ConfigError;

/// Turns a conflict into one of its offered resolutions.
///
/// Returning a resolution outside [`Conflict::choices`] is a programmer error
/// and makes the editor panic.
pub trait ConflictResolver {
    fn resolve(&mut self, conflict: &Conflict) -> Resolution;
}

impl<F> ConflictResolver for F
where
    F: FnMut(&Conflict) -> Resolution,
{
    fn resolve(&mut self, conflict: &Conflict) -> Resolution {
        self(conflict)
    }
}

/// Answers every conflict of a kind the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyResolver {
    collision: Resolution,
    missing_predecessor: Resolution,
    ordering: Resolution,
    abandoned_successor: Resolution,
}

impl Default for PolicyResolver {
    /// The preselected choice of each kind: replace on collision, move on
    /// ordering, skip otherwise.
    fn default() -> Self {
        Self {
            collision: ConflictKind::Collision.default_choice(),
            missing_predecessor: ConflictKind::MissingPredecessor.default_choice(),
            ordering: ConflictKind::Ordering.default_choice(),
            abandoned_successor: ConflictKind::AbandonedSuccessor.default_choice(),
        }
    }
}

impl PolicyResolver {
    /// Builds a policy, rejecting resolutions a kind does not offer.
    pub fn new(
        collision: Resolution,
        missing_predecessor: Resolution,
        ordering: Resolution,
        abandoned_successor: Resolution,
    ) -> Result<Self, ConfigError> {
        let mut policy = Self::default();
        policy.set(ConflictKind::Collision, collision)?;
        policy.set(ConflictKind::MissingPredecessor, missing_predecessor)?;
        policy.set(ConflictKind::Ordering, ordering)?;
        policy.set(ConflictKind::AbandonedSuccessor, abandoned_successor)?;
        Ok(policy)
    }

    /// Leaves every conflicting alloc out.
    pub fn skip_all() -> Self {
        Self::uniform(Resolution::Skip)
    }

    /// Cancels at the first conflict.
    pub fn cancel_all() -> Self {
        Self::uniform(Resolution::Cancel)
    }

    fn uniform(resolution: Resolution) -> Self {
        Self {
            collision: resolution,
            missing_predecessor: resolution,
            ordering: resolution,
            abandoned_successor: resolution,
        }
    }

    pub fn set(&mut self, kind: ConflictKind, resolution: Resolution) -> Result<(), ConfigError> {
        if !kind.allows(resolution) {
            return Err(ConfigError::InvalidPolicy { kind, resolution });
        }
        *self.slot_mut(kind) = resolution;
        Ok(())
    }

    pub fn policy(&self, kind: ConflictKind) -> Resolution {
        match kind {
            ConflictKind::Collision => self.collision,
            ConflictKind::MissingPredecessor => self.missing_predecessor,
            ConflictKind::Ordering => self.ordering,
            ConflictKind::AbandonedSuccessor => self.abandoned_successor,
        }
    }

    fn slot_mut(&mut self, kind: ConflictKind) -> &mut Resolution {
        match kind {
            ConflictKind::Collision => &mut self.collision,
            ConflictKind::MissingPredecessor => &mut self.missing_predecessor,
            ConflictKind::Ordering => &mut self.ordering,
            ConflictKind::AbandonedSuccessor => &mut self.abandoned_successor,
        }
    }
}

impl ConflictResolver for PolicyResolver {
    fn resolve(&mut self, conflict: &Conflict) -> Resolution {
        self.policy(conflict.kind())
    }
}

/// Asks the wrapped resolver once per conflict kind and repeats that answer
/// for every later conflict of the same kind ("apply to all").
///
/// The memory lasts as long as the wrapper; call [`ApplyToAll::forget`]
/// between unrelated operations.
#[derive(Debug, Clone)]
pub struct ApplyToAll<R> {
    inner: R,
    remembered: HashMap<ConflictKind, Resolution>,
}

impl<R: ConflictResolver> ApplyToAll<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            remembered: HashMap::new(),
        }
    }

    pub fn remembered(&self, kind: ConflictKind) -> Option<Resolution> {
        self.remembered.get(&kind).copied()
    }

    pub fn forget(&mut self) {
        self.remembered.clear();
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: ConflictResolver> ConflictResolver for ApplyToAll<R> {
    fn resolve(&mut self, conflict: &Conflict) -> Resolution {
        let kind = conflict.kind();
        if let Some(resolution) = self.remembered.get(&kind) {
            debug!("Applying remembered {} to {} conflict", resolution, kind);
            return *resolution;
        }
        let resolution = self.inner.resolve(conflict);
        self.remembered.insert(kind, resolution);
        resolution
    }
}
