//! Recorded edits and their atomic commit.
//!
//! The editor never touches a variant while it is still asking questions. It
//! records what it decided in an [`EditPlan`], and only a plan that ran to
//! completion is replayed against the variant.

use std::collections::BTreeSet;

use log::{error, info, warn};

use super::rules;
use crate::error::StalePlan;
use crate::models::{Alloc, AllocSet, Timestamp, Variant};

/// Which batch operation produced a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Cut,
    Paste,
}

impl EditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EditKind::Cut => "cut",
            EditKind::Paste => "paste",
        }
    }
}

impl std::fmt::Display for EditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded step of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Insert `alloc` into the variant, re-stamped to `start`.
    AddToTarget { alloc: Alloc, start: Timestamp },
    /// Remove a current member of the variant.
    RemoveFromTarget { alloc: Alloc },
    /// Leave a candidate out of the batch. The variant is not touched.
    RemoveFromBatch { alloc: Alloc },
}

impl Edit {
    /// The alloc as it ends up in the variant, for additions.
    pub fn placed(&self) -> Option<Alloc> {
        match self {
            Edit::AddToTarget { alloc, start } => Some(alloc.with_start(*start)),
            _ => None,
        }
    }
}

/// Result of simulating a cut or paste to completion.
#[derive(Debug, Clone)]
pub struct EditPlan {
    kind: EditKind,
    edits: Vec<Edit>,
    revision: u64,
}

impl EditPlan {
    pub(crate) fn new(kind: EditKind, edits: Vec<Edit>, revision: u64) -> Self {
        Self { kind, edits, revision }
    }

    pub fn kind(&self) -> EditKind {
        self.kind
    }

    /// Edits in the order they will be replayed.
    pub fn edits(&self) -> &[Edit] {
        &self.edits
    }

    /// Variant revision the plan was simulated against.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Allocs that will be inserted, as placed. A candidate replaced by a
    /// later one of the same batch is not listed.
    pub fn added(&self) -> BTreeSet<Alloc> {
        self.net().0
    }

    /// Members of the variant that will be removed, including allocs
    /// displaced by a replacing paste.
    pub fn removed(&self) -> BTreeSet<Alloc> {
        self.net().1
    }

    fn net(&self) -> (BTreeSet<Alloc>, BTreeSet<Alloc>) {
        let mut added = BTreeSet::new();
        let mut removed = BTreeSet::new();
        for edit in &self.edits {
            match edit {
                Edit::AddToTarget { alloc, start } => {
                    added.insert(alloc.with_start(*start));
                }
                Edit::RemoveFromTarget { alloc } => {
                    if !added.remove(alloc) {
                        removed.insert(alloc.clone());
                    }
                }
                Edit::RemoveFromBatch { .. } => {}
            }
        }
        (added, removed)
    }

    /// Candidates the resolver chose to leave out.
    pub fn skipped(&self) -> BTreeSet<Alloc> {
        self.edits
            .iter()
            .filter_map(|e| match e {
                Edit::RemoveFromBatch { alloc } => Some(alloc.clone()),
                _ => None,
            })
            .collect()
    }

    /// Replays the plan against `variant` if it still fits it.
    ///
    /// The plan is first replayed on a copy of the variant's allocs; the
    /// variant is only touched if every planned removal finds its member,
    /// no planned addition is already present, and the outcome passes
    /// [`check_invariants`](rules::check_invariants).
    ///
    /// # Returns
    ///
    /// The removed allocs for a cut, the placed allocs for a paste.
    ///
    /// # Errors
    ///
    /// [`StalePlan`] if the variant's revision moved on or its members no
    /// longer match the plan. The variant is left untouched.
    pub fn commit(self, variant: &mut Variant) -> Result<BTreeSet<Alloc>, StalePlan> {
        if variant.revision() != self.revision {
            return Err(StalePlan::Revision {
                planned: self.revision,
                current: variant.revision(),
            });
        }
        if let Err(stale) = self.verify(variant.allocs()) {
            warn!("Variant '{}': refusing {} plan: {}", variant.name(), self.kind, stale);
            return Err(stale);
        }
        Ok(self.apply(variant))
    }

    /// Dry run of [`apply`](Self::apply) on a copy of `allocs`.
    fn verify(&self, allocs: &AllocSet) -> Result<(), StalePlan> {
        let mut buffer = allocs.clone();
        for edit in &self.edits {
            match edit {
                Edit::AddToTarget { alloc, start } => {
                    let placed = alloc.with_start(*start);
                    if buffer.contains(&placed) {
                        return Err(StalePlan::DuplicateMember(placed));
                    }
                    buffer.insert(placed);
                }
                Edit::RemoveFromTarget { alloc } => {
                    if !buffer.remove(alloc) {
                        return Err(StalePlan::MissingMember(alloc.clone()));
                    }
                }
                Edit::RemoveFromBatch { .. } => {}
            }
        }
        rules::check_invariants(&buffer)?;
        Ok(())
    }

    /// Replays the plan without any checks. Only the editor calls
    /// this, directly after simulating against the same variant.
    pub(crate) fn apply(self, variant: &mut Variant) -> BTreeSet<Alloc> {
        let mut affected = BTreeSet::new();
        let (mut added, mut removed, mut skipped) = (0usize, 0usize, 0usize);

        for edit in self.edits {
            match edit {
                Edit::AddToTarget { alloc, start } => {
                    let placed = alloc.with_start(start);
                    variant.insert_unchecked(placed.clone());
                    if self.kind == EditKind::Paste {
                        affected.insert(placed);
                    }
                    added += 1;
                }
                Edit::RemoveFromTarget { alloc } => {
                    if !variant.remove_unchecked(&alloc) {
                        error!(
                            "Variant '{}': planned removal of {} found no member",
                            variant.name(),
                            alloc
                        );
                        panic!("edit plan out of sync with variant: {alloc} is not a member");
                    }
                    match self.kind {
                        EditKind::Cut => {
                            affected.insert(alloc);
                        }
                        EditKind::Paste => {
                            affected.remove(&alloc);
                        }
                    }
                    removed += 1;
                }
                Edit::RemoveFromBatch { .. } => skipped += 1,
            }
        }

        debug_assert!(
            variant.check_invariants().is_ok(),
            "commit broke variant invariants: {:?}",
            variant.check_invariants()
        );
        info!(
            "Variant '{}': {} committed ({} added, {} removed, {} skipped)",
            variant.name(),
            self.kind,
            added,
            removed,
            skipped
        );
        affected
    }
}
