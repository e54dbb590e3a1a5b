//! Transactional cut and paste.
//!
//! [`VariantEditor`] simulates a batch edit against a private copy of the
//! variant's allocs, asking its [`ConflictResolver`] whenever the next step
//! would break an invariant. A cancelled simulation is simply dropped; a
//! completed one is an [`EditPlan`] that replays onto the variant in one go.
//!
//! Cut walks the selection from the latest alloc to the earliest so that a
//! selected successor leaves before its predecessor is examined. Paste walks
//! the candidates from earliest to latest so that a predecessor is in place
//! before its successor is examined.

use std::collections::BTreeSet;

use log::{debug, error, info, warn};

use super::conflict::{AddConflict, Conflict, RemoveConflict, Resolution};
use super::plan::{Edit, EditKind, EditPlan};
use super::resolver::ConflictResolver;
use super::rules;
use crate::error::Cancelled;
use crate::models::{Alloc, AllocSet, Timestamp, Variant};

/// Batch editor for a [`Variant`].
///
/// The editor holds its resolver across operations, so stateful resolvers
/// such as [`ApplyToAll`](super::ApplyToAll) keep their memory until the
/// caller resets them through [`VariantEditor::resolver_mut`].
#[derive(Debug, Clone)]
pub struct VariantEditor<R> {
    resolver: R,
}

impl<R: ConflictResolver> VariantEditor<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut R {
        &mut self.resolver
    }

    pub fn into_resolver(self) -> R {
        self.resolver
    }

    // ==================== Cut ====================

    /// Removes the selected allocs from `variant`.
    ///
    /// # Arguments
    ///
    /// * `variant` - Variant to edit
    /// * `selection` - Allocs to remove; allocs that are not members are ignored
    ///
    /// # Returns
    ///
    /// The allocs actually removed, in natural order. Allocs whose removal
    /// would abandon an unselected successor are skipped when the resolver
    /// says so.
    ///
    /// # Errors
    ///
    /// [`Cancelled`] if the resolver cancels; `variant` is then unchanged.
    pub fn cut(
        &mut self,
        variant: &mut Variant,
        selection: impl IntoIterator<Item = Alloc>,
    ) -> Result<BTreeSet<Alloc>, Cancelled> {
        let plan = self.plan_cut(variant, selection)?;
        Ok(plan.apply(variant))
    }

    /// Simulates a cut without touching `variant`.
    pub fn plan_cut(
        &mut self,
        variant: &Variant,
        selection: impl IntoIterator<Item = Alloc>,
    ) -> Result<EditPlan, Cancelled> {
        let selection: BTreeSet<Alloc> = selection.into_iter().collect();
        let mut buffer = variant.allocs().clone();
        let mut edits = Vec::with_capacity(selection.len());

        for alloc in selection.into_iter().rev() {
            if !buffer.contains(&alloc) {
                warn!("Variant '{}': {} is not a member, ignoring it", variant.name(), alloc);
                continue;
            }
            match rules::try_remove(&buffer, &alloc) {
                Ok(()) => {
                    buffer.remove(&alloc);
                    edits.push(Edit::RemoveFromTarget { alloc });
                }
                Err(conflict) => {
                    let conflict = Conflict::from(conflict);
                    match self.ask(variant, EditKind::Cut, &conflict)? {
                        Resolution::Skip => edits.push(Edit::RemoveFromBatch { alloc }),
                        other => unreachable!("{other} accepted for {conflict}"),
                    }
                }
            }
        }

        Ok(EditPlan::new(EditKind::Cut, edits, variant.revision()))
    }

    // ==================== Paste ====================

    /// Adds `candidates` to `variant`.
    ///
    /// # Arguments
    ///
    /// * `variant` - Variant to edit
    /// * `candidates` - Allocs to add; duplicates collapse
    ///
    /// # Returns
    ///
    /// The allocs actually added, in natural order, with any start time
    /// adjustment applied. Members displaced by a replacement are not part of
    /// the result.
    ///
    /// # Errors
    ///
    /// [`Cancelled`] if the resolver cancels; `variant` is then unchanged.
    pub fn paste(
        &mut self,
        variant: &mut Variant,
        candidates: impl IntoIterator<Item = Alloc>,
    ) -> Result<BTreeSet<Alloc>, Cancelled> {
        let plan = self.plan_paste(variant, candidates)?;
        Ok(plan.apply(variant))
    }

    /// Simulates a paste without touching `variant`.
    pub fn plan_paste(
        &mut self,
        variant: &Variant,
        candidates: impl IntoIterator<Item = Alloc>,
    ) -> Result<EditPlan, Cancelled> {
        let candidates: BTreeSet<Alloc> = candidates.into_iter().collect();
        let mut buffer = variant.allocs().clone();
        let mut staged = Vec::with_capacity(candidates.len());

        for alloc in candidates {
            staged.push(self.stage_paste(variant, &mut buffer, alloc)?);
        }
        self.settle_paste(variant, &mut buffer, &mut staged)?;

        let mut edits = Vec::with_capacity(staged.len());
        for candidate in staged {
            candidate.into_edits(&mut edits);
        }
        Ok(EditPlan::new(EditKind::Paste, edits, variant.revision()))
    }

    /// Settles one candidate: asks until it can be added, is skipped, or the
    /// whole paste is cancelled.
    ///
    /// A replacement is only checked against its own predecessor here. The
    /// replaced member's successor may still be replaced by a later candidate,
    /// so it is judged in [`settle_paste`](Self::settle_paste).
    fn stage_paste(
        &mut self,
        variant: &Variant,
        buffer: &mut AllocSet,
        alloc: Alloc,
    ) -> Result<Staged, Cancelled> {
        let mut start = alloc.start();
        let mut replacing: Option<Alloc> = None;

        loop {
            let candidate = alloc.with_start(start);
            let outcome = match &replacing {
                None => rules::try_add(buffer, &candidate),
                Some(_) => rules::check_predecessor(buffer, &candidate),
            };

            let conflict = match outcome {
                Ok(()) => {
                    if let Some(old) = &replacing {
                        buffer.remove(old);
                    }
                    buffer.insert(candidate);
                    return Ok(Staged {
                        alloc,
                        placement: Some(Placement {
                            start,
                            replaced: replacing,
                        }),
                    });
                }
                Err(conflict) => Conflict::from(conflict),
            };

            match (self.ask(variant, EditKind::Paste, &conflict)?, &conflict) {
                (Resolution::Skip, _) => return Ok(Staged { alloc, placement: None }),
                (Resolution::Replace, Conflict::Add(AddConflict::Collision { old_alloc, .. })) => {
                    replacing = Some(old_alloc.clone());
                }
                (
                    Resolution::Move,
                    Conflict::Add(AddConflict::Ordering {
                        earliest_start_time, ..
                    }),
                ) => {
                    start = *earliest_start_time;
                }
                (other, _) => unreachable!("{other} accepted for {conflict}"),
            }
        }
    }

    /// Asks about whatever the batch as a whole leaves broken, until the
    /// buffer passes [`rules::check_invariants`].
    ///
    /// A staged candidate that no longer follows its predecessor gets its own
    /// conflict again. A member the batch did not touch can only be broken by
    /// the replacement of its predecessor, which is raised as an abandoned
    /// successor of the replaced alloc; Skip undoes that replacement.
    fn settle_paste(
        &mut self,
        variant: &Variant,
        buffer: &mut AllocSet,
        staged: &mut [Staged],
    ) -> Result<(), Cancelled> {
        while let Err(broken) = rules::check_invariants(buffer) {
            let alloc = broken.alloc().clone();

            if let Some(index) = staged.iter().rposition(|s| s.placed().as_ref() == Some(&alloc)) {
                let conflict = Conflict::from(broken);
                match (self.ask(variant, EditKind::Paste, &conflict)?, &conflict) {
                    (Resolution::Skip, _) => staged[index].revert(buffer),
                    (
                        Resolution::Move,
                        Conflict::Add(AddConflict::Ordering {
                            earliest_start_time, ..
                        }),
                    ) => staged[index].restamp(buffer, *earliest_start_time),
                    (other, _) => unreachable!("{other} accepted for {conflict}"),
                }
                continue;
            }

            // Closest live replacement below the broken member.
            let culprit = staged
                .iter()
                .enumerate()
                .filter_map(|(index, s)| {
                    let placed = s.placed()?;
                    let old = s.replaced()?;
                    let below =
                        placed.obs() == alloc.obs() && placed.first_step() < alloc.first_step();
                    (below && buffer.contains(&placed))
                        .then(|| (index, placed.first_step(), old.clone()))
                })
                .max_by_key(|(_, first_step, _)| *first_step);
            let Some((index, _, old)) = culprit else {
                error!("Variant '{}': no staged replacement explains {}", variant.name(), broken);
                panic!("paste simulation left {alloc} inconsistent");
            };

            let conflict = Conflict::from(RemoveConflict::AbandonedSuccessor { alloc: old });
            match self.ask(variant, EditKind::Paste, &conflict)? {
                Resolution::Skip => staged[index].revert(buffer),
                other => unreachable!("{other} accepted for {conflict}"),
            }
        }
        Ok(())
    }

    // ==================== Resolution ====================

    /// Hands `conflict` to the resolver and checks the answer.
    ///
    /// # Panics
    ///
    /// If the resolver picks a resolution the conflict does not offer.
    fn ask(
        &mut self,
        variant: &Variant,
        kind: EditKind,
        conflict: &Conflict,
    ) -> Result<Resolution, Cancelled> {
        let resolution = self.resolver.resolve(conflict);
        let conflict_kind = conflict.kind();
        if !conflict_kind.allows(resolution) {
            error!(
                "Resolver answered {} to a {} conflict; valid choices are {:?}",
                resolution,
                conflict_kind,
                conflict_kind.choices()
            );
            panic!("invalid resolution {resolution} for {conflict_kind} conflict");
        }
        debug!("Variant '{}': {} conflict: {} -> {}", variant.name(), kind, conflict, resolution);

        if resolution == Resolution::Cancel {
            info!("Variant '{}': {} cancelled at {}", variant.name(), kind, conflict.alloc());
            return Err(Cancelled);
        }
        Ok(resolution)
    }
}

/// One paste candidate as the simulation left it.
#[derive(Debug)]
struct Staged {
    alloc: Alloc,
    placement: Option<Placement>,
}

#[derive(Debug)]
struct Placement {
    start: Timestamp,
    replaced: Option<Alloc>,
}

impl Staged {
    fn placed(&self) -> Option<Alloc> {
        self.placement.as_ref().map(|p| self.alloc.with_start(p.start))
    }

    fn replaced(&self) -> Option<&Alloc> {
        self.placement.as_ref().and_then(|p| p.replaced.as_ref())
    }

    /// Takes the candidate back out of `buffer` and restores the member it
    /// replaced.
    fn revert(&mut self, buffer: &mut AllocSet) {
        if let Some(placed) = self.placed() {
            buffer.remove(&placed);
        }
        if let Some(Placement {
            replaced: Some(old), ..
        }) = self.placement.take()
        {
            buffer.insert(old);
        }
    }

    fn restamp(&mut self, buffer: &mut AllocSet, start: Timestamp) {
        if let Some(placed) = self.placed() {
            buffer.remove(&placed);
            buffer.insert(placed.with_start(start));
        }
        if let Some(placement) = self.placement.as_mut() {
            placement.start = start;
        }
    }

    fn into_edits(self, edits: &mut Vec<Edit>) {
        match self.placement {
            None => edits.push(Edit::RemoveFromBatch { alloc: self.alloc }),
            Some(Placement { start, replaced }) => {
                if let Some(old) = replaced {
                    edits.push(Edit::RemoveFromTarget { alloc: old });
                }
                edits.push(Edit::AddToTarget {
                    alloc: self.alloc,
                    start,
                });
            }
        }
    }
}
