//! Pure invariant checks.
//!
//! Every function here inspects an explicit [`AllocSet`] and never mutates
//! it, so the editor can run them repeatedly against its simulation buffer.

use crate::models::{Alloc, AllocSet};

use super::conflict::{AddConflict, RemoveConflict};

/// Checks whether `candidate` may be inserted into `target`.
///
/// Checks run in order: collision on the `(obs, first_step)` slot, presence
/// of the predecessor, then the predecessor's end time.
pub fn try_add(target: &AllocSet, candidate: &Alloc) -> Result<(), AddConflict> {
    if let Some(old) = target.slot(candidate) {
        return Err(AddConflict::Collision {
            old_alloc: old.clone(),
            new_alloc: candidate.clone(),
        });
    }
    check_predecessor(target, candidate)
}

/// Checks whether `alloc` may be removed from `target`: no member may be its
/// successor.
pub fn try_remove(target: &AllocSet, alloc: &Alloc) -> Result<(), RemoveConflict> {
    match target.successor_of(alloc) {
        Some(_) => Err(RemoveConflict::AbandonedSuccessor {
            alloc: alloc.clone(),
        }),
        None => Ok(()),
    }
}

/// Verifies every invariant of a committed variant over the whole set and
/// reports the first violation in natural order.
pub fn check_invariants(set: &AllocSet) -> Result<(), AddConflict> {
    for alloc in set {
        if let Some(other) = set
            .for_obs(&alloc.obs().id)
            .find(|o| *o != alloc && o.same_slot(alloc))
        {
            return Err(AddConflict::Collision {
                old_alloc: other.clone(),
                new_alloc: alloc.clone(),
            });
        }
        check_predecessor(set, alloc)?;
    }
    Ok(())
}

/// Checks that `candidate` follows its predecessor in `target`: present
/// unless the candidate starts at step zero, and ended by the time the
/// candidate starts.
///
/// Used on its own when `candidate` replaces the member in its slot.
pub fn check_predecessor(target: &AllocSet, candidate: &Alloc) -> Result<(), AddConflict> {
    if candidate.first_step() == 0 {
        return Ok(());
    }
    match target.predecessor_of(candidate) {
        None => Err(AddConflict::MissingPredecessor {
            alloc: candidate.clone(),
        }),
        Some(pred) if candidate.start() < pred.end() => Err(AddConflict::Ordering {
            alloc: candidate.clone(),
            earliest_start_time: pred.end(),
        }),
        Some(_) => Ok(()),
    }
}
