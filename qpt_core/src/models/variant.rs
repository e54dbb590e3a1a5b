//! One candidate schedule for a night.
//!
//! A [`Variant`] owns an [`AllocSet`] and guarantees, in every state a caller
//! can observe, that its allocs are collision free, that every continuation
//! has its predecessor, and that no continuation starts before its
//! predecessor ends. Single-item mutations here validate before touching the
//! set; batch edits go through [`VariantEditor`](crate::edit::VariantEditor).

use std::sync::Arc;

use chrono::Duration;
use log::debug;

use super::alloc::{Alloc, SetupType, Timestamp};
use super::alloc_set::AllocSet;
use super::obs::{Obs, ObsId};
use super::snapshot::{AllocSnapshot, VariantSnapshot};
use crate::edit::{rules, AddConflict};
use crate::error::{VariantError, VariantResult};

#[derive(Debug, Clone)]
pub struct Variant {
    name: String,
    comment: String,
    allocs: AllocSet,
    revision: u64,
}

impl Variant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: String::new(),
            allocs: AllocSet::new(),
            revision: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    /// Counter bumped by every alloc mutation. Name and comment changes do
    /// not count.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    pub fn allocs(&self) -> &AllocSet {
        &self.allocs
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Alloc> + ExactSizeIterator {
        self.allocs.iter()
    }

    pub fn len(&self) -> usize {
        self.allocs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allocs.is_empty()
    }

    pub fn contains(&self, alloc: &Alloc) -> bool {
        self.allocs.contains(alloc)
    }

    pub fn allocs_for_obs<'a>(&'a self, obs: &ObsId) -> impl Iterator<Item = &'a Alloc> + 'a {
        self.allocs.for_obs(obs)
    }

    pub fn predecessor(&self, alloc: &Alloc) -> Option<&Alloc> {
        self.allocs.predecessor_of(alloc)
    }

    pub fn successor(&self, alloc: &Alloc) -> Option<&Alloc> {
        self.allocs.successor_of(alloc)
    }

    /// Neighbour before `alloc` in natural order, of any observation.
    pub fn previous(&self, alloc: &Alloc) -> Option<&Alloc> {
        self.allocs.previous(alloc)
    }

    /// Neighbour after `alloc` in natural order, of any observation.
    pub fn next(&self, alloc: &Alloc) -> Option<&Alloc> {
        self.allocs.next(alloc)
    }

    /// Start of the earliest visit, or `None` for an empty variant.
    pub fn start(&self) -> Option<Timestamp> {
        self.allocs.first().map(Alloc::start)
    }

    /// End of the latest-starting visit, or `None` for an empty variant.
    pub fn end(&self) -> Option<Timestamp> {
        self.allocs.last().map(Alloc::end)
    }

    pub fn span(&self) -> Option<Duration> {
        Some(self.end()? - self.start()?)
    }

    pub fn check_invariants(&self) -> Result<(), AddConflict> {
        rules::check_invariants(&self.allocs)
    }

    /// Clamps `proposed` so that a visit of `length` placed there stays
    /// after `alloc`'s predecessor and before its successor. The successor
    /// bound wins when both cannot be met.
    pub fn constrain_start_time(&self, alloc: &Alloc, proposed: Timestamp, length: Duration) -> Timestamp {
        let mut start = proposed;
        if let Some(pred) = self.predecessor(alloc) {
            start = start.max(pred.end());
        }
        if let Some(succ) = self.successor(alloc) {
            start = start.min(succ.start() - length);
        }
        start
    }

    pub fn snapshot(&self) -> VariantSnapshot {
        VariantSnapshot {
            name: self.name.clone(),
            comment: self.comment.clone(),
            allocs: self.allocs.iter().map(AllocSnapshot::from).collect(),
        }
    }

    // ------------------------------------------------------------------
    // Validated single-item mutations
    // ------------------------------------------------------------------

    /// Builds a visit and adds it.
    pub fn add_alloc(
        &mut self,
        obs: Arc<Obs>,
        start: Timestamp,
        first_step: usize,
        last_step: usize,
        setup_type: SetupType,
        comment: impl Into<String>,
    ) -> VariantResult<Alloc> {
        let alloc = Alloc::new(obs, start, first_step, last_step, setup_type, comment)?;
        self.add(alloc.clone())?;
        Ok(alloc)
    }

    /// Adds `alloc` if no invariant would break.
    pub fn add(&mut self, alloc: Alloc) -> VariantResult<()> {
        rules::try_add(&self.allocs, &alloc)?;
        debug!("Variant '{}': adding {}", self.name, alloc);
        self.insert_unchecked(alloc);
        Ok(())
    }

    /// Removes `alloc` unless it has a successor.
    pub fn remove_alloc(&mut self, alloc: &Alloc) -> VariantResult<()> {
        if !self.contains(alloc) {
            return Err(VariantError::NotFound(alloc.clone()));
        }
        rules::try_remove(&self.allocs, alloc)?;
        debug!("Variant '{}': removing {}", self.name, alloc);
        self.remove_unchecked(alloc);
        Ok(())
    }

    /// Re-stamps a member to `new_start`.
    pub fn move_alloc(&mut self, alloc: &Alloc, new_start: Timestamp) -> VariantResult<Alloc> {
        self.move_alloc_with_setup(alloc, new_start, alloc.setup_type())
    }

    /// Re-stamps a member to `new_start` with a new setup type. The moved
    /// visit must still start after its predecessor ends and end before its
    /// successor starts.
    pub fn move_alloc_with_setup(
        &mut self,
        alloc: &Alloc,
        new_start: Timestamp,
        setup_type: SetupType,
    ) -> VariantResult<Alloc> {
        if !self.contains(alloc) {
            return Err(VariantError::NotFound(alloc.clone()));
        }
        let moved = alloc.with_setup_type(setup_type).with_start(new_start);
        if let Some(pred) = self.predecessor(alloc) {
            if moved.start() < pred.end() {
                return Err(AddConflict::Ordering {
                    alloc: moved,
                    earliest_start_time: pred.end(),
                }
                .into());
            }
        }
        if let Some(succ) = self.successor(alloc) {
            if succ.start() < moved.end() {
                return Err(VariantError::SuccessorOrdering {
                    latest_end_time: succ.start(),
                    alloc: moved,
                });
            }
        }
        self.replace_unchecked(alloc, moved.clone());
        Ok(moved)
    }

    /// Cycles a member's setup: none to full, full to reacquisition (or to
    /// none when the observation has no reacquisition time), reacquisition to
    /// none. The science steps keep their place on the timeline where the
    /// neighbours allow it.
    pub fn toggle_setup_time(&mut self, alloc: &Alloc) -> VariantResult<Alloc> {
        let steps = &alloc.obs().steps;
        let full = steps.setup_time;
        let reacq = steps.reacquisition_time;
        let (start, setup) = match alloc.setup_type() {
            SetupType::None => (
                self.constrain_start_time(alloc, alloc.start() - full, alloc.length() + full),
                SetupType::Full,
            ),
            SetupType::Full if reacq > Duration::zero() => (
                self.constrain_start_time(
                    alloc,
                    alloc.start() + full - reacq,
                    alloc.length() - full + reacq,
                ),
                SetupType::Reacquisition,
            ),
            SetupType::Full => (
                self.constrain_start_time(alloc, alloc.start() + full, alloc.length() - full),
                SetupType::None,
            ),
            SetupType::Reacquisition => (alloc.start() + reacq, SetupType::None),
        };
        self.move_alloc_with_setup(alloc, start, setup)
    }

    /// Replaces a member's comment.
    pub fn set_alloc_comment(&mut self, alloc: &Alloc, comment: impl Into<String>) -> VariantResult<Alloc> {
        if !self.contains(alloc) {
            return Err(VariantError::NotFound(alloc.clone()));
        }
        let updated = alloc.with_comment(comment);
        self.replace_unchecked(alloc, updated.clone());
        Ok(updated)
    }

    /// Moves every visit by `offset`. A uniform shift keeps every invariant.
    pub fn shift_all(&mut self, offset: Duration) {
        if self.allocs.is_empty() {
            return;
        }
        self.allocs = self.allocs.iter().map(|a| a.with_start(a.start() + offset)).collect();
        self.revision += 1;
    }

    // ------------------------------------------------------------------
    // Commit primitives for the editor; the caller has already validated.
    // ------------------------------------------------------------------

    pub(crate) fn insert_unchecked(&mut self, alloc: Alloc) {
        self.allocs.insert(alloc);
        self.revision += 1;
    }

    pub(crate) fn remove_unchecked(&mut self, alloc: &Alloc) -> bool {
        let removed = self.allocs.remove(alloc);
        if removed {
            self.revision += 1;
        }
        removed
    }

    fn replace_unchecked(&mut self, old: &Alloc, new: Alloc) {
        self.allocs.remove(old);
        self.allocs.insert(new);
        self.revision += 1;
    }
}
