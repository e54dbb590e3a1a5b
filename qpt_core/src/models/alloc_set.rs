//! Ordered alloc storage with a per-observation index.
//!
//! [`AllocSet`] backs both a variant's live allocs and the editor's
//! simulation buffer. Iteration follows natural order; slot, predecessor and
//! successor lookups only scan the allocs of one observation.

use std::collections::{BTreeSet, HashMap};

use super::alloc::Alloc;
use super::obs::ObsId;

#[derive(Debug, Clone, Default)]
pub struct AllocSet {
    ordered: BTreeSet<Alloc>,
    by_obs: HashMap<ObsId, BTreeSet<Alloc>>,
}

impl AllocSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn contains(&self, alloc: &Alloc) -> bool {
        self.ordered.contains(alloc)
    }

    /// Inserts `alloc`. No invariant is checked here; callers validate first.
    pub fn insert(&mut self, alloc: Alloc) -> bool {
        if !self.ordered.insert(alloc.clone()) {
            return false;
        }
        self.by_obs
            .entry(alloc.obs().id.clone())
            .or_default()
            .insert(alloc);
        true
    }

    pub fn remove(&mut self, alloc: &Alloc) -> bool {
        if !self.ordered.remove(alloc) {
            return false;
        }
        let id = &alloc.obs().id;
        if let Some(members) = self.by_obs.get_mut(id) {
            members.remove(alloc);
            if members.is_empty() {
                self.by_obs.remove(id);
            }
        }
        true
    }

    /// Allocs in natural order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Alloc> + ExactSizeIterator {
        self.ordered.iter()
    }

    pub fn first(&self) -> Option<&Alloc> {
        self.ordered.first()
    }

    pub fn last(&self) -> Option<&Alloc> {
        self.ordered.last()
    }

    /// Allocs of one observation, in natural order.
    pub fn for_obs<'a>(&'a self, obs: &ObsId) -> impl Iterator<Item = &'a Alloc> + 'a {
        self.by_obs.get(obs).into_iter().flat_map(|members| members.iter())
    }

    /// The member occupying the same slot (observation and first step) as
    /// `alloc`, if any.
    pub fn slot(&self, alloc: &Alloc) -> Option<&Alloc> {
        self.for_obs(&alloc.obs().id)
            .find(|a| a.first_step() == alloc.first_step())
    }

    /// The member that `alloc` continues, if any.
    pub fn predecessor_of(&self, alloc: &Alloc) -> Option<&Alloc> {
        self.for_obs(&alloc.obs().id).find(|p| p.is_successor(alloc))
    }

    /// The member that continues `alloc`, if any.
    pub fn successor_of(&self, alloc: &Alloc) -> Option<&Alloc> {
        self.for_obs(&alloc.obs().id).find(|s| alloc.is_successor(s))
    }

    /// The member immediately before `alloc` in natural order.
    pub fn previous(&self, alloc: &Alloc) -> Option<&Alloc> {
        self.ordered.range(..alloc).next_back()
    }

    /// The member immediately after `alloc` in natural order.
    pub fn next(&self, alloc: &Alloc) -> Option<&Alloc> {
        use std::ops::Bound::{Excluded, Unbounded};
        self.ordered.range((Excluded(alloc), Unbounded)).next()
    }

    pub fn to_vec(&self) -> Vec<Alloc> {
        self.ordered.iter().cloned().collect()
    }
}

impl PartialEq for AllocSet {
    fn eq(&self, other: &Self) -> bool {
        self.ordered == other.ordered
    }
}

impl Eq for AllocSet {}

impl FromIterator<Alloc> for AllocSet {
    fn from_iter<I: IntoIterator<Item = Alloc>>(iter: I) -> Self {
        let mut set = AllocSet::new();
        for alloc in iter {
            set.insert(alloc);
        }
        set
    }
}

impl<'a> IntoIterator for &'a AllocSet {
    type Item = &'a Alloc;
    type IntoIter = std::collections::btree_set::Iter<'a, Alloc>;

    fn into_iter(self) -> Self::IntoIter {
        self.ordered.iter()
    }
}

impl IntoIterator for AllocSet {
    type Item = Alloc;
    type IntoIter = std::collections::btree_set::IntoIter<Alloc>;

    fn into_iter(self) -> Self::IntoIter {
        self.ordered.into_iter()
    }
}
