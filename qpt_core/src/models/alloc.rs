//! Scheduled visits.
//!
//! An [`Alloc`] places a contiguous step range of one observation at a start
//! time. Allocs are immutable values; every change (new start, new setup,
//! new comment) produces a replacement that the owning variant swaps in.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::obs::Obs;
use crate::error::VariantError;

/// Instant on the planning timeline.
pub type Timestamp = DateTime<Utc>;

/// How much target acquisition precedes the science steps of a visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupType {
    None,
    Reacquisition,
    Full,
}

impl SetupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetupType::None => "none",
            SetupType::Reacquisition => "reacquisition",
            SetupType::Full => "full",
        }
    }
}

impl fmt::Display for SetupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single scheduled visit: steps `first_step..=last_step` of `obs`,
/// starting at `start`.
///
/// Natural order is by start time, then observation id, first step, last
/// step, setup type and comment. The order is total and agrees with
/// equality, so a set of allocs has exactly one iteration order.
#[derive(Debug, Clone)]
pub struct Alloc {
    obs: Arc<Obs>,
    start: Timestamp,
    end: Timestamp,
    first_step: usize,
    last_step: usize,
    setup_type: SetupType,
    comment: String,
}

impl Alloc {
    /// Creates a visit, deriving its end time from the observation's step
    /// timing.
    ///
    /// # Errors
    ///
    /// [`VariantError::InvalidStepRange`] unless
    /// `first_step <= last_step < obs.step_count()`.
    pub fn new(
        obs: Arc<Obs>,
        start: Timestamp,
        first_step: usize,
        last_step: usize,
        setup_type: SetupType,
        comment: impl Into<String>,
    ) -> Result<Self, VariantError> {
        if first_step > last_step || last_step >= obs.step_count() {
            return Err(VariantError::InvalidStepRange {
                obs: obs.id.clone(),
                first_step,
                last_step,
                step_count: obs.step_count(),
            });
        }
        let end = start + span(&obs, first_step, last_step, setup_type);
        Ok(Self {
            obs,
            start,
            end,
            first_step,
            last_step,
            setup_type,
            comment: comment.into(),
        })
    }

    /// Builds a visit for dragging onto the timeline. The start time is
    /// meaningless (the Unix epoch). The visit begins at the first
    /// unexecuted step and grows one step at a time while full setup plus
    /// steps fit within `max_length_hint`; at least one step is always
    /// included, so the hint is not honored when that step alone is longer.
    ///
    /// # Errors
    ///
    /// [`VariantError::InvalidStepRange`] if every step has been executed.
    pub fn for_dragging(obs: Arc<Obs>, max_length_hint: Duration) -> Result<Self, VariantError> {
        let steps = &obs.steps;
        let first = steps.first_unexecuted_step();
        let mut last = first;
        if first < steps.len() {
            let mut length = steps.setup_time + steps.remaining_time(first);
            while last + 1 < steps.len() {
                let next = steps.remaining_time(last + 1);
                if length + next > max_length_hint {
                    break;
                }
                length = length + next;
                last += 1;
            }
        }
        Alloc::new(obs, DateTime::<Utc>::UNIX_EPOCH, first, last, SetupType::Full, "")
    }

    pub fn obs(&self) -> &Arc<Obs> {
        &self.obs
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    /// Start plus setup plus the remaining time of every step in range.
    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    pub fn first_step(&self) -> usize {
        self.first_step
    }

    pub fn last_step(&self) -> usize {
        self.last_step
    }

    pub fn setup_type(&self) -> SetupType {
        self.setup_type
    }

    pub fn comment(&self) -> &str {
        &self.comment
    }

    pub fn setup_time(&self) -> Duration {
        setup_overhead(&self.obs, self.setup_type)
    }

    /// Same visit slot: same observation and same first step.
    pub fn same_slot(&self, other: &Alloc) -> bool {
        self.obs == other.obs && self.first_step == other.first_step
    }

    /// `true` if `other` continues this visit: same observation, starting on
    /// the step after this one ends.
    pub fn is_successor(&self, other: &Alloc) -> bool {
        self.obs == other.obs && self.last_step + 1 == other.first_step
    }

    /// `true` if this visit continues `other`.
    pub fn is_predecessor(&self, other: &Alloc) -> bool {
        other.is_successor(self)
    }

    pub fn overlaps(&self, other: &Alloc) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains(&self, t: Timestamp) -> bool {
        self.start <= t && t < self.end
    }

    /// The same visit re-stamped to `start`; the length is unchanged.
    pub fn with_start(&self, start: Timestamp) -> Alloc {
        Alloc {
            start,
            end: start + self.length(),
            ..self.clone()
        }
    }

    /// The same visit with a different setup, keeping its start time.
    pub fn with_setup_type(&self, setup_type: SetupType) -> Alloc {
        let end =
            self.start + span(&self.obs, self.first_step, self.last_step, setup_type);
        Alloc {
            end,
            setup_type,
            ..self.clone()
        }
    }

    pub fn with_comment(&self, comment: impl Into<String>) -> Alloc {
        Alloc {
            comment: comment.into(),
            ..self.clone()
        }
    }
}

fn setup_overhead(obs: &Obs, setup_type: SetupType) -> Duration {
    match setup_type {
        SetupType::None => Duration::zero(),
        SetupType::Full => obs.steps.setup_time,
        SetupType::Reacquisition => obs.steps.reacquisition_time,
    }
}

fn span(obs: &Obs, first_step: usize, last_step: usize, setup_type: SetupType) -> Duration {
    (first_step..=last_step).fold(setup_overhead(obs, setup_type), |acc, i| {
        acc + obs.steps.remaining_time(i)
    })
}

impl Ord for Alloc {
    fn cmp(&self, other: &Self) -> Ordering {
        self.start
            .cmp(&other.start)
            .then_with(|| self.obs.id.cmp(&other.obs.id))
            .then_with(|| self.first_step.cmp(&other.first_step))
            .then_with(|| self.last_step.cmp(&other.last_step))
            .then_with(|| self.setup_type.cmp(&other.setup_type))
            .then_with(|| self.comment.cmp(&other.comment))
    }
}

impl PartialOrd for Alloc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Alloc {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Alloc {}

impl std::hash::Hash for Alloc {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.start.hash(state);
        self.obs.id.hash(state);
        self.first_step.hash(state);
        self.last_step.hash(state);
        self.setup_type.hash(state);
        self.comment.hash(state);
    }
}

impl fmt::Display for Alloc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} S{}", self.obs, self.first_step + 1)?;
        if self.last_step > self.first_step {
            write!(f, "-{}", self.last_step + 1)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::obs::{PlannedStep, StepSummary};
    use chrono::TimeZone;

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 3, 10, 1, 0, 0).unwrap()
    }

    fn obs(id: &str, steps: usize) -> Arc<Obs> {
        Arc::new(Obs::new(
            id,
            StepSummary::new(
                Duration::minutes(15),
                Duration::minutes(5),
                vec![PlannedStep::new(Duration::minutes(2)); steps],
            ),
        ))
    }

    #[test]
    fn test_end_includes_setup_and_steps() {
        let a = Alloc::new(obs("GS-1", 10), t0(), 0, 4, SetupType::Full, "").unwrap();
        assert_eq!(a.length(), Duration::minutes(15 + 10));
        assert_eq!(a.end(), t0() + Duration::minutes(25));
        assert_eq!(a.setup_time(), Duration::minutes(15));
    }

    #[test]
    fn test_reacquisition_and_no_setup() {
        let o = obs("GS-1", 10);
        let r = Alloc::new(o.clone(), t0(), 5, 9, SetupType::Reacquisition, "").unwrap();
        let n = Alloc::new(o, t0(), 5, 9, SetupType::None, "").unwrap();
        assert_eq!(r.length(), Duration::minutes(15));
        assert_eq!(n.length(), Duration::minutes(10));
    }

    #[test]
    fn test_executed_steps_take_no_time() {
        let o = Arc::new(Obs::new(
            "GN-7",
            StepSummary::new(
                Duration::zero(),
                Duration::zero(),
                vec![
                    PlannedStep::executed(Duration::minutes(30)),
                    PlannedStep::new(Duration::minutes(3)),
                ],
            ),
        ));
        let a = Alloc::new(o, t0(), 0, 1, SetupType::None, "").unwrap();
        assert_eq!(a.length(), Duration::minutes(3));
    }

    #[test]
    fn test_invalid_step_ranges_rejected() {
        let o = obs("GS-1", 5);
        assert!(matches!(
            Alloc::new(o.clone(), t0(), 3, 2, SetupType::Full, ""),
            Err(VariantError::InvalidStepRange { .. })
        ));
        assert!(matches!(
            Alloc::new(o, t0(), 0, 5, SetupType::Full, ""),
            Err(VariantError::InvalidStepRange { step_count: 5, .. })
        ));
    }

    #[test]
    fn test_display_uses_one_based_steps() {
        let o = obs("GS-2024A-Q-3-4", 10);
        let single = Alloc::new(o.clone(), t0(), 2, 2, SetupType::Full, "").unwrap();
        let range = Alloc::new(o, t0(), 0, 4, SetupType::Full, "").unwrap();
        assert_eq!(single.to_string(), "GS-2024A-Q-3-4 S3");
        assert_eq!(range.to_string(), "GS-2024A-Q-3-4 S1-5");
    }

    #[test]
    fn test_natural_order_is_start_then_identity() {
        let a = obs("A", 10);
        let b = obs("B", 10);
        let late = Alloc::new(a.clone(), t0() + Duration::hours(1), 0, 0, SetupType::Full, "").unwrap();
        let early_b = Alloc::new(b, t0(), 0, 0, SetupType::Full, "").unwrap();
        let early_a = Alloc::new(a.clone(), t0(), 0, 0, SetupType::Full, "").unwrap();
        let early_a_step = Alloc::new(a, t0(), 1, 1, SetupType::Full, "").unwrap();

        let mut v = vec![late.clone(), early_b.clone(), early_a_step.clone(), early_a.clone()];
        v.sort();
        assert_eq!(v, vec![early_a, early_a_step, early_b, late]);
    }

    #[test]
    fn test_successor_relation() {
        let o = obs("GS-1", 10);
        let head = Alloc::new(o.clone(), t0(), 0, 4, SetupType::Full, "").unwrap();
        let tail = Alloc::new(o.clone(), t0(), 5, 9, SetupType::None, "").unwrap();
        let other = Alloc::new(obs("GS-2", 10), t0(), 5, 9, SetupType::None, "").unwrap();
        assert!(head.is_successor(&tail));
        assert!(tail.is_predecessor(&head));
        assert!(!tail.is_successor(&head));
        assert!(!head.is_successor(&other));
    }

    #[test]
    fn test_with_start_keeps_length() {
        let a = Alloc::new(obs("GS-1", 10), t0(), 0, 4, SetupType::Full, "note").unwrap();
        let moved = a.with_start(t0() + Duration::hours(2));
        assert_eq!(moved.length(), a.length());
        assert_eq!(moved.comment(), "note");
        assert!(moved.same_slot(&a));
        assert_ne!(moved, a);
    }

    #[test]
    fn test_with_setup_type_recomputes_end() {
        let a = Alloc::new(obs("GS-1", 10), t0(), 0, 4, SetupType::Full, "").unwrap();
        let bare = a.with_setup_type(SetupType::None);
        assert_eq!(bare.start(), a.start());
        assert_eq!(bare.length(), Duration::minutes(10));
    }

    #[test]
    fn test_for_dragging_respects_hint() {
        // setup 15 + 2 per step; 21 minutes fits 3 steps
        let a = Alloc::for_dragging(obs("GS-1", 10), Duration::minutes(21)).unwrap();
        assert_eq!(a.first_step(), 0);
        assert_eq!(a.last_step(), 2);
        assert_eq!(a.setup_type(), SetupType::Full);
    }

    #[test]
    fn test_for_dragging_always_takes_one_step() {
        let a = Alloc::for_dragging(obs("GS-1", 10), Duration::minutes(1)).unwrap();
        assert_eq!((a.first_step(), a.last_step()), (0, 0));
    }

    #[test]
    fn test_for_dragging_starts_after_executed_steps() {
        let o = Arc::new(Obs::new(
            "GS-9",
            StepSummary::new(
                Duration::minutes(1),
                Duration::zero(),
                vec![
                    PlannedStep::executed(Duration::minutes(1)),
                    PlannedStep::new(Duration::minutes(1)),
                    PlannedStep::new(Duration::minutes(1)),
                ],
            ),
        ));
        let a = Alloc::for_dragging(o, Duration::hours(1)).unwrap();
        assert_eq!((a.first_step(), a.last_step()), (1, 2));
    }

    #[test]
    fn test_overlaps_and_contains() {
        let o = obs("GS-1", 10);
        let a = Alloc::new(o.clone(), t0(), 0, 4, SetupType::Full, "").unwrap();
        let b = Alloc::new(o, a.end(), 5, 9, SetupType::None, "").unwrap();
        assert!(!a.overlaps(&b));
        assert!(a.contains(t0()));
        assert!(!a.contains(a.end()));
        assert!(a.overlaps(&a.with_start(t0() + Duration::minutes(1))));
    }
}
