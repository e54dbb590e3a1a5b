//! Observations as seen by the planner.
//!
//! An [`Obs`] is a read-only reference to an observation in the program tree:
//! its identifier and the planned timing of its executable steps. The planner
//! never mutates observations; allocs share them through [`Arc`](std::sync::Arc).

use chrono::Duration;
use serde::{Deserialize, Serialize};

crate::define_id_type!(ObsId);

/// Planned timing of a single executable step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedStep {
    /// Time needed to execute the step.
    #[serde(with = "duration_millis")]
    pub time: Duration,
    /// Steps already executed contribute no time to a visit.
    #[serde(default)]
    pub executed: bool,
}

impl PlannedStep {
    pub fn new(time: Duration) -> Self {
        Self {
            time,
            executed: false,
        }
    }

    pub fn executed(time: Duration) -> Self {
        Self {
            time,
            executed: true,
        }
    }
}

/// Planned step timing for an observation, plus its setup overheads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    /// Full acquisition/setup time.
    #[serde(with = "duration_millis")]
    pub setup_time: Duration,
    /// Reduced setup time when re-acquiring a target already set up.
    #[serde(with = "duration_millis")]
    pub reacquisition_time: Duration,
    #[serde(default)]
    pub steps: Vec<PlannedStep>,
}

impl StepSummary {
    pub fn new(setup_time: Duration, reacquisition_time: Duration, steps: Vec<PlannedStep>) -> Self {
        Self {
            setup_time,
            reacquisition_time,
            steps,
        }
    }

    /// `count` unexecuted steps of `step_time` each, with a full setup of
    /// `setup_time` and no reacquisition option.
    pub fn uniform(setup_time: Duration, step_time: Duration, count: usize) -> Self {
        Self {
            setup_time,
            reacquisition_time: Duration::zero(),
            steps: vec![PlannedStep::new(step_time); count],
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Time of step `index`, or zero when it has already been executed.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    pub fn remaining_time(&self, index: usize) -> Duration {
        let step = &self.steps[index];
        if step.executed {
            Duration::zero()
        } else {
            step.time
        }
    }

    pub fn is_step_executed(&self, index: usize) -> bool {
        self.steps.get(index).is_some_and(|s| s.executed)
    }

    /// Index of the first step not yet executed. Equals `len()` when every
    /// step has been executed.
    pub fn first_unexecuted_step(&self) -> usize {
        self.steps
            .iter()
            .position(|s| !s.executed)
            .unwrap_or(self.steps.len())
    }
}

/// An observation: identity plus its ordered executable steps.
///
/// Equality, hashing and ordering use the identifier only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obs {
    pub id: ObsId,
    pub steps: StepSummary,
}

impl Obs {
    pub fn new(id: impl Into<ObsId>, steps: StepSummary) -> Self {
        Self {
            id: id.into(),
            steps,
        }
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }
}

impl PartialEq for Obs {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Obs {}

impl std::hash::Hash for Obs {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Obs {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Obs {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl std::fmt::Display for Obs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Serializes a [`Duration`] as whole milliseconds.
pub(crate) mod duration_millis {
    use chrono::Duration;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_i64(d.num_milliseconds())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        i64::deserialize(d).map(Duration::milliseconds)
    }
}
