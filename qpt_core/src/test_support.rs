//! Shared fixtures for unit tests.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};

use crate::models::{Alloc, Obs, SetupType, StepSummary, Timestamp};

/// Start of the test night.
pub fn t0() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 3, 10, 23, 0, 0).unwrap()
}

pub fn at(minutes: i64) -> Timestamp {
    t0() + Duration::minutes(minutes)
}

/// Ten steps of 6 minutes each behind a 10 minute setup.
pub fn obs(id: &str) -> Arc<Obs> {
    Arc::new(Obs::new(
        id,
        StepSummary::uniform(Duration::minutes(10), Duration::minutes(6), 10),
    ))
}

/// A fully set-up visit of steps `first..=last` starting `minutes` into the night.
pub fn alloc(obs: &Arc<Obs>, minutes: i64, first: usize, last: usize) -> Alloc {
    Alloc::new(obs.clone(), at(minutes), first, last, SetupType::Full, "").unwrap()
}
