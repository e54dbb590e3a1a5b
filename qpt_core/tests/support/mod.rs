#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use qpt_core::models::{Alloc, Obs, SetupType, StepSummary, Timestamp, Variant};

/// Evening twilight of the test night.
pub fn night_start() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 9, 1, 23, 30, 0).unwrap()
}

pub fn at(minutes: i64) -> Timestamp {
    night_start() + Duration::minutes(minutes)
}

/// An observation of `steps` steps of 5 minutes behind a 15 minute setup.
pub fn obs(id: &str, steps: usize) -> Arc<Obs> {
    Arc::new(Obs::new(
        id,
        StepSummary::uniform(Duration::minutes(15), Duration::minutes(5), steps),
    ))
}

/// A fully set-up visit of steps `first..=last` starting `minutes` into the night.
pub fn visit(obs: &Arc<Obs>, minutes: i64, first: usize, last: usize) -> Alloc {
    Alloc::new(obs.clone(), at(minutes), first, last, SetupType::Full, "").expect("valid step range")
}

/// Asserts the three variant invariants by brute force over all pairs.
pub fn assert_consistent(variant: &Variant) {
    let allocs: Vec<&Alloc> = variant.iter().collect();
    for a in &allocs {
        for b in &allocs {
            if a != b && a.obs() == b.obs() {
                assert_ne!(a.first_step(), b.first_step(), "collision between {} and {}", a, b);
            }
        }
        if a.first_step() > 0 {
            let pred = allocs
                .iter()
                .find(|p| p.obs() == a.obs() && p.last_step() + 1 == a.first_step())
                .unwrap_or_else(|| panic!("{} has no predecessor", a));
            assert!(pred.end() <= a.start(), "{} starts before {} ends", a, pred);
        }
    }
}
