//! # QPT Core
//!
//! Allocation-editing engine for nightly telescope observing queues.
//!
//! A night's plan is a [`models::Variant`]: an ordered set of
//! [`models::Alloc`] visits, each one a contiguous step range of an
//! observation placed at a start time. This crate owns the invariants that
//! keep a variant consistent and the transactional cut/paste editor that
//! mutates it.
//!
//! ## Invariants
//!
//! Every committed variant satisfies:
//!
//! - no two allocs share the same observation and first step;
//! - every alloc that does not start at step 0 has its predecessor (the
//!   alloc of the same observation ending on the step just before) present;
//! - every alloc starts no earlier than its predecessor ends.
//!
//! ## Architecture
//!
//! - [`models`]: observations, allocs, variants and the ordered alloc set
//! - [`edit`]: conflict taxonomy, pure invariant checks, conflict resolvers,
//!   and the simulate-then-commit [`edit::VariantEditor`]
//! - [`config`]: TOML configuration for automated conflict resolution
//! - [`error`]: crate error types
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use chrono::{Duration, TimeZone, Utc};
//! use qpt_core::edit::{PolicyResolver, VariantEditor};
//! use qpt_core::models::{Alloc, Obs, SetupType, StepSummary, Variant};
//!
//! let obs = Arc::new(Obs::new(
//!     "GS-2024B-Q-1-1",
//!     StepSummary::uniform(Duration::minutes(10), Duration::minutes(5), 10),
//! ));
//! let t0 = Utc.with_ymd_and_hms(2024, 9, 1, 23, 0, 0).unwrap();
//!
//! let mut variant = Variant::new("Plan A");
//! let mut editor = VariantEditor::new(PolicyResolver::default());
//!
//! let first = Alloc::new(obs.clone(), t0, 0, 4, SetupType::Full, "").unwrap();
//! let second = Alloc::new(obs, first.end(), 5, 9, SetupType::None, "").unwrap();
//! let pasted = editor.paste(&mut variant, [first, second]).unwrap();
//!
//! assert_eq!(pasted.len(), 2);
//! assert!(variant.check_invariants().is_ok());
//! ```

pub mod config;
pub mod edit;
pub mod error;
pub mod models;

#[cfg(test)]
mod test_support;
