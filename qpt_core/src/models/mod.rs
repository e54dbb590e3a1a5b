//! Schedule model: observations, visits and variants.

pub mod alloc;
pub mod alloc_set;
pub mod macros;
pub mod obs;
pub mod snapshot;
pub mod variant;

#[cfg(test)]
mod variant_tests;

pub use alloc::{Alloc, SetupType, Timestamp};
pub use alloc_set::AllocSet;
pub use obs::{Obs, ObsId, PlannedStep, StepSummary};
pub use snapshot::{AllocSnapshot, VariantSnapshot};
pub use variant::Variant;
