//! Error types.
//!
//! Conflicts raised while editing live in [`crate::edit`]; this module holds
//! the failures of direct variant mutation, of edit transactions and of
//! configuration loading.

use std::path::PathBuf;

use crate::edit::{AddConflict, ConflictKind, RemoveConflict, Resolution};
use crate::models::{Alloc, ObsId, Timestamp};

/// Failure of a single, non-transactional variant mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VariantError {
    #[error("invalid step range {first_step}..={last_step} for {obs} ({step_count} steps)")]
    InvalidStepRange {
        obs: ObsId,
        first_step: usize,
        last_step: usize,
        step_count: usize,
    },

    #[error(transparent)]
    Add(#[from] AddConflict),

    #[error(transparent)]
    Remove(#[from] RemoveConflict),

    /// A moved visit would end after its successor starts.
    #[error("{alloc} must end before its successor starts, no later than {latest_end_time}")]
    SuccessorOrdering {
        alloc: Alloc,
        latest_end_time: Timestamp,
    },

    #[error("{0} is not part of this variant")]
    NotFound(Alloc),
}

/// Result type for single variant mutations.
pub type VariantResult<T> = Result<T, VariantError>;

/// A cut or paste was cancelled by the conflict resolver. The variant is
/// unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("edit cancelled")]
pub struct Cancelled;

/// An edit plan was committed against a variant it was not built for. The
/// variant is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StalePlan {
    #[error("edit plan built at revision {planned} but variant is at revision {current}")]
    Revision { planned: u64, current: u64 },

    /// Revisions match but the members differ, e.g. another variant or a
    /// diverged clone.
    #[error("edit plan removes {0}, which is not part of the variant")]
    MissingMember(Alloc),

    #[error("edit plan adds {0}, which is already part of the variant")]
    DuplicateMember(Alloc),

    #[error("edit plan would leave the variant inconsistent: {0}")]
    Inconsistent(#[from] AddConflict),
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("'{resolution}' is not a valid resolution for {kind} conflicts")]
    InvalidPolicy {
        kind: ConflictKind,
        resolution: Resolution,
    },

    #[error("no planner.toml found in standard locations")]
    NotFound,
}
