//! Read-only, serializable views of committed state.
//!
//! Snapshots are what display code (flag computation, collision highlighting,
//! exports) consumes. They never feed back into an edit.

use serde::{Deserialize, Serialize};

use super::alloc::{Alloc, SetupType, Timestamp};
use super::obs::ObsId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocSnapshot {
    pub obs: ObsId,
    pub start: Timestamp,
    pub end: Timestamp,
    pub first_step: usize,
    pub last_step: usize,
    pub setup_type: SetupType,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
}

impl From<&Alloc> for AllocSnapshot {
    fn from(a: &Alloc) -> Self {
        Self {
            obs: a.obs().id.clone(),
            start: a.start(),
            end: a.end(),
            first_step: a.first_step(),
            last_step: a.last_step(),
            setup_type: a.setup_type(),
            comment: a.comment().to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSnapshot {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    /// Visits in natural order.
    pub allocs: Vec<AllocSnapshot>,
}

impl VariantSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
