//! Editing: conflicts, invariant checks, resolvers and the batch editor.

pub mod conflict;
pub mod plan;
pub mod planner;
pub mod resolver;
pub mod rules;


pub use conflict::{AddConflict, Conflict, ConflictKind, RemoveConflict, Resolution};
pub use plan::{Edit, EditKind, EditPlan};
pub use planner::VariantEditor;
pub use resolver::{ApplyToAll, ConflictResolver, PolicyResolver};
