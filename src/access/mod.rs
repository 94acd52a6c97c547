//! Effective course access resolution.
//!
//! Snapshot -> indexes -> resolver -> query -> sort. Every stage is a pure
//! function of the previous one; [`AccessEngine`] adds memoization on top.

pub mod engine;
pub mod errors;
pub mod format;
pub mod index;
pub mod loader;
pub mod query;
pub mod resolver;
pub mod snapshot;
pub mod sort;
pub mod types;

pub use engine::{AccessEngine, EngineStats};
pub use errors::AccessError;
pub use query::{filter_grants, GrantFilter, ReasonFilter, RoleFilter};
pub use resolver::{ReasonCounts, Resolution};
pub use snapshot::{Snapshot, SnapshotBuilder};
pub use sort::{sort_grants, SortDirection, SortField, SortSpec};
pub use types::*;
