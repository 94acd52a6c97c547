//! Course access - effective access resolution for a learning-management console
//!
//! Derives who can see which course and why from snapshots of users, courses,
//! groups, group memberships and access grants.

pub mod access;
pub mod errors;
pub mod report;
pub mod settings;
