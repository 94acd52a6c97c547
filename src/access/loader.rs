use std::path::Path;

use crate::access::errors::AccessError;
use crate::access::format::parse_kdl_document;
use crate::access::snapshot::{Snapshot, SnapshotBuilder};

/// Load all `.kdl` snapshot files from the given directory and merge them,
/// in path order, into a single `Snapshot`.
pub fn load_snapshot(dir: &Path) -> Result<Snapshot, AccessError> {
    if !dir.is_dir() {
        return Err(AccessError::InvalidSnapshot(format!(
            "snapshot directory `{}` does not exist or is not a directory",
            dir.display()
        )));
    }

    let mut merged = SnapshotBuilder::default();
    let mut file_count = 0;

    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext == "kdl")
                .unwrap_or(false)
        })
        .collect();
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        let contents =
            std::fs::read_to_string(&path).map_err(|source| AccessError::SnapshotLoadError {
                path: path.display().to_string(),
                source,
            })?;
        let page = parse_kdl_document(&contents)?;
        merged = merged.merge(page);
        file_count += 1;
    }

    let snapshot = merged.build();

    tracing::info!(
        files = file_count,
        users = snapshot.users.len(),
        courses = snapshot.courses.len(),
        groups = snapshot.groups.len(),
        memberships = snapshot.memberships.len(),
        grants = snapshot.grants.len(),
        "Loaded relation snapshot"
    );

    Ok(snapshot)
}
