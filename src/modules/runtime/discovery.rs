//! Route discovery: walk the data directory and pair data files with schemas

use mock_api_core::{MockApiError, RouteDescriptor, RouteTable, IGNORED_NAMES, SCHEMA_EXTENSION};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Walk `root` depth-first and describe one route per data file
///
/// Schema files are not routes of their own; they are picked up by the data
/// file with the same base name. Pairing is not checked here.
pub fn discover(root: &Path) -> Result<RouteTable, MockApiError> {
    let mut routes = Vec::new();
    walk(root, "", &mut routes)?;
    debug!("Discovered {} route(s) under {}", routes.len(), root.display());
    RouteTable::new(routes)
}

fn walk(dir: &Path, relative: &str, routes: &mut Vec<RouteDescriptor>) -> Result<(), MockApiError> {
    let discovery_error = |source| MockApiError::Discovery {
        path: dir.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(discovery_error)? {
        let entry = entry.map_err(discovery_error)?;
        let name = entry.file_name().to_string_lossy().into_owned();

        if is_ignored(&name) || name.ends_with(SCHEMA_EXTENSION) {
            continue;
        }

        if entry.file_type().map_err(discovery_error)?.is_dir() {
            walk(&entry.path(), &format!("{}/{}", relative, name), routes)?;
            continue;
        }

        routes.push(RouteDescriptor::new(name, relative));
    }

    Ok(())
}

fn is_ignored(name: &str) -> bool {
    IGNORED_NAMES.contains(&name)
}
