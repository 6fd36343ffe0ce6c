//! Route descriptors discovered from the data directory

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{MockApiError, Result};

/// Runs of whitespace collapsed into a single hyphen by [`slugify`]
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Extension of GraphQL schema files
pub const SCHEMA_EXTENSION: &str = ".graphql";

/// File and directory names that never become routes
pub const IGNORED_NAMES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// One discovered endpoint: a data file and its paired schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    /// Data file name without its extension
    pub name: String,

    /// Data file name, e.g. `die.json`
    pub data_file: String,

    /// Schema file name, e.g. `die.graphql`
    pub schema_file: String,

    /// Containing directory relative to the data root (`/games`), empty for the root
    pub directory: String,

    /// `directory` joined with the slug of `name`
    pub endpoint: String,
}

impl RouteDescriptor {
    /// Build a descriptor for `data_file` found in `directory`
    pub fn new(data_file: impl Into<String>, directory: impl Into<String>) -> Self {
        let data_file = data_file.into();
        let directory = directory.into();
        let name = strip_extension(&data_file).to_string();
        let endpoint = format!("{}/{}", directory, slugify(&name));

        Self {
            schema_file: format!("{}{}", name, SCHEMA_EXTENSION),
            name,
            data_file,
            directory,
            endpoint,
        }
    }

    /// Directory of this route below `root`
    pub fn directory_path(&self, root: &Path) -> PathBuf {
        self.directory
            .split('/')
            .filter(|segment| !segment.is_empty())
            .fold(root.to_path_buf(), |path, segment| path.join(segment))
    }

    /// Absolute location of the data file
    pub fn data_path(&self, root: &Path) -> PathBuf {
        self.directory_path(root).join(&self.data_file)
    }

    /// Absolute location of the schema file
    pub fn schema_path(&self, root: &Path) -> PathBuf {
        self.directory_path(root).join(&self.schema_file)
    }

    /// Data file location relative to the root, for log messages
    pub fn display_path(&self) -> String {
        format!("{}/{}", self.directory, self.data_file)
    }
}

/// Replace every whitespace run with a single hyphen
pub fn slugify(name: &str) -> String {
    WHITESPACE.replace_all(name, "-").into_owned()
}

fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(idx) => &file_name[..idx],
    }
}

/// Discovered routes, with endpoints guaranteed unique
#[derive(Debug, Clone, Default, Serialize)]
pub struct RouteTable {
    routes: Vec<RouteDescriptor>,
}

impl RouteTable {
    /// Build a table, rejecting endpoint collisions
    pub fn new(routes: Vec<RouteDescriptor>) -> Result<Self> {
        {
            let mut seen: HashMap<&str, &RouteDescriptor> = HashMap::with_capacity(routes.len());
            for route in &routes {
                if let Some(first) = seen.insert(route.endpoint.as_str(), route) {
                    return Err(MockApiError::DuplicateEndpoint {
                        endpoint: route.endpoint.clone(),
                        first: first.display_path(),
                        second: route.display_path(),
                    });
                }
            }
        }

        Ok(Self { routes })
    }

    /// Find a route by endpoint
    pub fn find(&self, endpoint: &str) -> Option<&RouteDescriptor> {
        self.routes.iter().find(|r| r.endpoint == endpoint)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RouteDescriptor> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl IntoIterator for RouteTable {
    type Item = RouteDescriptor;
    type IntoIter = std::vec::IntoIter<RouteDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.into_iter()
    }
}
