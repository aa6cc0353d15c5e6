//! Manifest input contract.
//!
//! The engine does not read `package.json`/lock files itself; an upstream
//! resolver flattens them into a list of [`PackageRecord`]s. This module
//! defines that record shape and loads it from a JSON file. Dependency
//! targets stay as declared version ranges; nothing here evaluates semver.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::ManifestError;

/// Relationship a package (or one of its declared dependencies) carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    #[default]
    #[serde(alias = "dependencies", alias = "prod")]
    Production,
    #[serde(alias = "devDependencies")]
    Dev,
    #[serde(alias = "peerDependencies")]
    Peer,
    #[serde(alias = "optionalDependencies")]
    Optional,
}

/// Free-form descriptive fields carried through to the graph node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageMetadata {
    pub registry_url: Option<String>,
    pub homepage: Option<String>,
    pub repository: Option<String>,
    pub description: Option<String>,
}

/// One flattened package entry as supplied by the manifest resolver.
///
/// `dependencies`/`dev_dependencies`/`peer_dependencies` map dependency
/// name to the declared version range, verbatim. Optional dependencies are
/// carried along but never become graph edges. The annotation fields
/// (`size`, `license`, `vulnerability_count`, `risk_score`) default to
/// "unknown"; the engine scores what it is given and fabricates nothing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageRecord {
    pub name: String,
    pub version: String,
    #[serde(alias = "dependencyType")]
    pub dependency_type: DependencyKind,
    pub dependencies: BTreeMap<String, String>,
    #[serde(alias = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(alias = "peerDependencies")]
    pub peer_dependencies: BTreeMap<String, String>,
    #[serde(alias = "optionalDependencies")]
    pub optional_dependencies: BTreeMap<String, String>,
    pub size: u64,
    pub license: Option<String>,
    #[serde(alias = "vulnerabilityCount")]
    pub vulnerability_count: u32,
    #[serde(alias = "riskScore")]
    pub risk_score: f64,
    pub metadata: PackageMetadata,
}

impl PackageRecord {
    /// Convenience constructor used by tests, benches and demos.
    #[must_use]
    pub fn new(name: &str, version: &str) -> Self {
        Self { name: name.to_string(), version: version.to_string(), ..Self::default() }
    }

    /// Add a production dependency on `name` with the given range.
    #[must_use]
    pub fn with_dependency(mut self, name: &str, range: &str) -> Self {
        self.dependencies.insert(name.to_string(), range.to_string());
        self
    }

    /// Add a dev dependency on `name` with the given range.
    #[must_use]
    pub fn with_dev_dependency(mut self, name: &str, range: &str) -> Self {
        self.dev_dependencies.insert(name.to_string(), range.to_string());
        self
    }

    /// Add a peer dependency on `name` with the given range.
    #[must_use]
    pub fn with_peer_dependency(mut self, name: &str, range: &str) -> Self {
        self.peer_dependencies.insert(name.to_string(), range.to_string());
        self
    }
}

/// Load a flattened package list from a JSON file.
///
/// The file holds a JSON array of [`PackageRecord`] objects; unknown fields
/// are ignored and missing ones take defaults, so the loader tolerates
/// resolver output from different manifest ecosystems.
///
/// # Errors
/// Returns `ManifestError::Io` if the file cannot be read and
/// `ManifestError::InvalidJson` if it is not a valid record array.
pub fn load_package_list(path: &Path) -> Result<Vec<PackageRecord>, ManifestError> {
    let data = std::fs::read_to_string(path)?;
    serde_json::from_str::<Vec<PackageRecord>>(&data).map_err(|e| ManifestError::InvalidJson {
        file: path.to_path_buf(),
        message: e.to_string(),
    })
}
