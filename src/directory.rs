//! Service discovery: which services exist and what they expose.
//!
//! Services come from two sources: folders scanned for manifest files, and
//! services registered explicitly by name. Folder services are listed first,
//! in sorted file-name order, followed by registered services; a name seen
//! twice is listed once.

use crate::error::{BrowserError, Result};
use crate::model::ServiceObject;
use indexmap::{IndexMap, IndexSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Lookup of available services and their public methods.
pub trait ServiceDirectory {
    /// Names of all callable services, deduplicated, in first-seen order.
    fn list_available_service_names(&self) -> IndexSet<String>;

    /// Methods and doc comments of `name`.
    fn service_object(&self, name: &str) -> Result<ServiceObject>;
}

/// Filesystem-backed directory of JSON service manifests.
///
/// A manifest is `{"methods": [{"name", "params", "doc"}]}`; the service name
/// is the manifest's file stem.
#[derive(Debug, Clone)]
pub struct FsServiceDirectory {
    folders: Vec<PathBuf>,
    registered: IndexMap<String, PathBuf>,
    extension: String,
}

impl FsServiceDirectory {
    pub fn new(folders: Vec<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            folders,
            registered: IndexMap::new(),
            extension: extension.into(),
        }
    }

    /// Register a service whose manifest lives outside the scanned folders.
    pub fn register(&mut self, name: impl Into<String>, manifest: impl Into<PathBuf>) {
        self.registered.insert(name.into(), manifest.into());
    }

    /// Service names found in one folder. An unreadable folder lists nothing.
    fn scan_folder(&self, folder: &Path) -> Vec<String> {
        let entries = match fs::read_dir(folder) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(folder = %folder.display(), error = %e, "cannot read service folder");
                return Vec::new();
            }
        };
        let suffix = format!(".{}", self.extension);
        let mut names: Vec<String> = entries
            .flatten()
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter_map(|file_name| {
                file_name
                    .strip_suffix(suffix.as_str())
                    .filter(|stem| !stem.is_empty())
                    .map(str::to_string)
            })
            .collect();
        names.sort();
        names
    }

    fn manifest_path(&self, name: &str) -> Option<PathBuf> {
        let file_name = format!("{}.{}", name, self.extension);
        self.folders
            .iter()
            .map(|folder| folder.join(&file_name))
            .find(|candidate| candidate.is_file())
            .or_else(|| self.registered.get(name).cloned())
    }
}

impl ServiceDirectory for FsServiceDirectory {
    fn list_available_service_names(&self) -> IndexSet<String> {
        let mut names = IndexSet::new();
        for folder in &self.folders {
            for name in self.scan_folder(folder) {
                names.insert(name);
            }
        }
        for name in self.registered.keys() {
            names.insert(name.clone());
        }
        names
    }

    fn service_object(&self, name: &str) -> Result<ServiceObject> {
        let path = self
            .manifest_path(name)
            .ok_or_else(|| BrowserError::UnknownService(name.to_string()))?;
        let content = fs::read_to_string(&path).map_err(|source| BrowserError::Io {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| BrowserError::Manifest { path, source })
    }
}
