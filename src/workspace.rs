//! Workspace scanning and manifest discovery.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::config::WorkspaceConfig;
use crate::manifest::PackageManifest;

/// A manifest that could not be loaded during discovery.
#[derive(Debug, Clone)]
pub struct DiscoveryError {
    pub path: PathBuf,
    pub message: String,
}

/// Everything discovery found: parsed manifests plus per-path failures.
#[derive(Debug, Default)]
pub struct Discovery {
    pub manifests: Vec<PackageManifest>,
    pub errors: Vec<DiscoveryError>,
}

/// Scans the workspace for `package.json` files.
#[derive(Debug)]
pub struct WorkspaceScanner {
    root: PathBuf,
}

impl WorkspaceScanner {
    /// Create a new workspace scanner.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Find every `package.json` in the workspace, classify each by role
    /// from the workspace config, and record per-path parse failures
    /// without aborting the scan.
    pub fn discover(&self, config: &WorkspaceConfig) -> Result<Discovery> {
        let mut discovery = Discovery::default();

        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| {
                let name = e.file_name().to_string_lossy();
                // Skip build output, vendored modules, and VCS directories
                !matches!(
                    name.as_ref(),
                    "target" | ".git" | "node_modules" | ".cargo" | "dist" | "build" | "coverage"
                )
            })
        {
            let entry = entry.context("Failed to read directory entry")?;

            if entry.file_type().is_file() && entry.file_name() == "package.json" {
                let role = config.role_for(&self.relative_dir(entry.path()));
                match PackageManifest::load(entry.path(), role) {
                    Ok(manifest) => discovery.manifests.push(manifest),
                    Err(e) => {
                        warn!("Failed to load {}: {:#}", entry.path().display(), e);
                        discovery.errors.push(DiscoveryError {
                            path: entry.path().to_path_buf(),
                            message: format!("{:#}", e),
                        });
                    }
                }
            }
        }

        discovery.manifests.sort_by(|a, b| a.path.cmp(&b.path));
        discovery.errors.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(discovery)
    }

    /// Directory of a manifest relative to the root, `/`-joined, empty for
    /// the root itself.
    fn relative_dir(&self, manifest_path: &Path) -> String {
        manifest_path
            .parent()
            .and_then(|dir| dir.strip_prefix(&self.root).ok())
            .map(|rel| {
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("/")
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;
