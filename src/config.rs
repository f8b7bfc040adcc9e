//! Workspace configuration loaded from `workspace.toml`.
//!
//! The config file anchors workspace-root discovery and declares the role of
//! every manifest; roles are never inferred from manifest content.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, Item};

use crate::manifest::ManifestRole;

/// File that marks the workspace root.
pub const CONFIG_FILE: &str = "workspace.toml";

/// Parsed workspace configuration.
///
/// Role patterns come in three shapes: `.` for the root manifest, `dir` for
/// an exact directory, and `dir/*` for one level below it. The longest
/// matching pattern wins; unmatched manifests default to `project`.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    pub root: PathBuf,
    /// Engine name the sync-engines recipe writes (default `node`).
    pub runtime: String,
    pub roles: Vec<(String, ManifestRole)>,
    pub schedule_url: Option<String>,
    pub license_url: Option<String>,
}

impl WorkspaceConfig {
    /// Load `workspace.toml` from the given workspace root.
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let path = root.join(CONFIG_FILE);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let document: DocumentMut = content
            .parse()
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        let runtime = document
            .get("workspace")
            .and_then(|workspace| workspace.get("runtime"))
            .and_then(|item| item.as_str())
            .unwrap_or("node")
            .to_string();

        let mut roles = Vec::new();
        if let Some(Item::Table(table)) = document.get("roles") {
            for (pattern, item) in table.iter() {
                let role_str = item.as_str().ok_or_else(|| {
                    anyhow::anyhow!("Role for '{}' must be a string in {}", pattern, path.display())
                })?;
                let role = role_str
                    .parse::<ManifestRole>()
                    .map_err(|e| anyhow::anyhow!("{} in {}", e, path.display()))?;
                roles.push((pattern.to_string(), role));
            }
        }

        let remote_url = |key: &str| {
            document
                .get("remote")
                .and_then(|remote| remote.get(key))
                .and_then(|item| item.as_str())
                .map(str::to_string)
        };

        Ok(Self {
            root,
            runtime,
            roles,
            schedule_url: remote_url("schedule-url"),
            license_url: remote_url("license-url"),
        })
    }

    /// Role for a manifest directory given as a `/`-joined path relative to
    /// the workspace root (empty string for the root itself).
    pub fn role_for(&self, relative_dir: &str) -> ManifestRole {
        let mut best: Option<(usize, ManifestRole)> = None;

        for (pattern, role) in &self.roles {
            let specificity = if pattern == "." {
                relative_dir.is_empty().then_some(1)
            } else if let Some(prefix) = pattern.strip_suffix("/*") {
                relative_dir
                    .strip_prefix(prefix)
                    .and_then(|rest| rest.strip_prefix('/'))
                    .filter(|rest| !rest.is_empty() && !rest.contains('/'))
                    .map(|_| pattern.len())
            } else if relative_dir == pattern.as_str() {
                // Exact patterns beat a glob with the same stem.
                Some(pattern.len() + 1)
            } else {
                None
            };

            if let Some(specificity) = specificity {
                if best.map_or(true, |(b, _)| specificity > b) {
                    best = Some((specificity, *role));
                }
            }
        }

        best.map(|(_, role)| role).unwrap_or(ManifestRole::Project)
    }
}

/// Walk up from `start` to the nearest directory containing `workspace.toml`.
pub fn find_workspace_root(start: impl AsRef<Path>) -> Result<PathBuf> {
    let start = start.as_ref();
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(CONFIG_FILE).is_file() {
            return Ok(dir);
        }
        if !dir.pop() {
            anyhow::bail!("No {} found above {}", CONFIG_FILE, start.display());
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
