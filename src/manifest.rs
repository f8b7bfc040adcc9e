//! Package manifest parsing, roles, and mutation policies.
//!
//! A `PackageManifest` keeps the raw order-preserving JSON map alongside the
//! indentation and trailing-newline conventions detected from the source
//! text, so an in-place rewrite changes only the fields a recipe touched.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::ser::PrettyFormatter;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Dependency sections a recipe may rewrite.
pub const DEPENDENCY_SECTIONS: [&str; 2] = ["dependencies", "devDependencies"];

/// Role of a manifest within the workspace, declared in `workspace.toml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManifestRole {
    Project,
    Config,
    Docs,
    App,
    Package,
    Tool,
}

impl FromStr for ManifestRole {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "project" => Ok(Self::Project),
            "config" => Ok(Self::Config),
            "docs" => Ok(Self::Docs),
            "app" => Ok(Self::App),
            "package" => Ok(Self::Package),
            "tool" => Ok(Self::Tool),
            _ => Err(format!("Unknown manifest role: {}", s)),
        }
    }
}

impl ManifestRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Config => "config",
            Self::Docs => "docs",
            Self::App => "app",
            Self::Package => "package",
            Self::Tool => "tool",
        }
    }
}

/// Mutation class a synchronization recipe may apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPolicy {
    Freezable,
    Trackable,
    Distributable,
}

impl SyncPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Freezable => "freezable",
            Self::Trackable => "trackable",
            Self::Distributable => "distributable",
        }
    }
}

/// The static role → policy table.
pub fn allowed_policies(role: ManifestRole) -> &'static [SyncPolicy] {
    match role {
        ManifestRole::Project => &[SyncPolicy::Freezable],
        ManifestRole::Config => &[SyncPolicy::Freezable, SyncPolicy::Trackable],
        ManifestRole::Docs => &[SyncPolicy::Freezable, SyncPolicy::Trackable],
        ManifestRole::App => &[SyncPolicy::Trackable],
        ManifestRole::Package => &[SyncPolicy::Trackable, SyncPolicy::Distributable],
        ManifestRole::Tool => &[SyncPolicy::Freezable, SyncPolicy::Trackable],
    }
}

/// Guard called by every mutating recipe before it touches a manifest.
pub fn is_policy_allowed(role: ManifestRole, policy: SyncPolicy) -> bool {
    allowed_policies(role).contains(&policy)
}

/// Represents a `package.json` manifest file.
#[derive(Debug, Clone)]
pub struct PackageManifest {
    pub path: PathBuf,
    pub role: ManifestRole,
    data: Map<String, Value>,
    indent: String,
    trailing_newline: bool,
}

impl PackageManifest {
    /// Load a `package.json` file from disk.
    pub fn load(path: impl AsRef<Path>, role: ManifestRole) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let data: Map<String, Value> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            role,
            data,
            indent: detect_indent(&content),
            trailing_newline: content.ends_with('\n'),
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.string_field("name")
    }

    pub fn version(&self) -> Option<&str> {
        self.string_field("version")
    }

    /// Package name when present, otherwise the manifest path.
    pub fn display_name(&self) -> String {
        match self.name() {
            Some(name) => name.to_string(),
            None => self.path.display().to_string(),
        }
    }

    pub fn string_field(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn set_field(&mut self, key: &str, value: Value) {
        self.data.insert(key.to_string(), value);
    }

    /// String-valued entries of a dependency section, in declaration order.
    /// Non-string specifiers (objects, nulls) are skipped.
    pub fn dependencies(&self, section: &str) -> Vec<(String, String)> {
        match self.data.get(section).and_then(Value::as_object) {
            Some(map) => map
                .iter()
                .filter_map(|(name, spec)| {
                    spec.as_str().map(|s| (name.clone(), s.to_string()))
                })
                .collect(),
            None => Vec::new(),
        }
    }

    /// Rewrite one dependency specifier in place. Missing sections are left
    /// untouched; recipes only rewrite entries they saw during the diff.
    pub fn set_dependency(&mut self, section: &str, name: &str, spec: &str) {
        if let Some(map) = self.data.get_mut(section).and_then(Value::as_object_mut) {
            map.insert(name.to_string(), Value::String(spec.to_string()));
        }
    }

    pub fn engine(&self, name: &str) -> Option<&str> {
        self.data
            .get("engines")
            .and_then(Value::as_object)
            .and_then(|engines| engines.get(name))
            .and_then(Value::as_str)
    }

    /// Set an `engines` entry, creating the section when absent.
    pub fn set_engine(&mut self, name: &str, range: &str) {
        let engines = self
            .data
            .entry("engines".to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Some(map) = engines.as_object_mut() {
            map.insert(name.to_string(), Value::String(range.to_string()));
        }
    }

    /// Serialize with the conventions detected at load time.
    pub fn to_pretty_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(self.indent.as_bytes());
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.data
            .serialize(&mut serializer)
            .with_context(|| format!("Failed to serialize {}", self.path.display()))?;

        let mut text = String::from_utf8(buf)
            .with_context(|| format!("Failed to serialize {}", self.path.display()))?;
        if self.trailing_newline {
            text.push('\n');
        }
        Ok(text)
    }

    /// Save the manifest back to disk.
    pub fn save(&self) -> Result<()> {
        std::fs::write(&self.path, self.to_pretty_string()?)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}

/// Indentation of the first indented line, defaulting to two spaces.
fn detect_indent(content: &str) -> String {
    for line in content.lines() {
        let indent: String = line.chars().take_while(|c| c.is_whitespace()).collect();
        if !indent.is_empty() && indent.len() < line.len() {
            return indent;
        }
    }
    "  ".to_string()
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
