//! Synchronization recipes for workspace manifests.
//!
//! Every recipe runs the same four-stage pipeline: discover manifests,
//! compute each manifest's diff in memory, print the report, and only then
//! write the changed files. Diff computation never interleaves with writes,
//! so the preview always matches what a write run would do. A single
//! manifest's failure is recorded in the aggregate outcome and skipped; no
//! recipe aborts the whole workspace because of one bad manifest.

use anyhow::Result;
use colored::Colorize;
use semver::Version;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::WorkspaceConfig;
use crate::manifest::{
    is_policy_allowed, PackageManifest, SyncPolicy, DEPENDENCY_SECTIONS,
};
use crate::patterns;
use crate::remote::{lts_engine_range, RemoteMetadata};
use crate::workspace::{Discovery, WorkspaceScanner};

/// Run options shared by every recipe.
///
/// With both flags unset the recipe is preview-only; files are written only
/// when `replace_file` is set and `dry_run` is not.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    pub dry_run: bool,
    pub replace_file: bool,
}

impl SyncOptions {
    pub fn should_write(&self) -> bool {
        self.replace_file && !self.dry_run
    }
}

/// Per-manifest outcome of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestStatus {
    Changed,
    Unchanged,
    Skipped,
    Error,
}

/// One manifest's entry in the aggregate report.
#[derive(Debug, Clone)]
pub struct ManifestReport {
    pub path: PathBuf,
    pub name: String,
    pub status: ManifestStatus,
    pub details: Vec<String>,
}

/// Aggregate summary of a recipe run.
#[derive(Debug, Default)]
pub struct SyncOutcome {
    pub changed: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub errors: usize,
    pub reports: Vec<ManifestReport>,
}

impl SyncOutcome {
    fn push(&mut self, report: ManifestReport) {
        match report.status {
            ManifestStatus::Changed => self.changed += 1,
            ManifestStatus::Unchanged => self.unchanged += 1,
            ManifestStatus::Skipped => self.skipped += 1,
            ManifestStatus::Error => self.errors += 1,
        }
        self.reports.push(report);
    }

    /// Print a colorized terminal report.
    pub fn print(&self, title: &str, options: &SyncOptions) {
        println!("\n{}", "═".repeat(80).bright_black());
        println!("{}", title.bright_white().bold());
        println!("{}", "═".repeat(80).bright_black());
        if !options.should_write() {
            println!("{}", "Preview mode: no files were written".yellow());
        }
        println!();

        for report in &self.reports {
            let icon = match report.status {
                ManifestStatus::Changed => "✓".green(),
                ManifestStatus::Unchanged => "·".bright_black(),
                ManifestStatus::Skipped => "⚠".yellow(),
                ManifestStatus::Error => "✗".red(),
            };
            println!(
                "{} {} {}",
                icon,
                report.name.bright_white().bold(),
                report.path.display().to_string().dimmed()
            );
            for detail in &report.details {
                println!("    {}", detail.dimmed());
            }
        }

        println!(
            "\n{} changed, {} unchanged, {} skipped, {} error(s)",
            self.changed.to_string().green(),
            self.unchanged,
            self.skipped.to_string().yellow(),
            self.errors.to_string().red()
        );
    }
}

fn report(manifest: &PackageManifest, status: ManifestStatus, details: Vec<String>) -> ManifestReport {
    ManifestReport {
        path: manifest.path.clone(),
        name: manifest.display_name(),
        status,
        details,
    }
}

fn policy_skip(manifest: &PackageManifest, policy: SyncPolicy) -> ManifestReport {
    report(
        manifest,
        ManifestStatus::Skipped,
        vec![format!(
            "role '{}' does not permit {} mutations",
            manifest.role.as_str(),
            policy.as_str()
        )],
    )
}

/// Runs the synchronization recipes against one workspace.
pub struct SyncEngine<'a> {
    config: &'a WorkspaceConfig,
    remote: &'a RemoteMetadata,
}

impl<'a> SyncEngine<'a> {
    pub fn new(config: &'a WorkspaceConfig, remote: &'a RemoteMetadata) -> Self {
        Self { config, remote }
    }

    /// Pin every range-prefixed dependency specifier to its exact version.
    /// Idempotent: a second run without intervening edits changes nothing.
    pub async fn pin_versions(&self, options: &SyncOptions) -> Result<SyncOutcome> {
        let mut discovery = self.discover()?;
        let mut outcome = SyncOutcome::default();
        record_discovery_errors(&mut outcome, &discovery);
        let mut to_write = Vec::new();

        for (index, manifest) in discovery.manifests.iter_mut().enumerate() {
            if !is_policy_allowed(manifest.role, SyncPolicy::Trackable) {
                outcome.push(policy_skip(manifest, SyncPolicy::Trackable));
                continue;
            }

            let mut details = Vec::new();
            for section in DEPENDENCY_SECTIONS {
                for (name, spec) in manifest.dependencies(section) {
                    if let Some(pinned) = pin_specifier(&spec) {
                        details.push(format!("{}: {} -> {}", name, spec, pinned));
                        manifest.set_dependency(section, &name, &pinned);
                    }
                }
            }

            if details.is_empty() {
                outcome.push(report(manifest, ManifestStatus::Unchanged, details));
            } else {
                info!(
                    manifest = %manifest.path.display(),
                    pinned = details.len(),
                    "Pinning dependency specifiers"
                );
                to_write.push(index);
                outcome.push(report(manifest, ManifestStatus::Changed, details));
            }
        }

        write_changed(&discovery.manifests, &to_write, options, &mut outcome);
        Ok(outcome)
    }

    /// Write the active-LTS engine constraint into `engines.<runtime>` of
    /// every freezable manifest. When the schedule dataset is unavailable
    /// every candidate is skipped with that reason; nothing aborts.
    pub async fn sync_engines(&self, options: &SyncOptions) -> Result<SyncOutcome> {
        let majors = self.remote.fetch_active_lts_majors(None).await;
        let range = match majors.as_deref() {
            Some([]) => None,
            Some(majors) => Some(lts_engine_range(majors)),
            None => None,
        };
        let skip_reason = match majors {
            None => "release schedule unavailable",
            Some(_) => "no active LTS release lines",
        };

        let mut discovery = self.discover()?;
        let mut outcome = SyncOutcome::default();
        record_discovery_errors(&mut outcome, &discovery);
        let mut to_write = Vec::new();

        for (index, manifest) in discovery.manifests.iter_mut().enumerate() {
            if !is_policy_allowed(manifest.role, SyncPolicy::Freezable) {
                outcome.push(policy_skip(manifest, SyncPolicy::Freezable));
                continue;
            }

            let Some(range) = &range else {
                outcome.push(report(
                    manifest,
                    ManifestStatus::Skipped,
                    vec![skip_reason.to_string()],
                ));
                continue;
            };

            let current = manifest.engine(&self.config.runtime);
            if current == Some(range.as_str()) {
                outcome.push(report(manifest, ManifestStatus::Unchanged, Vec::new()));
            } else {
                let detail = format!(
                    "engines.{}: {} -> {}",
                    self.config.runtime,
                    current.unwrap_or("(unset)"),
                    range
                );
                manifest.set_engine(&self.config.runtime, range);
                info!(manifest = %manifest.path.display(), "{}", detail);
                to_write.push(index);
                outcome.push(report(manifest, ManifestStatus::Changed, vec![detail]));
            }
        }

        write_changed(&discovery.manifests, &to_write, options, &mut outcome);
        Ok(outcome)
    }

    /// Reconcile dependency specifiers against resolved versions: a
    /// workspace-local package of the same name first, then a copy installed
    /// under `node_modules`. A `^`/`~` operator prefix is preserved;
    /// unresolvable dependencies are left alone.
    pub async fn sync_versions(&self, options: &SyncOptions) -> Result<SyncOutcome> {
        let mut discovery = self.discover()?;
        let mut outcome = SyncOutcome::default();
        record_discovery_errors(&mut outcome, &discovery);

        let local: HashMap<String, String> = discovery
            .manifests
            .iter()
            .filter_map(|m| Some((m.name()?.to_string(), m.version()?.to_string())))
            .collect();

        let mut to_write = Vec::new();

        for (index, manifest) in discovery.manifests.iter_mut().enumerate() {
            if !is_policy_allowed(manifest.role, SyncPolicy::Trackable) {
                outcome.push(policy_skip(manifest, SyncPolicy::Trackable));
                continue;
            }

            let mut details = Vec::new();
            for section in DEPENDENCY_SECTIONS {
                for (name, spec) in manifest.dependencies(section) {
                    // Only validly-named packages are looked up on disk
                    if !patterns::is_valid_slug(&name) && !patterns::is_valid_scoped_slug(&name) {
                        continue;
                    }
                    let resolved = match local.get(&name) {
                        Some(version) => Some(version.clone()),
                        None => installed_version(&self.config.root, &name),
                    };
                    let Some(resolved) = resolved else { continue };

                    if let Some(updated) = retarget_specifier(&spec, &resolved) {
                        info!(
                            manifest = %manifest.path.display(),
                            dependency = %name,
                            "{} -> {}", spec, updated
                        );
                        details.push(format!("{}: {} -> {}", name, spec, updated));
                        manifest.set_dependency(section, &name, &updated);
                    }
                }
            }

            if details.is_empty() {
                outcome.push(report(manifest, ManifestStatus::Unchanged, details));
            } else {
                to_write.push(index);
                outcome.push(report(manifest, ManifestStatus::Changed, details));
            }
        }

        write_changed(&discovery.manifests, &to_write, options, &mut outcome);
        Ok(outcome)
    }

    /// Reconcile `license`, `author`, and `repository` from the
    /// workspace-root manifest into every distributable manifest. The
    /// license identifier is validated against the license registry; an
    /// unknown identifier is recorded as that manifest's error and blocks
    /// only the license write. When the registry is unavailable the license
    /// is synced unvalidated with a warning.
    pub async fn sync_metadata(&self, options: &SyncOptions) -> Result<SyncOutcome> {
        let licenses = self.remote.fetch_licenses().await;
        if licenses.is_none() {
            warn!("License registry unavailable; syncing license fields unvalidated");
        }

        let mut discovery = self.discover()?;
        let mut outcome = SyncOutcome::default();
        record_discovery_errors(&mut outcome, &discovery);

        let source = discovery
            .manifests
            .iter()
            .find(|m| m.path.parent() == Some(self.config.root.as_path()))
            .map(|m| SourceFields {
                license: m.string_field("license").map(str::to_string),
                author: m.field("author").cloned(),
                repository: m.field("repository").cloned(),
            });

        if let Some(author) = source
            .as_ref()
            .and_then(|s| s.author.as_ref())
            .and_then(Value::as_str)
        {
            if !patterns::is_email_like(author) {
                warn!("Workspace author '{}' has no email address", author);
            }
        }

        let mut to_write = Vec::new();

        for (index, manifest) in discovery.manifests.iter_mut().enumerate() {
            if !is_policy_allowed(manifest.role, SyncPolicy::Distributable) {
                outcome.push(policy_skip(manifest, SyncPolicy::Distributable));
                continue;
            }

            let Some(source) = &source else {
                outcome.push(report(
                    manifest,
                    ManifestStatus::Skipped,
                    vec!["no workspace-root manifest to sync from".to_string()],
                ));
                continue;
            };

            let mut details = Vec::new();
            let mut license_error = None;

            if let Some(license) = &source.license {
                match &licenses {
                    Some(registry) if !registry.contains(license) => {
                        license_error =
                            Some(format!("license '{}' is not a known identifier", license));
                    }
                    _ => {
                        if manifest.string_field("license") != Some(license.as_str()) {
                            details.push(format!(
                                "license: {} -> {}",
                                manifest.string_field("license").unwrap_or("(unset)"),
                                license
                            ));
                            manifest.set_field("license", Value::String(license.clone()));
                        }
                    }
                }
            }

            for (key, value) in [("author", &source.author), ("repository", &source.repository)] {
                if let Some(value) = value {
                    if manifest.field(key) != Some(value) {
                        details.push(format!("{}: synced from workspace root", key));
                        manifest.set_field(key, value.clone());
                    }
                }
            }

            if !details.is_empty() {
                to_write.push(index);
            }

            match license_error {
                Some(error) => {
                    let mut all = vec![error];
                    all.extend(details);
                    outcome.push(report(manifest, ManifestStatus::Error, all));
                }
                None if details.is_empty() => {
                    outcome.push(report(manifest, ManifestStatus::Unchanged, details));
                }
                None => {
                    outcome.push(report(manifest, ManifestStatus::Changed, details));
                }
            }
        }

        write_changed(&discovery.manifests, &to_write, options, &mut outcome);
        Ok(outcome)
    }

    fn discover(&self) -> Result<Discovery> {
        WorkspaceScanner::new(&self.config.root).discover(self.config)
    }
}

struct SourceFields {
    license: Option<String>,
    author: Option<Value>,
    repository: Option<Value>,
}

fn record_discovery_errors(outcome: &mut SyncOutcome, discovery: &Discovery) {
    for error in &discovery.errors {
        outcome.push(ManifestReport {
            path: error.path.clone(),
            name: error.path.display().to_string(),
            status: ManifestStatus::Error,
            details: vec![error.message.clone()],
        });
    }
}

/// Stage four: write every changed manifest back in place. Runs only when
/// the options ask for it; a failed write degrades to an error entry.
fn write_changed(
    manifests: &[PackageManifest],
    indexes: &[usize],
    options: &SyncOptions,
    outcome: &mut SyncOutcome,
) {
    if !options.should_write() {
        return;
    }
    for &index in indexes {
        let manifest = &manifests[index];
        if let Err(e) = manifest.save() {
            warn!("Failed to write {}: {:#}", manifest.path.display(), e);
            outcome.push(report(
                manifest,
                ManifestStatus::Error,
                vec![format!("write failed: {:#}", e)],
            ));
        }
    }
}

/// Strip a range/prefix operator from an otherwise exact specifier.
/// Returns `None` when the specifier is already exact or is not an
/// operator-prefixed exact version (`*`, `1.x`, full ranges, `workspace:`,
/// `file:`, URLs).
fn pin_specifier(spec: &str) -> Option<String> {
    let trimmed = spec.trim();
    let bare = trimmed
        .trim_start_matches(|c: char| matches!(c, '^' | '~' | '>' | '=' | 'v') || c.is_whitespace());
    if bare == trimmed {
        return None;
    }
    if Version::parse(bare).is_ok() {
        Some(bare.to_string())
    } else {
        None
    }
}

/// Retarget a plain version specifier at a resolved version, preserving a
/// `^`/`~` operator prefix. Returns `None` when the specifier already
/// targets the resolved version or is not a plain version shape.
fn retarget_specifier(spec: &str, resolved: &str) -> Option<String> {
    let trimmed = spec.trim();
    let (operator, bare) = match trimmed.strip_prefix(['^', '~']) {
        Some(rest) => (&trimmed[..1], rest),
        None => ("", trimmed),
    };
    Version::parse(bare).ok()?;
    if bare == resolved {
        return None;
    }
    Some(format!("{}{}", operator, resolved))
}

/// Version of a package installed under `<root>/node_modules`.
fn installed_version(root: &Path, name: &str) -> Option<String> {
    let path = root.join("node_modules").join(name).join("package.json");
    let content = std::fs::read_to_string(path).ok()?;
    let data: serde_json::Value = serde_json::from_str(&content).ok()?;
    data.get("version")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
