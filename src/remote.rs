//! Remote metadata caches: runtime release schedule and license registry.
//!
//! Both datasets are fetched at most once per `RemoteMetadata` instance. A
//! failed fetch (transport error, non-success status, or a payload that
//! fails schema validation) is cached as a terminal absent result and never
//! retried; callers see `None` and degrade. Concurrent first callers share
//! one in-flight request.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::patterns;

pub const DEFAULT_SCHEDULE_URL: &str =
    "https://raw.githubusercontent.com/nodejs/Release/main/schedule.json";
pub const DEFAULT_LICENSE_URL: &str =
    "https://raw.githubusercontent.com/spdx/license-list-data/main/json/licenses.json";

/// One release line of the runtime support schedule.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScheduleEntry {
    /// LTS codename. Presence, not value, marks the line as long-term
    /// support.
    pub codename: Option<String>,
    /// End-of-life date. Always present; a payload without it fails schema
    /// validation.
    pub end: NaiveDate,
}

/// Release schedule keyed by release-line identifier (`"v20"`).
pub type Schedule = BTreeMap<String, ScheduleEntry>;

#[derive(Debug, Deserialize)]
struct LicenseList {
    licenses: Vec<LicenseRecord>,
}

#[derive(Debug, Deserialize)]
struct LicenseRecord {
    #[serde(rename = "licenseId")]
    license_id: String,
}

/// Fetch-once caches over the two authoritative datasets.
///
/// Owned by whichever top-level context creates it: one instance per
/// process in production, one fresh instance per test.
pub struct RemoteMetadata {
    client: reqwest::Client,
    schedule_url: String,
    license_url: String,
    schedule: OnceCell<Option<Arc<Schedule>>>,
    licenses: OnceCell<Option<Arc<HashSet<String>>>>,
}

impl Default for RemoteMetadata {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteMetadata {
    /// Create a cache pointed at the default endpoints.
    pub fn new() -> Self {
        Self::with_endpoints(None, None)
    }

    /// Create a cache with endpoint overrides (from `workspace.toml`
    /// `[remote]`, or a mock server in tests).
    pub fn with_endpoints(schedule_url: Option<String>, license_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            schedule_url: schedule_url.unwrap_or_else(|| DEFAULT_SCHEDULE_URL.to_string()),
            license_url: license_url.unwrap_or_else(|| DEFAULT_LICENSE_URL.to_string()),
            schedule: OnceCell::new(),
            licenses: OnceCell::new(),
        }
    }

    /// Fetch and memoize the release schedule. Returns `None` when the
    /// dataset is unavailable, permanently for this instance.
    pub async fn fetch_schedule(&self) -> Option<Arc<Schedule>> {
        self.schedule
            .get_or_init(|| async {
                match self.request_schedule().await {
                    Ok(schedule) => {
                        debug!(lines = schedule.len(), "Fetched release schedule");
                        Some(Arc::new(schedule))
                    }
                    Err(e) => {
                        warn!("Release schedule unavailable: {:#}", e);
                        None
                    }
                }
            })
            .await
            .clone()
    }

    /// Fetch and memoize the set of known license identifiers.
    pub async fn fetch_licenses(&self) -> Option<Arc<HashSet<String>>> {
        self.licenses
            .get_or_init(|| async {
                match self.request_licenses().await {
                    Ok(licenses) => {
                        debug!(count = licenses.len(), "Fetched license registry");
                        Some(Arc::new(licenses))
                    }
                    Err(e) => {
                        warn!("License registry unavailable: {:#}", e);
                        None
                    }
                }
            })
            .await
            .clone()
    }

    /// Numeric release lines currently in long-term support: codename
    /// present and end-of-life in the future. Filtered to `>= floor` when
    /// given, sorted ascending. `None` when the schedule is unavailable.
    pub async fn fetch_active_lts_majors(&self, floor: Option<u64>) -> Option<Vec<u64>> {
        let schedule = self.fetch_schedule().await?;
        let today = chrono::Local::now().date_naive();

        let mut majors: Vec<u64> = schedule
            .iter()
            .filter(|(_, entry)| entry.codename.is_some() && entry.end > today)
            .filter_map(|(line, _)| patterns::strip_leading_non_digits(line).parse().ok())
            .filter(|major| floor.map_or(true, |floor| *major >= floor))
            .collect();

        majors.sort_unstable();
        majors.dedup();
        Some(majors)
    }

    /// Return both caches to the unfetched state. Test isolation only;
    /// production code never calls this.
    pub fn reset_for_testing(&mut self) {
        self.schedule = OnceCell::new();
        self.licenses = OnceCell::new();
    }

    async fn request_schedule(&self) -> Result<Schedule> {
        let response = self
            .client
            .get(&self.schedule_url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", self.schedule_url))?
            .error_for_status()
            .with_context(|| format!("Failed to fetch {}", self.schedule_url))?;

        let schedule: Schedule = response
            .json()
            .await
            .context("Release schedule failed schema validation")?;
        Ok(schedule)
    }

    async fn request_licenses(&self) -> Result<HashSet<String>> {
        let response = self
            .client
            .get(&self.license_url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", self.license_url))?
            .error_for_status()
            .with_context(|| format!("Failed to fetch {}", self.license_url))?;

        let list: LicenseList = response
            .json()
            .await
            .context("License list failed schema validation")?;
        Ok(list
            .licenses
            .into_iter()
            .map(|record| record.license_id)
            .collect())
    }
}

/// Engine constraint accepting every given major line: `^18 || ^20`.
pub fn lts_engine_range(majors: &[u64]) -> String {
    majors
        .iter()
        .map(|major| format!("^{}", major))
        .collect::<Vec<_>>()
        .join(" || ")
}

#[cfg(test)]
#[path = "remote_tests.rs"]
mod tests;
