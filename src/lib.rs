//! Version intelligence and manifest synchronization for the Meridian
//! multi-project workspace.
//!
//! This crate keeps machine-readable facts consistent across every
//! `package.json` in the workspace: installed-tool versions (probe),
//! dependency pin targets and engine constraints (sync recipes), and
//! license identifiers (remote metadata).

pub mod config;
pub mod manifest;
pub mod patterns;
pub mod probe;
pub mod remote;
pub mod sync;
pub mod workspace;

pub use config::{find_workspace_root, WorkspaceConfig};
pub use manifest::{
    allowed_policies, is_policy_allowed, ManifestRole, PackageManifest, SyncPolicy,
};
pub use probe::{probe_all, probe_category, ProbeCategory};
pub use remote::{lts_engine_range, RemoteMetadata, ScheduleEntry};
pub use sync::{SyncEngine, SyncOptions, SyncOutcome};
pub use workspace::{Discovery, WorkspaceScanner};
