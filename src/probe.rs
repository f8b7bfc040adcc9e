//! Installed-tool version probing.
//!
//! Each category owns a table of `ToolSpec` rows; adding a tool is a data
//! change, not new control flow. A tool that is missing, times out, exits
//! without recognizable output, or prints an unknown banner is simply
//! omitted from the result map.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::patterns;

/// Bounded wait per diagnostic command; expiry counts as "not installed".
const COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Categories of tools that can be probed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeCategory {
    Browsers,
    Managers,
    Runtimes,
    NodeTools,
    System,
}

impl ProbeCategory {
    pub const ALL: [ProbeCategory; 5] = [
        Self::Browsers,
        Self::Managers,
        Self::Runtimes,
        Self::NodeTools,
        Self::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Browsers => "browsers",
            Self::Managers => "managers",
            Self::Runtimes => "runtimes",
            Self::NodeTools => "node-tools",
            Self::System => "system",
        }
    }
}

impl FromStr for ProbeCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "browsers" => Ok(Self::Browsers),
            "managers" => Ok(Self::Managers),
            "runtimes" => Ok(Self::Runtimes),
            "node-tools" => Ok(Self::NodeTools),
            "system" => Ok(Self::System),
            _ => Err(format!("Unknown probe category: {}", s)),
        }
    }
}

/// Which pattern-library rule normalizes a tool's banner.
#[derive(Debug, Clone, Copy)]
pub enum BannerKind {
    Semver,
    Dotted,
    Java,
    Rustc,
}

/// One probeable tool: diagnostic command plus banner normalizer.
#[derive(Debug, Clone, Copy)]
pub struct ToolSpec {
    pub name: &'static str,
    pub command: &'static str,
    pub args: &'static [&'static str],
    pub banner: BannerKind,
}

const BROWSERS: &[ToolSpec] = &[
    ToolSpec {
        name: "firefox",
        command: "firefox",
        args: &["--version"],
        banner: BannerKind::Dotted,
    },
    ToolSpec {
        name: "chrome",
        command: "google-chrome",
        args: &["--version"],
        banner: BannerKind::Dotted,
    },
    ToolSpec {
        name: "chromium",
        command: "chromium",
        args: &["--version"],
        banner: BannerKind::Dotted,
    },
    ToolSpec {
        name: "brave",
        command: "brave-browser",
        args: &["--version"],
        banner: BannerKind::Dotted,
    },
    ToolSpec {
        name: "edge",
        command: "microsoft-edge",
        args: &["--version"],
        banner: BannerKind::Dotted,
    },
];

#[cfg(target_os = "macos")]
const MAC_BROWSER_BUNDLES: &[ToolSpec] = &[
    ToolSpec {
        name: "chrome",
        command: "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        args: &["--version"],
        banner: BannerKind::Dotted,
    },
    ToolSpec {
        name: "firefox",
        command: "/Applications/Firefox.app/Contents/MacOS/firefox",
        args: &["--version"],
        banner: BannerKind::Dotted,
    },
    ToolSpec {
        name: "edge",
        command: "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
        args: &["--version"],
        banner: BannerKind::Dotted,
    },
];

#[cfg(windows)]
const BROWSER_REGISTRY_KEYS: &[(&str, &str)] = &[
    ("chrome", r"HKCU\Software\Google\Chrome\BLBeacon"),
    ("edge", r"HKCU\Software\Microsoft\Edge\BLBeacon"),
];

const MANAGERS: &[ToolSpec] = &[
    ToolSpec {
        name: "rustup",
        command: "rustup",
        args: &["--version"],
        banner: BannerKind::Semver,
    },
    ToolSpec {
        name: "pyenv",
        command: "pyenv",
        args: &["--version"],
        banner: BannerKind::Dotted,
    },
    ToolSpec {
        name: "rbenv",
        command: "rbenv",
        args: &["--version"],
        banner: BannerKind::Dotted,
    },
    ToolSpec {
        name: "fnm",
        command: "fnm",
        args: &["--version"],
        banner: BannerKind::Semver,
    },
    ToolSpec {
        name: "volta",
        command: "volta",
        args: &["--version"],
        banner: BannerKind::Semver,
    },
    ToolSpec {
        name: "conda",
        command: "conda",
        args: &["--version"],
        banner: BannerKind::Dotted,
    },
];

const RUNTIMES: &[ToolSpec] = &[
    ToolSpec {
        name: "node",
        command: "node",
        args: &["--version"],
        banner: BannerKind::Semver,
    },
    ToolSpec {
        name: "deno",
        command: "deno",
        args: &["--version"],
        banner: BannerKind::Semver,
    },
    ToolSpec {
        name: "bun",
        command: "bun",
        args: &["--version"],
        banner: BannerKind::Semver,
    },
    ToolSpec {
        name: "python",
        command: "python3",
        args: &["--version"],
        banner: BannerKind::Dotted,
    },
    ToolSpec {
        name: "ruby",
        command: "ruby",
        args: &["--version"],
        banner: BannerKind::Dotted,
    },
    ToolSpec {
        name: "go",
        command: "go",
        args: &["version"],
        banner: BannerKind::Dotted,
    },
    // java banners on stderr
    ToolSpec {
        name: "java",
        command: "java",
        args: &["-version"],
        banner: BannerKind::Java,
    },
    ToolSpec {
        name: "rustc",
        command: "rustc",
        args: &["--version"],
        banner: BannerKind::Rustc,
    },
];

const NODE_TOOLS: &[ToolSpec] = &[
    ToolSpec {
        name: "npm",
        command: "npm",
        args: &["--version"],
        banner: BannerKind::Semver,
    },
    ToolSpec {
        name: "yarn",
        command: "yarn",
        args: &["--version"],
        banner: BannerKind::Semver,
    },
    ToolSpec {
        name: "pnpm",
        command: "pnpm",
        args: &["--version"],
        banner: BannerKind::Semver,
    },
    ToolSpec {
        name: "corepack",
        command: "corepack",
        args: &["--version"],
        banner: BannerKind::Semver,
    },
];

/// Probe one category, returning tool → normalized version.
pub async fn probe_category(category: ProbeCategory) -> BTreeMap<String, String> {
    match category {
        ProbeCategory::Browsers => probe_browsers().await,
        ProbeCategory::Managers => probe_tools(MANAGERS).await,
        ProbeCategory::Runtimes => probe_tools(RUNTIMES).await,
        ProbeCategory::NodeTools => probe_tools(NODE_TOOLS).await,
        ProbeCategory::System => probe_system().await,
    }
}

/// Probe the requested categories concurrently. A category that fails is
/// logged and omitted; the others still complete.
pub async fn probe_all(
    selection: &[ProbeCategory],
) -> BTreeMap<ProbeCategory, BTreeMap<String, String>> {
    let mut handles: Vec<(ProbeCategory, JoinHandle<BTreeMap<String, String>>)> = Vec::new();
    for &category in selection {
        handles.push((category, tokio::spawn(probe_category(category))));
    }

    let mut results = BTreeMap::new();
    for (category, handle) in handles {
        match handle.await {
            Ok(versions) => {
                results.insert(category, versions);
            }
            Err(e) => {
                warn!("{} probe failed: {}", category.as_str(), e);
            }
        }
    }
    results
}

async fn probe_browsers() -> BTreeMap<String, String> {
    let mut versions = probe_tools(BROWSERS).await;
    versions.extend(platform_browsers().await);
    versions
}

/// Browsers reached outside PATH: application bundles on macOS, registry
/// beacons on Windows.
#[cfg(target_os = "macos")]
async fn platform_browsers() -> BTreeMap<String, String> {
    probe_tools(MAC_BROWSER_BUNDLES).await
}

#[cfg(windows)]
async fn platform_browsers() -> BTreeMap<String, String> {
    probe_registry_browsers().await
}

#[cfg(not(any(target_os = "macos", windows)))]
async fn platform_browsers() -> BTreeMap<String, String> {
    BTreeMap::new()
}

/// Probe every tool in a table concurrently and merge the results.
async fn probe_tools(specs: &'static [ToolSpec]) -> BTreeMap<String, String> {
    let mut handles: Vec<JoinHandle<Option<(String, String)>>> = Vec::new();
    for spec in specs {
        handles.push(tokio::spawn(probe_tool(*spec)));
    }

    let mut versions = BTreeMap::new();
    for handle in handles {
        match handle.await {
            Ok(Some((name, version))) => {
                versions.insert(name, version);
            }
            Ok(None) => {}
            Err(e) => warn!("Probe task panicked: {}", e),
        }
    }
    versions
}

async fn probe_tool(spec: ToolSpec) -> Option<(String, String)> {
    let executable = which::which(spec.command).ok()?;
    let raw = run_command(&executable, spec.args, COMMAND_TIMEOUT).await?;
    let text = patterns::collapse_whitespace(&patterns::strip_ansi(&raw));
    let version = normalize_banner(spec.banner, &text)?;
    Some((spec.name.to_string(), version))
}

/// Run a diagnostic command with a bounded wait, capturing stdout and
/// stderr. Non-zero exit is tolerated; many tools banner on stderr and some
/// exit non-zero after printing. Returns `None` on spawn failure or timeout.
pub(crate) async fn run_command(
    executable: &Path,
    args: &[&str],
    timeout: Duration,
) -> Option<String> {
    let mut command = tokio::process::Command::new(executable);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push('\n');
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            Some(text)
        }
        Ok(Err(e)) => {
            debug!("{}: failed to run: {}", executable.display(), e);
            None
        }
        Err(_) => {
            debug!("{}: timed out after {:?}", executable.display(), timeout);
            None
        }
    }
}

/// Apply the banner kind's pattern to normalized output.
pub(crate) fn normalize_banner(kind: BannerKind, text: &str) -> Option<String> {
    match kind {
        BannerKind::Semver => patterns::extract_semver(text).map(|parts| parts.full),
        BannerKind::Dotted => patterns::extract_dotted_version(text),
        BannerKind::Java => patterns::parse_java_banner(text).map(|banner| banner.version),
        BannerKind::Rustc => patterns::parse_rustc_banner(text).map(|banner| {
            match banner.channel {
                Some(channel) => format!("{}-{}", banner.version, channel),
                None => banner.version,
            }
        }),
    }
}

async fn probe_system() -> BTreeMap<String, String> {
    let mut facts = BTreeMap::new();

    let info = os_info::get();
    facts.insert(
        "os".to_string(),
        patterns::collapse_whitespace(&format!("{} {}", info.os_type(), info.version())),
    );
    facts.insert("arch".to_string(), std::env::consts::ARCH.to_string());

    #[cfg(unix)]
    if let Ok(shell) = std::env::var("SHELL") {
        if let Some(version) = probe_shell_version(&shell).await {
            facts.insert("shell".to_string(), version);
        }
    }

    facts
}

#[cfg(unix)]
async fn probe_shell_version(shell: &str) -> Option<String> {
    let executable = which::which(shell).ok()?;
    let raw = run_command(&executable, &["--version"], COMMAND_TIMEOUT).await?;
    patterns::extract_dotted_version(&patterns::strip_ansi(&raw))
}

#[cfg(windows)]
async fn probe_registry_browsers() -> BTreeMap<String, String> {
    let mut versions = BTreeMap::new();
    for (name, key) in BROWSER_REGISTRY_KEYS {
        let Some(raw) = run_command(
            Path::new("reg"),
            &["query", key, "/v", "version"],
            COMMAND_TIMEOUT,
        )
        .await
        else {
            continue;
        };

        for row in patterns::parse_registry_rows(&raw) {
            if row.name.eq_ignore_ascii_case("version") {
                if let Some(version) = patterns::extract_dotted_version(&row.value) {
                    versions.insert(name.to_string(), version);
                }
            }
        }
    }
    versions
}

#[cfg(test)]
#[path = "probe_tests.rs"]
mod tests;
