//! Text-extraction patterns shared by the probe and sync layers.
//!
//! Every rule that recognizes tool banners, version substrings, or shell
//! noise lives here so there is a single source of truth for format
//! changes. Pattern sources are exported as plain `&str` constants with no
//! flags baked in; callers that need `multi_line` or `case_insensitive`
//! apply them through `RegexBuilder` at the point of use. All helpers are
//! total: unrecognized input yields `None` or the input unchanged, never
//! an error.

use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;

/// Unanchored ANSI escape sequence (CSI form).
pub const ANSI: &str = r"\x1b\[[0-9;?]*[\x40-\x7e]";

/// ANSI escape sequence anchored at the start of input.
pub const ANSI_ANCHORED: &str = r"^\x1b\[[0-9;?]*[\x40-\x7e]";

/// Single- or double-quoted string; group 1 or 2 captures the interior.
pub const QUOTED: &str = r#""([^"]*)"|'([^']*)'"#;

/// Canonical semantic version: numeric core with no leading zeros, optional
/// pre-release and build-metadata suffixes.
pub const SEMVER: &str = r"(?P<core>(?:0|[1-9]\d*)\.(?:0|[1-9]\d*)\.(?:0|[1-9]\d*))(?:-(?P<pre>(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?(?:\+(?P<build>[0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?";

/// First dotted numeric run, for versions that are not semver (4-part
/// browser builds, 2-part tool versions).
pub const DOTTED_VERSION: &str = r"\d+(?:\.\d+)+";

/// Version token of a Java-family banner (`openjdk 17.0.2 …`,
/// `java version "1.8.0_281"`).
pub const JAVA_VERSION: &str = r#"(?:openjdk|java)(?:\s+version)?\s+"?(?P<version>[0-9][\w.+-]*?)"?(?:\s|$)"#;

/// Distribution name and version inside a Java-family banner
/// (`Temurin-17.0.2+8`, `Zulu17.30+15-CA`, `GraalVM CE 17.0.7+7.1`).
pub const JAVA_DISTRIBUTION: &str = r"(?P<distribution>GraalVM CE|Temurin|Corretto|Zulu|AdoptOpenJDK|GraalVM|Liberica|Semeru|Microsoft|Homebrew)[-. ]?(?P<distribution_version>[0-9][^\s()]*)";

/// Build string of a Java-family banner (`(build 17.0.2+8)`).
pub const JAVA_BUILD: &str = r"\(build\s+(?P<build>[^)]+)\)";

/// Rust compiler banner: version, optional channel, commit hash and date.
pub const RUSTC_BANNER: &str = r"rustc\s+(?P<version>\d+\.\d+\.\d+)(?:-(?P<channel>nightly|beta(?:\.\d+)?|dev))?\s+\((?P<hash>[0-9a-f]+)\s+(?P<date>\d{4}-\d{2}-\d{2})\)";

/// One `reg query` result row: value name, declared type, data. Callers
/// apply the multiline flag when scanning whole command output.
pub const REGISTRY_ROW: &str = r"^\s*(?P<name>\S+)\s+(?P<kind>REG_[A-Z_]+)\s+(?P<value>.+?)\s*$";

/// Unscoped package slug: lowercase alphanumeric segments joined by single
/// hyphens or underscores.
pub const SLUG: &str = r"[a-z0-9]+(?:[-_][a-z0-9]+)*";

/// Scoped package slug: `@scope/name` with the same per-segment rules.
pub const SCOPED_SLUG: &str = r"@[a-z0-9]+(?:[-_][a-z0-9]+)*/[a-z0-9]+(?:[-_][a-z0-9]+)*";

/// Run of non-digit characters at the start of input.
pub const LEADING_NON_DIGITS: &str = r"^[^0-9]*";

/// Run of whitespace characters.
pub const WHITESPACE_RUN: &str = r"\s+";

/// Line break, tolerant of both line-ending conventions.
pub const LINE_BREAK: &str = r"\r?\n";

/// Loose email shape, for sanity-checking `Name <address>` author strings.
pub const EMAIL: &str = r"[^\s@<>]+@[^\s@<>]+\.[^\s@<>]+";

/// Leading `error:` / `Error:` prefix on a diagnostic line. Case folding is
/// applied by the caller.
pub const ERROR_PREFIX: &str = r"^\s*(?:error|err)\s*:\s*";

fn compiled(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("built-in pattern compiles"))
}

/// Parsed semantic-version substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemverParts {
    /// Entire matched version, suffixes included.
    pub full: String,
    /// The `major.minor.patch` numeric core.
    pub core: String,
    pub pre_release: Option<String>,
    pub build: Option<String>,
}

/// Parsed Java-family version banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaBanner {
    pub version: String,
    pub distribution: Option<String>,
    pub distribution_version: Option<String>,
    pub build: Option<String>,
}

/// Parsed Rust compiler banner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RustcBanner {
    pub version: String,
    pub channel: Option<String>,
    pub commit_hash: String,
    pub commit_date: String,
}

/// One row of `reg query` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryRow {
    pub name: String,
    pub kind: String,
    pub value: String,
}

/// Remove every ANSI escape sequence from `text`.
pub fn strip_ansi(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, ANSI).replace_all(text, "").into_owned()
}

/// Unwrap `text` when the whole trimmed input is one quoted string,
/// otherwise return it unchanged.
pub fn unquote(text: &str) -> &str {
    static RE: OnceLock<Regex> = OnceLock::new();
    let exact = RE.get_or_init(|| {
        Regex::new(&format!("^(?:{QUOTED})$")).expect("built-in pattern compiles")
    });

    let trimmed = text.trim();
    match exact.captures(trimmed) {
        Some(caps) => caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or(trimmed),
        None => text,
    }
}

/// Extract the first semantic version in `text`.
pub fn extract_semver(text: &str) -> Option<SemverParts> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let caps = compiled(&RE, SEMVER).captures(text)?;

    Some(SemverParts {
        full: caps.get(0)?.as_str().to_string(),
        core: caps.name("core")?.as_str().to_string(),
        pre_release: caps.name("pre").map(|m| m.as_str().to_string()),
        build: caps.name("build").map(|m| m.as_str().to_string()),
    })
}

/// Extract the first dotted numeric version in `text` (`109.0.5414.119`).
pub fn extract_dotted_version(text: &str) -> Option<String> {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, DOTTED_VERSION)
        .find(text)
        .map(|m| m.as_str().to_string())
}

/// Parse a Java-family version banner. Returns `None` when no version token
/// is present; distribution and build details are optional.
pub fn parse_java_banner(text: &str) -> Option<JavaBanner> {
    static VERSION: OnceLock<Regex> = OnceLock::new();
    static DISTRIBUTION: OnceLock<Regex> = OnceLock::new();
    static BUILD: OnceLock<Regex> = OnceLock::new();

    let version = compiled(&VERSION, JAVA_VERSION)
        .captures(text)?
        .name("version")?
        .as_str()
        .to_string();

    let (distribution, distribution_version) =
        match compiled(&DISTRIBUTION, JAVA_DISTRIBUTION).captures(text) {
            Some(caps) => (
                caps.name("distribution").map(|m| m.as_str().to_string()),
                caps.name("distribution_version")
                    .map(|m| m.as_str().to_string()),
            ),
            None => (None, None),
        };

    let build = compiled(&BUILD, JAVA_BUILD)
        .captures(text)
        .and_then(|caps| caps.name("build").map(|m| m.as_str().to_string()));

    Some(JavaBanner {
        version,
        distribution,
        distribution_version,
        build,
    })
}

/// Parse a `rustc --version` banner.
pub fn parse_rustc_banner(text: &str) -> Option<RustcBanner> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let caps = compiled(&RE, RUSTC_BANNER).captures(text)?;

    Some(RustcBanner {
        version: caps.name("version")?.as_str().to_string(),
        channel: caps.name("channel").map(|m| m.as_str().to_string()),
        commit_hash: caps.name("hash")?.as_str().to_string(),
        commit_date: caps.name("date")?.as_str().to_string(),
    })
}

/// Parse every three-column row out of `reg query` output.
pub fn parse_registry_rows(text: &str) -> Vec<RegistryRow> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let rows = RE.get_or_init(|| {
        RegexBuilder::new(REGISTRY_ROW)
            .multi_line(true)
            .build()
            .expect("built-in pattern compiles")
    });

    rows.captures_iter(text)
        .filter_map(|caps| {
            Some(RegistryRow {
                name: caps.name("name")?.as_str().to_string(),
                kind: caps.name("kind")?.as_str().to_string(),
                value: unquote(caps.name("value")?.as_str()).to_string(),
            })
        })
        .collect()
}

/// Whether `text` is a valid unscoped package slug.
pub fn is_valid_slug(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(&format!("^(?:{SLUG})$")).expect("built-in pattern compiles"))
        .is_match(text)
}

/// Whether `text` is a valid `@scope/name` package slug.
pub fn is_valid_scoped_slug(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("^(?:{SCOPED_SLUG})$")).expect("built-in pattern compiles")
    })
    .is_match(text)
}

/// Slice off everything before the first digit.
pub fn strip_leading_non_digits(text: &str) -> &str {
    static RE: OnceLock<Regex> = OnceLock::new();
    match compiled(&RE, LEADING_NON_DIGITS).find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// Collapse every whitespace run to a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, WHITESPACE_RUN)
        .replace_all(text.trim(), " ")
        .into_owned()
}

/// Split `text` into lines, accepting both line-ending conventions.
pub fn split_lines(text: &str) -> Vec<&str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, LINE_BREAK).split(text).collect()
}

/// Whether `text` contains an email-shaped token.
pub fn is_email_like(text: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    compiled(&RE, EMAIL).is_match(text)
}

/// Drop a leading `error:` prefix from a diagnostic line, case-insensitively.
pub fn strip_error_prefix(text: &str) -> &str {
    static RE: OnceLock<Regex> = OnceLock::new();
    let prefix = RE.get_or_init(|| {
        RegexBuilder::new(ERROR_PREFIX)
            .case_insensitive(true)
            .build()
            .expect("built-in pattern compiles")
    });

    match prefix.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

#[cfg(test)]
#[path = "patterns_tests.rs"]
mod tests;
