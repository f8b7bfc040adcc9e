#[cfg(test)]
mod tests {
    use crate::patterns::*;

    #[test]
    fn test_extract_semver_core() {
        let parts = extract_semver("node v18.19.0 installed").unwrap();
        assert_eq!(parts.core, "18.19.0");
        assert_eq!(parts.full, "18.19.0");
        assert_eq!(parts.pre_release, None);
        assert_eq!(parts.build, None);
    }

    #[test]
    fn test_extract_semver_pre_release_and_build() {
        let parts = extract_semver("7.1.0-rc.2+build.5").unwrap();
        assert_eq!(parts.core, "7.1.0");
        assert_eq!(parts.pre_release.as_deref(), Some("rc.2"));
        assert_eq!(parts.build.as_deref(), Some("build.5"));
        assert_eq!(parts.full, "7.1.0-rc.2+build.5");
    }

    #[test]
    fn test_extract_semver_rejects_leading_zero() {
        assert!(extract_semver("1.01.0").is_none());
        assert!(extract_semver("1.01.2").is_none());
    }

    #[test]
    fn test_extract_semver_no_match() {
        assert!(extract_semver("no versions here").is_none());
        assert!(extract_semver("").is_none());
        assert!(extract_semver("1.2").is_none());
    }

    #[test]
    fn test_extract_dotted_version() {
        assert_eq!(
            extract_dotted_version("Google Chrome 109.0.5414.119").as_deref(),
            Some("109.0.5414.119")
        );
        assert_eq!(
            extract_dotted_version("Python 3.11.4").as_deref(),
            Some("3.11.4")
        );
        assert!(extract_dotted_version("version 7").is_none());
    }

    #[test]
    fn test_java_banner_temurin() {
        let banner = parse_java_banner(
            "openjdk 17.0.2 2022-01-18 LTS OpenJDK Runtime Environment Temurin-17.0.2+8 (build 17.0.2+8)",
        )
        .unwrap();

        assert_eq!(banner.version, "17.0.2");
        assert_eq!(banner.distribution.as_deref(), Some("Temurin"));
        assert_eq!(banner.distribution_version.as_deref(), Some("17.0.2+8"));
        assert_eq!(banner.build.as_deref(), Some("17.0.2+8"));
    }

    #[test]
    fn test_java_banner_legacy_quoted() {
        let banner = parse_java_banner("java version \"1.8.0_281\"\nJava(TM) SE Runtime Environment (build 1.8.0_281-b09)").unwrap();
        assert_eq!(banner.version, "1.8.0_281");
        assert_eq!(banner.distribution, None);
        assert_eq!(banner.build.as_deref(), Some("1.8.0_281-b09"));
    }

    #[test]
    fn test_java_banner_no_version() {
        assert!(parse_java_banner("not a java banner").is_none());
    }

    #[test]
    fn test_rustc_banner_stable() {
        let banner = parse_rustc_banner("rustc 1.75.0 (82e1608df 2023-12-21)").unwrap();
        assert_eq!(banner.version, "1.75.0");
        assert_eq!(banner.channel, None);
        assert_eq!(banner.commit_hash, "82e1608df");
        assert_eq!(banner.commit_date, "2023-12-21");
    }

    #[test]
    fn test_rustc_banner_nightly() {
        let banner = parse_rustc_banner("rustc 1.77.0-nightly (3b1717c05 2024-01-14)").unwrap();
        assert_eq!(banner.version, "1.77.0");
        assert_eq!(banner.channel.as_deref(), Some("nightly"));
    }

    #[test]
    fn test_registry_rows_multiline() {
        let output = "\r\nHKEY_CURRENT_USER\\Software\\Google\\Chrome\\BLBeacon\r\n    version    REG_SZ    109.0.5414.119\r\n    state      REG_DWORD    0x1\r\n";
        let rows = parse_registry_rows(output);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "version");
        assert_eq!(rows[0].kind, "REG_SZ");
        assert_eq!(rows[0].value, "109.0.5414.119");
        assert_eq!(rows[1].kind, "REG_DWORD");
    }

    #[test]
    fn test_registry_rows_none() {
        assert!(parse_registry_rows("garbage with no rows").is_empty());
    }

    #[test]
    fn test_slug_validation() {
        assert!(is_valid_slug("foo"));
        assert!(is_valid_slug("foo-bar"));
        assert!(is_valid_slug("foo_bar2"));

        assert!(!is_valid_slug("Foo"));
        assert!(!is_valid_slug("foo--bar"));
        assert!(!is_valid_slug("-foo"));
        assert!(!is_valid_slug("foo-"));
        assert!(!is_valid_slug(""));
    }

    #[test]
    fn test_scoped_slug_validation() {
        assert!(is_valid_scoped_slug("@scope/name"));
        assert!(is_valid_scoped_slug("@my-org/some_pkg"));

        assert!(!is_valid_scoped_slug("@Scope/name"));
        assert!(!is_valid_scoped_slug("@scope/"));
        assert!(!is_valid_scoped_slug("scope/name"));
        assert!(!is_valid_scoped_slug("@scope/na--me"));
        assert!(!is_valid_scoped_slug("@scope/name/extra"));
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[32mgreen\x1b[0m"), "green");
        assert_eq!(strip_ansi("plain"), "plain");
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"hello\""), "hello");
        assert_eq!(unquote("'single'"), "single");
        assert_eq!(unquote("  \"padded\"  "), "padded");
        assert_eq!(unquote("bare"), "bare");
        // Two quoted strings are not one quoted string
        assert_eq!(unquote("\"a\" \"b\""), "\"a\" \"b\"");
    }

    #[test]
    fn test_strip_leading_non_digits() {
        assert_eq!(strip_leading_non_digits("v1.2.3"), "1.2.3");
        assert_eq!(strip_leading_non_digits("go version go1.21.5"), "1.21.5");
        assert_eq!(strip_leading_non_digits("no digits"), "");
        assert_eq!(strip_leading_non_digits("1.0"), "1.0");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a \t b\n\nc  "), "a b c");
        assert_eq!(collapse_whitespace(""), "");
    }

    #[test]
    fn test_split_lines_both_conventions() {
        assert_eq!(split_lines("a\nb\r\nc"), vec!["a", "b", "c"]);
        assert_eq!(split_lines("single"), vec!["single"]);
    }

    #[test]
    fn test_is_email_like() {
        assert!(is_email_like("Jane Doe <jane@example.com>"));
        assert!(is_email_like("jane@example.com"));
        assert!(!is_email_like("Jane Doe"));
        assert!(!is_email_like("jane@localhost"));
    }

    #[test]
    fn test_strip_error_prefix() {
        assert_eq!(strip_error_prefix("error: boom"), "boom");
        assert_eq!(strip_error_prefix("Error:  spaced"), "spaced");
        assert_eq!(strip_error_prefix("ERR: loud"), "loud");
        assert_eq!(strip_error_prefix("no prefix"), "no prefix");
    }

    #[test]
    fn test_helpers_total_on_junk() {
        let junk = "\u{0}\u{1b}[9999Z \"'@@//--..";
        let _ = strip_ansi(junk);
        let _ = unquote(junk);
        let _ = extract_semver(junk);
        let _ = extract_dotted_version(junk);
        let _ = parse_java_banner(junk);
        let _ = parse_rustc_banner(junk);
        let _ = parse_registry_rows(junk);
        let _ = strip_leading_non_digits(junk);
        let _ = collapse_whitespace(junk);
        let _ = split_lines(junk);
        let _ = strip_error_prefix(junk);
    }
}
