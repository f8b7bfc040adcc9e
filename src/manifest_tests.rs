#[cfg(test)]
mod tests {
    use crate::manifest::{
        allowed_policies, is_policy_allowed, ManifestRole, PackageManifest, SyncPolicy,
    };
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_manifest(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("package.json");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_role_policy_table() {
        assert_eq!(
            allowed_policies(ManifestRole::Project),
            &[SyncPolicy::Freezable]
        );
        assert_eq!(
            allowed_policies(ManifestRole::Config),
            &[SyncPolicy::Freezable, SyncPolicy::Trackable]
        );
        assert_eq!(
            allowed_policies(ManifestRole::Docs),
            &[SyncPolicy::Freezable, SyncPolicy::Trackable]
        );
        assert_eq!(allowed_policies(ManifestRole::App), &[SyncPolicy::Trackable]);
        assert_eq!(
            allowed_policies(ManifestRole::Package),
            &[SyncPolicy::Trackable, SyncPolicy::Distributable]
        );
        assert_eq!(
            allowed_policies(ManifestRole::Tool),
            &[SyncPolicy::Freezable, SyncPolicy::Trackable]
        );
    }

    #[test]
    fn test_policy_guard() {
        assert!(is_policy_allowed(ManifestRole::App, SyncPolicy::Trackable));
        assert!(!is_policy_allowed(ManifestRole::App, SyncPolicy::Freezable));
        assert!(!is_policy_allowed(
            ManifestRole::Project,
            SyncPolicy::Distributable
        ));
        assert!(is_policy_allowed(
            ManifestRole::Package,
            SyncPolicy::Distributable
        ));
    }

    #[test]
    fn test_role_from_str() {
        assert_eq!("package".parse::<ManifestRole>().unwrap(), ManifestRole::Package);
        assert_eq!("DOCS".parse::<ManifestRole>().unwrap(), ManifestRole::Docs);
        assert!("plugin".parse::<ManifestRole>().is_err());
    }

    #[test]
    fn test_load_accessors() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_manifest(
            &temp_dir,
            r#"{
  "name": "@meridian/site",
  "version": "1.4.0",
  "dependencies": {
    "react": "^18.2.0",
    "left-pad": "1.3.0",
    "local": { "workspace": true }
  },
  "engines": { "node": "^18" }
}
"#,
        );

        let manifest = PackageManifest::load(&path, ManifestRole::App).unwrap();
        assert_eq!(manifest.name(), Some("@meridian/site"));
        assert_eq!(manifest.version(), Some("1.4.0"));
        assert_eq!(manifest.engine("node"), Some("^18"));
        assert_eq!(manifest.engine("deno"), None);

        // Object-valued specifiers are skipped
        let deps = manifest.dependencies("dependencies");
        assert_eq!(
            deps,
            vec![
                ("react".to_string(), "^18.2.0".to_string()),
                ("left-pad".to_string(), "1.3.0".to_string()),
            ]
        );
        assert!(manifest.dependencies("devDependencies").is_empty());
    }

    #[test]
    fn test_save_preserves_order_and_indent() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_manifest(
            &temp_dir,
            "{\n    \"version\": \"2.0.0\",\n    \"name\": \"ordered\",\n    \"dependencies\": {\n        \"zeta\": \"^1.0.0\",\n        \"alpha\": \"^2.0.0\"\n    }\n}\n",
        );

        let mut manifest = PackageManifest::load(&path, ManifestRole::App).unwrap();
        manifest.set_dependency("dependencies", "zeta", "1.0.0");
        manifest.save().unwrap();

        let written = fs::read_to_string(&path).unwrap();
        // version stays before name, zeta before alpha, four-space indent kept
        assert!(written.find("\"version\"").unwrap() < written.find("\"name\"").unwrap());
        assert!(written.find("\"zeta\"").unwrap() < written.find("\"alpha\"").unwrap());
        assert!(written.contains("    \"version\""));
        assert!(written.contains("\"zeta\": \"1.0.0\""));
        assert!(written.ends_with('\n'));
    }

    #[test]
    fn test_set_engine_creates_section() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_manifest(&temp_dir, "{\n  \"name\": \"bare\"\n}\n");

        let mut manifest = PackageManifest::load(&path, ManifestRole::Project).unwrap();
        assert_eq!(manifest.engine("node"), None);

        manifest.set_engine("node", "^18 || ^20");
        assert_eq!(manifest.engine("node"), Some("^18 || ^20"));

        manifest.save().unwrap();
        let reloaded = PackageManifest::load(&path, ManifestRole::Project).unwrap();
        assert_eq!(reloaded.engine("node"), Some("^18 || ^20"));
    }

    #[test]
    fn test_load_rejects_invalid_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_manifest(&temp_dir, "{ not json");
        assert!(PackageManifest::load(&path, ManifestRole::Project).is_err());
    }

    #[test]
    fn test_display_name_falls_back_to_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_manifest(&temp_dir, "{}");
        let manifest = PackageManifest::load(&path, ManifestRole::Project).unwrap();
        assert_eq!(manifest.display_name(), path.display().to_string());
    }
}
