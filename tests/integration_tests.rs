//! Integration tests for the meridian-workspace CLI

use serde_json::json;
use std::fs;
use std::process::Command;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_workspace(extra_config: &str) -> TempDir {
    let temp = TempDir::new().unwrap();

    fs::write(
        temp.path().join("workspace.toml"),
        format!(
            r#"[roles]
"." = "config"
"apps/*" = "app"
{extra_config}"#
        ),
    )
    .unwrap();

    fs::write(temp.path().join("package.json"), "{ \"name\": \"root\" }\n").unwrap();

    let site = temp.path().join("apps").join("site");
    fs::create_dir_all(&site).unwrap();
    fs::write(
        site.join("package.json"),
        r#"{
  "name": "site",
  "dependencies": { "react": "^2.3.1" }
}
"#,
    )
    .unwrap();

    temp
}

fn bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_meridian-workspace"))
}

#[test]
fn test_pin_versions_preview_by_default() {
    let workspace = create_test_workspace("");

    let output = bin()
        .arg("pin-versions")
        .current_dir(workspace.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Preview mode"));
    assert!(stdout.contains("react"));

    // File untouched without --write
    let site = fs::read_to_string(workspace.path().join("apps/site/package.json")).unwrap();
    assert!(site.contains("^2.3.1"));
}

#[test]
fn test_pin_versions_write() {
    let workspace = create_test_workspace("");

    let output = bin()
        .args(["pin-versions", "--write"])
        .current_dir(workspace.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));

    let site = fs::read_to_string(workspace.path().join("apps/site/package.json")).unwrap();
    assert!(site.contains("\"react\": \"2.3.1\""));
}

#[test]
fn test_pin_versions_dry_run_wins_over_write() {
    let workspace = create_test_workspace("");

    let output = bin()
        .args(["pin-versions", "--write", "--dry-run"])
        .current_dir(workspace.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));

    let site = fs::read_to_string(workspace.path().join("apps/site/package.json")).unwrap();
    assert!(site.contains("^2.3.1"));
}

#[tokio::test]
async fn test_sync_engines_through_configured_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/schedule.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "v18": { "codename": "Hydrogen", "end": "2099-04-30" },
            "v20": { "codename": "Iron", "end": "2099-04-30" }
        })))
        .mount(&server)
        .await;

    let workspace = create_test_workspace(&format!(
        "\n[remote]\nschedule-url = \"{}/schedule.json\"\n",
        server.uri()
    ));

    let output = bin()
        .args(["sync-engines", "--write"])
        .current_dir(workspace.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));

    let root = fs::read_to_string(workspace.path().join("package.json")).unwrap();
    assert!(root.contains("\"node\": \"^18 || ^20\""));
}

#[test]
fn test_probe_json_shape() {
    let output = bin()
        .args(["probe", "--system", "--json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let system = parsed.get("system").unwrap().as_object().unwrap();
    assert!(system.contains_key("os"));
    assert!(system.contains_key("arch"));
}

#[test]
fn test_missing_workspace_root_is_fatal() {
    let empty = TempDir::new().unwrap();

    let output = bin()
        .arg("pin-versions")
        .current_dir(empty.path())
        .output()
        .unwrap();

    assert_ne!(output.status.code(), Some(0));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("workspace.toml"));
}

#[test]
fn test_explicit_root_flag() {
    let workspace = create_test_workspace("");

    let output = bin()
        .args(["pin-versions", "--root"])
        .arg(workspace.path())
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("react"));
}
