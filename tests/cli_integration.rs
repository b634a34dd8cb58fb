//! CLI integration tests for Quay.
//!
//! Each test builds a throwaway workspace of `project.json` files and runs
//! the binary against it with `QUAY_HOME` pointed at an empty directory.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get the quay binary command, isolated from the user's global config.
fn quay(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("quay").unwrap();
    cmd.env("QUAY_HOME", home)
        .env_remove("QUAY_FRAMEWORK")
        .env_remove("QUAY_CONFIGURATION");
    cmd
}

fn write_project(root: &Path, name: &str, json: &str) {
    let dir = root.join("src").join(name);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("project.json"), json).unwrap();
    fs::write(dir.join(format!("{}.cs", name)), "class C {}").unwrap();
}

/// `App -> Utils -> Newtonsoft.Json`, with Newtonsoft.Json installed as a package.
fn workspace() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("work");

    write_project(
        &root,
        "App",
        r#"{ "dependencies": { "Utils": "" }, "frameworks": { "dnxcore50": {} } }"#,
    );
    write_project(
        &root,
        "Utils",
        r#"{ "dependencies": { "Newtonsoft.Json": "6.0.8" }, "frameworks": { "dnxcore50": {} } }"#,
    );

    let lib = root.join("packages/Newtonsoft.Json/6.0.8/lib/dnxcore50");
    fs::create_dir_all(&lib).unwrap();
    fs::write(lib.join("Newtonsoft.Json.dll"), b"MZ").unwrap();

    fs::create_dir_all(root.join(".quay")).unwrap();
    fs::write(
        root.join(".quay/config.toml"),
        "[resolve]\npackages = \"packages\"\nframework = \"dnxcore50\"\n",
    )
    .unwrap();

    fs::create_dir_all(tmp.path().join("home")).unwrap();
    tmp
}

// ============================================================================
// quay --help
// ============================================================================

#[test]
fn test_help_lists_commands() {
    let tmp = TempDir::new().unwrap();

    quay(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("resolve"))
        .stdout(predicate::str::contains("exports"))
        .stdout(predicate::str::contains("paths"));
}

// ============================================================================
// quay resolve
// ============================================================================

#[test]
fn test_resolve_prints_tree() {
    let tmp = workspace();

    quay(&tmp.path().join("home"))
        .args(["resolve", "App"])
        .current_dir(tmp.path().join("work"))
        .assert()
        .success()
        .stdout(predicate::str::contains("App v1.0.0 [Project]"))
        .stdout(predicate::str::contains("├── Utils v1.0.0 [Project]"))
        .stdout(predicate::str::contains("Newtonsoft.Json v6.0.8 [Package]"));
}

#[test]
fn test_resolve_json() {
    let tmp = workspace();

    let output = quay(&tmp.path().join("home"))
        .args(["resolve", "App", "--json"])
        .current_dir(tmp.path().join("work"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let libraries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let libraries = libraries.as_array().unwrap();
    assert_eq!(libraries.len(), 3);
    assert_eq!(libraries[0]["name"], "App");
    assert_eq!(libraries[0]["type"], "Project");
    assert_eq!(libraries[2]["type"], "Package");
    assert_eq!(libraries[2]["resolved"], true);
}

#[test]
fn test_resolve_reports_missing_library() {
    let tmp = workspace();
    let root = tmp.path().join("work");
    write_project(
        &root,
        "Broken",
        r#"{ "dependencies": { "Missing.Lib": "1.0" }, "frameworks": { "dnxcore50": {} } }"#,
    );

    quay(&tmp.path().join("home"))
        .args(["resolve", "Broken", "--no-color"])
        .current_dir(&root)
        .assert()
        .failure()
        .stdout(predicate::str::contains("Missing.Lib v1.0.0 [Unresolved] (unresolved)"))
        .stderr(predicate::str::contains("could not find `Missing.Lib"))
        .stderr(predicate::str::contains("1 unresolved library"));
}

// ============================================================================
// quay exports
// ============================================================================

#[test]
fn test_exports_all_json() {
    let tmp = workspace();
    let root = tmp.path().join("work");
    let bin = root.join("src/Utils/bin/Debug/dnxcore50");
    fs::create_dir_all(&bin).unwrap();
    fs::write(bin.join("Utils.dll"), b"MZ").unwrap();

    let output = quay(&tmp.path().join("home"))
        .args(["exports", "App", "--all", "--json"])
        .current_dir(&root)
        .output()
        .unwrap();
    assert!(output.status.success());

    let export: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<_> = export["metadata_references"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Newtonsoft.Json", "Utils"]);
    assert_eq!(export["source_references"].as_array().unwrap().len(), 1);
}

#[test]
fn test_exports_include_projects() {
    let tmp = workspace();

    quay(&tmp.path().join("home"))
        .args(["exports", "App", "--include-projects"])
        .current_dir(tmp.path().join("work"))
        .assert()
        .success()
        .stdout(predicate::str::contains("metadata:"))
        .stdout(predicate::str::contains("sources:"))
        .stdout(predicate::str::contains("App.cs"))
        .stdout(predicate::str::contains("Utils.cs"));
}

#[test]
fn test_exports_unknown_library() {
    let tmp = workspace();

    quay(&tmp.path().join("home"))
        .args(["exports", "Nope"])
        .current_dir(tmp.path().join("work"))
        .assert()
        .success()
        .stdout(predicate::str::contains("contributes nothing"));
}

// ============================================================================
// quay paths
// ============================================================================

#[test]
fn test_paths_lists_search_locations() {
    let tmp = workspace();

    quay(&tmp.path().join("home"))
        .args(["paths"])
        .current_dir(tmp.path().join("work"))
        .assert()
        .success()
        .stdout(predicate::str::contains("{name}"))
        .stdout(predicate::str::contains("{version}"));
}

#[test]
fn test_paths_for_unresolved_library() {
    let tmp = workspace();

    quay(&tmp.path().join("home"))
        .args(["paths", "Missing.Lib", "--no-color"])
        .current_dir(tmp.path().join("work"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find `Missing.Lib`"))
        .stderr(predicate::str::contains("could not be resolved"));
}

#[test]
fn test_invalid_framework_fails() {
    let tmp = workspace();

    quay(&tmp.path().join("home"))
        .args(["resolve", "App", "--framework", "not a framework"])
        .current_dir(tmp.path().join("work"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid target framework"));
}
