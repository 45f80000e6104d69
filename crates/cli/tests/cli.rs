use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

#[allow(deprecated)]
fn cli(root: &Path) -> Command {
    let mut cmd = Command::cargo_bin("context-preset").expect("binary");
    cmd.current_dir(root);
    cmd
}

fn setup_repo() -> tempfile::TempDir {
    let temp = tempdir().unwrap();
    for file in ["pkg/a.ts", "pkg/b.ts", "pkg/c.ts", "docs/guide.md", "README.md"] {
        let path = temp.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "x").unwrap();
    }
    temp
}

#[test]
fn compile_prints_patterns() {
    let temp = setup_repo();
    cli(temp.path())
        .args(["compile", "pkg/a.ts", "pkg/b.ts"])
        .assert()
        .success()
        .stdout("pkg/**\n!pkg/c.ts\n");

    cli(temp.path())
        .args(["compile", "--level", "minimal", "pkg/a.ts", "pkg/b.ts"])
        .assert()
        .success()
        .stdout("pkg/a.ts\npkg/b.ts\n");
}

#[test]
fn compile_reads_selection_from_stdin() {
    let temp = setup_repo();
    cli(temp.path())
        .args(["compile", "--level", "minimal"])
        .write_stdin("pkg/a.ts\npkg/b.ts\n\npkg/c.ts\n")
        .assert()
        .success()
        .stdout("pkg/**\n");
}

#[test]
fn compile_json_reports_stats() {
    let temp = setup_repo();
    let output = cli(temp.path())
        .args(["compile", "--json", "--level", "aggressive", "pkg/a.ts", "pkg/b.ts", "pkg/c.ts"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let body: Value = serde_json::from_slice(&output.stdout).expect("valid json");
    assert_eq!(body["level"], "aggressive");
    assert_eq!(body["patterns"][0], "pkg/**");
    assert_eq!(body["stats"]["input_files"], 3);
    assert_eq!(body["stats"]["pattern_count"], 1);
    assert_eq!(body["applications"][0]["rule"], "full-directory");
}

#[test]
fn saved_preset_round_trips_through_expand() {
    let temp = setup_repo();
    cli(temp.path())
        .args(["compile", "--save", "api", "--header", "api files", "pkg/a.ts", "pkg/b.ts"])
        .assert()
        .success();

    let stored = temp.path().join(".context-preset/presets/api.patterns");
    assert_eq!(
        fs::read_to_string(stored).unwrap(),
        "# api files\npkg/**\n!pkg/c.ts\n"
    );

    cli(temp.path())
        .args(["expand", "--preset", "api"])
        .assert()
        .success()
        .stdout("pkg/a.ts\npkg/b.ts\n");

    cli(temp.path())
        .arg("list")
        .assert()
        .success()
        .stdout("api\n");

    cli(temp.path()).args(["delete", "api"]).assert().success();
    cli(temp.path()).arg("list").assert().success().stdout("");
}

#[test]
fn expand_reads_file_or_stdin() {
    let temp = setup_repo();
    fs::write(temp.path().join("docs.patterns"), "**/*.md\n").unwrap();

    cli(temp.path())
        .args(["expand", "docs.patterns"])
        .assert()
        .success()
        .stdout("README.md\ndocs/guide.md\n");

    cli(temp.path())
        .args(["expand", "--json"])
        .write_stdin("!**/*.md\n!pkg/c.ts\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"pkg/a.ts\""))
        .stdout(predicate::str::contains("docs.patterns"))
        .stdout(predicate::str::contains("guide.md").not());
}

#[test]
fn unsafe_input_fails() {
    let temp = setup_repo();
    cli(temp.path())
        .args(["compile", "../outside.ts"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsafe path"));

    cli(temp.path())
        .arg("expand")
        .write_stdin("../x\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsafe pattern"));
}

#[test]
fn missing_preset_fails() {
    let temp = setup_repo();
    cli(temp.path())
        .args(["expand", "--preset", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Preset not found: nope"));
}

#[test]
fn project_config_is_applied() {
    let temp = setup_repo();
    fs::create_dir_all(temp.path().join(".context-preset")).unwrap();
    fs::write(
        temp.path().join(".context-preset/config.toml"),
        "balanced_max_missing = 0\n",
    )
    .unwrap();

    cli(temp.path())
        .args(["compile", "pkg/a.ts", "pkg/b.ts"])
        .assert()
        .success()
        .stdout("pkg/a.ts\npkg/b.ts\n");

    fs::write(temp.path().join("bad.toml"), "min_files_per_glob = 0\n").unwrap();
    cli(temp.path())
        .args(["compile", "--config", "bad.toml", "pkg/a.ts"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}
