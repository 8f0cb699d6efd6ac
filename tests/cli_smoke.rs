//! CLI smoke tests against the built `devkit` binary.

mod common;

use std::fs;
use std::path::Path;

use serde_json::Value;

fn write_config(root: &Path) -> String {
    let dotfile = root.join("home").join(".gitconfig");
    fs::create_dir_all(dotfile.parent().expect("parent")).expect("create home");
    fs::write(&dotfile, "[user]\n\tname = Test\n").expect("write dotfile");

    let config_path = root.join("config.toml");
    let body = format!(
        "[paths]\nbackup_dir = {:?}\nactivity_log = {:?}\n\n[backup]\ntracked_files = [{:?}]\nmax_backups = 3\n",
        root.join("backups").display().to_string(),
        root.join("activity.jsonl").display().to_string(),
        dotfile.display().to_string(),
    );
    fs::write(&config_path, body).expect("write config");
    config_path.display().to_string()
}

fn json_line(stdout: &str) -> Value {
    let line = stdout.lines().next().expect("one json line");
    serde_json::from_str(line).expect("valid json")
}

#[test]
fn help_lists_subcommands() {
    let result = common::run_cli_case("help_lists_subcommands", &["--help"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    for sub in ["console", "status", "backups", "config", "completions"] {
        assert!(
            result.stdout.contains(sub),
            "missing {sub}; log: {}",
            result.log_path.display()
        );
    }
}

#[test]
fn version_prints_crate_version() {
    let result = common::run_cli_case("version_prints_crate_version", &["--version"]);
    assert!(result.status.success());
    assert!(result.stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn completions_emit_a_script() {
    let result = common::run_cli_case("completions_emit_a_script", &["completions", "bash"]);
    assert!(result.status.success(), "log: {}", result.log_path.display());
    assert!(result.stdout.contains("devkit"));
}

#[test]
fn config_path_reports_override() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("absent.toml").display().to_string();
    let result = common::run_cli_case(
        "config_path_reports_override",
        &["--json", "--config", &path, "config", "path"],
    );
    assert!(result.status.success(), "log: {}", result.log_path.display());
    let payload = json_line(&result.stdout);
    assert_eq!(payload["path"], Value::String(path));
    assert_eq!(payload["exists"], Value::Bool(false));
}

#[test]
fn missing_explicit_config_is_a_user_error() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path = tmp.path().join("absent.toml").display().to_string();
    let result = common::run_cli_case(
        "missing_explicit_config_is_a_user_error",
        &["--config", &path, "config", "show"],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
    assert!(result.stderr.contains("DVK-"));
}

#[test]
fn backup_create_list_delete_cycle() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = write_config(tmp.path());

    let created = common::run_cli_case(
        "backup_cycle_create",
        &["--json", "--config", &config, "backups", "create"],
    );
    assert!(created.status.success(), "log: {}", created.log_path.display());
    let payload = json_line(&created.stdout);
    let id = payload["report"]["snapshot"]["id"]
        .as_str()
        .expect("snapshot id")
        .to_string();
    assert_eq!(payload["report"]["snapshot"]["file_count"], Value::from(1));

    let listed = common::run_cli_case(
        "backup_cycle_list",
        &["--json", "--config", &config, "backups", "list"],
    );
    assert!(listed.status.success());
    let snapshots = json_line(&listed.stdout)["snapshots"].clone();
    assert_eq!(snapshots.as_array().map(Vec::len), Some(1));

    let deleted = common::run_cli_case(
        "backup_cycle_delete",
        &["--json", "--config", &config, "backups", "delete", &id],
    );
    assert!(deleted.status.success(), "log: {}", deleted.log_path.display());

    let relisted = common::run_cli_case(
        "backup_cycle_relist",
        &["--json", "--config", &config, "backups", "list"],
    );
    let snapshots = json_line(&relisted.stdout)["snapshots"].clone();
    assert_eq!(snapshots.as_array().map(Vec::len), Some(0));
}

#[test]
fn restoring_unknown_snapshot_fails_cleanly() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let config = write_config(tmp.path());
    let result = common::run_cli_case(
        "restoring_unknown_snapshot_fails_cleanly",
        &["--config", &config, "backups", "restore", "19700101-000000"],
    );
    assert_eq!(result.status.code(), Some(1), "log: {}", result.log_path.display());
}

#[test]
fn console_refuses_non_interactive_stdio() {
    let result = common::run_cli_case("console_refuses_non_interactive_stdio", &["console"]);
    assert_eq!(result.status.code(), Some(1));
    assert!(result.stderr.contains("interactive terminal"));
}
