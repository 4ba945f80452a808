//! Drives the `wlbridge` binary end to end

use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn wlbridge(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_wlbridge"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(stdin.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

fn write_config(dir: &Path) -> String {
    let path = dir.join("config.toml");
    std::fs::write(
        &path,
        format!(
            "[discord]\nprefix = \"!\"\nauthorized_users = [\"U1\"]\n\n[storage]\ndata_dir = {:?}\n",
            dir.display().to_string()
        ),
    )
    .unwrap();
    path.display().to_string()
}

#[test]
fn test_init_then_check() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    let path = path.to_str().unwrap();

    let init = wlbridge(&["--config", path, "init"], "");
    assert!(init.status.success());
    assert!(Path::new(path).exists());

    let again = wlbridge(&["--config", path, "init"], "");
    assert!(!again.status.success());

    let check = wlbridge(&["--config", path, "check"], "");
    assert!(check.status.success());
}

#[test]
fn test_check_rejects_bad_prefix() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[discord]\nprefix = \"\"\n").unwrap();

    let check = wlbridge(&["--config", path.to_str().unwrap(), "check"], "");
    assert!(!check.status.success());
}

#[test]
fn test_run_answers_console_lines() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    let output = wlbridge(
        &["--config", &config, "run", "--as-id", "U1", "--as-name", "alice"],
        "!wl add Steve\n",
    );
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("[console] Steve has been added to the whitelist."));

    let whitelist = std::fs::read_to_string(dir.path().join("whitelist.json")).unwrap();
    assert!(whitelist.contains("\"name\": \"Steve\""));
    let audit = std::fs::read_to_string(dir.path().join("whitelist_log.txt")).unwrap();
    assert!(audit.contains("ADD Steve by alice (U1)"));
}

#[test]
fn test_run_denies_unknown_console_identity() {
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    let output = wlbridge(&["--config", &config], "!wl list\n");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("[console] You don't have permission to use this command."));
}
