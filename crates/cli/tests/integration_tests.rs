//! Integration tests for the RiptideKV CLI: drive the built binary as a
//! subprocess, piping commands to its stdin and asserting on stdout.

use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn run_cli_command(dir: &Path, fanout: &str, capacity: &str, commands: &str) -> String {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let mut child = Command::new("cargo")
        .args(["run", "-p", "cli", "--"])
        .env("RIPTIDE_LSM_DIR", dir.to_str().unwrap())
        .env("RIPTIDE_LSM_R", fanout)
        .env("RIPTIDE_LSM_L", capacity)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn cli");

    {
        let stdin = child.stdin.as_mut().expect("failed to open stdin");
        stdin.write_all(commands.as_bytes()).expect("failed to write commands");
        stdin.write_all(b"EXIT\n").expect("failed to write EXIT");
    }

    let output = child.wait_with_output().expect("failed to read output");
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn insert_and_get() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path()).unwrap();

    let output = run_cli_command(dir.path(), "10", "1000", "INSERT key1 value1\nGET key1\n");

    assert!(output.contains("OK"));
    assert!(output.contains("value1"));
}

#[test]
fn multiple_keys() {
    let dir = tempdir().unwrap();

    let commands = "INSERT a 1\nINSERT b 2\nINSERT c 3\nGET a\nGET b\nGET c\n";
    let output = run_cli_command(dir.path(), "10", "1000", commands);

    assert!(output.contains('1'));
    assert!(output.contains('2'));
    assert!(output.contains('3'));
}

#[test]
fn overwrite_key() {
    let dir = tempdir().unwrap();

    let commands = "INSERT mykey oldvalue\nGET mykey\nINSERT mykey newvalue\nGET mykey\n";
    let output = run_cli_command(dir.path(), "10", "1000", commands);

    assert!(output.contains("oldvalue"));
    assert!(output.contains("newvalue"));
}

#[test]
fn delete_key() {
    let dir = tempdir().unwrap();

    let commands = "INSERT k v\nGET k\nDELETE k\nGET k\n";
    let output = run_cli_command(dir.path(), "10", "1000", commands);

    let lines: Vec<&str> = output.lines().collect();
    assert!(lines.iter().any(|l| l.contains("v") && !l.contains("nil")));
    assert!(output.contains("(nil)"));
}

#[test]
fn insert_rejects_tombstone_marker() {
    let dir = tempdir().unwrap();

    let output = run_cli_command(dir.path(), "10", "1000", "INSERT k <DELETED>\n");

    assert!(output.contains("ERR"));
}

#[test]
fn range_scan_prints_sorted_entries() {
    let dir = tempdir().unwrap();

    let commands = "INSERT b 2\nINSERT a 1\nINSERT c 3\nRANGE a c\n";
    let output = run_cli_command(dir.path(), "10", "1000", commands);

    let a_pos = output.find("a -> 1").unwrap();
    let b_pos = output.find("b -> 2").unwrap();
    let c_pos = output.find("c -> 3").unwrap();
    assert!(a_pos < b_pos && b_pos < c_pos);
    assert!(output.contains("(3 entries)"));
}

#[test]
fn explicit_flush_survives_reopen() {
    let dir = tempdir().unwrap();

    run_cli_command(dir.path(), "10", "1000", "INSERT k v\nFLUSH\n");
    let output = run_cli_command(dir.path(), "10", "1000", "GET k\n");

    assert!(output.contains('v'));
}

#[test]
fn low_fanout_triggers_merge_and_data_survives() {
    let dir = tempdir().unwrap();

    // memtable capacity 1 and fanout 1: every insert flushes immediately and
    // every second flush forces a merge cascade.
    let commands = "INSERT a 1\nINSERT b 2\nINSERT c 3\nINSERT d 4\n";
    run_cli_command(dir.path(), "1", "1", commands);

    let output = run_cli_command(
        dir.path(),
        "1",
        "1",
        "GET a\nGET b\nGET c\nGET d\n",
    );
    for expected in ["1", "2", "3", "4"] {
        assert!(output.contains(expected));
    }
}
