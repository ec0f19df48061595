use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

const SOURCE: &str = "\
print(\"always\")
--#if debug
print(\"debug\")
--#else
print(\"release\")
--#endif
log(\"trace\")
";

#[test]
fn preprocesses_directory_in_debug() {
    let dir = tempdir().expect("tempdir");
    let input_path = dir.path().join("main.lua");
    fs::write(&input_path, SOURCE).expect("write input");

    cargo_bin_cmd!("picopp-cli")
        .arg(dir.path())
        .arg("--symbols")
        .arg("debug")
        .arg("log")
        .assert()
        .success()
        .stdout(predicate::str::contains("with symbols [debug, log]"));

    let output = fs::read_to_string(&input_path).expect("read output");
    assert_eq!(output, "print(\"always\")\nprint(\"debug\")\nlog(\"trace\")\n");
}

#[test]
fn preprocesses_single_file_in_release() {
    let dir = tempdir().expect("tempdir");
    let input_path = dir.path().join("main.lua");
    fs::write(&input_path, SOURCE).expect("write input");

    cargo_bin_cmd!("picopp-cli")
        .arg(&input_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("with symbols []"));

    let output = fs::read_to_string(&input_path).expect("read output");
    assert_eq!(output, "print(\"always\")\nprint(\"release\")\n");
}

#[test]
fn reports_unterminated_region() {
    let dir = tempdir().expect("tempdir");
    let input_path = dir.path().join("broken.lua");
    fs::write(&input_path, "--#if debug\nprint(1)\n").expect("write input");

    cargo_bin_cmd!("picopp-cli")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("region type If"));

    let untouched = fs::read_to_string(&input_path).expect("read input");
    assert_eq!(untouched, "--#if debug\nprint(1)\n");
}

#[test]
fn lenient_flag_tolerates_stray_endif() {
    let dir = tempdir().expect("tempdir");
    let input_path = dir.path().join("broken.lua");
    fs::write(&input_path, "a\n--#endif\nb\n").expect("write input");

    cargo_bin_cmd!("picopp-cli")
        .arg(&input_path)
        .arg("--lenient")
        .assert()
        .success()
        .stderr(predicate::str::contains("--#endif"));

    let output = fs::read_to_string(&input_path).expect("read output");
    assert_eq!(output, "a\nb\n");
}

#[test]
fn keep_going_processes_remaining_files() {
    let dir = tempdir().expect("tempdir");
    fs::write(dir.path().join("a.lua"), "--#endif\n").expect("write a");
    fs::write(dir.path().join("b.lua"), "-- comment\nb\n").expect("write b");

    cargo_bin_cmd!("picopp-cli")
        .arg(dir.path())
        .arg("--keep-going")
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 file(s) failed"));

    let output = fs::read_to_string(dir.path().join("b.lua")).expect("read b");
    assert_eq!(output, "b\n");
}

#[test]
fn any_fence_width_accepts_mismatched_close() {
    let dir = tempdir().expect("tempdir");
    let input_path = dir.path().join("cart.lua");
    fs::write(&input_path, "--[=[#pico8\ncode\n--#pico8]]\n").expect("write input");

    cargo_bin_cmd!("picopp-cli")
        .arg(&input_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("fence width"));

    cargo_bin_cmd!("picopp-cli")
        .arg(&input_path)
        .arg("--any-fence-width")
        .assert()
        .success();

    let output = fs::read_to_string(&input_path).expect("read output");
    assert_eq!(output, "code\n");
}

#[test]
fn reports_missing_path() {
    let dir = tempdir().expect("tempdir");

    cargo_bin_cmd!("picopp-cli")
        .arg(dir.path().join("missing.lua"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to preprocess"));
}

#[cfg(unix)]
#[test]
fn unreadable_entry_fails_the_run() {
    let dir = tempdir().expect("tempdir");
    fs::write(dir.path().join("a.lua"), "-- comment\na\n").expect("write a");
    std::os::unix::fs::symlink(dir.path().join("nowhere.lua"), dir.path().join("dangling.lua"))
        .expect("symlink");

    cargo_bin_cmd!("picopp-cli")
        .arg(dir.path())
        .arg("--follow-links")
        .assert()
        .failure()
        .stderr(predicate::str::contains("dangling.lua"));

    cargo_bin_cmd!("picopp-cli")
        .arg(dir.path())
        .arg("--follow-links")
        .arg("--keep-going")
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 file(s) failed"));

    let output = fs::read_to_string(dir.path().join("a.lua")).expect("read a");
    assert_eq!(output, "a\n");
}
