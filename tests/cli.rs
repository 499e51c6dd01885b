//! Integration tests for the gridtypes command line

use std::fs;
use std::path::Path;
use std::process::Command;

use indoc::indoc;

fn run_command(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .arg("run")
        .arg("-q")
        .arg("--")
        // Tests must not depend on a user's ~/.config/gridtypes/default.types.
        .arg("--no-default-types")
        .args(args)
        .output()
        .expect("Failed to execute command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

fn write_types(dir: &Path, content: &str) -> String {
    let path = dir.join("test.types");
    fs::write(&path, content).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_save_dedups_and_renames() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_types(
        dir.path(),
        indoc! {"
            # units of length
            TYPE Dim TAGGED Metre | Second
            TYPE Dim TAGGED Metre | Second
            TYPE Dim TAGGED Gram
            TYPE Holder TAGGED Holds(TAGGED Dim)
        "},
    );

    let (stdout, stderr, code) = run_command(&[&file]);
    assert_eq!(code, 0, "stderr: {}", stderr);
    assert_eq!(
        stdout,
        indoc! {"
            # gridtypes declarations
            TYPE Dim TAGGED Metre | Second
            TYPE Dim0 TAGGED Gram
            TYPE Holder TAGGED Holds(TAGGED Dim0)
        "}
    );
}

#[test]
fn test_output_file_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_types(
        dir.path(),
        indoc! {"
            TYPE Pair(@TYPEVAR a, @UNITVAR u) TAGGED Both((@TYPEVAR a, NUMBER 2 {@UNITVAR u/s})) | Neither
            TYPE Reading TAGGED At((DATETIME TIMEOFDAY, TAGGED Pair<TEXT, {m}>))
        "},
    );
    let out = dir.path().join("out.types");
    let out_str = out.to_string_lossy().to_string();

    let (stdout, stderr, code) = run_command(&["-o", &out_str, &file]);
    assert_eq!(code, 0, "stderr: {}", stderr);
    assert!(stdout.contains("Saved to"));

    let saved = fs::read_to_string(&out).unwrap();
    assert!(saved.contains("TYPE Reading TAGGED At((DATETIME TIMEOFDAY, TAGGED Pair<TEXT, {m}>))"));

    let (again, stderr, code) = run_command(&[&out_str]);
    assert_eq!(code, 0, "stderr: {}", stderr);
    assert_eq!(again, saved);
}

#[test]
fn test_parse_error_reports_line() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_types(dir.path(), "TYPE A TAGGED X\nTYPE B TAGGED Y(NUMBR)\n");

    let (_, stderr, code) = run_command(&[&file]);
    assert_eq!(code, 1);
    assert!(stderr.contains("line 2"), "stderr: {}", stderr);
}

#[test]
fn test_unify_types() {
    let (stdout, stderr, code) = run_command(&["--unify", "(NUMBER {m}, [])", "(NUMBER {m}, [TEXT])"]);
    assert_eq!(code, 0, "stderr: {}", stderr);
    assert_eq!(stdout.trim(), "(Number{m}, [Text])");
}

#[test]
fn test_unify_with_declared_types() {
    let dir = tempfile::tempdir().unwrap();
    let file = write_types(dir.path(), "TYPE Shape TAGGED Circle(NUMBER) | Point\n");

    let (stdout, _, code) = run_command(&[&file, "--unify", "TAGGED Shape", "TAGGED Shape"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "Shape <Circle:Number|Point>");
}

#[test]
fn test_unify_mismatch() {
    let (stdout, stderr, code) = run_command(&["--unify", "NUMBER {m}", "NUMBER {s}"]);
    assert_eq!(code, 1);
    assert!(stdout.is_empty());
    assert!(stderr.contains("Types differ: Number{m} and Number{s}"), "stderr: {}", stderr);
}

#[test]
fn test_units_solved() {
    let (stdout, stderr, code) = run_command(&["--units", "m/@UNITVAR u", "m/s"]);
    assert_eq!(code, 0, "stderr: {}", stderr);
    assert_eq!(stdout.trim(), "m/s\n@UNITVAR u = s");
}

#[test]
fn test_units_no_solution() {
    let (_, stderr, code) = run_command(&["--units", "kg", "s"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no solution"), "stderr: {}", stderr);
}

#[test]
fn test_units_power_out_of_range() {
    let (_, stderr, code) = run_command(&["--units", "m^2147483647*m", "m"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("out of range"), "stderr: {}", stderr);

    let (_, stderr, code) = run_command(&["--units", "m^2147483647", "1/m"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("no solution"), "stderr: {}", stderr);
}

#[test]
fn test_parse_date() {
    let (stdout, _, code) = run_command(&["--parse-date", "yearmonthday", "2024-03-01"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "2024-03-01");

    let (_, stderr, code) = run_command(&["--parse-date", "YEARMONTHDAY", "01/02/2003"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("ambiguous"), "stderr: {}", stderr);

    let (_, stderr, code) = run_command(&["--parse-date", "WEEKDAY", "Monday"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown date/time granularity"));
}

#[test]
fn test_unknown_option() {
    let (_, stderr, code) = run_command(&["--bogus"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown option: --bogus"));
}
