//! CLI integration tests for awk-lite
//!
//! These tests run the awk-lite binary and verify command-line behavior.

use std::io::Write;
use std::process::{Command, Output, Stdio};
use tempfile::NamedTempFile;

/// Run awk-lite with the given arguments and stdin, returning the raw output
fn run_binary(args: &[&str], input: Option<&str>) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_awk-lite"));
    cmd.args(args);
    cmd.stdin(Stdio::piped());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    let mut child = cmd.spawn().expect("failed to spawn awk-lite");

    if let Some(mut stdin) = child.stdin.take() {
        if let Some(input_str) = input {
            stdin.write_all(input_str.as_bytes()).expect("failed to write stdin");
        }
        // dropping stdin closes it
    }

    child.wait_with_output().expect("failed to wait for awk-lite")
}

/// Run awk-lite, returning stdout on success and stderr on failure
fn run_awk_lite(args: &[&str], input: Option<&str>) -> Result<String, String> {
    let output = run_binary(args, input);
    if output.status.success() {
        String::from_utf8(output.stdout).map_err(|e| e.to_string())
    } else {
        Err(String::from_utf8_lossy(&output.stderr).to_string())
    }
}

fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", contents).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_cli_help() {
    let output = run_awk_lite(&["--help"], None).unwrap();
    assert!(output.contains("Usage:"));
    assert!(output.contains("awk-lite"));
}

#[test]
fn test_cli_version() {
    let output = run_awk_lite(&["--version"], None).unwrap();
    assert!(output.starts_with("awk-lite "));
}

#[test]
fn test_cli_simple_program() {
    let output = run_awk_lite(&["BEGIN { print \"hello\" }"], None).unwrap();
    assert_eq!(output, "hello\n");
}

#[test]
fn test_cli_with_stdin() {
    let output = run_awk_lite(&["{ print $2 }"], Some("a b\nc d\n")).unwrap();
    assert_eq!(output, "b\nd\n");
}

#[test]
fn test_cli_data_file() {
    let data = temp_file("Line 1\nLine 2\nLine 3\n");
    let path = data.path().to_str().unwrap();

    let output = run_awk_lite(&["{ print NR \":\" $2 }", path], None).unwrap();
    assert_eq!(output, "1:1\n2:2\n3:3\n");
}

#[test]
fn test_cli_filename_variable() {
    let data = temp_file("x\n");
    let path = data.path().to_str().unwrap();

    let output = run_awk_lite(&["{ print FILENAME }", path], None).unwrap();
    assert_eq!(output, format!("{}\n", path));
}

#[test]
fn test_cli_field_separator() {
    let output = run_awk_lite(&["-F", ":", "{ print $1 }"], Some("root:x:0\nuser:x:1000\n")).unwrap();
    assert_eq!(output, "root\nuser\n");
}

#[test]
fn test_cli_field_separator_attached() {
    let output = run_awk_lite(&["-F,", "{ print $2 }"], Some("a,b,c\n")).unwrap();
    assert_eq!(output, "b\n");
}

#[test]
fn test_cli_variable_assignment() {
    let output = run_awk_lite(&["-v", "name=World", "BEGIN { print \"Hello, \" name }"], None).unwrap();
    assert_eq!(output, "Hello, World\n");
}

#[test]
fn test_cli_multiple_variables() {
    let output = run_awk_lite(&["-v", "a=1", "-v", "b=2", "BEGIN { print a + b }"], None).unwrap();
    assert_eq!(output, "3.0\n");
}

#[test]
fn test_cli_program_file() {
    let script = temp_file("{ sum += $1 }\nEND { print sum }\n");
    let script_path = script.path().to_str().unwrap();

    let output = run_awk_lite(&["-f", script_path], Some("1\n2\n3\n")).unwrap();
    assert_eq!(output, "6.0\n");
}

#[test]
fn test_cli_program_file_with_data_file() {
    let script = temp_file("`^b` { print toupper($0) }\n");
    let data = temp_file("apple\nbanana\nberry\n");

    let output = run_awk_lite(
        &["-f", script.path().to_str().unwrap(), data.path().to_str().unwrap()],
        None,
    )
    .unwrap();
    assert_eq!(output, "BANANA\nBERRY\n");
}

#[test]
fn test_cli_prompts_for_paths() {
    let script = temp_file("{ print $1 }\n");
    let data = temp_file("one two\nthree four\n");
    let answers = format!(
        "{}\n{}\n",
        script.path().to_str().unwrap(),
        data.path().to_str().unwrap()
    );

    let output = run_binary(&[], Some(&answers));
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "one\nthree\n");
    // prompts stay off stdout
    assert!(String::from_utf8_lossy(&output.stderr).contains("Script file:"));
}

#[test]
fn test_cli_prompt_with_empty_data_path() {
    let script = temp_file("BEGIN { print \"begin\" } { print \"record\" } END { print NR }\n");
    let answers = format!("{}\n\n", script.path().to_str().unwrap());

    let output = run_awk_lite(&[], Some(&answers)).unwrap();
    assert_eq!(output, "begin\n0\n");
}

#[test]
fn test_cli_exit_status() {
    let output = run_binary(&["BEGIN { exit 3 }"], None);
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn test_cli_parse_error() {
    let output = run_binary(&["BEGIN { print "], None);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("awk-lite: "));
    assert!(stderr.contains("parse error"));
}

#[test]
fn test_cli_runtime_error() {
    let output = run_binary(&["BEGIN { frob(1) }"], None);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown function: frob"));
}

#[test]
fn test_cli_missing_data_file() {
    let output = run_binary(&["{ print }", "/nonexistent/awk-lite-data"], None);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_cli_unknown_option() {
    let err = run_awk_lite(&["-z", "BEGIN { }"], None).unwrap_err();
    assert!(err.contains("unknown option: -z"));
}

#[test]
fn test_cli_invalid_variable_assignment() {
    let err = run_awk_lite(&["-v", "novalue", "BEGIN { }"], None).unwrap_err();
    assert!(err.contains("invalid variable assignment"));
}

#[test]
fn test_cli_log_output_stays_on_stderr() {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_awk-lite"));
    cmd.env("RUST_LOG", "awk_lite=debug");
    cmd.args(["BEGIN { print \"clean\" }"]);
    let output = cmd.output().unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "clean\n");
}
