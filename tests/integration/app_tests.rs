use clap::Parser;
use dupescan::cli::Cli;
use dupescan::error::ExitCode;
use std::fs;
use tempfile::tempdir;

fn cli(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("dupescan").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_run_app_success_creates_log_file() {
    let data = tempdir().unwrap();
    fs::write(data.path().join("a.txt"), "hello").unwrap();
    fs::write(data.path().join("b.txt"), "hello").unwrap();

    let logs = tempdir().unwrap();
    let log_file = logs.path().join("scan.log");

    let code = dupescan::run_app(cli(&[
        "-q",
        "--log-file",
        log_file.to_str().unwrap(),
        data.path().to_str().unwrap(),
    ]))
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(log_file.exists());
}

#[test]
fn test_run_app_empty_directory_succeeds() {
    let data = tempdir().unwrap();
    let logs = tempdir().unwrap();

    let code = dupescan::run_app(cli(&[
        "-q",
        "--no-size-filter",
        "--log-file",
        logs.path().join("scan.log").to_str().unwrap(),
        data.path().to_str().unwrap(),
    ]))
    .unwrap();

    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_run_app_missing_root_is_general_error() {
    let logs = tempdir().unwrap();

    let err = dupescan::run_app(cli(&[
        "-q",
        "--log-file",
        logs.path().join("scan.log").to_str().unwrap(),
        "/nonexistent/dupescan/root",
    ]))
    .unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_run_app_missing_config_is_error() {
    let data = tempdir().unwrap();

    let err = dupescan::run_app(cli(&[
        "-q",
        "--config",
        data.path().join("absent.toml").to_str().unwrap(),
        data.path().to_str().unwrap(),
    ]))
    .unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}
