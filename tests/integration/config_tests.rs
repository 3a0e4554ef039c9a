use clap::Parser;
use dupescan::cli::Cli;
use dupescan::config::Config;
use dupescan::duplicates::DuplicateFinder;
use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::tempdir;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Clear all DUPESCAN_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("DUPESCAN_") {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_config_load_from_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();

    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
log_file = "/var/log/dupescan.log"
io_threads = 8
size_filter = false
paranoid = true
follow_symlinks = true
skip_hidden = true
"#,
    )
    .unwrap();

    let config = Config::load(Some(&config_path)).unwrap();

    assert_eq!(config.log_file, PathBuf::from("/var/log/dupescan.log"));
    assert_eq!(config.io_threads, 8);
    assert!(!config.size_filter);
    assert!(config.paranoid);
    assert!(config.follow_symlinks);
    assert!(config.skip_hidden);
}

#[test]
fn test_env_overrides_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();

    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = 8\nparanoid = true\n").unwrap();

    std::env::set_var("DUPESCAN_IO_THREADS", "2");
    std::env::set_var("DUPESCAN_LOG_FILE", "from_env.log");

    let config = Config::load(Some(&config_path));
    clear_env();
    let config = config.unwrap();

    assert_eq!(config.io_threads, 2);
    assert_eq!(config.log_file, PathBuf::from("from_env.log"));
    assert!(config.paranoid);
}

#[test]
fn test_cli_overrides_env_and_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();

    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = 8\nlog_file = \"toml.log\"\n").unwrap();
    std::env::set_var("DUPESCAN_IO_THREADS", "2");

    let cli = Cli::try_parse_from([
        "dupescan",
        "--config",
        config_path.to_str().unwrap(),
        "--io-threads",
        "3",
        ".",
    ])
    .unwrap();

    let config = Config::load(cli.config.as_deref());
    clear_env();
    let config = config.unwrap().apply_cli(&cli);

    assert_eq!(config.io_threads, 3);
    assert_eq!(config.log_file, PathBuf::from("toml.log"));
}

#[test]
fn test_zero_io_threads_clamped() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();

    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = 0\n").unwrap();

    let config = Config::load(Some(&config_path)).unwrap();
    assert_eq!(config.io_threads, 1);
}

#[test]
fn test_config_wrong_type_is_error() {
    let _lock = ENV_MUTEX.lock().unwrap();
    clear_env();

    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "io_threads = \"lots\"\n").unwrap();

    assert!(Config::load(Some(&config_path)).is_err());
}

#[test]
fn test_config_invalid_toml_is_error() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "paranoid = ").unwrap();

    let figment =
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::file(&config_path));

    let result: Result<Config, _> = figment.extract();
    assert!(result.is_err());
}

#[test]
fn test_log_file_inside_scanned_tree_is_not_a_candidate() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), "report line\n").unwrap();
    let log_file = dir.path().join("dupescan.log");
    fs::write(&log_file, "report line\n").unwrap();

    let cli = Cli::try_parse_from([
        "dupescan",
        "--log-file",
        log_file.to_str().unwrap(),
        dir.path().to_str().unwrap(),
    ])
    .unwrap();
    let config = Config::default().apply_cli(&cli);

    let (pairs, summary) = DuplicateFinder::new(config.finder_config())
        .find_duplicates_in(dir.path())
        .unwrap();

    assert_eq!(summary.candidates, 1);
    assert!(pairs.is_empty());
}
