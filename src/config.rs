//! Application configuration management.
//!
//! Settings are layered with figment, lowest priority first:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. A TOML file (`--config`, or `config.toml` in the platform config
//!    directory)
//! 3. `DUPESCAN_*` environment variables (e.g. `DUPESCAN_IO_THREADS=4`)
//! 4. Command-line flags ([`Config::apply_cli`])

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::duplicates::FinderConfig;
use crate::scanner::WalkerConfig;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "DUPESCAN_";

/// Default log file, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "dupescan.log";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File the duplicate report is appended to.
    pub log_file: PathBuf,
    /// Fingerprint workers; 1 hashes lazily.
    pub io_threads: usize,
    /// Only compare files of equal size.
    pub size_filter: bool,
    /// Confirm fingerprint matches byte-for-byte.
    pub paranoid: bool,
    /// Follow symbolic links during traversal.
    pub follow_symlinks: bool,
    /// Skip hidden files and directories.
    pub skip_hidden: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
            io_threads: 1,
            size_filter: true,
            paranoid: false,
            follow_symlinks: false,
            skip_hidden: false,
        }
    }
}

impl Config {
    /// Build the layered figment: defaults, TOML file, environment.
    ///
    /// A missing TOML file contributes nothing.
    #[must_use]
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = config_file {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load the configuration.
    ///
    /// `explicit` is the `--config` argument; without it, the platform
    /// default path is used if it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit file does not exist, or if any layer
    /// holds a value of the wrong type.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let file = match explicit {
            Some(path) => {
                if !path.is_file() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Some(path.to_path_buf())
            }
            None => Self::default_config_path().filter(|p| p.is_file()),
        };

        if let Some(ref path) = file {
            log::debug!("Loading config from {}", path.display());
        }

        let config: Config = Self::figment(file.as_deref())
            .extract()
            .context("Invalid configuration")?;
        Ok(config.normalized())
    }

    /// Override loaded values with command-line flags.
    ///
    /// Boolean flags only ever switch a behavior on (or, for
    /// `--no-size-filter`, off); absent flags keep the loaded value.
    #[must_use]
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(ref log_file) = cli.log_file {
            self.log_file = log_file.clone();
        }
        if let Some(threads) = cli.io_threads {
            self.io_threads = threads;
        }
        if cli.no_size_filter {
            self.size_filter = false;
        }
        self.paranoid |= cli.paranoid;
        self.follow_symlinks |= cli.follow_symlinks;
        self.skip_hidden |= cli.skip_hidden;
        self.normalized()
    }

    /// Finder settings derived from this configuration.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_io_threads(self.io_threads)
            .with_size_filter(self.size_filter)
            .with_paranoid(self.paranoid)
            .with_walker_config(
                WalkerConfig::new(self.follow_symlinks, self.skip_hidden)
                    .with_excluded(&self.log_file),
            )
    }

    /// `config.toml` in the platform-specific configuration directory.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupescan", "dupescan")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn normalized(mut self) -> Self {
        if self.io_threads == 0 {
            log::warn!("io_threads must be at least 1, using 1");
            self.io_threads = 1;
        }
        self
    }
}
