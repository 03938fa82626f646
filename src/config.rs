use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use log::debug;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::shamir::MAX_SHARES;

/// Environment variable that points at an alternative config file
pub const CONFIG_ENV: &str = "SSS_CONFIG";

/// Configuration for the sss tool
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Number of shares to create when `-n` is not given (default: 3)
    pub default_shares: usize,
    /// Threshold required to recover when `-t` is not given (default: 2)
    pub default_threshold: usize,
    /// Directory that split writes share files to when `--outdir` is not given
    pub output_dir: Option<PathBuf>,
    /// Suppress printing shares to stdout (default: false)
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_shares: 3,
            default_threshold: 2,
            output_dir: None,
            quiet: false,
        }
    }
}

impl Config {
    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }

        let proj_dirs = ProjectDirs::from("com", "sss", "sss")
            .context("Failed to determine configuration directory")?;

        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Load configuration, falling back to defaults when no file exists
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        config.validate()?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))?;

        Ok(())
    }

    /// Check that the defaults form a valid split
    pub fn validate(&self) -> Result<()> {
        let (n, t) = (self.default_shares, self.default_threshold);
        if !(2..=MAX_SHARES).contains(&n) || t < 2 || t > n {
            bail!(
                "invalid default shares/threshold ({}/{}): require 2 <= t <= n <= {}",
                n,
                t,
                MAX_SHARES
            );
        }
        Ok(())
    }

    /// Initialize configuration with user input
    pub fn initialize() -> Result<Self> {
        use console::style;
        use dialoguer::{Confirm, Input};

        println!("{}", style("sss configuration").bold().green());
        println!("These defaults are used when split is run without -n, -t or --outdir.\n");

        let current = Config::load().unwrap_or_default();

        let default_shares: usize = Input::new()
            .with_prompt("Number of shares")
            .default(current.default_shares)
            .validate_with(|n: &usize| {
                if (2..=MAX_SHARES).contains(n) {
                    Ok(())
                } else {
                    Err("Must be between 2 and 255")
                }
            })
            .interact_text()?;

        let default_threshold: usize = Input::new()
            .with_prompt("Threshold")
            .default(current.default_threshold.min(default_shares))
            .validate_with(|t: &usize| {
                if *t >= 2 && *t <= default_shares {
                    Ok(())
                } else {
                    Err("Must be at least 2 and no more than the number of shares")
                }
            })
            .interact_text()?;

        let output_dir: String = Input::new()
            .with_prompt("Output directory for share files (empty for none)")
            .allow_empty(true)
            .default(
                current
                    .output_dir
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
            )
            .interact_text()?;

        let output_dir = if output_dir.trim().is_empty() {
            None
        } else {
            Some(PathBuf::from(output_dir.trim()))
        };

        let quiet = Confirm::new()
            .with_prompt("Suppress printing shares to the terminal?")
            .default(current.quiet)
            .interact()?;

        let config = Config {
            default_shares,
            default_threshold,
            output_dir,
            quiet,
        };

        let path = Self::config_path()?;
        config.save_to(&path)?;

        println!(
            "{} {}",
            style("\nConfiguration saved to").green(),
            path.display()
        );

        Ok(config)
    }
}
