use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;
use crate::models::DedupPrecedence;

/// Dataset token of the per-accident tables.
pub const DEFAULT_ACCIDENTS_TOKEN: &str = "nehody";
/// Dataset token of the per-person consequence tables.
pub const DEFAULT_CONSEQUENCES_TOKEN: &str = "nasledky";

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Aggregate Czech police traffic-accident statistics
#[derive(Parser, Debug, Clone)]
#[command(
    name = "crash-report",
    about = "Aggregate Czech police traffic-accident statistics",
    version
)]
pub struct Settings {
    /// ZIP archive with one directory per year
    #[arg(long, default_value = "data_23_24.zip")]
    pub archive: PathBuf,

    /// Dataset token of the accident tables
    #[arg(long, default_value = DEFAULT_ACCIDENTS_TOKEN)]
    pub accidents_token: String,

    /// Dataset token of the consequence tables
    #[arg(long, default_value = DEFAULT_CONSEQUENCES_TOKEN)]
    pub consequences_token: String,

    /// Directory the aggregate tables are written to
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Which year wins when an accident id appears in several years
    #[arg(long, default_value = "earliest", value_parser = ["earliest", "latest"])]
    pub precedence: String,

    /// Report the in-memory size of the normalized table
    #[arg(long)]
    pub verbose: bool,

    /// Print a summary of every aggregate table
    #[arg(long)]
    pub summary: bool,

    /// Logging level
    #[arg(
        long,
        default_value = "INFO",
        value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"]
    )]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.crash-stats/last_used.json`.
///
/// Only input and output paths are kept; the dedup precedence always comes
/// from the command line.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".crash-stats").join("last_used.json")
    }

    /// Load persisted params from an explicit path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to an explicit path, creating parent
    /// directories if needed.
    pub fn save_to(&self, path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> std::result::Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation, taking args and an explicit config path.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = LastUsedParams::clear_at(config_path) {
                tracing::warn!(error = %e, "could not clear saved configuration");
            }
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if !is_arg_explicitly_set(&matches, "archive") {
            if let Some(v) = last.archive {
                settings.archive = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "output_dir") {
            if let Some(v) = last.output_dir {
                settings.output_dir = v;
            }
        }

        settings = Self::apply_debug(settings);

        let params = LastUsedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            tracing::warn!(error = %e, "could not persist configuration");
        }

        settings
    }

    /// The parsed `--precedence` value.
    pub fn dedup_precedence(&self) -> Result<DedupPrecedence> {
        self.precedence.parse()
    }

    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            archive: Some(s.archive.clone()),
            output_dir: Some(s.output_dir.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line.
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
