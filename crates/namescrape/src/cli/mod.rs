pub mod extract;
pub mod sources;

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use namescrape_core::RuleRegistry;

/// Rule set compiled into the binary: author lists of four statistics journals.
pub const BUNDLED_RULES: &str = include_str!("../../rules/journals.json");

#[derive(Parser)]
#[command(
    name = "namescrape",
    about = "Build name rosters from department directories and journal issues",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract names for one or more roles
    Extract {
        /// Role to extract: faculty, student (or phd), author
        #[arg(long = "role", required = true)]
        roles: Vec<String>,
        /// Rule registry file (defaults to the user config, then the bundled journals)
        #[arg(long)]
        rules: Option<PathBuf>,
        /// Only visit these sources
        #[arg(long = "source")]
        sources: Vec<String>,
        /// Add a gender column from first-name classification
        #[arg(long)]
        classify: bool,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Tsv)]
        format: OutputFormat,
    },
    /// List configured sources and their roles
    Sources {
        #[arg(long)]
        rules: Option<PathBuf>,
    },
    /// Load and validate a rule registry without fetching anything
    Check {
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Tsv,
    Json,
}

/// Where the active rule registry was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulesOrigin {
    File(PathBuf),
    UserConfig(PathBuf),
    Bundled,
}

impl fmt::Display for RulesOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) | Self::UserConfig(path) => write!(f, "{}", path.display()),
            Self::Bundled => f.write_str("bundled journal rules"),
        }
    }
}

pub fn user_rules_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("namescrape").join("rules.json"))
}

/// An explicit path wins, then `<config_dir>/namescrape/rules.json`, then the
/// bundled rule set.
pub fn load_registry(path: Option<&Path>) -> Result<(RuleRegistry, RulesOrigin)> {
    if let Some(path) = path {
        let registry = RuleRegistry::from_path(path)
            .with_context(|| format!("failed to load rules from {}", path.display()))?;
        return Ok((registry, RulesOrigin::File(path.to_path_buf())));
    }

    if let Some(path) = user_rules_path().filter(|p| p.is_file()) {
        let registry = RuleRegistry::from_path(&path)
            .with_context(|| format!("failed to load rules from {}", path.display()))?;
        return Ok((registry, RulesOrigin::UserConfig(path)));
    }

    let registry =
        RuleRegistry::from_json_str(BUNDLED_RULES).context("bundled rules are invalid")?;
    Ok((registry, RulesOrigin::Bundled))
}
