use std::path::PathBuf;

use clap::{CommandFactory, Parser};

use crate::error::{PipelineError, Result};

/// Default directory with the raw CEAPS CSV files.
pub const DEFAULT_RAW_DIR: &str = "./data/raw";
/// Default location of the normalized (interim) export.
pub const DEFAULT_INTERIM_FILE: &str = "./data/interim/data.csv";
/// Default location of the daily forecasting-ready export.
pub const DEFAULT_PROCESSED_FILE: &str = "./data/processed/forecasting_data.csv";

/// Default field separator of the raw Senate exports.
pub const RAW_SEPARATOR: char = ';';
/// Default field separator of files this pipeline itself wrote.
pub const DERIVED_SEPARATOR: char = ',';

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// CEAPS expense-data cleaning and forecasting preparation
#[derive(Parser, Debug, Clone)]
#[command(
    name = "ceaps",
    about = "Cleans CEAPS expense records and prepares a daily forecasting series",
    version
)]
pub struct Settings {
    /// Pipeline stage to run
    #[arg(long, default_value = "full", value_parser = ["wrangle", "prepare", "full"])]
    pub stage: String,

    /// Input path: raw CSV directory for wrangle/full, derived CSV file for prepare
    #[arg(long, default_value = DEFAULT_RAW_DIR)]
    pub input: PathBuf,

    /// Output file (stage-dependent default when omitted)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Where the full stage writes the normalized interim export
    #[arg(long, default_value = DEFAULT_INTERIM_FILE)]
    pub interim: PathBuf,

    /// Character encoding of the input files, or "auto" to sniff per file
    #[arg(long, default_value = "auto")]
    pub encoding: String,

    /// Field separator (defaults to ';' for raw input, ',' for derived files)
    #[arg(long)]
    pub separator: Option<char>,

    /// Keep exact-duplicate rows instead of dropping them
    #[arg(long)]
    pub keep_duplicates: bool,

    /// Drop rows whose expense-date year disagrees with the ANO column
    #[arg(long)]
    pub drop_year_mismatch: bool,

    /// Skip the stationarity check and transform
    #[arg(long)]
    pub skip_stationarity: bool,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

// ── Enumerated pipeline options ────────────────────────────────────────────────

/// Which part of the pipeline to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Raw directory → normalized export.
    Wrangle,
    /// Derived file → daily series export.
    Prepare,
    /// Both, passing the normalized records in memory.
    Full,
}

/// Input character encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodingChoice {
    /// Sniff each file from its byte content.
    Auto,
    /// A fixed encoding label applied to every file.
    Label(String),
}

/// Toggles for the optional cleaning passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CleaningOptions {
    /// Remove exact-duplicate rows (stable, first occurrence wins).
    pub drop_duplicates: bool,
    /// Drop rows whose parsed date year disagrees with the `ANO` field.
    pub drop_year_mismatch: bool,
}

impl Default for CleaningOptions {
    fn default() -> Self {
        Self {
            drop_duplicates: true,
            drop_year_mismatch: false,
        }
    }
}

/// Fully-resolved configuration, passed by value into the pipeline.
///
/// No component reads process-wide state; everything a stage needs is here.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub stage: Stage,
    pub input_path: PathBuf,
    pub interim_path: PathBuf,
    pub output_path: PathBuf,
    pub encoding: EncodingChoice,
    /// Field separator as a single ASCII byte.
    pub separator: u8,
    pub cleaning: CleaningOptions,
    pub check_stationarity: bool,
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse the process arguments, also returning the raw matches so that
    /// stage-dependent defaults can tell explicit flags from defaults.
    pub fn parse_with_matches() -> (Self, clap::ArgMatches) {
        Self::parse_with_matches_from(std::env::args_os().collect())
    }

    /// Same as [`parse_with_matches`], from an explicit argument list
    /// (used by tests).
    pub fn parse_with_matches_from(args: Vec<std::ffi::OsString>) -> (Self, clap::ArgMatches) {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        (settings, matches)
    }

    /// Resolve the CLI surface into a [`PipelineConfig`].
    ///
    /// Defaults that depend on the stage are applied only when the flag was
    /// not given explicitly on the command line:
    /// * `--input` falls back to the interim export for `prepare`;
    /// * `--separator` falls back to `;` for raw ingestion and `,` for
    ///   derived files;
    /// * `--output` falls back to the interim export for `wrangle` and the
    ///   processed export otherwise.
    pub fn into_config(self, matches: &clap::ArgMatches) -> Result<PipelineConfig> {
        let stage = match self.stage.as_str() {
            "wrangle" => Stage::Wrangle,
            "prepare" => Stage::Prepare,
            "full" => Stage::Full,
            other => return Err(PipelineError::Config(format!("unknown stage: {other}"))),
        };

        let input_path = if stage == Stage::Prepare && !is_arg_explicitly_set(matches, "input") {
            PathBuf::from(DEFAULT_INTERIM_FILE)
        } else {
            self.input
        };

        let separator = match self.separator {
            Some(c) => c,
            None => match stage {
                Stage::Prepare => DERIVED_SEPARATOR,
                Stage::Wrangle | Stage::Full => RAW_SEPARATOR,
            },
        };
        if !separator.is_ascii() {
            return Err(PipelineError::Config(format!(
                "separator must be a single ASCII character, got {separator:?}"
            )));
        }

        let output_path = self.output.unwrap_or_else(|| match stage {
            Stage::Wrangle => PathBuf::from(DEFAULT_INTERIM_FILE),
            Stage::Prepare | Stage::Full => PathBuf::from(DEFAULT_PROCESSED_FILE),
        });

        let encoding = if self.encoding.eq_ignore_ascii_case("auto") {
            EncodingChoice::Auto
        } else {
            EncodingChoice::Label(self.encoding)
        };

        Ok(PipelineConfig {
            stage,
            input_path,
            interim_path: self.interim,
            output_path,
            encoding,
            separator: separator as u8,
            cleaning: CleaningOptions {
                drop_duplicates: !self.keep_duplicates,
                drop_year_mismatch: self.drop_year_mismatch,
            },
            check_stationarity: !self.skip_stationarity,
        })
    }
}

// ── Helper: check if an arg was explicitly set on the command line ─────────────

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
