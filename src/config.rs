// src/config.rs
use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::matrix::parse::ParseOptions;

pub const DEFAULT_DELIMITER: char = ';';
pub const DEFAULT_ENTITY_MARKER: &str = "verage";
pub const DEFAULT_SENTINEL: &str = "1.0";
pub const DEFAULT_DIMENSION: &str = "Brain zone";
pub const DEFAULT_INTERMEDIATE_PATTERN: &str = "trimmed_file{n}.csv";

/// Reconcile labeled matrix files and merge one chosen row across them.
#[derive(Debug, Clone, Parser)]
#[command(name = "zonemerge", version)]
pub struct CliArgs {
    /// Input files (glob patterns are expanded). Order defines intermediate numbering.
    #[arg(value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Optional YAML file with defaults for the options below.
    #[arg(long, env = "ZONEMERGE_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Row label to merge; prompted for when absent.
    #[arg(long, short = 'l', value_name = "LABEL")]
    pub label: Option<String>,

    /// Merged table destination; prompted for when absent.
    #[arg(long, short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Directory receiving the trimmed intermediate files.
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Field delimiter of input and output files.
    #[arg(long)]
    pub delimiter: Option<char>,

    /// Substring marking an entity row in column 0.
    #[arg(long)]
    pub entity_marker: Option<String>,

    /// Cell value a column must contain to survive trimming.
    #[arg(long)]
    pub sentinel: Option<String>,

    /// Dimension name printed in the merged table header.
    #[arg(long)]
    pub dimension: Option<String>,

    /// Keep the last block of a file even without a trailing blank line.
    #[arg(long)]
    pub flush_trailing_block: bool,

    /// Do not delete the trimmed intermediate files.
    #[arg(long)]
    pub keep_intermediate: bool,
}

/// Values a `--config` file may provide. CLI flags win over these.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PartialConfig {
    work_dir: Option<PathBuf>,
    delimiter: Option<char>,
    entity_marker: Option<String>,
    sentinel: Option<String>,
    dimension: Option<String>,
    intermediate_pattern: Option<String>,
    flush_trailing_block: Option<bool>,
    keep_intermediate: Option<bool>,
    label: Option<String>,
    output: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub inputs: Vec<String>,
    pub work_dir: PathBuf,
    pub delimiter: char,
    pub entity_marker: String,
    pub sentinel: String,
    pub dimension: String,
    /// File name of the N-th trimmed intermediate; `{n}` is the 1-based input index.
    pub intermediate_pattern: String,
    pub flush_trailing_block: bool,
    pub keep_intermediate: bool,
    pub label: Option<String>,
    pub output: Option<PathBuf>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            work_dir: PathBuf::from("."),
            delimiter: DEFAULT_DELIMITER,
            entity_marker: DEFAULT_ENTITY_MARKER.to_string(),
            sentinel: DEFAULT_SENTINEL.to_string(),
            dimension: DEFAULT_DIMENSION.to_string(),
            intermediate_pattern: DEFAULT_INTERMEDIATE_PATTERN.to_string(),
            flush_trailing_block: false,
            keep_intermediate: false,
            label: None,
            output: None,
        }
    }
}

impl MergeConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            inputs,
            config,
            label: cli_label,
            output: cli_output,
            work_dir: cli_work_dir,
            delimiter: cli_delimiter,
            entity_marker: cli_entity_marker,
            sentinel: cli_sentinel,
            dimension: cli_dimension,
            flush_trailing_block: cli_flush,
            keep_intermediate: cli_keep,
        } = args;

        let file = match config.as_ref() {
            Some(path) => load_config_file(path)?,
            None => PartialConfig::default(),
        };
        let defaults = MergeConfig::default();

        Ok(Self {
            inputs,
            work_dir: cli_work_dir.or(file.work_dir).unwrap_or(defaults.work_dir),
            delimiter: cli_delimiter.or(file.delimiter).unwrap_or(defaults.delimiter),
            entity_marker: cli_entity_marker
                .or(file.entity_marker)
                .unwrap_or(defaults.entity_marker),
            sentinel: cli_sentinel.or(file.sentinel).unwrap_or(defaults.sentinel),
            dimension: cli_dimension.or(file.dimension).unwrap_or(defaults.dimension),
            intermediate_pattern: file
                .intermediate_pattern
                .unwrap_or(defaults.intermediate_pattern),
            // a bare flag can only switch these on
            flush_trailing_block: cli_flush || file.flush_trailing_block.unwrap_or(false),
            keep_intermediate: cli_keep || file.keep_intermediate.unwrap_or(false),
            label: cli_label.or(file.label),
            output: cli_output.or(file.output),
        })
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.delimiter.is_ascii(),
            "delimiter must be a single ASCII character, got {:?}",
            self.delimiter
        );
        anyhow::ensure!(!self.entity_marker.is_empty(), "entity marker must not be empty");
        anyhow::ensure!(!self.sentinel.is_empty(), "sentinel must not be empty");
        anyhow::ensure!(
            self.intermediate_pattern.contains("{n}"),
            "intermediate pattern '{}' must contain {{n}}",
            self.intermediate_pattern
        );
        Ok(())
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            delimiter: self.delimiter as u8,
            entity_marker: self.entity_marker.clone(),
            flush_trailing_block: self.flush_trailing_block,
        }
    }

    /// Path of the trimmed intermediate for the input at 1-based position `n`.
    pub fn intermediate_path(&self, n: usize) -> PathBuf {
        self.work_dir
            .join(self.intermediate_pattern.replace("{n}", &n.to_string()))
    }
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
}
