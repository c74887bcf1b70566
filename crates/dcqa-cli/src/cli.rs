//! CLI argument definitions for `dcqa`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "dcqa",
    version,
    about = "Clean media plans and budgets against reference taxonomies",
    long_about = "Clean raw media plan and budget extracts.\n\n\
                  Attributes brands, vendors, channels and campaigns from the project\n\
                  taxonomy, reconciles FX, and writes every correction or gap to an\n\
                  exception list."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the plans and budgets pipelines over a project folder.
    Clean(CleanArgs),

    /// Run the two-pass brand resolver over the latest plans batch.
    BrandCheck(ProjectArgs),

    /// Expand a cleaned extract into one row per day.
    Prorate(ProrateArgs),

    /// Write review CSVs for unresolved brands, vendors, channels and leagues.
    FixPacks(CleanArgs),

    /// Merge reviewed fix packs into the taxonomy.
    ApplyFixes(ProjectArgs),
}

#[derive(Parser)]
pub struct ProjectArgs {
    /// Project folder containing input/, taxonomy/ and rules/.
    #[arg(value_name = "BASE")]
    pub base: PathBuf,

    #[command(flatten)]
    pub paths: PathOverrides,
}

/// Per-location overrides of the project folder layout.
#[derive(Parser)]
pub struct PathOverrides {
    /// Raw batch folder (default: <BASE>/input/raw).
    #[arg(long = "input-dir", value_name = "DIR")]
    pub input_dir: Option<PathBuf>,

    /// Taxonomy folder (default: <BASE>/taxonomy).
    #[arg(long = "taxonomy-dir", value_name = "DIR")]
    pub taxonomy_dir: Option<PathBuf>,

    /// Rules file (default: <BASE>/rules/validation_rules.toml).
    #[arg(long = "rules", value_name = "PATH")]
    pub rules: Option<PathBuf>,

    /// Output folder (default: <BASE>/output).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Parser)]
pub struct CleanArgs {
    /// Project folder containing input/, taxonomy/ and rules/.
    #[arg(value_name = "BASE")]
    pub base: PathBuf,

    #[command(flatten)]
    pub paths: PathOverrides,

    /// Reference date for age-based rules and output names (default: today).
    #[arg(long = "as-of", value_name = "YYYY-MM-DD")]
    pub as_of: Option<NaiveDate>,

    /// Run the pipelines and report without writing output files.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Parser)]
pub struct ProrateArgs {
    /// Cleaned CSV extract to expand.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Column layout of the extract.
    #[arg(long = "layout", value_enum, default_value = "budgets")]
    pub layout: LayoutArg,

    /// Daily output CSV.
    #[arg(short = 'o', long = "output", value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Rules file whose `[proration]` section overrides the built-in layouts.
    #[arg(long = "rules", value_name = "PATH")]
    pub rules: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum LayoutArg {
    Budgets,
    Plans,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
