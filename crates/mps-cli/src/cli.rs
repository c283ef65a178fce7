//! CLI argument definitions for the media plan editor.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use mps_model::EntityKind;

#[derive(Parser)]
#[command(
    name = "mediaplan",
    version,
    about = "Media plan editor - inspect, edit and move campaign plan hierarchies",
    long_about = "Inspect, edit and move the Section → Tactique → Placement → Créatif\n\
                  hierarchy of a campaign onglet stored in a JSON plan file.\n\n\
                  Edits go through the same pending-change and commit engine as the\n\
                  interactive table; pass --write to persist the result."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (defaults to the config file, then pretty).
    #[arg(long = "log-format", value_enum, global = true)]
    pub log_format: Option<LogFormatArg>,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Configuration file (default: the per-user config directory).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show the projected table rows of an onglet.
    Rows(RowsArgs),

    /// Analyse a selection for a move without changing anything.
    Analyze(AnalyzeArgs),

    /// Edit one cell and save it.
    Edit(EditArgs),

    /// Copy one field of a source row to other rows and save.
    FillDown(FillDownArgs),

    /// Copy every copyable field of a row to rows of the same kind and save.
    CopyRow(CopyRowArgs),

    /// Move elements (with their subtrees) under another parent.
    Move(MoveArgs),

    /// Render a taxonomy template with the values stored on an entity.
    Taxonomy(TaxonomyArgs),
}

/// Plan file and onglet selection shared by every command.
#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    /// JSON plan file (one client's campaigns, versions and onglets).
    #[arg(long = "plan", short = 'p', value_name = "FILE")]
    pub plan: PathBuf,

    /// Campaign id (default: the first campaign in the file).
    #[arg(long = "campaign")]
    pub campaign: Option<String>,

    /// Version id (default: the first version of the campaign).
    #[arg(long = "version-id")]
    pub version: Option<String>,

    /// Onglet id (default: the first onglet of the version).
    #[arg(long = "onglet")]
    pub onglet: Option<String>,
}

#[derive(Args, Debug)]
pub struct RowsArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Editable level whose columns are shown.
    #[arg(long = "level", value_enum, default_value = "section")]
    pub level: LevelArg,

    /// Sections to expand (comma separated ids).
    #[arg(long = "expand", value_delimiter = ',')]
    pub expand: Vec<String>,

    /// Expand every section.
    #[arg(long = "expand-all")]
    pub expand_all: bool,

    /// Print a plain indented outline instead of a table.
    #[arg(long = "outline")]
    pub outline: bool,
}

#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Selected entity ids, any level.
    #[arg(required = true, value_name = "ID")]
    pub ids: Vec<String>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Entity id.
    pub id: String,

    /// Field key (e.g. TC_Budget).
    pub field: String,

    /// New value; numbers, booleans and JSON literals are recognised.
    pub value: String,

    /// Write the updated plan back to the file.
    #[arg(long = "write")]
    pub write: bool,
}

#[derive(Args, Debug)]
pub struct FillDownArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Row whose value is copied.
    pub source: String,

    /// Field key to copy.
    pub field: String,

    /// Rows receiving the value.
    #[arg(required = true, value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Write the updated plan back to the file.
    #[arg(long = "write")]
    pub write: bool,
}

#[derive(Args, Debug)]
pub struct CopyRowArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Row whose values are copied.
    pub source: String,

    /// Rows receiving the values.
    #[arg(required = true, value_name = "TARGET")]
    pub targets: Vec<String>,

    /// Write the updated plan back to the file.
    #[arg(long = "write")]
    pub write: bool,
}

#[derive(Args, Debug)]
pub struct MoveArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Selected entity ids; descendants of other selected ids ride along.
    #[arg(required = true, value_name = "ID")]
    pub ids: Vec<String>,

    /// Destination as campaign/version/onglet[/section[/tactique[/placement]]].
    #[arg(long = "to", value_name = "PATH")]
    pub to: String,

    /// Write the updated plan back to the file.
    #[arg(long = "write")]
    pub write: bool,
}

#[derive(Args, Debug)]
pub struct TaxonomyArgs {
    #[command(flatten)]
    pub plan: PlanArgs,

    /// Placement or créatif id.
    pub id: String,

    /// Template with <VARIABLE> placeholders.
    #[arg(long = "template")]
    pub template: String,
}

/// Editable level choices.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LevelArg {
    Section,
    Tactique,
    Placement,
    Creatif,
}

impl From<LevelArg> for EntityKind {
    fn from(level: LevelArg) -> Self {
        match level {
            LevelArg::Section => EntityKind::Section,
            LevelArg::Tactique => EntityKind::Tactique,
            LevelArg::Placement => EntityKind::Placement,
            LevelArg::Creatif => EntityKind::Creatif,
        }
    }
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
