//! CLI argument definitions and command dispatch.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::normalize::ResizeStrategy;

/// Photo frame CLI - keep a gallery of portrait images and rotate them across display slots.
///
/// Robot Mode: Use --robot or --format=json for machine-parseable output.
#[derive(Parser, Debug)]
#[command(name = "pf", version, about, long_about = None)]
#[command(propagate_version = true)]
#[allow(clippy::struct_excessive_bools)] // CLI flags naturally use multiple bools
pub struct Cli {
    /// Output format (text for humans, json for agents/scripts)
    #[arg(
        long,
        short = 'f',
        default_value = "text",
        global = true,
        env = "PF_FORMAT"
    )]
    pub format: OutputFormat,

    /// Robot mode: equivalent to --format=json plus JSON logs
    #[arg(long, global = true)]
    pub robot: bool,

    /// Verbose output (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Configuration file (TOML or YAML)
    #[arg(long, global = true, env = "PF_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Gallery database file (overrides the config file)
    #[arg(long, global = true, env = "PF_DB", value_name = "FILE")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with optional color
    #[default]
    Text,
    /// JSON output for scripts and agents
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

impl Cli {
    /// Returns true if output should be JSON (robot mode or explicit --format=json).
    pub const fn use_json(&self) -> bool {
        self.robot || matches!(self.format, OutputFormat::Json | OutputFormat::JsonCompact)
    }

    /// Returns true if output should be compact JSON.
    pub const fn use_compact_json(&self) -> bool {
        matches!(self.format, OutputFormat::JsonCompact)
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // === Gallery ===
    /// Add image files to the gallery
    Add(AddArgs),

    /// Add an image read from stdin (e.g. a clipboard pipe)
    Paste(PasteArgs),

    /// List images in the gallery
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Remove an image by id
    #[command(visible_alias = "rm")]
    Remove(RemoveArgs),

    // === Backup ===
    /// Export the gallery as a JSON document
    Export(ExportArgs),

    /// Replace the gallery with a previously exported document
    Import(ImportArgs),

    // === Display ===
    /// Render one frame of slot assignments
    Show(ShowArgs),

    /// Rotate images across the display slots until interrupted
    Run(RunArgs),

    // === Configuration ===
    /// Write a default configuration file
    Init(InitArgs),

    /// Show the effective configuration
    Config(ConfigArgs),

    // === Utilities ===
    /// Show version and build information
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// === Argument Structs ===

#[derive(Parser, Debug)]
pub struct AddArgs {
    /// Image files (PNG, JPEG, GIF, BMP, WebP, ...)
    #[arg(required = true, value_name = "IMAGE")]
    pub images: Vec<PathBuf>,

    /// Resize strategy (overrides the config file)
    #[arg(long)]
    pub resize: Option<ResizeStrategy>,

    /// Continue with the remaining files if one fails
    #[arg(long, short = 'c')]
    pub continue_on_error: bool,
}

#[derive(Parser, Debug)]
pub struct PasteArgs {
    /// Resize strategy (overrides the config file)
    #[arg(long)]
    pub resize: Option<ResizeStrategy>,
}

#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Show creation time and payload size
    #[arg(long, short = 'l')]
    pub long: bool,
}

#[derive(Parser, Debug)]
pub struct RemoveArgs {
    /// Image id as shown by `pf list`
    pub id: i64,
}

#[derive(Parser, Debug)]
pub struct ExportArgs {
    /// Output file ("-" for stdout)
    #[arg(long, short = 'o', default_value = "images.json")]
    pub output: PathBuf,
}

#[derive(Parser, Debug)]
pub struct ImportArgs {
    /// Document produced by `pf export`
    pub file: PathBuf,
}

#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Write slot files to this directory instead of only printing
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Milliseconds between rotation ticks (overrides the config file)
    #[arg(long, short = 'i')]
    pub interval_ms: Option<u64>,

    /// Directory the slot files are written to (overrides the config file)
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Stop after this many seconds (0 = run until interrupted)
    #[arg(long, short = 'd', default_value = "0")]
    pub duration_secs: u64,
}

#[derive(Parser, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Show configuration file path only
    #[arg(long)]
    pub path: bool,
}

#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
