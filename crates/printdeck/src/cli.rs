//! Clap derive structures for the `printdeck` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// printdeck -- drive OctoPrint-compatible printers from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "printdeck",
    version,
    about = "Manage 3D printers from the command line",
    long_about = "Keep a set of OctoPrint-compatible printers, pick one as active,\n\
        watch its live status and send it jobs, temperatures, moves and files.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "PRINTDECK_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

    /// When to use color output [default: from config, else auto]
    #[arg(long, global = true)]
    pub color: Option<ColorMode>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides config)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Config file to read instead of the platform default
    #[arg(long, env = "PRINTDECK_CONFIG", global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding printer profiles (overrides config)
    #[arg(long, env = "PRINTDECK_DATA_DIR", global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,
}

impl GlobalOpts {
    pub fn output(&self) -> OutputFormat {
        self.output.unwrap_or(OutputFormat::Table)
    }

    pub fn color(&self) -> ColorMode {
        self.color.unwrap_or(ColorMode::Auto)
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage printer profiles and the active printer
    #[command(alias = "p")]
    Printers(PrintersArgs),

    /// Show the active printer's live status
    #[command(alias = "st")]
    Status(StatusArgs),

    /// Pause, resume or cancel the current job
    Job(JobArgs),

    /// Set a heater's target temperature
    Temp {
        /// Heater: nozzle, bed, chamber, or tool<N>
        heater: String,

        /// Target in °C (0 turns the heater off)
        celsius: f64,
    },

    /// Move one axis by a relative distance
    #[command(allow_negative_numbers = true)]
    Move {
        /// Axis: x, y or z
        axis: String,

        /// Distance in mm; negative moves toward the origin
        distance: f64,
    },

    /// Home one or more axes
    Home {
        /// Axes to home, e.g. "xy" [default: xyz]
        #[arg(default_value = "xyz")]
        axes: String,
    },

    /// Push filament through the nozzle
    Extrude {
        /// Amount in mm
        #[arg(default_value = "5")]
        mm: f64,
    },

    /// Pull filament back from the nozzle
    Retract {
        /// Amount in mm
        #[arg(default_value = "5")]
        mm: f64,
    },

    /// Send raw G-code lines
    Gcode {
        /// One or more command lines, sent in order
        #[arg(required = true)]
        lines: Vec<String>,
    },

    /// Manage files stored on the printer
    #[command(alias = "f")]
    Files(FilesArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Printers ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PrintersArgs {
    #[command(subcommand)]
    pub command: PrintersCommand,
}

#[derive(Debug, Subcommand)]
pub enum PrintersCommand {
    /// List printer profiles
    #[command(alias = "ls")]
    List,

    /// Add a printer and make it active
    Add {
        /// Display name
        name: String,

        /// Server URL, e.g. http://octopi.local
        url: String,

        /// API key (prompted for when omitted)
        #[arg(long, env = "PRINTDECK_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Accent color shown next to the printer
        #[arg(long)]
        color: Option<String>,

        /// Save without probing the printer first
        #[arg(long)]
        skip_test: bool,
    },

    /// Change fields of a printer profile
    Edit {
        /// Printer name or ID
        printer: String,

        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New server URL
        #[arg(long)]
        url: Option<String>,

        /// New API key
        #[arg(long, conflicts_with = "prompt_key")]
        api_key: Option<String>,

        /// Prompt for a new API key without echoing it
        #[arg(long)]
        prompt_key: bool,

        /// New accent color
        #[arg(long, conflicts_with = "clear_color")]
        color: Option<String>,

        /// Remove the accent color
        #[arg(long)]
        clear_color: bool,
    },

    /// Remove a printer profile
    #[command(alias = "rm")]
    Remove {
        /// Printer name or ID
        printer: String,
    },

    /// Make a printer the active one
    Use {
        /// Printer name or ID
        printer: String,
    },

    /// Check that a printer answers with its API key
    Test {
        /// Printer name or ID [default: active printer]
        printer: Option<String>,
    },
}

// ── Status ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct StatusArgs {
    /// Keep polling and print every change until interrupted
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// Poll interval while watching, e.g. "2s" or "500ms" [default: from config]
    #[arg(long, value_parser = humantime::parse_duration, requires = "watch")]
    pub interval: Option<Duration>,
}

// ── Job ──────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct JobArgs {
    #[command(subcommand)]
    pub command: JobCommand,
}

#[derive(Debug, Subcommand)]
pub enum JobCommand {
    /// Pause the running print
    Pause,
    /// Resume a paused print
    Resume,
    /// Cancel the current print
    Cancel,
}

// ── Files ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FilesArgs {
    #[command(subcommand)]
    pub command: FilesCommand,
}

#[derive(Debug, Subcommand)]
pub enum FilesCommand {
    /// List printable files (folders flattened)
    #[command(alias = "ls")]
    List,

    /// Upload a G-code file
    Upload {
        /// Local .gcode, .gco or .g file
        path: PathBuf,

        /// Name to store it under [default: the local file name]
        #[arg(long)]
        name: Option<String>,

        /// Start printing once the upload finishes
        #[arg(long)]
        print: bool,
    },

    /// Select a stored file and start printing it
    Print {
        /// File path on the printer
        name: String,
    },

    /// Delete a stored file
    #[command(alias = "rm")]
    Delete {
        /// File path on the printer
        name: String,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the resolved configuration
    Show,

    /// Print the config file and data directory locations
    Path,

    /// Write a config file, prompting for values when interactive
    Init {
        /// Write defaults without prompting
        #[arg(long)]
        defaults: bool,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
