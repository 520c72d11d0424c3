//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};

use crate::application::DateField;

/// Radial family tree engine: graph discovery, sector layout and date inference for Gramps XML
#[derive(Parser, Debug)]
#[command(name = "rsfam")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub debug: u8,

    /// Config file (default: ./rsfam.toml if present)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Document and root selection shared by the tree commands.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Gramps XML document (default: data_path from config)
    #[arg(value_hint = ValueHint::FilePath)]
    pub file: Option<PathBuf>,

    /// Root family by id attribute, e.g. F0001
    #[arg(long, conflicts_with = "root_tag")]
    pub root_id: Option<String>,

    /// Root family by tag name
    #[arg(long)]
    pub root_tag: Option<String>,

    /// Year drawn at the centre of the diagram
    #[arg(long)]
    pub max_year: Option<i32>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Lay out the tree and write it as JSON
    Export {
        #[command(flatten)]
        source: SourceArgs,
        /// Output file (default: stdout)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Show the family graph as a tree
    Tree {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Show counts, date range and levels
    Info {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// List the nodes that rotate together with a node
    Rotate {
        /// Person or family handle
        handle: String,
        /// Rotate by this many degrees and print the resulting overrides
        #[arg(long, allow_hyphen_values = true)]
        by: Option<f64>,
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Move a date to the one drawn at a radius and print the resulting overrides
    Rescale {
        /// Person or family handle
        handle: String,
        /// Date to move
        #[arg(value_enum)]
        field: FieldArg,
        /// Radius in scale units
        radius: f64,
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print a commented template
    Template,
    /// Show config file locations
    Path,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldArg {
    Birth,
    Death,
    Marriage,
}

impl From<FieldArg> for DateField {
    fn from(field: FieldArg) -> Self {
        match field {
            FieldArg::Birth => DateField::Birth,
            FieldArg::Death => DateField::Death,
            FieldArg::Marriage => DateField::Marriage,
        }
    }
}
