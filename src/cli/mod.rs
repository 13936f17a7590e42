//! CLI definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::export::ExportScope;

pub mod commands;

/// Health profile CLI - export and import personal health records
#[derive(Parser, Debug)]
#[command(name = "hp", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Database path (default: ~/.healthprofile/data/health.db)
    #[arg(long, global = true, env = "HP_DB")]
    pub db: Option<PathBuf>,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (no output except errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the health database
    Init {
        /// Overwrite existing database
        #[arg(long)]
        force: bool,
    },

    /// Fill the database with generated sample records
    Generate {
        /// Number of days to generate, ending now
        #[arg(long, default_value = "30")]
        days: u32,

        /// Random seed (same seed, same records)
        #[arg(long, default_value = "42")]
        seed: u64,
    },

    /// Export records to a profile file
    Export(ExportArgs),

    /// Import a profile file into the database
    Import {
        /// Profile file, or a profile name in the profile directory
        profile: String,

        /// Delete this app's existing records of each imported type first
        #[arg(long)]
        delete_existing: bool,

        /// Profile directory used to resolve a bare name
        #[arg(long, env = "HP_PROFILE_DIR")]
        dir: Option<PathBuf>,
    },

    /// Inspect exported profiles
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },

    /// Show record counts and user characteristics
    Status,

    /// Print version information
    Version,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Arguments for `hp export`.
#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Profile name; also the output file name
    pub name: String,

    /// Which records to export
    #[arg(long, value_enum, default_value_t = ScopeArg::All)]
    pub scope: ScopeArg,

    /// Output directory (default: ~/.healthprofile/profiles)
    #[arg(long, env = "HP_PROFILE_DIR")]
    pub dir: Option<PathBuf>,

    /// Replace an existing profile with the same name
    #[arg(long)]
    pub overwrite: bool,

    /// Leave record identifiers out of the profile
    #[arg(long)]
    pub no_uuids: bool,
}

/// Export scope as accepted on the command line.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScopeArg {
    /// Every accessible record
    #[default]
    All,
    /// Records written by this app (generated or imported)
    AddedByApp,
    /// Records generated by this app
    GeneratedByApp,
}

impl From<ScopeArg> for ExportScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::All => Self::All,
            ScopeArg::AddedByApp => Self::AddedByApp,
            ScopeArg::GeneratedByApp => Self::GeneratedByApp,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List profiles in the profile directory
    List {
        /// Profile directory (default: ~/.healthprofile/profiles)
        #[arg(long, env = "HP_PROFILE_DIR")]
        dir: Option<PathBuf>,
    },

    /// Show a profile's metadata without reading its records
    Show {
        /// Profile file, or a profile name in the profile directory
        profile: String,

        /// Profile directory used to resolve a bare name
        #[arg(long, env = "HP_PROFILE_DIR")]
        dir: Option<PathBuf>,
    },
}
