mod daemon;

pub use daemon::DaemonCommands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::SourceKind;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the number of battery units
    Units,

    /// Normalized battery reading (all units unless --unit is given)
    #[command(alias = "status")]
    Info {
        #[arg(short, long)]
        unit: Option<u32>,

        #[arg(long)]
        json: bool,
    },

    /// Raw info block of one unit
    RawInfo {
        #[arg(short, long)]
        unit: u32,

        #[arg(long)]
        json: bool,
    },

    /// Raw status block of one unit
    RawStatus {
        #[arg(short, long)]
        unit: u32,

        #[arg(long)]
        json: bool,
    },

    /// Dump monitoring counters as `name: value` lines
    #[command(alias = "sysctl")]
    Counters {
        /// Print only this counter, e.g. `life` or `battery.life`
        name: Option<String>,
    },

    /// Stream JSON samples
    #[command(alias = "raw")]
    Pipe {
        #[arg(short, long, default_value_t = 0)]
        samples: u32,

        #[arg(short, long, default_value_t = 1000)]
        interval: u64,

        #[arg(short, long)]
        compact: bool,
    },

    /// Print diagnostics about sources, devices and config
    Debug,

    Config {
        #[arg(long)]
        path: bool,

        #[arg(long)]
        reset: bool,

        #[arg(short, long)]
        edit: bool,
    },

    Daemon {
        #[command(subcommand)]
        command: DaemonCommands,
    },

    /// Show the newest log file
    Logs {
        #[arg(short = 'n', long, default_value_t = 50)]
        lines: usize,

        #[arg(short, long)]
        follow: bool,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Info {
            unit: None,
            json: false,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "battinfo", version, about = "Aggregated battery status", verbatim_doc_comment)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Battery source to read from
    #[arg(long, global = true, value_enum)]
    pub source: Option<SourceKind>,

    /// Read batteries from a TOML fixture instead of the hardware
    #[arg(long, global = true, value_name = "PATH")]
    pub fixture: Option<PathBuf>,

    /// Query the running daemon instead of reading batteries directly
    #[arg(long, global = true)]
    pub remote: bool,
}
