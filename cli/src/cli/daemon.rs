use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum DaemonCommands {
    /// Start the daemon (backgrounds itself unless --foreground)
    Start {
        #[arg(short, long)]
        foreground: bool,
    },

    /// Ask a running daemon to exit
    Stop,

    /// Show whether the daemon is running and what it serves
    Status,
}
