mod cli;
mod commands;
mod config;
mod daemon;
mod data;
mod logging;

use clap::Parser;
use color_eyre::eyre::Result;

use cli::{Cli, Commands};
use commands::Context;
use config::{LogLevel, UserConfig};
use data::SourceOptions;
use logging::LogMode;

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let mut config = UserConfig::load();
    config.merge_with_args(cli.source);
    let log_level_override = cli.log_level.as_deref().map(LogLevel::from_str);

    let ctx = Context {
        source: SourceOptions::from_config(&config, cli.fixture),
        config,
        remote: cli.remote,
    };
    let log_level = ctx.config.log_level;

    let command = cli.command.unwrap_or_default();
    if let Commands::Daemon { command } = command {
        return commands::daemon::run(command, ctx, log_level_override);
    }

    let _guard = logging::init(log_level, LogMode::Stderr, log_level_override);
    match command {
        Commands::Units => commands::units::run(&ctx),
        Commands::Info { unit, json } => commands::info::run(&ctx, unit, json),
        Commands::RawInfo { unit, json } => commands::raw::run_info(&ctx, unit, json),
        Commands::RawStatus { unit, json } => commands::raw::run_status(&ctx, unit, json),
        Commands::Counters { name } => commands::counters::run(&ctx, name.as_deref()),
        Commands::Pipe {
            samples,
            interval,
            compact,
        } => commands::pipe::run(&ctx, samples, interval, compact),
        Commands::Debug => commands::debug::run(&ctx),
        Commands::Config { path, reset, edit } => commands::config::run(path, reset, edit),
        Commands::Logs { lines, follow } => commands::logs::run(lines, follow),
        Commands::Daemon { .. } => Ok(()),
    }
}
