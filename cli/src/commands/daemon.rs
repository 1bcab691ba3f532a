use std::time::Duration;

use color_eyre::eyre::{eyre, Result};

use super::Context;
use crate::cli::DaemonCommands;
use crate::config::LogLevel;
use crate::daemon::{daemon_pid, is_daemon_running, run_daemon, socket_path, DaemonClient};
use crate::logging::{self, LogMode};

pub fn run(
    command: DaemonCommands,
    ctx: Context,
    log_level_override: Option<LogLevel>,
) -> Result<()> {
    let log_level = ctx.config.log_level;

    match command {
        DaemonCommands::Start { foreground } => {
            if is_daemon_running() {
                println!("Daemon is already running.");
                return Ok(());
            }

            if foreground {
                let _guard = logging::init(log_level, LogMode::Both, log_level_override);
                println!("Starting daemon in foreground...");
                println!("Press Ctrl+C to stop.");
                run_daemon(true, log_level, log_level_override, ctx.config, ctx.source)
                    .map_err(|e| eyre!("{}", e))?;
            } else {
                println!("Starting daemon...");
                run_daemon(false, log_level, log_level_override, ctx.config, ctx.source)
                    .map_err(|e| eyre!("{}", e))?;
                std::thread::sleep(Duration::from_millis(500));

                let mut started = false;
                for _ in 0..3 {
                    if is_daemon_running() {
                        started = true;
                        break;
                    }
                    std::thread::sleep(Duration::from_millis(200));
                }

                if started {
                    println!("Daemon started successfully.");
                    println!("Socket: {:?}", socket_path());
                } else {
                    println!("Daemon may have failed to start. Check logs:");
                    println!("  battinfo logs");
                }
            }
        }
        DaemonCommands::Stop => {
            if !is_daemon_running() {
                println!("Daemon is not running.");
                return Ok(());
            }

            let mut client =
                DaemonClient::connect().map_err(|e| eyre!("Failed to connect to daemon: {}", e))?;
            client.shutdown().map_err(|e| eyre!("{}", e))?;
            println!("Daemon stopped.");
        }
        DaemonCommands::Status => {
            println!("Daemon Status");
            println!("{}", "-".repeat(40));

            if !is_daemon_running() {
                println!("Running:      no");
                if let Some(pid) = daemon_pid() {
                    println!("Stale PID:    {} (process alive, socket unresponsive)", pid);
                }
                return Ok(());
            }

            let mut client =
                DaemonClient::connect().map_err(|e| eyre!("Failed to connect to daemon: {}", e))?;
            let status = client.get_status().map_err(|e| eyre!("{}", e))?;
            let uptime = humantime::format_duration(Duration::from_secs(status.uptime_secs));

            println!("Running:      yes");
            if let Some(pid) = daemon_pid() {
                println!("PID:          {}", pid);
            }
            println!("Version:      {}", status.version);
            println!(
                "Protocol:     v{} (supports v{}+)",
                status.protocol_version, status.min_supported_version
            );
            println!("Uptime:       {}", uptime);
            println!("Source:       {}", status.source);
            println!("Units:        {}", status.units);
            println!("Subscribers:  {}", status.subscriber_count);
            println!("Info expire:  {}s", status.info_expire_secs);
            if let Some(age) = status.cache_age_ms {
                println!("Cache age:    {}ms", age);
            }
            println!("Socket:       {}", socket_path().display());
        }
    }

    Ok(())
}
