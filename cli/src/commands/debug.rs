use color_eyre::eyre::Result;

use battinfo_platform::BatteryState;

use super::Context;
use crate::config::{self, config_path};
use crate::daemon::{is_daemon_running, socket_path};
use crate::data::{open_source, BatteryData};

pub fn run(ctx: &Context) -> Result<()> {
    println!("battinfo debug information");
    println!("{}", "=".repeat(60));

    println!("\n--- Source ---");
    println!("Configured: {}", ctx.config.source.label());
    if let Some(fixture) = &ctx.source.fixture {
        println!("Fixture: {}", fixture.display());
    }
    println!("Sysfs root: {}", ctx.source.sysfs_root.display());

    let data = BatteryData::new(open_source(&ctx.source)?, ctx.config.aggregator_config());
    println!("Active: {}", data.source_name());
    println!("Info expire: {}s", data.info_expire_secs());

    println!("\n--- Devices ---");
    match data.devices() {
        Ok(devices) if devices.is_empty() => println!("No batteries found"),
        Ok(devices) => {
            for (unit, device) in devices.iter().enumerate() {
                println!("[{}] {}", unit, device);
                let (status, info) = data.raw_device(device);
                match status {
                    Ok(status) => {
                        let (state, rate, cap, volt) = status.to_firmware();
                        println!(
                            "    status: state=0x{:x} ({}) rate={} cap={} volt={} -> {}",
                            state,
                            BatteryState::from_bits_retain(state).label(),
                            rate,
                            cap,
                            volt,
                            verdict(status.is_valid())
                        );
                    }
                    Err(e) => println!("    status: error: {}", e),
                }
                match info {
                    Ok(info) => {
                        println!(
                            "    info:   lfcap={}{} dcap={:?} chemistry={} -> {}",
                            info.last_full_capacity,
                            info.units.capacity_suffix(),
                            info.design_capacity,
                            info.chemistry,
                            verdict(info.is_valid())
                        );
                        if let Some(health) = info.health_percent() {
                            println!("    health: {:.1}%", health);
                        }
                    }
                    Err(e) => println!("    info:   error: {}", e),
                }
            }
        }
        Err(e) => println!("Enumeration failed: {}", e),
    }

    println!("\n--- Aggregate ---");
    match data.battery_info(battinfo_protocol::UnitSelector::All) {
        Ok(info) => println!("{}", serde_json::to_string_pretty(&info)?),
        Err(e) => println!("error: {}", e),
    }

    println!("\n--- Daemon ---");
    println!("Socket: {}", socket_path().display());
    println!("Running: {}", if is_daemon_running() { "yes" } else { "no" });

    println!("\n--- Config Paths ---");
    println!("Config: {}", config_path().display());
    println!("Runtime: {}", config::runtime_dir().display());

    println!("\n--- Current Config ---");
    println!("{}", toml::to_string_pretty(&ctx.config)?);

    Ok(())
}

fn verdict(valid: bool) -> &'static str {
    if valid {
        "valid"
    } else {
        "invalid"
    }
}
