use color_eyre::eyre::Result;

use battinfo_protocol::{BatteryInfoSnapshot, UnitSelector};

use super::{or_unknown, Backend, Context};

pub fn run(ctx: &Context, unit: Option<u32>, json: bool) -> Result<()> {
    let selector = unit.map_or(UnitSelector::All, UnitSelector::Unit);
    let mut backend = Backend::open(ctx)?;
    let info = backend.battery_info(selector)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print!("{}", render(selector, &info));
    }
    Ok(())
}

fn render(selector: UnitSelector, info: &BatteryInfoSnapshot) -> String {
    let title = match selector {
        UnitSelector::All => "all units".to_string(),
        UnitSelector::Unit(unit) => format!("unit {}", unit),
    };

    let capacity = if info.cap < 0 {
        "unknown".to_string()
    } else {
        format!("{}%", info.cap)
    };
    let remaining = match &info.time_remaining_formatted {
        Some(formatted) => format!("{} ({} min)", formatted, info.min),
        None => or_unknown(info.min),
    };

    format!(
        "Battery ({}): {}\n  Capacity:  {}\n  Remaining: {}\n  Rate:      {}\n  State:     0x{:x}\n",
        title,
        info.state_label,
        capacity,
        remaining,
        or_unknown(info.rate),
        info.state
    )
}
