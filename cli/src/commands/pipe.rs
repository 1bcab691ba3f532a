use std::time::Duration;

use color_eyre::eyre::Result;
use serde_json::{json, Value};

use battinfo_protocol::{BatteryInfoSnapshot, UnitSelector};

use super::{Backend, Context};

pub fn run(ctx: &Context, samples: u32, interval: u64, compact: bool) -> Result<()> {
    let mut backend = Backend::open(ctx)?;

    if let Backend::Remote(client) = &mut backend {
        client.subscribe()?;
    }

    let mut counter = 0u32;
    loop {
        let (timestamp, info) = match &mut backend {
            Backend::Local(data) => (chrono::Utc::now(), data.battery_info(UnitSelector::All)?),
            Backend::Remote(client) => {
                let update = client.read_update()?;
                let timestamp = chrono::DateTime::from_timestamp(update.timestamp, 0)
                    .unwrap_or_else(chrono::Utc::now);
                (timestamp, update.info)
            }
        };

        let doc = sample(timestamp, &info);
        if compact {
            println!("{}", serde_json::to_string(&doc)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&doc)?);
        }

        counter += 1;
        if samples > 0 && counter >= samples {
            break;
        }

        // Remote samples are paced by the daemon.
        if matches!(backend, Backend::Local(_)) {
            std::thread::sleep(Duration::from_millis(interval));
        }
    }

    if let Backend::Remote(client) = &mut backend {
        client.unsubscribe()?;
    }

    Ok(())
}

fn sample(timestamp: chrono::DateTime<chrono::Utc>, info: &BatteryInfoSnapshot) -> Value {
    json!({
        "timestamp": timestamp.to_rfc3339(),
        "battery": {
            "life": info.cap,
            "time": info.min,
            "state": info.state,
            "state_label": info.state_label,
            "rate": info.rate,
            "time_remaining": info.time_remaining_formatted,
        },
    })
}
