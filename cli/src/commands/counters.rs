use color_eyre::eyre::Result;

use battinfo_core::CounterSnapshot;

use super::{Backend, Context};
use crate::data::counters_from_wire;

const PREFIX: &str = "battery";

pub fn run(ctx: &Context, name: Option<&str>) -> Result<()> {
    let mut backend = Backend::open(ctx)?;
    let counters = counters_from_wire(&backend.counters()?);
    match name {
        Some(name) => {
            let name = name
                .strip_prefix(PREFIX)
                .and_then(|rest| rest.strip_prefix('.'))
                .unwrap_or(name);
            println!("{}", counters.value(name)?);
        }
        None => print!("{}", render(&counters)),
    }
    Ok(())
}

fn render(counters: &CounterSnapshot) -> String {
    CounterSnapshot::NAMES
        .iter()
        .filter_map(|name| {
            let value = counters.value(name).ok()?;
            Some(format!("{}.{}: {}\n", PREFIX, name, value))
        })
        .collect()
}
