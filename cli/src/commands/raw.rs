use color_eyre::eyre::Result;

use battinfo_protocol::{RawInfoSnapshot, RawStatusSnapshot, UNKNOWN_VALUE};

use super::{Backend, Context};

pub fn run_info(ctx: &Context, unit: u32, json: bool) -> Result<()> {
    let mut backend = Backend::open(ctx)?;
    let info = backend.raw_info(unit)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        print!("{}", render_info(&info));
    }
    Ok(())
}

pub fn run_status(ctx: &Context, unit: u32, json: bool) -> Result<()> {
    let mut backend = Backend::open(ctx)?;
    let status = backend.raw_status(unit)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        print!("{}", render_status(&status));
    }
    Ok(())
}

fn word(value: u32) -> String {
    if value == UNKNOWN_VALUE {
        format!("unknown (0x{:x})", value)
    } else {
        value.to_string()
    }
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map_or_else(|| "unknown".to_string(), ToString::to_string)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

pub(crate) fn render_status(status: &RawStatusSnapshot) -> String {
    format!(
        "{}\n  state: 0x{:x}\n  rate:  {}\n  cap:   {}\n  volt:  {}\n  valid: {}\n",
        status.device,
        status.state,
        word(status.rate),
        word(status.cap),
        word(status.volt),
        yes_no(status.valid)
    )
}

pub(crate) fn render_info(info: &RawInfoSnapshot) -> String {
    let mut out = format!("{}\n", info.device);
    let rows = [
        ("units", info.units.clone()),
        ("dcap", opt(&info.dcap)),
        ("lfcap", info.lfcap.to_string()),
        ("technology", info.technology.clone()),
        ("dvol", opt(&info.dvol)),
        ("wcap", opt(&info.wcap)),
        ("lcap", opt(&info.lcap)),
        ("model", opt(&info.model)),
        ("serial", opt(&info.serial)),
        ("chemistry", info.chemistry.clone()),
        ("oeminfo", opt(&info.oeminfo)),
        ("valid", yes_no(info.valid).to_string()),
    ];
    for (name, value) in rows {
        out.push_str(&format!("  {:<11}{}\n", format!("{}:", name), value));
    }
    out
}
