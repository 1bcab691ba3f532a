use color_eyre::eyre::Result;

use super::{Backend, Context};

pub fn run(ctx: &Context) -> Result<()> {
    let mut backend = Backend::open(ctx)?;
    println!("{}", backend.units()?);
    Ok(())
}
