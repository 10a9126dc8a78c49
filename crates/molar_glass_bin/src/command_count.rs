use anyhow::{Context, Result};
use log::info;
use molar_glass::prelude::*;

pub(super) fn command_count(file: &str) -> Result<()> {
    let n = XyzFileHandler::count(file)
        .with_context(|| format!("counting configurations in '{file}'"))?;
    info!("{n} configurations in '{file}'");
    println!("{n}");
    Ok(())
}
