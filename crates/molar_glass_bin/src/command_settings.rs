use anyhow::Result;
use molar_glass::prelude::*;

pub(super) fn command_settings(preset: &str) -> Result<()> {
    let settings = Settings::preset(preset)?;
    print!("{}", toml::to_string_pretty(&settings)?);
    Ok(())
}
