use anyhow::Result;
use clap::{Parser, Subcommand};

mod command_analyze;
mod command_count;
mod command_settings;

use command_analyze::{command_analyze, AnalyzeArgs};
use command_count::command_count;
use command_settings::command_settings;

/// Structure of network glasses from MD trajectories
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cmd {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runs the analysis over an extended XYZ trajectory
    Analyze(AnalyzeArgs),

    /// Counts configurations in the trajectory
    Count {
        /// Extended XYZ trajectory
        #[arg(short, required = true)]
        file: String,
    },

    /// Prints the settings of a preset as TOML, a starting point for a settings file
    Settings {
        /// Preset name: SiO2 or Na2SiO3
        #[arg(short, long, default_value = "SiO2")]
        preset: String,
    },
}

fn main() -> Result<()> {
    env_logger::builder()
        .format_timestamp(None)
        .format_indent(Some(8))
        .filter_level(log::LevelFilter::Info)
        .init();

    let cmd = Cmd::parse();

    match &cmd.command {
        Commands::Analyze(args) => {
            molar_glass::greeting("analyze");
            command_analyze(args)?;
        }
        Commands::Count { file } => {
            command_count(file)?;
        }
        // No greeting, the output is meant to be redirected to a file
        Commands::Settings { preset } => {
            command_settings(preset)?;
        }
    }
    Ok(())
}
