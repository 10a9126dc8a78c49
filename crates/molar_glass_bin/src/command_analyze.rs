use anyhow::{Context, Result};
use clap::Args;
use log::info;
use molar_glass::prelude::*;

#[derive(Args)]
pub(super) struct AnalyzeArgs {
    /// Extended XYZ trajectory
    #[arg(short, required = true)]
    file: String,

    /// Settings file in TOML format
    #[arg(short, long, conflicts_with = "preset")]
    settings: Option<String>,

    /// Built-in settings: SiO2 or Na2SiO3
    #[arg(short, long, default_value = "SiO2")]
    preset: String,

    /// First configuration
    #[arg(short, long, default_value_t = 0)]
    begin: usize,

    /// Last configuration (exclusive), the end of the trajectory if not set
    #[arg(short, long)]
    end: Option<usize>,

    /// Take every n-th configuration
    #[arg(long, default_value_t = 1)]
    skip: usize,

    /// Number of configurations analyzed in parallel
    #[arg(long, default_value_t = 16)]
    batch: usize,

    /// Report progress every n configurations, 0 to disable
    #[arg(long, default_value_t = 100)]
    log: usize,

    /// Output directory
    #[arg(short, long, default_value = "results")]
    out: String,
}

pub(super) fn command_analyze(args: &AnalyzeArgs) -> Result<()> {
    let settings = match &args.settings {
        Some(fname) => {
            info!("Loading settings from '{fname}'");
            Settings::from_file(fname).with_context(|| format!("loading settings from '{fname}'"))?
        }
        None => {
            info!("Using preset '{}'", args.preset);
            Settings::preset(&args.preset)?
        }
    };

    let analyzer = TrajectoryAnalyzer::new(settings)?.with_log_every(args.log);

    info!("Reading trajectory '{}'", args.file);
    let frames = XyzFileHandler::open(&args.file)?.into_window(args.begin, args.end, args.skip);
    let res = analyzer
        .run(frames, args.batch)
        .with_context(|| format!("analyzing '{}'", args.file))?;

    info!("Writing results to '{}'", args.out);
    ResultsWriter::new(&args.out)?.write_all(&res)?;

    summary(&res);
    Ok(())
}

fn summary(res: &TrajectoryResults) {
    use comfy_table::modifiers::UTF8_ROUND_CORNERS;
    use comfy_table::presets::UTF8_FULL;
    use comfy_table::Table;

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Value", "Mean", "Std"]);

    table.add_row(vec![
        "configurations".to_string(),
        res.n_frames().to_string(),
        String::new(),
    ]);
    table.add_row(vec![
        "warnings".to_string(),
        res.warnings.len().to_string(),
        String::new(),
    ]);

    for (name, ms) in &res.averages {
        let (mean, std) = ms.compute_or_zero();
        table.add_row(vec![name.clone(), format!("{mean:.4}"), format!("{std:.4}")]);
    }
    for c in &res.pair_curves {
        let (mean, std) = c.bond_length;
        table.add_row(vec![
            format!("d({})", c.pair),
            format!("{mean:.4}"),
            format!("{std:.4}"),
        ]);
    }
    for c in &res.angle_curves {
        let (mean, std) = c.angle;
        table.add_row(vec![
            format!("angle({})", c.triplet),
            format!("{mean:.2}"),
            format!("{std:.2}"),
        ]);
    }
    println!("{table}");
}
