use std::path::PathBuf;

use anyhow::{Context, Result};

use pbp_features::config::PipelineConfig;
use pbp_features::logging::init_logging;
use pbp_features::{pbp_dataset, persist, tendency};

const DEFAULT_OUTPUT: &str = "team_tendencies.json";

fn main() -> Result<()> {
    init_logging();
    let config = PipelineConfig::load()?;

    let input = config
        .input
        .clone()
        .or_else(pbp_dataset::default_input_path)
        .context("no play log given (use --input or PBP_INPUT)")?;
    let output = config
        .tendencies_out
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));

    let plays = pbp_dataset::read_play_log(&input, config.seasons.as_deref())?;
    let (tendencies, warnings) = tendency::compute_tendencies(&plays);
    persist::save_tendencies(&output, &tendencies)?;

    println!("Team tendencies written");
    println!("Output: {}", output.display());
    println!("Plays: {}", plays.len());
    for table in tendencies.tables() {
        println!(
            "{}: {} team-seasons, seasons {:?}",
            table.statistic(),
            table.len(),
            table.seasons()
        );
    }
    if !warnings.is_empty() {
        println!("warnings: {}", warnings.len());
        for w in warnings.iter().take(6) {
            println!("   - {w}");
        }
    }

    Ok(())
}
