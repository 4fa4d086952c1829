use anyhow::{Context, Result};
use tracing::info;

use pbp_features::config::PipelineConfig;
use pbp_features::logging::init_logging;
use pbp_features::{feature_store, pbp_dataset, persist, pipeline, sequencer};

fn main() -> Result<()> {
    init_logging();
    let config = PipelineConfig::load()?;

    let input = config
        .input
        .clone()
        .or_else(pbp_dataset::default_input_path)
        .context("no play log given (use --input or PBP_INPUT)")?;

    let mut plays = pbp_dataset::read_play_log(&input, config.seasons.as_deref())
        .with_context(|| format!("load play log {}", input.display()))?;
    if config.sort {
        sequencer::sort_chronologically(&mut plays);
        info!("sorted play log chronologically");
    }

    let external = match config.tendencies_in.as_deref() {
        Some(path) => {
            let artifact = persist::load_tendencies(path)?;
            info!(
                path = %path.display(),
                seasons = ?artifact.seasons,
                generated_at = artifact.generated_at.as_str(),
                "loaded tendency artifact"
            );
            Some(artifact.tendencies)
        }
        None => None,
    };

    let output = pipeline::run(&plays, external, &config.pipeline_options())?;

    if let Some(path) = config.tendencies_out.as_deref() {
        persist::save_tendencies(path, &output.tendencies)?;
        info!(path = %path.display(), "wrote tendency artifact");
    }

    let db_path = config.db.clone().or_else(feature_store::default_db_path);
    let mut rows_written = 0usize;
    if let Some(db_path) = db_path.as_deref() {
        let mut conn = feature_store::open_db(db_path)?;
        rows_written = feature_store::write_feature_table(&mut conn, &output.table)?;
        feature_store::write_tendencies(&mut conn, &output.tendencies)?;
        feature_store::record_run(&conn, rows_written, &output.digest, &output.warnings)?;
    }

    let summary = output.warning_summary();
    println!("Feature derivation complete");
    println!("Input: {}", input.display());
    println!("Games: {}", output.games);
    println!("Plays: {}", output.table.len());
    println!("Columns: {}", output.table.schema().len());
    match db_path {
        Some(path) => println!("DB: {} ({} rows)", path.display(), rows_written),
        None => println!("DB: n/a"),
    }
    println!("Digest: {}", output.digest);
    if !summary.degenerate.is_empty() {
        println!("Degenerate aggregates:");
        for (statistic, count) in &summary.degenerate {
            println!("   - {statistic}: {count}");
        }
    }
    if !summary.clamped.is_empty() {
        println!("Clamped inputs:");
        for (column, count) in &summary.clamped {
            println!("   - {column}: {count}");
        }
    }

    Ok(())
}
