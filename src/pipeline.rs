//! End-to-end derivation: play log in, feature table plus run report out.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{FeatureError, FeatureWarning};
use crate::features::{FeatureRow, FeatureTable, RowSources};
use crate::game_state::GameStateFeatures;
use crate::interactions::SituationalFeatures;
use crate::play::PlayRecord;
use crate::sequencer;
use crate::tendency::{self, TeamTendencies};
use crate::weather::WeatherTable;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub include_weather: bool,
    /// Worker threads for per-game derivation. `None` uses the global pool,
    /// `Some(1)` runs serially.
    pub threads: Option<usize>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            include_weather: true,
            threads: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub table: FeatureTable,
    pub tendencies: TeamTendencies,
    pub warnings: Vec<FeatureWarning>,
    pub digest: String,
    pub games: usize,
}

/// Count of warnings per column, for the run report.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WarningSummary {
    pub degenerate: BTreeMap<String, usize>,
    pub clamped: BTreeMap<String, usize>,
}

impl PipelineOutput {
    pub fn warning_summary(&self) -> WarningSummary {
        summarize_warnings(&self.warnings)
    }
}

pub fn summarize_warnings(warnings: &[FeatureWarning]) -> WarningSummary {
    let mut summary = WarningSummary::default();
    for w in warnings {
        let bucket = match w {
            FeatureWarning::DegenerateAggregate { .. } => &mut summary.degenerate,
            FeatureWarning::OutOfRangeInput { .. } => &mut summary.clamped,
        };
        *bucket.entry(w.column().to_string()).or_insert(0) += 1;
    }
    summary
}

/// Derives feature rows for one game. Plays must already be in order.
pub fn derive_game(
    game: &[PlayRecord],
    tendencies: &TeamTendencies,
    weather: &WeatherTable,
) -> (Vec<FeatureRow>, Vec<FeatureWarning>) {
    let mut warnings = Vec::new();
    let sequenced = sequencer::sequence_game(game);

    let rows = game
        .iter()
        .zip(&sequenced)
        .map(|(play, seq)| {
            let game_state = GameStateFeatures::derive(play, seq, &mut warnings);
            let inputs = tendencies.inputs_for(play);
            let situational = SituationalFeatures::build(
                &inputs,
                play.in_red_zone(),
                game_state.possdiff_per_minute,
            );
            let game_weather = weather.get(&play.game_id);
            let values = RowSources {
                sequenced: seq,
                game_state: &game_state,
                tendencies: &inputs,
                situational: &situational,
                weather: &game_weather,
            }
            .values();
            FeatureRow {
                game_id: play.game_id.clone(),
                play_id: play.play_id,
                season: play.season,
                values,
            }
        })
        .collect();

    if let Some(first) = game.first() {
        debug!(
            game_id = first.game_id.as_str(),
            plays = game.len(),
            clamped = warnings.len(),
            "derived game"
        );
    }
    (rows, warnings)
}

fn build_pool(threads: Option<usize>) -> Option<rayon::ThreadPool> {
    let threads = threads?;
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .ok()
}

fn with_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}

/// Runs the full derivation over a chronologically ordered play log.
///
/// Tendencies are computed from `plays` unless `tendencies` supplies tables
/// built elsewhere (e.g. a prior season range loaded from disk).
pub fn run(
    plays: &[PlayRecord],
    tendencies: Option<TeamTendencies>,
    options: &PipelineOptions,
) -> Result<PipelineOutput, FeatureError> {
    let games = sequencer::split_games(plays)?;
    info!(plays = plays.len(), games = games.len(), "validated play order");

    let mut warnings = Vec::new();
    let tendencies = match tendencies {
        Some(t) => t,
        None => {
            let (t, tendency_warnings) = tendency::compute_tendencies(plays);
            warnings.extend(tendency_warnings);
            t
        }
    };

    let weather = if options.include_weather {
        let table = WeatherTable::build(plays, &mut warnings);
        info!(games_with_weather = table.len(), "built weather table");
        table
    } else {
        WeatherTable::default()
    };

    let pool = build_pool(options.threads);
    let per_game: Vec<(Vec<FeatureRow>, Vec<FeatureWarning>)> = with_pool(&pool, || {
        if options.threads == Some(1) {
            games
                .iter()
                .map(|game| derive_game(game, &tendencies, &weather))
                .collect()
        } else {
            games
                .par_iter()
                .map(|game| derive_game(game, &tendencies, &weather))
                .collect()
        }
    });

    let mut rows = Vec::with_capacity(plays.len());
    for (game_rows, game_warnings) in per_game {
        rows.extend(game_rows);
        warnings.extend(game_warnings);
    }

    let table = FeatureTable::from_rows(rows);
    let digest = table.digest();

    let summary = summarize_warnings(&warnings);
    for (column, count) in &summary.clamped {
        warn!(column = column.as_str(), count, "clamped out-of-range inputs");
    }
    info!(
        rows = table.len(),
        columns = table.schema().len(),
        warnings = warnings.len(),
        digest = digest.as_str(),
        "feature table complete"
    );

    Ok(PipelineOutput {
        table,
        tendencies,
        warnings,
        digest,
        games: games.len(),
    })
}
