use serde::Serialize;
use thiserror::Error;

/// Fatal failures. Any of these aborts the run for the season range.
#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("missing required column `{column}`")]
    MissingColumn { column: String },

    #[error("play log out of order at game {game_id} play {play_id}: {detail}")]
    UnsortedSequence {
        game_id: String,
        play_id: i64,
        detail: String,
    },

    #[error("invalid value in `{column}` at game {game_id} play {play_id}: {detail}")]
    InvalidValue {
        game_id: String,
        play_id: i64,
        column: String,
        detail: String,
    },

    #[error("unknown feature column `{name}`")]
    UnknownFeature { name: String },

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl FeatureError {
    pub fn missing_column(column: &str) -> Self {
        Self::MissingColumn {
            column: column.to_string(),
        }
    }
}

/// Non-fatal conditions collected into the run report.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum FeatureWarning {
    #[error("{statistic} for season {season} has zero variance across {groups} teams")]
    DegenerateAggregate {
        statistic: String,
        season: i32,
        groups: usize,
    },

    #[error("`{column}` = {value} at game {game_id} play {play_id} clamped to {clamped_to}")]
    OutOfRangeInput {
        game_id: String,
        play_id: i64,
        column: String,
        value: f64,
        clamped_to: f64,
    },
}

impl FeatureWarning {
    pub fn column(&self) -> &str {
        match self {
            Self::DegenerateAggregate { statistic, .. } => statistic,
            Self::OutOfRangeInput { column, .. } => column,
        }
    }
}
