//! Reads an nflverse-style play-by-play parquet file into [`PlayRecord`]s.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parquet::file::reader::{FileReader, SerializedFileReader};
use parquet::record::{Row, RowAccessor};
use parquet::schema::types::Type;
use tracing::info;

use crate::error::FeatureError;
use crate::play::{Location, PlayRecord, PlayType};

pub const REQUIRED_COLUMNS: [&str; 29] = [
    "game_id",
    "play_id",
    "season",
    "qtr",
    "drive",
    "posteam",
    "defteam",
    "home_team",
    "location",
    "posteam_score",
    "defteam_score",
    "down",
    "ydstogo",
    "yardline_100",
    "goal_to_go",
    "quarter_seconds_remaining",
    "half_seconds_remaining",
    "game_seconds_remaining",
    "play_type",
    "complete_pass",
    "penalty",
    "fumble_lost",
    "qb_spike",
    "touchdown",
    "out_of_bounds",
    "posteam_timeouts_remaining",
    "defteam_timeouts_remaining",
    "pass_oe",
    "penalty_team",
];

pub const OPTIONAL_COLUMNS: [&str; 5] = ["qb_scramble", "timeout", "timeout_team", "weather", "roof"];

pub fn default_input_path() -> Option<PathBuf> {
    std::env::var("PBP_INPUT")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
}

/// Maps column names to positions in the projected row.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    /// Positions in the file schema, ascending.
    file_positions: Vec<usize>,
    projected: HashMap<&'static str, usize>,
}

impl ColumnIndex {
    /// Fails with `MissingColumn` on the first required column not in `names`.
    pub fn resolve(names: &[String]) -> Result<Self, FeatureError> {
        let position = |col: &str| names.iter().position(|n| n == col);

        let mut found: Vec<(usize, &'static str)> = Vec::new();
        for col in REQUIRED_COLUMNS {
            let pos = position(col).ok_or_else(|| FeatureError::missing_column(col))?;
            found.push((pos, col));
        }
        for col in OPTIONAL_COLUMNS {
            if let Some(pos) = position(col) {
                found.push((pos, col));
            }
        }
        found.sort_unstable();

        let file_positions = found.iter().map(|(pos, _)| *pos).collect();
        let projected = found
            .iter()
            .enumerate()
            .map(|(idx, (_, col))| (*col, idx))
            .collect();
        Ok(Self {
            file_positions,
            projected,
        })
    }

    pub fn get(&self, column: &str) -> Option<usize> {
        self.projected.get(column).copied()
    }

    pub fn has(&self, column: &str) -> bool {
        self.projected.contains_key(column)
    }

    pub fn file_positions(&self) -> &[usize] {
        &self.file_positions
    }
}

fn read_num(row: &Row, idx: usize) -> Option<f64> {
    if let Ok(v) = row.get_double(idx) {
        return Some(v);
    }
    if let Ok(v) = row.get_long(idx) {
        return Some(v as f64);
    }
    if let Ok(v) = row.get_int(idx) {
        return Some(f64::from(v));
    }
    if let Ok(v) = row.get_float(idx) {
        return Some(f64::from(v));
    }
    if let Ok(v) = row.get_bool(idx) {
        return Some(if v { 1.0 } else { 0.0 });
    }
    None
}

fn read_str(row: &Row, idx: usize) -> Option<String> {
    row.get_string(idx)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

struct RowReader<'a> {
    row: &'a Row,
    index: &'a ColumnIndex,
    game_id: String,
    play_id: i64,
}

impl RowReader<'_> {
    fn num(&self, column: &str) -> Option<f64> {
        self.index
            .get(column)
            .and_then(|idx| read_num(self.row, idx))
            .filter(|v| !v.is_nan())
    }

    fn text(&self, column: &str) -> Option<String> {
        self.index.get(column).and_then(|idx| read_str(self.row, idx))
    }

    /// `== 1` semantics: null and NaN read as false.
    fn flag(&self, column: &str) -> bool {
        self.num(column) == Some(1.0)
    }

    fn invalid(&self, column: &str, detail: &str) -> FeatureError {
        FeatureError::InvalidValue {
            game_id: self.game_id.clone(),
            play_id: self.play_id,
            column: column.to_string(),
            detail: detail.to_string(),
        }
    }

    fn required_num(&self, column: &str) -> Result<f64, FeatureError> {
        self.num(column).ok_or_else(|| self.invalid(column, "null"))
    }

    fn small(&self, column: &str) -> Option<u8> {
        self.num(column)
            .filter(|v| *v >= 0.0 && *v <= f64::from(u8::MAX))
            .map(|v| v as u8)
    }
}

fn play_from_row(row: &Row, index: &ColumnIndex) -> Result<PlayRecord, FeatureError> {
    let mut reader = RowReader {
        row,
        index,
        game_id: String::new(),
        play_id: 0,
    };
    reader.game_id = reader
        .text("game_id")
        .ok_or_else(|| reader.invalid("game_id", "null"))?;
    reader.play_id = reader.required_num("play_id")? as i64;

    let season = reader.required_num("season")? as i32;
    let qtr = reader.required_num("qtr")?;
    if !(1.0..=f64::from(u8::MAX)).contains(&qtr) {
        return Err(reader.invalid("qtr", &format!("quarter {qtr} out of range")));
    }

    Ok(PlayRecord {
        game_id: reader.game_id.clone(),
        play_id: reader.play_id,
        season,
        qtr: qtr as u8,
        drive: reader.num("drive").map(|v| v as i64),
        posteam: reader.text("posteam"),
        defteam: reader.text("defteam"),
        home_team: reader.text("home_team").unwrap_or_default(),
        location: Location::parse(reader.text("location").as_deref()),
        posteam_score: reader.num("posteam_score").map(|v| v as i32),
        defteam_score: reader.num("defteam_score").map(|v| v as i32),
        down: reader.small("down"),
        ydstogo: reader.num("ydstogo"),
        yardline_100: reader.num("yardline_100"),
        goal_to_go: reader.flag("goal_to_go"),
        quarter_seconds_remaining: reader.required_num("quarter_seconds_remaining")?,
        half_seconds_remaining: reader.required_num("half_seconds_remaining")?,
        game_seconds_remaining: reader.required_num("game_seconds_remaining")?,
        play_type: PlayType::parse(reader.text("play_type").as_deref()),
        complete_pass: reader.flag("complete_pass"),
        penalty: reader.flag("penalty"),
        fumble_lost: reader.flag("fumble_lost"),
        qb_spike: reader.flag("qb_spike"),
        touchdown: reader.flag("touchdown"),
        out_of_bounds: reader.flag("out_of_bounds"),
        qb_scramble: reader.flag("qb_scramble"),
        posteam_timeouts_remaining: reader.small("posteam_timeouts_remaining"),
        defteam_timeouts_remaining: reader.small("defteam_timeouts_remaining"),
        pass_oe: reader.num("pass_oe"),
        penalty_team: reader.text("penalty_team"),
        timeout: reader.flag("timeout"),
        timeout_team: reader.text("timeout_team"),
        weather: reader.text("weather"),
        roof: reader.text("roof"),
    })
}

/// Reads the play log, keeping only `seasons` when given. Rows keep file order.
pub fn read_play_log(path: &Path, seasons: Option<&[i32]>) -> Result<Vec<PlayRecord>, FeatureError> {
    let file = fs::File::open(path)?;
    let reader = SerializedFileReader::new(file)?;

    let root = reader.metadata().file_metadata().schema_descr().root_schema();
    let fields = root.get_fields();
    let names: Vec<String> = fields.iter().map(|f| f.name().to_string()).collect();
    let index = ColumnIndex::resolve(&names)?;

    let projected_fields: Vec<Arc<Type>> = index
        .file_positions()
        .iter()
        .map(|&pos| Arc::clone(&fields[pos]))
        .collect();
    let projection = Type::group_type_builder(root.name())
        .with_fields(projected_fields)
        .build()?;

    let mut out = Vec::new();
    for row in reader.get_row_iter(Some(projection))? {
        let play = play_from_row(&row?, &index)?;
        if seasons.is_some_and(|s| !s.contains(&play.season)) {
            continue;
        }
        out.push(play);
    }

    info!(
        path = %path.display(),
        plays = out.len(),
        optional_columns = OPTIONAL_COLUMNS.iter().filter(|c| index.has(c)).count(),
        "loaded play log"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(extra: &[&str]) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .chain(extra)
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn resolve_reports_first_missing_column() {
        let cols: Vec<String> = names(&[])
            .into_iter()
            .filter(|c| c != "pass_oe")
            .collect();
        assert!(matches!(
            ColumnIndex::resolve(&cols),
            Err(FeatureError::MissingColumn { column }) if column == "pass_oe"
        ));
    }

    #[test]
    fn resolve_projects_in_file_order() {
        let mut cols = vec!["old_game_id".to_string(), "weather".to_string()];
        cols.extend(names(&[]));
        let index = ColumnIndex::resolve(&cols).unwrap();
        assert_eq!(index.get("weather"), Some(0));
        assert_eq!(index.get("game_id"), Some(1));
        assert!(!index.has("roof"));
        assert_eq!(index.file_positions()[0], 1);
    }
}
