//! The assembled feature table: one row of named f64 columns per play, plus
//! the named column subsets downstream models select by.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::clock::ClockTransition;
use crate::error::FeatureError;
use crate::game_state::GameStateFeatures;
use crate::interactions::{SituationalFeatures, TendencyInputs};
use crate::sequencer::SequencedPlay;
use crate::weather::WeatherFeatures;

/// Anything that contributes named numeric columns to a feature row.
///
/// Implementors visit their columns in a fixed order; the same order is used
/// to build the schema and to fill each row.
pub trait FeatureSource {
    fn visit_columns(&self, visit: &mut dyn FnMut(&str, f64));
}

pub const COMMON_TIMEOUT_FEATURES: [&str; 13] = [
    "clock_running",
    "inv_half_minutes",
    "log_inv_half_minutes",
    "inv_game_minutes",
    "log_inv_game_minutes",
    "possession_diff",
    "fg_possession_diff",
    "possdiff_per_minute",
    "fgpossdiff_per_minute",
    "clock_runs_pdpm",
    "clock_runs_fgpdpm",
    "clock_runs_pdpm2",
    "clock_runs_fgpdpm2",
];

pub const ONLY_OFF_TIMEOUT_FEATURES: [&str; 8] = [
    "off_timeouts_remaining_0",
    "off_timeouts_remaining_1",
    "off_timeouts_remaining_2",
    "off_timeouts_remaining_3",
    "clock_runs_pdpm_off0to",
    "clock_runs_pdpm_off1to",
    "clock_runs_pdpm_off2to",
    "clock_runs_pdpm_off3to",
];

pub const ONLY_DEF_TIMEOUT_FEATURES: [&str; 8] = [
    "def_timeouts_remaining_0",
    "def_timeouts_remaining_1",
    "def_timeouts_remaining_2",
    "def_timeouts_remaining_3",
    "clock_runs_pdpm_def0to",
    "clock_runs_pdpm_def1to",
    "clock_runs_pdpm_def2to",
    "clock_runs_pdpm_def3to",
];

pub const STATE_FEATURES: [&str; 53] = [
    "is_offense_home",
    "offense_log_pass_prob",
    "defense_log_pass_prob",
    "off_def_lpp",
    "off_lpp_rz",
    "def_lpp_rz",
    "off_def_lpp_rz",
    "off_lpp_outside_rz",
    "off_lpp_inside_rz",
    "def_lpp_outside_rz",
    "def_lpp_inside_rz",
    "off_lpp_pdpm",
    "def_lpp_pdpm",
    "off_lpp_rz_pdpm",
    "def_lpp_rz_pdpm",
    "down_1",
    "down_2",
    "down_3",
    "down_4",
    "goal_to_go",
    "z_ydstogo",
    "ydstogo_pct",
    "log_ydstogo_pct",
    "to_go_1st",
    "to_go_2nd",
    "to_go_3rd",
    "to_go_4th",
    "log_to_go_1st",
    "log_to_go_2nd",
    "log_to_go_3rd",
    "log_to_go_4th",
    "fp_1st",
    "fp_2nd",
    "fp_3rd",
    "fp_4th",
    "yardline_fgsig_4th",
    "yardline_puntsig_4th",
    "yardline_pct",
    "yardline_pct_sq",
    "log_yardline_pct",
    "fg_sigmoid",
    "punt_sigmoid",
    "goal_to_go_yardline",
    "log_goal_to_go_yardline",
    "yards_to_go_yardline",
    "log_yards_to_go_yardline",
    "yardline_4th",
    "log_yardline_4th",
    "yardline_not_4th",
    "log_yardline_not_4th",
    "inside_2m_warning",
    "garbage_time_win",
    "garbage_time_loss",
];

pub const WEATHER_FEATURES: [&str; 4] = ["rain", "temp_pct", "humidity_pct", "wind_speed_z"];

pub fn off_timeout_features() -> Vec<&'static str> {
    [COMMON_TIMEOUT_FEATURES.as_slice(), ONLY_OFF_TIMEOUT_FEATURES.as_slice()].concat()
}

pub fn def_timeout_features() -> Vec<&'static str> {
    [COMMON_TIMEOUT_FEATURES.as_slice(), ONLY_DEF_TIMEOUT_FEATURES.as_slice()].concat()
}

pub fn all_timeout_features() -> Vec<&'static str> {
    [
        COMMON_TIMEOUT_FEATURES.as_slice(),
        ONLY_OFF_TIMEOUT_FEATURES.as_slice(),
        ONLY_DEF_TIMEOUT_FEATURES.as_slice(),
    ]
    .concat()
}

/// Per-play components in schema order.
pub struct RowSources<'a> {
    pub sequenced: &'a SequencedPlay,
    pub game_state: &'a GameStateFeatures,
    pub tendencies: &'a TendencyInputs,
    pub situational: &'a SituationalFeatures,
    pub weather: &'a WeatherFeatures,
}

impl RowSources<'_> {
    fn visit_all(&self, visit: &mut dyn FnMut(&str, f64)) {
        self.sequenced.visit_columns(visit);
        self.game_state.visit_columns(visit);
        self.tendencies.visit_columns(visit);
        self.situational.visit_columns(visit);
        self.weather.visit_columns(visit);
    }

    pub fn values(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(FEATURE_SCHEMA.len());
        self.visit_all(&mut |_, v| out.push(v));
        out
    }
}

/// Every derived column name, in row order.
pub static FEATURE_SCHEMA: Lazy<Vec<String>> = Lazy::new(|| {
    let sequenced = SequencedPlay {
        transition: ClockTransition::Stops,
        clock_running: false,
        clock_paused_before: false,
        same_drive: false,
        next_game_seconds_remaining: None,
        next_half_seconds_remaining: None,
        next_quarter_seconds_remaining: None,
    };
    let sources = RowSources {
        sequenced: &sequenced,
        game_state: &GameStateFeatures::default(),
        tendencies: &TendencyInputs::default(),
        situational: &SituationalFeatures::default(),
        weather: &WeatherFeatures::missing(),
    };
    let mut names = Vec::new();
    sources.visit_all(&mut |name, _| names.push(name.to_string()));
    names
});

static SCHEMA_INDEX: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    FEATURE_SCHEMA
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), idx))
        .collect()
});

pub fn column_index(name: &str) -> Result<usize, FeatureError> {
    SCHEMA_INDEX
        .get(name)
        .copied()
        .ok_or_else(|| FeatureError::UnknownFeature {
            name: name.to_string(),
        })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub game_id: String,
    pub play_id: i64,
    pub season: i32,
    pub values: Vec<f64>,
}

/// Row-per-play table sharing [`FEATURE_SCHEMA`]. Rows keep input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn from_rows(rows: Vec<FeatureRow>) -> Self {
        Self { rows }
    }

    pub fn schema(&self) -> &'static [String] {
        FEATURE_SCHEMA.as_slice()
    }

    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, game_id: &str, play_id: i64) -> Option<&FeatureRow> {
        self.rows
            .iter()
            .find(|r| r.play_id == play_id && r.game_id == game_id)
    }

    pub fn value(&self, row: &FeatureRow, name: &str) -> Result<f64, FeatureError> {
        Ok(row.values[column_index(name)?])
    }

    pub fn column(&self, name: &str) -> Result<Vec<f64>, FeatureError> {
        let idx = column_index(name)?;
        Ok(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Projects the table onto `names`, one inner vector per row.
    pub fn select(&self, names: &[&str]) -> Result<Vec<Vec<f64>>, FeatureError> {
        let indices = names
            .iter()
            .map(|name| column_index(name))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(self
            .rows
            .iter()
            .map(|r| indices.iter().map(|&i| r.values[i]).collect())
            .collect())
    }

    /// SHA-256 over row keys and the exact bit patterns of every value.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        for name in self.schema() {
            hasher.update(name.as_bytes());
            hasher.update([0u8]);
        }
        for row in &self.rows {
            hasher.update(row.game_id.as_bytes());
            hasher.update([0u8]);
            hasher.update(row.play_id.to_le_bytes());
            for v in &row.values {
                hasher.update(v.to_bits().to_le_bytes());
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_has_unique_names() {
        let mut names: Vec<&str> = FEATURE_SCHEMA.iter().map(String::as_str).collect();
        let n = names.len();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), n);
    }

    #[test]
    fn named_lists_are_in_schema() {
        for name in all_timeout_features()
            .into_iter()
            .chain(STATE_FEATURES)
            .chain(WEATHER_FEATURES)
        {
            assert!(column_index(name).is_ok(), "{name} missing from schema");
        }
    }

    #[test]
    fn select_rejects_unknown_names() {
        let table = FeatureTable::default();
        assert!(matches!(
            table.select(&["possession_diff", "nope"]),
            Err(FeatureError::UnknownFeature { name }) if name == "nope"
        ));
    }

    #[test]
    fn digest_is_stable_and_sensitive() {
        let width = FEATURE_SCHEMA.len();
        let row = FeatureRow {
            game_id: "2023_01_KC_DET".to_string(),
            play_id: 1,
            season: 2023,
            values: vec![0.0; width],
        };
        let a = FeatureTable::from_rows(vec![row.clone()]);
        let mut changed = row;
        changed.values[0] = 1.0;
        let b = FeatureTable::from_rows(vec![changed]);
        assert_eq!(a.digest(), a.clone().digest());
        assert_ne!(a.digest(), b.digest());
    }
}
