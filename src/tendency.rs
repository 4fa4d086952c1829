//! Per-team, per-season tendency aggregates built from the full play log.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::FeatureWarning;
use crate::interactions::TendencyInputs;
use crate::play::PlayRecord;

const RED_ZONE_YARDLINE: f64 = 20.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSeasonEntry {
    pub team: String,
    pub season: i32,
    pub value: f64,
}

#[derive(Serialize, Deserialize)]
struct TableRepr {
    statistic: String,
    entries: Vec<TeamSeasonEntry>,
}

/// Immutable lookup of one statistic keyed by (team, season).
///
/// Absent keys read as NaN; callers drop or impute before model use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "TableRepr", into = "TableRepr")]
pub struct TeamSeasonTable {
    statistic: String,
    values: BTreeMap<(String, i32), f64>,
}

impl From<TableRepr> for TeamSeasonTable {
    fn from(repr: TableRepr) -> Self {
        Self::from_entries(&repr.statistic, repr.entries)
    }
}

impl From<TeamSeasonTable> for TableRepr {
    fn from(table: TeamSeasonTable) -> Self {
        let entries = table.entries().collect();
        Self {
            statistic: table.statistic,
            entries,
        }
    }
}

impl TeamSeasonTable {
    pub fn from_entries(statistic: &str, entries: impl IntoIterator<Item = TeamSeasonEntry>) -> Self {
        let values = entries
            .into_iter()
            .map(|e| ((e.team, e.season), e.value))
            .collect();
        Self {
            statistic: statistic.to_string(),
            values,
        }
    }

    pub fn statistic(&self) -> &str {
        &self.statistic
    }

    pub fn get(&self, team: &str, season: i32) -> Option<f64> {
        self.values.get(&(team.to_string(), season)).copied()
    }

    /// Left-join semantics: any missing piece yields NaN.
    pub fn lookup(&self, team: Option<&str>, season: i32) -> f64 {
        team.and_then(|t| self.get(t, season)).unwrap_or(f64::NAN)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = TeamSeasonEntry> + '_ {
        self.values
            .iter()
            .map(|((team, season), value)| TeamSeasonEntry {
                team: team.clone(),
                season: *season,
                value: *value,
            })
    }

    pub fn seasons(&self) -> Vec<i32> {
        let mut out: Vec<i32> = self.values.keys().map(|(_, s)| *s).collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

#[derive(Debug, Clone, Default)]
struct MeanAccumulator {
    groups: BTreeMap<(String, i32), (f64, usize)>,
}

impl MeanAccumulator {
    fn push(&mut self, team: &str, season: i32, value: f64) {
        let slot = self
            .groups
            .entry((team.to_string(), season))
            .or_insert((0.0, 0));
        slot.0 += value;
        slot.1 += 1;
    }

    fn into_table(self, statistic: &str) -> TeamSeasonTable {
        let values = self
            .groups
            .into_iter()
            .filter(|(_, (_, n))| *n > 0)
            .map(|(key, (sum, n))| (key, sum / n as f64))
            .collect();
        TeamSeasonTable {
            statistic: statistic.to_string(),
            values,
        }
    }
}

/// The four PROE tables and two penalty-discipline tables for a batch of seasons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamTendencies {
    pub offense_proe: TeamSeasonTable,
    pub defense_proe: TeamSeasonTable,
    pub offense_rz_proe: TeamSeasonTable,
    pub defense_rz_proe: TeamSeasonTable,
    pub offense_penalty_z: TeamSeasonTable,
    pub defense_penalty_z: TeamSeasonTable,
}

impl TeamTendencies {
    pub fn inputs_for(&self, play: &PlayRecord) -> TendencyInputs {
        let off = play.posteam.as_deref();
        let def = play.defteam.as_deref();
        let season = play.season;
        TendencyInputs {
            offense_proe: self.offense_proe.lookup(off, season),
            defense_proe: self.defense_proe.lookup(def, season),
            offense_rz_proe: self.offense_rz_proe.lookup(off, season),
            defense_rz_proe: self.defense_rz_proe.lookup(def, season),
            offense_penalty_z: self.offense_penalty_z.lookup(off, season),
            defense_penalty_z: self.defense_penalty_z.lookup(def, season),
        }
    }

    pub fn tables(&self) -> [&TeamSeasonTable; 6] {
        [
            &self.offense_proe,
            &self.defense_proe,
            &self.offense_rz_proe,
            &self.defense_rz_proe,
            &self.offense_penalty_z,
            &self.defense_penalty_z,
        ]
    }
}

/// Mean pass rate over expectation per team-season, split by side and by
/// red zone. `pass_oe` arrives in percentage points and is scaled to a rate.
pub fn compute_proe_tables(plays: &[PlayRecord]) -> [TeamSeasonTable; 4] {
    let mut offense = MeanAccumulator::default();
    let mut defense = MeanAccumulator::default();
    let mut offense_rz = MeanAccumulator::default();
    let mut defense_rz = MeanAccumulator::default();

    for play in plays {
        let (Some(posteam), Some(defteam), Some(pass_oe), Some(yardline)) = (
            play.posteam.as_deref(),
            play.defteam.as_deref(),
            play.pass_oe,
            play.yardline_100,
        ) else {
            continue;
        };
        if pass_oe.is_nan() || yardline.is_nan() {
            continue;
        }
        let rate = pass_oe / 100.0;
        if yardline <= RED_ZONE_YARDLINE {
            offense_rz.push(posteam, play.season, rate);
            defense_rz.push(defteam, play.season, rate);
        } else {
            offense.push(posteam, play.season, rate);
            defense.push(defteam, play.season, rate);
        }
    }

    [
        offense.into_table("offense_proe"),
        defense.into_table("defense_proe"),
        offense_rz.into_table("offense_rz_proe"),
        defense_rz.into_table("defense_rz_proe"),
    ]
}

/// Penalty-avoidance z-scores per team-season, standardized within each
/// season and negated so that higher means fewer penalties.
pub fn compute_penalty_z_tables(
    plays: &[PlayRecord],
    warnings: &mut Vec<FeatureWarning>,
) -> [TeamSeasonTable; 2] {
    let mut offense = MeanAccumulator::default();
    let mut defense = MeanAccumulator::default();

    for play in plays {
        if !play.play_call().is_non_defensive_timeout() {
            continue;
        }
        let penalty_team = play.penalty_team.as_deref();
        if let Some(posteam) = play.posteam.as_deref() {
            let flagged = penalty_team == Some(posteam);
            offense.push(posteam, play.season, if flagged { 1.0 } else { 0.0 });
        }
        if let Some(defteam) = play.defteam.as_deref() {
            let flagged = penalty_team == Some(defteam);
            defense.push(defteam, play.season, if flagged { 1.0 } else { 0.0 });
        }
    }

    [
        standardize_negated(offense.into_table("offense_penalty_z"), warnings),
        standardize_negated(defense.into_table("defense_penalty_z"), warnings),
    ]
}

fn standardize_negated(rates: TeamSeasonTable, warnings: &mut Vec<FeatureWarning>) -> TeamSeasonTable {
    let mut by_season: BTreeMap<i32, Vec<(&String, f64)>> = BTreeMap::new();
    for ((team, season), rate) in &rates.values {
        by_season.entry(*season).or_default().push((team, *rate));
    }

    let mut values = BTreeMap::new();
    for (season, group) in by_season {
        let n = group.len();
        let mean = group.iter().map(|(_, r)| r).sum::<f64>() / n as f64;
        let std = sample_std(group.iter().map(|(_, r)| *r), mean, n);

        let degenerate = !(std.is_finite() && std > 0.0);
        if degenerate {
            warn!(
                statistic = rates.statistic.as_str(),
                season, groups = n, "penalty rate has no spread; z-scores set to 0"
            );
            warnings.push(FeatureWarning::DegenerateAggregate {
                statistic: rates.statistic.clone(),
                season,
                groups: n,
            });
        }

        for (team, rate) in group {
            let z = if degenerate { 0.0 } else { -(rate - mean) / std };
            values.insert((team.clone(), season), z);
        }
    }

    TeamSeasonTable {
        statistic: rates.statistic.clone(),
        values,
    }
}

/// Sample standard deviation (n - 1 denominator); NaN below two samples.
fn sample_std(values: impl Iterator<Item = f64>, mean: f64, n: usize) -> f64 {
    if n < 2 {
        return f64::NAN;
    }
    let ss: f64 = values.map(|v| (v - mean).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Builds every tendency table from one batch of seasons.
pub fn compute_tendencies(plays: &[PlayRecord]) -> (TeamTendencies, Vec<FeatureWarning>) {
    let mut warnings = Vec::new();
    let [offense_proe, defense_proe, offense_rz_proe, defense_rz_proe] = compute_proe_tables(plays);
    let [offense_penalty_z, defense_penalty_z] = compute_penalty_z_tables(plays, &mut warnings);

    let tendencies = TeamTendencies {
        offense_proe,
        defense_proe,
        offense_rz_proe,
        defense_rz_proe,
        offense_penalty_z,
        defense_penalty_z,
    };
    info!(
        team_seasons = tendencies.offense_proe.len(),
        degenerate = warnings.len(),
        "computed team tendencies"
    );
    (tendencies, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_lookup_is_nan_for_absent_keys() {
        let table = TeamSeasonTable::from_entries(
            "offense_proe",
            [TeamSeasonEntry {
                team: "KC".to_string(),
                season: 2023,
                value: 0.04,
            }],
        );
        assert_eq!(table.get("KC", 2023), Some(0.04));
        assert!(table.lookup(Some("KC"), 2022).is_nan());
        assert!(table.lookup(None, 2023).is_nan());
    }

    #[test]
    fn table_round_trips_through_json() {
        let table = TeamSeasonTable::from_entries(
            "defense_rz_proe",
            [
                TeamSeasonEntry {
                    team: "BUF".to_string(),
                    season: 2022,
                    value: -0.01,
                },
                TeamSeasonEntry {
                    team: "KC".to_string(),
                    season: 2022,
                    value: 0.02,
                },
            ],
        );
        let json = serde_json::to_string(&table).unwrap();
        let back: TeamSeasonTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
        assert_eq!(back.seasons(), vec![2022]);
    }

    #[test]
    fn sample_std_uses_n_minus_one() {
        let values = [1.0, 3.0];
        let std = sample_std(values.into_iter(), 2.0, 2);
        assert!((std - 2f64.sqrt()).abs() < 1e-12);
        assert!(sample_std([1.0].into_iter(), 1.0, 1).is_nan());
    }
}
