//! Score, time and field-position covariates derived from a single play plus
//! its sequenced clock state.

use once_cell::sync::Lazy;

use crate::error::FeatureWarning;
use crate::features::FeatureSource;
use crate::play::PlayRecord;
use crate::sequencer::SequencedPlay;

/// Additive floor applied before taking the log of a probability.
pub const EPSILON: f64 = 1e-6;
/// Cap on reciprocal minutes, i.e. a ten second floor on the denominator.
pub const MAX_INV_MINUTES: f64 = 6.0;
/// Points in one touchdown plus two-point conversion.
const POINTS_PER_POSSESSION: i32 = 8;
/// Distance from the line of scrimmage to the goal posts, plus holder depth.
const FG_SNAP_DISTANCE: f64 = 17.0;
const GARBAGE_TIME_MINUTES: f64 = 5.0;
const GARBAGE_TIME_POSSESSIONS: f64 = 3.0;
const TWO_MINUTE_WARNING_SECS: f64 = 120.0;

/// Score gap in scoring possessions, as if the offense had `n` more points.
pub fn possession_diff_plus(offense_score: i32, defense_score: i32, n: i32) -> i32 {
    let diff = offense_score + n - defense_score;
    if diff == 0 {
        return 0;
    }
    diff / POINTS_PER_POSSESSION + diff.signum()
}

pub fn possession_diff(offense_score: i32, defense_score: i32) -> i32 {
    possession_diff_plus(offense_score, defense_score, 0)
}

/// Possession differential if the offense kicked a field goal right now.
pub fn fg_possession_diff(offense_score: i32, defense_score: i32) -> i32 {
    possession_diff_plus(offense_score, defense_score, 3)
}

pub fn minutes_left(seconds_remaining: f64) -> f64 {
    (seconds_remaining + 1.0) / 60.0
}

pub fn inverse_minutes(minutes_left: f64) -> f64 {
    if minutes_left <= 0.0 {
        return MAX_INV_MINUTES;
    }
    (1.0 / minutes_left).min(MAX_INV_MINUTES)
}

/// Make probability by kick distance band. NaN in, NaN out.
pub fn fg_make_prob(yardline_100: f64) -> f64 {
    if yardline_100.is_nan() {
        return f64::NAN;
    }
    let distance = yardline_100 + FG_SNAP_DISTANCE;
    if distance < 35.0 {
        1.0
    } else if distance < 40.0 {
        0.9
    } else if distance < 45.0 {
        0.8
    } else if distance < 50.0 {
        0.7
    } else if distance < 55.0 {
        0.6
    } else if distance < 60.0 {
        0.45
    } else if distance < 65.0 {
        0.3
    } else if distance < 70.0 {
        0.1
    } else {
        0.0
    }
}

/// Relative value of punting from a field position. NaN in, NaN out.
pub fn punt_value(yardline_100: f64) -> f64 {
    if yardline_100.is_nan() {
        f64::NAN
    } else if yardline_100 < 40.0 {
        0.0
    } else if yardline_100 < 50.0 {
        0.2
    } else if yardline_100 < 55.0 {
        0.4
    } else if yardline_100 < 60.0 {
        0.6
    } else if yardline_100 < 65.0 {
        0.8
    } else {
        1.0
    }
}

/// `(garbage_time_win, garbage_time_loss)` for the offense.
pub fn garbage_time(game_minutes_left: f64, inv_game_minutes: f64, possession_diff: f64) -> (f64, f64) {
    if game_minutes_left >= GARBAGE_TIME_MINUTES {
        return (0.0, 0.0);
    }
    let weight = inv_game_minutes.clamp(1.0, 3.0);
    let win = if possession_diff >= GARBAGE_TIME_POSSESSIONS {
        weight
    } else {
        0.0
    };
    let loss = if possession_diff <= -GARBAGE_TIME_POSSESSIONS {
        weight
    } else {
        0.0
    };
    (win, loss)
}

/// Clamps while letting NaN through, like a dataframe `clip`.
fn clip(v: f64, lo: f64, hi: f64) -> f64 {
    if v.is_nan() { v } else { v.clamp(lo, hi) }
}

fn indicator(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Offense,
    Defense,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Offense, Side::Defense];

    pub fn prefix(self) -> &'static str {
        match self {
            Side::Offense => "off",
            Side::Defense => "def",
        }
    }

    fn index(self) -> usize {
        match self {
            Side::Offense => 0,
            Side::Defense => 1,
        }
    }
}

pub const MAX_TIMEOUTS: u8 = 3;
const TIMEOUT_SLOTS: usize = MAX_TIMEOUTS as usize + 1;

/// Column names for every (side, timeout count) pair:
/// `(one_hot_name, clock_runs_pdpm_name)`.
static TIMEOUT_COLUMNS: Lazy<[[(String, String); TIMEOUT_SLOTS]; 2]> = Lazy::new(|| {
    Side::ALL.map(|side| {
        std::array::from_fn(|count| {
            (
                format!("{}_timeouts_remaining_{count}", side.prefix()),
                format!("clock_runs_pdpm_{}{count}to", side.prefix()),
            )
        })
    })
});

pub fn timeout_indicator_column(side: Side, count: u8) -> &'static str {
    &TIMEOUT_COLUMNS[side.index()][usize::from(count.min(MAX_TIMEOUTS))].0
}

pub fn timeout_interaction_column(side: Side, count: u8) -> &'static str {
    &TIMEOUT_COLUMNS[side.index()][usize::from(count.min(MAX_TIMEOUTS))].1
}

/// One-hot timeouts remaining and their clock-running interactions, per side.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeoutFeatures {
    remaining: [[f64; TIMEOUT_SLOTS]; 2],
    clock_runs_pdpm: [[f64; TIMEOUT_SLOTS]; 2],
}

impl TimeoutFeatures {
    pub fn new(offense: Option<u8>, defense: Option<u8>, clock_runs_pdpm: f64) -> Self {
        let mut out = Self::default();
        for (side, remaining) in Side::ALL.into_iter().zip([offense, defense]) {
            let Some(remaining) = remaining else {
                continue;
            };
            let slot = usize::from(remaining.min(MAX_TIMEOUTS));
            out.remaining[side.index()][slot] = 1.0;
        }
        for side in Side::ALL {
            for slot in 0..TIMEOUT_SLOTS {
                out.clock_runs_pdpm[side.index()][slot] =
                    clock_runs_pdpm * out.remaining[side.index()][slot];
            }
        }
        out
    }

    pub fn remaining(&self, side: Side, count: u8) -> f64 {
        self.remaining[side.index()][usize::from(count.min(MAX_TIMEOUTS))]
    }

    pub fn clock_runs_pdpm(&self, side: Side, count: u8) -> f64 {
        self.clock_runs_pdpm[side.index()][usize::from(count.min(MAX_TIMEOUTS))]
    }
}

impl FeatureSource for TimeoutFeatures {
    fn visit_columns(&self, visit: &mut dyn FnMut(&str, f64)) {
        for side in Side::ALL {
            for count in 0..=MAX_TIMEOUTS {
                visit(timeout_indicator_column(side, count), self.remaining(side, count));
            }
        }
        for side in Side::ALL {
            for count in 0..=MAX_TIMEOUTS {
                visit(
                    timeout_interaction_column(side, count),
                    self.clock_runs_pdpm(side, count),
                );
            }
        }
    }
}

const TO_GO: [&str; 4] = ["to_go_1st", "to_go_2nd", "to_go_3rd", "to_go_4th"];
const LOG_TO_GO: [&str; 4] = [
    "log_to_go_1st",
    "log_to_go_2nd",
    "log_to_go_3rd",
    "log_to_go_4th",
];
const FP: [&str; 4] = ["fp_1st", "fp_2nd", "fp_3rd", "fp_4th"];
const FP_FGSIG: [&str; 4] = [
    "fp_fgsig_1st",
    "fp_fgsig_2nd",
    "fp_fgsig_3rd",
    "fp_fgsig_4th",
];
const FP_PUNTSIG: [&str; 4] = [
    "fp_puntsig_1st",
    "fp_puntsig_2nd",
    "fp_puntsig_3rd",
    "fp_puntsig_4th",
];
const DOWNS: [&str; 4] = ["down_1", "down_2", "down_3", "down_4"];

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GameStateFeatures {
    pub is_offense_home: f64,
    pub possession_diff: f64,
    pub fg_possession_diff: f64,
    pub game_minutes_left: f64,
    pub half_minutes_left: f64,
    pub inv_half_minutes: f64,
    pub log_inv_half_minutes: f64,
    pub inv_game_minutes: f64,
    pub log_inv_game_minutes: f64,
    pub possdiff_per_minute: f64,
    pub fgpossdiff_per_minute: f64,
    pub pdpm2: f64,
    pub fgpdpm2: f64,
    pub garbage_time_win: f64,
    pub garbage_time_loss: f64,
    pub inside_2m_warning: f64,

    pub down: [f64; 4],
    pub goal_to_go: f64,
    pub z_ydstogo: f64,
    pub ydstogo_pct: f64,
    pub log_ydstogo_pct: f64,
    pub ydstogo_sigmoid: f64,
    pub to_go: [f64; 4],
    pub log_to_go: [f64; 4],
    pub fp: [f64; 4],
    pub fp_fgsig: [f64; 4],
    pub fp_puntsig: [f64; 4],

    pub yardline_pct: f64,
    pub log_yardline_pct: f64,
    pub yardline_pct_sq: f64,
    pub fg_make_prob: f64,
    pub fg_sigmoid: f64,
    pub punt_value: f64,
    pub punt_sigmoid: f64,
    pub yardline_pct_4th: f64,
    pub yardline_fgsig_4th: f64,
    pub yardline_puntsig_4th: f64,
    pub yardline_4th: f64,
    pub log_yardline_4th: f64,
    pub yardline_not_4th: f64,
    pub log_yardline_not_4th: f64,
    pub goal_to_go_yardline: f64,
    pub log_goal_to_go_yardline: f64,
    pub yards_to_go_yardline: f64,
    pub log_yards_to_go_yardline: f64,

    pub clock_running: f64,
    pub clock_runs_pdpm: f64,
    pub clock_runs_fgpdpm: f64,
    pub clock_runs_pdpm2: f64,
    pub clock_runs_fgpdpm2: f64,
    pub timeouts: TimeoutFeatures,
}

/// Clamps a raw input into its documented domain, recording a warning when
/// the value had to move.
struct InputGuard<'a> {
    play: &'a PlayRecord,
    warnings: &'a mut Vec<FeatureWarning>,
}

impl InputGuard<'_> {
    fn clamp(&mut self, column: &str, value: f64, lo: f64, hi: f64) -> f64 {
        if value.is_nan() || (lo..=hi).contains(&value) {
            return value;
        }
        let clamped_to = value.clamp(lo, hi);
        self.warnings.push(FeatureWarning::OutOfRangeInput {
            game_id: self.play.game_id.clone(),
            play_id: self.play.play_id,
            column: column.to_string(),
            value,
            clamped_to,
        });
        clamped_to
    }
}

impl GameStateFeatures {
    pub fn derive(
        play: &PlayRecord,
        seq: &SequencedPlay,
        warnings: &mut Vec<FeatureWarning>,
    ) -> Self {
        let mut guard = InputGuard { play, warnings };

        let game_secs = guard.clamp(
            "game_seconds_remaining",
            play.game_seconds_remaining,
            0.0,
            f64::MAX,
        );
        let half_secs = guard.clamp(
            "half_seconds_remaining",
            play.half_seconds_remaining,
            0.0,
            f64::MAX,
        );
        let ydstogo = guard.clamp(
            "ydstogo",
            play.ydstogo.unwrap_or(f64::NAN),
            0.0,
            100.0,
        );
        let yardline_100 = guard.clamp(
            "yardline_100",
            play.yardline_100.unwrap_or(f64::NAN),
            0.0,
            100.0,
        );
        let off_timeouts = play.posteam_timeouts_remaining.map(|n| {
            guard.clamp(
                "posteam_timeouts_remaining",
                f64::from(n),
                0.0,
                f64::from(MAX_TIMEOUTS),
            ) as u8
        });
        let def_timeouts = play.defteam_timeouts_remaining.map(|n| {
            guard.clamp(
                "defteam_timeouts_remaining",
                f64::from(n),
                0.0,
                f64::from(MAX_TIMEOUTS),
            ) as u8
        });

        let (possession_diff, fg_possession_diff) = match (play.posteam_score, play.defteam_score) {
            (Some(off), Some(def)) => (
                f64::from(possession_diff(off, def)),
                f64::from(fg_possession_diff(off, def)),
            ),
            _ => (f64::NAN, f64::NAN),
        };

        let game_minutes_left = minutes_left(game_secs);
        let half_minutes_left = minutes_left(half_secs);
        let inv_half_minutes = inverse_minutes(half_minutes_left);
        let inv_game_minutes = inverse_minutes(game_minutes_left);

        let possdiff_per_minute = possession_diff * inv_game_minutes;
        let fgpossdiff_per_minute = fg_possession_diff * inv_game_minutes;
        let pdpm2 = possdiff_per_minute * possdiff_per_minute.abs();
        let fgpdpm2 = fgpossdiff_per_minute * fgpossdiff_per_minute.abs();
        let (garbage_time_win, garbage_time_loss) =
            garbage_time(game_minutes_left, inv_game_minutes, possession_diff);

        let mut down = [0.0; 4];
        if let Some(d) = play.down.filter(|d| (1..=4).contains(d)) {
            down[usize::from(d - 1)] = 1.0;
        }
        let down_4 = down[3];

        let ydstogo_pct = ydstogo / 10.0;
        let log_ydstogo_pct = clip(ydstogo_pct, 0.1, f64::INFINITY).ln();
        let ydstogo_sigmoid = (-ydstogo / 10.0).exp();

        let yardline_pct = yardline_100 / 100.0;
        let log_yardline_pct = clip(yardline_pct, 0.01, 1.0).ln();
        let fg_prob = fg_make_prob(yardline_100);
        let punt = punt_value(yardline_100);
        let fg_sigmoid = (EPSILON + fg_prob).ln();
        let punt_sigmoid = (EPSILON + punt).ln();

        let to_go = down.map(|d| d * ydstogo_sigmoid);
        let log_to_go = down.map(|d| d * log_ydstogo_pct);
        let fp = to_go.map(|t| t * ydstogo_pct);
        let fp_fgsig = to_go.map(|t| t * fg_sigmoid);
        let fp_puntsig = to_go.map(|t| t * punt_sigmoid);

        let goal_to_go = indicator(play.goal_to_go);
        let clock_running = indicator(seq.clock_running);
        let clock_runs_pdpm = clock_running * possdiff_per_minute;

        Self {
            is_offense_home: play.is_offense_home(),
            possession_diff,
            fg_possession_diff,
            game_minutes_left,
            half_minutes_left,
            inv_half_minutes,
            log_inv_half_minutes: inv_half_minutes.ln(),
            inv_game_minutes,
            log_inv_game_minutes: inv_game_minutes.ln(),
            possdiff_per_minute,
            fgpossdiff_per_minute,
            pdpm2,
            fgpdpm2,
            garbage_time_win,
            garbage_time_loss,
            inside_2m_warning: indicator(half_secs <= TWO_MINUTE_WARNING_SECS),

            down,
            goal_to_go,
            z_ydstogo: (ydstogo - 10.0) / 5.0,
            ydstogo_pct,
            log_ydstogo_pct,
            ydstogo_sigmoid,
            to_go,
            log_to_go,
            fp,
            fp_fgsig,
            fp_puntsig,

            yardline_pct,
            log_yardline_pct,
            yardline_pct_sq: yardline_pct * yardline_pct,
            fg_make_prob: fg_prob,
            fg_sigmoid,
            punt_value: punt,
            punt_sigmoid,
            yardline_pct_4th: down_4 * yardline_pct,
            yardline_fgsig_4th: down_4 * fg_sigmoid,
            yardline_puntsig_4th: down_4 * punt_sigmoid,
            yardline_4th: down_4 * yardline_pct,
            log_yardline_4th: down_4 * log_yardline_pct,
            yardline_not_4th: (1.0 - down_4) * yardline_pct,
            log_yardline_not_4th: (1.0 - down_4) * log_yardline_pct,
            goal_to_go_yardline: goal_to_go * yardline_pct,
            log_goal_to_go_yardline: goal_to_go * log_yardline_pct,
            yards_to_go_yardline: (1.0 - goal_to_go) * yardline_pct,
            log_yards_to_go_yardline: (1.0 - goal_to_go) * log_yardline_pct,

            clock_running,
            clock_runs_pdpm,
            clock_runs_fgpdpm: clock_running * fgpossdiff_per_minute,
            clock_runs_pdpm2: clock_running * pdpm2,
            clock_runs_fgpdpm2: clock_running * fgpdpm2,
            timeouts: TimeoutFeatures::new(off_timeouts, def_timeouts, clock_runs_pdpm),
        }
    }
}

impl FeatureSource for GameStateFeatures {
    fn visit_columns(&self, visit: &mut dyn FnMut(&str, f64)) {
        visit("is_offense_home", self.is_offense_home);
        visit("possession_diff", self.possession_diff);
        visit("fg_possession_diff", self.fg_possession_diff);
        visit("game_minutes_left", self.game_minutes_left);
        visit("half_minutes_left", self.half_minutes_left);
        visit("inv_half_minutes", self.inv_half_minutes);
        visit("log_inv_half_minutes", self.log_inv_half_minutes);
        visit("inv_game_minutes", self.inv_game_minutes);
        visit("log_inv_game_minutes", self.log_inv_game_minutes);
        visit("possdiff_per_minute", self.possdiff_per_minute);
        visit("fgpossdiff_per_minute", self.fgpossdiff_per_minute);
        visit("pdpm2", self.pdpm2);
        visit("fgpdpm2", self.fgpdpm2);
        visit("garbage_time_win", self.garbage_time_win);
        visit("garbage_time_loss", self.garbage_time_loss);
        visit("inside_2m_warning", self.inside_2m_warning);

        for (name, v) in DOWNS.iter().zip(self.down) {
            visit(*name, v);
        }
        visit("goal_to_go", self.goal_to_go);
        visit("z_ydstogo", self.z_ydstogo);
        visit("ydstogo_pct", self.ydstogo_pct);
        visit("log_ydstogo_pct", self.log_ydstogo_pct);
        visit("ydstogo_sigmoid", self.ydstogo_sigmoid);
        for (names, values) in [
            (&TO_GO, &self.to_go),
            (&LOG_TO_GO, &self.log_to_go),
            (&FP, &self.fp),
            (&FP_FGSIG, &self.fp_fgsig),
            (&FP_PUNTSIG, &self.fp_puntsig),
        ] {
            for (name, v) in names.iter().zip(values) {
                visit(*name, *v);
            }
        }

        visit("yardline_pct", self.yardline_pct);
        visit("log_yardline_pct", self.log_yardline_pct);
        visit("yardline_pct_sq", self.yardline_pct_sq);
        visit("fg_make_prob", self.fg_make_prob);
        visit("fg_sigmoid", self.fg_sigmoid);
        visit("punt_value", self.punt_value);
        visit("punt_sigmoid", self.punt_sigmoid);
        visit("yardline_pct_4th", self.yardline_pct_4th);
        visit("yardline_fgsig_4th", self.yardline_fgsig_4th);
        visit("yardline_puntsig_4th", self.yardline_puntsig_4th);
        visit("yardline_4th", self.yardline_4th);
        visit("log_yardline_4th", self.log_yardline_4th);
        visit("yardline_not_4th", self.yardline_not_4th);
        visit("log_yardline_not_4th", self.log_yardline_not_4th);
        visit("goal_to_go_yardline", self.goal_to_go_yardline);
        visit("log_goal_to_go_yardline", self.log_goal_to_go_yardline);
        visit("yards_to_go_yardline", self.yards_to_go_yardline);
        visit("log_yards_to_go_yardline", self.log_yards_to_go_yardline);

        visit("clock_runs_pdpm", self.clock_runs_pdpm);
        visit("clock_runs_fgpdpm", self.clock_runs_fgpdpm);
        visit("clock_runs_pdpm2", self.clock_runs_pdpm2);
        visit("clock_runs_fgpdpm2", self.clock_runs_fgpdpm2);
        self.timeouts.visit_columns(visit);
    }
}
