//! Folds team tendencies into log pass-probability covariates and crosses them
//! with red-zone status and the per-minute possession differential.

use crate::features::FeatureSource;
use crate::game_state::EPSILON;

/// League-wide base rate of pass calls.
pub const PROB_PASS: f64 = 0.61;

/// Team tendencies joined onto a play. Absent keys arrive as NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TendencyInputs {
    pub offense_proe: f64,
    pub defense_proe: f64,
    pub offense_rz_proe: f64,
    pub defense_rz_proe: f64,
    pub offense_penalty_z: f64,
    pub defense_penalty_z: f64,
}

impl Default for TendencyInputs {
    fn default() -> Self {
        Self {
            offense_proe: f64::NAN,
            defense_proe: f64::NAN,
            offense_rz_proe: f64::NAN,
            defense_rz_proe: f64::NAN,
            offense_penalty_z: f64::NAN,
            defense_penalty_z: f64::NAN,
        }
    }
}

impl FeatureSource for TendencyInputs {
    fn visit_columns(&self, visit: &mut dyn FnMut(&str, f64)) {
        visit("offense_proe", self.offense_proe);
        visit("defense_proe", self.defense_proe);
        visit("offense_rz_proe", self.offense_rz_proe);
        visit("defense_rz_proe", self.defense_rz_proe);
        visit("offense_penalty_z", self.offense_penalty_z);
        visit("defense_penalty_z", self.defense_penalty_z);
    }
}

/// `ln(PROB_PASS + proe)`, floored so a pathological tendency cannot reach ln(0).
pub fn log_pass_prob(proe: f64) -> f64 {
    let p = PROB_PASS + proe;
    if p.is_nan() {
        return p;
    }
    p.max(EPSILON).ln()
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SituationalFeatures {
    pub offense_log_pass_prob: f64,
    pub defense_log_pass_prob: f64,
    pub off_def_lpp: f64,
    pub off_lpp_rz: f64,
    pub def_lpp_rz: f64,
    pub off_def_lpp_rz: f64,
    pub in_rz: f64,
    pub off_lpp_outside_rz: f64,
    pub off_lpp_inside_rz: f64,
    pub def_lpp_outside_rz: f64,
    pub def_lpp_inside_rz: f64,
    pub off_lpp_pdpm: f64,
    pub def_lpp_pdpm: f64,
    pub off_lpp_rz_pdpm: f64,
    pub def_lpp_rz_pdpm: f64,
}

impl SituationalFeatures {
    /// `in_red_zone` is `None` when field position is unknown, which counts as
    /// outside the red zone.
    pub fn build(
        tendencies: &TendencyInputs,
        in_red_zone: Option<bool>,
        possdiff_per_minute: f64,
    ) -> Self {
        let offense_log_pass_prob = log_pass_prob(tendencies.offense_proe);
        let defense_log_pass_prob = log_pass_prob(tendencies.defense_proe);
        let off_lpp_rz = log_pass_prob(tendencies.offense_rz_proe);
        let def_lpp_rz = log_pass_prob(tendencies.defense_rz_proe);
        let in_rz = if in_red_zone.unwrap_or(false) { 1.0 } else { 0.0 };

        Self {
            offense_log_pass_prob,
            defense_log_pass_prob,
            off_def_lpp: offense_log_pass_prob * defense_log_pass_prob,
            off_lpp_rz,
            def_lpp_rz,
            off_def_lpp_rz: off_lpp_rz * def_lpp_rz,
            in_rz,
            off_lpp_outside_rz: offense_log_pass_prob * (1.0 - in_rz),
            off_lpp_inside_rz: off_lpp_rz * in_rz,
            def_lpp_outside_rz: defense_log_pass_prob * (1.0 - in_rz),
            def_lpp_inside_rz: def_lpp_rz * in_rz,
            off_lpp_pdpm: offense_log_pass_prob * possdiff_per_minute,
            def_lpp_pdpm: defense_log_pass_prob * possdiff_per_minute,
            off_lpp_rz_pdpm: off_lpp_rz * possdiff_per_minute,
            def_lpp_rz_pdpm: def_lpp_rz * possdiff_per_minute,
        }
    }
}

impl FeatureSource for SituationalFeatures {
    fn visit_columns(&self, visit: &mut dyn FnMut(&str, f64)) {
        visit("offense_log_pass_prob", self.offense_log_pass_prob);
        visit("defense_log_pass_prob", self.defense_log_pass_prob);
        visit("off_def_lpp", self.off_def_lpp);
        visit("off_lpp_rz", self.off_lpp_rz);
        visit("def_lpp_rz", self.def_lpp_rz);
        visit("off_def_lpp_rz", self.off_def_lpp_rz);
        visit("in_rz", self.in_rz);
        visit("off_lpp_outside_rz", self.off_lpp_outside_rz);
        visit("off_lpp_inside_rz", self.off_lpp_inside_rz);
        visit("def_lpp_outside_rz", self.def_lpp_outside_rz);
        visit("def_lpp_inside_rz", self.def_lpp_inside_rz);
        visit("off_lpp_pdpm", self.off_lpp_pdpm);
        visit("def_lpp_pdpm", self.def_lpp_pdpm);
        visit("off_lpp_rz_pdpm", self.off_lpp_rz_pdpm);
        visit("def_lpp_rz_pdpm", self.def_lpp_rz_pdpm);
    }
}
