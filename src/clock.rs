use serde::{Deserialize, Serialize};

use crate::play::{PlayRecord, PlayType};

/// Inside five minutes of the game an out-of-bounds play stops the clock.
pub const GAME_HURRY_UP_SECS: f64 = 5.0 * 60.0;
/// Inside two minutes of a half an out-of-bounds play stops the clock.
pub const HALF_HURRY_UP_SECS: f64 = 2.0 * 60.0;

/// What the game clock does once a play is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClockTransition {
    /// Needs an explicit restart (incompletion, score, penalty, change of possession).
    Stops,
    /// Briefly halted, restarts on the ready-for-play signal.
    Pauses,
    /// Keeps ticking into the next snap.
    Runs,
}

impl ClockTransition {
    pub fn stops_after(self) -> bool {
        self == Self::Stops
    }

    pub fn pauses_after(self) -> bool {
        self == Self::Pauses
    }

    pub fn runs_after(self) -> bool {
        self == Self::Runs
    }

    /// `(stops_after, pauses_after, runs_after)` as 0/1 indicators.
    pub fn indicators(self) -> (f64, f64, f64) {
        (
            f64::from(u8::from(self.stops_after())),
            f64::from(u8::from(self.pauses_after())),
            f64::from(u8::from(self.runs_after())),
        )
    }
}

/// The subset of a play the clock rules look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockInputs {
    pub play_type: PlayType,
    pub complete_pass: bool,
    pub penalty: bool,
    pub fumble_lost: bool,
    pub qb_spike: bool,
    pub touchdown: bool,
    pub out_of_bounds: bool,
    pub game_seconds_remaining: f64,
    pub half_seconds_remaining: f64,
}

impl From<&PlayRecord> for ClockInputs {
    fn from(play: &PlayRecord) -> Self {
        Self {
            play_type: play.play_type,
            complete_pass: play.complete_pass,
            penalty: play.penalty,
            fumble_lost: play.fumble_lost,
            qb_spike: play.qb_spike,
            touchdown: play.touchdown,
            out_of_bounds: play.out_of_bounds,
            game_seconds_remaining: play.game_seconds_remaining,
            half_seconds_remaining: play.half_seconds_remaining,
        }
    }
}

impl ClockInputs {
    fn in_hurry_up(&self) -> bool {
        self.game_seconds_remaining < GAME_HURRY_UP_SECS
            || self.half_seconds_remaining < HALF_HURRY_UP_SECS
    }

    fn always_stops(&self) -> bool {
        !self.play_type.can_clock_run_after()
            || self.penalty
            || self.fumble_lost
            || self.qb_spike
            || self.touchdown
            || (self.play_type == PlayType::Pass && !self.complete_pass)
            || (self.out_of_bounds && self.in_hurry_up())
    }
}

/// Classifies the clock after a single play. Pure; looks at nothing but `inputs`.
pub fn classify(inputs: &ClockInputs) -> ClockTransition {
    if inputs.always_stops() {
        return ClockTransition::Stops;
    }
    let ball_carried = inputs.play_type == PlayType::Run || inputs.complete_pass;
    if inputs.out_of_bounds && ball_carried {
        ClockTransition::Pauses
    } else {
        ClockTransition::Runs
    }
}

pub fn classify_play(play: &PlayRecord) -> ClockTransition {
    classify(&ClockInputs::from(play))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(play_type: PlayType) -> ClockInputs {
        ClockInputs {
            play_type,
            complete_pass: false,
            penalty: false,
            fumble_lost: false,
            qb_spike: false,
            touchdown: false,
            out_of_bounds: false,
            game_seconds_remaining: 1800.0,
            half_seconds_remaining: 1800.0,
        }
    }

    #[test]
    fn kneel_out_of_bounds_keeps_running() {
        let mut i = inputs(PlayType::QbKneel);
        i.out_of_bounds = true;
        assert_eq!(classify(&i), ClockTransition::Runs);
    }

    #[test]
    fn hurry_up_threshold_is_strict() {
        let mut i = inputs(PlayType::Run);
        i.out_of_bounds = true;
        i.game_seconds_remaining = GAME_HURRY_UP_SECS;
        i.half_seconds_remaining = HALF_HURRY_UP_SECS;
        assert_eq!(classify(&i), ClockTransition::Pauses);
        i.half_seconds_remaining = HALF_HURRY_UP_SECS - 1.0;
        assert_eq!(classify(&i), ClockTransition::Stops);
    }

    #[test]
    fn indicators_are_one_hot() {
        for t in [
            ClockTransition::Stops,
            ClockTransition::Pauses,
            ClockTransition::Runs,
        ] {
            let (s, p, r) = t.indicators();
            assert_eq!(s + p + r, 1.0);
        }
    }
}
