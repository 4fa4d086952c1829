use serde::{Deserialize, Serialize};

/// Play types as they appear in the nflverse `play_type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayType {
    Pass,
    Run,
    QbKneel,
    QbSpike,
    Punt,
    FieldGoal,
    Kickoff,
    ExtraPoint,
    NoPlay,
    #[default]
    Other,
}

impl PlayType {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("pass") => Self::Pass,
            Some("run") => Self::Run,
            Some("qb_kneel") => Self::QbKneel,
            Some("qb_spike") => Self::QbSpike,
            Some("punt") => Self::Punt,
            Some("field_goal") => Self::FieldGoal,
            Some("kickoff") => Self::Kickoff,
            Some("extra_point") => Self::ExtraPoint,
            Some("no_play") => Self::NoPlay,
            _ => Self::Other,
        }
    }

    /// Scrimmage plays after which the clock is allowed to keep running.
    pub fn can_clock_run_after(self) -> bool {
        matches!(self, Self::Pass | Self::Run | Self::QbKneel)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Location {
    #[default]
    Home,
    Neutral,
}

impl Location {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("neutral") => Self::Neutral,
            _ => Self::Home,
        }
    }
}

/// One row of the raw play log.
///
/// Nullable numeric columns are `Option`; their absence propagates as NaN into
/// every derived column that depends on them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayRecord {
    pub game_id: String,
    pub play_id: i64,
    pub season: i32,
    pub qtr: u8,
    pub drive: Option<i64>,
    pub posteam: Option<String>,
    pub defteam: Option<String>,
    pub home_team: String,
    pub location: Location,
    pub posteam_score: Option<i32>,
    pub defteam_score: Option<i32>,
    pub down: Option<u8>,
    pub ydstogo: Option<f64>,
    pub yardline_100: Option<f64>,
    pub goal_to_go: bool,
    pub quarter_seconds_remaining: f64,
    pub half_seconds_remaining: f64,
    pub game_seconds_remaining: f64,
    pub play_type: PlayType,
    pub complete_pass: bool,
    pub penalty: bool,
    pub fumble_lost: bool,
    pub qb_spike: bool,
    pub touchdown: bool,
    pub out_of_bounds: bool,
    pub qb_scramble: bool,
    pub posteam_timeouts_remaining: Option<u8>,
    pub defteam_timeouts_remaining: Option<u8>,
    /// Pass rate over expectation, in percentage points.
    pub pass_oe: Option<f64>,
    pub penalty_team: Option<String>,
    pub timeout: bool,
    pub timeout_team: Option<String>,
    pub weather: Option<String>,
    pub roof: Option<String>,
}

impl PlayRecord {
    pub fn is_offense_home(&self) -> f64 {
        if self.location == Location::Neutral {
            return 0.5;
        }
        match self.posteam.as_deref() {
            Some(team) if team == self.home_team => 1.0,
            _ => 0.0,
        }
    }

    pub fn in_red_zone(&self) -> Option<bool> {
        self.yardline_100.map(|y| y <= 20.0)
    }

    pub fn play_call(&self) -> PlayCall {
        PlayCall::classify(self)
    }
}

/// Classified play call, the decision the offense (or a timeout) made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayCall {
    Punt,
    PenaltyOffense,
    PenaltyDefense,
    FgAttempt,
    QbKneel,
    QbSpike,
    DesignedRun,
    Dropback,
    OffensiveTimeout,
    DefensiveTimeout,
    Kickoff,
    ExtraPoint,
    Other,
}

/// Play calls that count toward the penalty-discipline aggregate.
pub const NON_DEFENSIVE_TIMEOUTS: [PlayCall; 8] = [
    PlayCall::Punt,
    PlayCall::PenaltyOffense,
    PlayCall::PenaltyDefense,
    PlayCall::FgAttempt,
    PlayCall::QbKneel,
    PlayCall::QbSpike,
    PlayCall::DesignedRun,
    PlayCall::Dropback,
];

impl PlayCall {
    pub fn classify(play: &PlayRecord) -> Self {
        let posteam = play.posteam.as_deref();
        let defteam = play.defteam.as_deref();

        if play.timeout {
            let team = play.timeout_team.as_deref();
            if team.is_some() && team == defteam {
                return Self::DefensiveTimeout;
            }
            if team.is_some() && team == posteam {
                return Self::OffensiveTimeout;
            }
        }

        if play.qb_spike {
            return Self::QbSpike;
        }

        match play.play_type {
            PlayType::Punt => Self::Punt,
            PlayType::FieldGoal => Self::FgAttempt,
            PlayType::QbKneel => Self::QbKneel,
            PlayType::QbSpike => Self::QbSpike,
            PlayType::Pass => Self::Dropback,
            PlayType::Run if play.qb_scramble => Self::Dropback,
            PlayType::Run => Self::DesignedRun,
            PlayType::Kickoff => Self::Kickoff,
            PlayType::ExtraPoint => Self::ExtraPoint,
            PlayType::NoPlay if play.penalty => {
                let team = play.penalty_team.as_deref();
                if team.is_some() && team == posteam {
                    Self::PenaltyOffense
                } else if team.is_some() && team == defteam {
                    Self::PenaltyDefense
                } else {
                    Self::Other
                }
            }
            PlayType::NoPlay | PlayType::Other => Self::Other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Punt => "PUNT",
            Self::PenaltyOffense => "PENALTY_OFFENSE",
            Self::PenaltyDefense => "PENALTY_DEFENSE",
            Self::FgAttempt => "FG_ATTEMPT",
            Self::QbKneel => "QB_KNEEL",
            Self::QbSpike => "QB_SPIKE",
            Self::DesignedRun => "DESIGNED_RUN",
            Self::Dropback => "DROPBACK",
            Self::OffensiveTimeout => "OFFENSIVE_TIMEOUT",
            Self::DefensiveTimeout => "DEFENSIVE_TIMEOUT",
            Self::Kickoff => "KICKOFF",
            Self::ExtraPoint => "EXTRA_POINT",
            Self::Other => "OTHER",
        }
    }

    pub fn is_non_defensive_timeout(self) -> bool {
        NON_DEFENSIVE_TIMEOUTS.contains(&self)
    }
}
