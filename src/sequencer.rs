//! Threads clock transitions through each game in chronological order.
//!
//! Ordering is a checked precondition: [`split_games`] refuses a play log whose
//! games are interleaved or whose clock runs backwards inside a period.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::clock::{self, ClockTransition};
use crate::error::FeatureError;
use crate::features::FeatureSource;
use crate::play::PlayRecord;

/// First quarter number that counts as overtime.
const FIRST_OVERTIME_QTR: u8 = 5;

/// Clock state carried from one play to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClockState {
    pub running: bool,
    pub paused: bool,
}

impl ClockState {
    fn after(transition: ClockTransition) -> Self {
        Self {
            running: transition.runs_after() || transition.pauses_after(),
            paused: transition.pauses_after(),
        }
    }
}

/// Per-play output of the fold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SequencedPlay {
    pub transition: ClockTransition,
    /// Clock was running (or only paused) when this play was snapped.
    pub clock_running: bool,
    pub clock_paused_before: bool,
    pub same_drive: bool,
    pub next_game_seconds_remaining: Option<f64>,
    pub next_half_seconds_remaining: Option<f64>,
    pub next_quarter_seconds_remaining: Option<f64>,
}

fn flag(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

impl FeatureSource for SequencedPlay {
    fn visit_columns(&self, visit: &mut dyn FnMut(&str, f64)) {
        let (stops, pauses, runs) = self.transition.indicators();
        visit("clock_stops_after", stops);
        visit("clock_pauses_after", pauses);
        visit("clock_runs_after", runs);
        visit("clock_running", flag(self.clock_running));
        visit("clock_paused_before", flag(self.clock_paused_before));
        visit("same_drive", flag(self.same_drive));
        visit(
            "next_game_seconds_remaining",
            self.next_game_seconds_remaining.unwrap_or(f64::NAN),
        );
        visit(
            "next_half_seconds_remaining",
            self.next_half_seconds_remaining.unwrap_or(f64::NAN),
        );
        visit(
            "next_quarter_seconds_remaining",
            self.next_quarter_seconds_remaining.unwrap_or(f64::NAN),
        );
    }
}

/// Splits a play log into contiguous per-game slices, validating order.
pub fn split_games(plays: &[PlayRecord]) -> Result<Vec<&[PlayRecord]>, FeatureError> {
    let mut games = Vec::new();
    let mut seen = HashSet::new();
    let mut start = 0usize;

    for idx in 1..=plays.len() {
        let boundary = idx == plays.len() || plays[idx].game_id != plays[start].game_id;
        if !boundary {
            continue;
        }
        let game = &plays[start..idx];
        if !seen.insert(game[0].game_id.as_str()) {
            return Err(FeatureError::UnsortedSequence {
                game_id: game[0].game_id.clone(),
                play_id: game[0].play_id,
                detail: "game appears in more than one block".to_string(),
            });
        }
        validate_game_order(game)?;
        games.push(game);
        start = idx;
    }

    Ok(games)
}

/// Checks that remaining time never increases within a game except when a new
/// overtime period starts.
pub fn validate_game_order(game: &[PlayRecord]) -> Result<(), FeatureError> {
    for pair in game.windows(2) {
        let (prev, next) = (&pair[0], &pair[1]);
        let fail = |detail: String| FeatureError::UnsortedSequence {
            game_id: next.game_id.clone(),
            play_id: next.play_id,
            detail,
        };

        if next.qtr < prev.qtr {
            return Err(fail(format!(
                "quarter went from {} back to {}",
                prev.qtr, next.qtr
            )));
        }
        let new_overtime = next.qtr > prev.qtr && next.qtr >= FIRST_OVERTIME_QTR;
        if new_overtime {
            continue;
        }
        if next.game_seconds_remaining > prev.game_seconds_remaining {
            return Err(fail(format!(
                "game_seconds_remaining rose from {} to {}",
                prev.game_seconds_remaining, next.game_seconds_remaining
            )));
        }
    }
    Ok(())
}

/// Runs the clock state machine over one game's plays, carrying the previous
/// play's clock state forward. The first play starts with the clock stopped.
pub fn sequence_game(game: &[PlayRecord]) -> Vec<SequencedPlay> {
    let mut out = Vec::with_capacity(game.len());
    let mut state = ClockState::default();
    let mut prev_drive: Option<i64> = None;

    for (idx, play) in game.iter().enumerate() {
        let transition = clock::classify_play(play);
        let next = game.get(idx + 1);
        let same_drive = matches!((prev_drive, play.drive), (Some(a), Some(b)) if a == b);

        out.push(SequencedPlay {
            transition,
            clock_running: state.running,
            clock_paused_before: state.paused,
            same_drive,
            next_game_seconds_remaining: next.map(|p| p.game_seconds_remaining),
            next_half_seconds_remaining: next.map(|p| p.half_seconds_remaining),
            next_quarter_seconds_remaining: next.map(|p| p.quarter_seconds_remaining),
        });

        state = ClockState::after(transition);
        prev_drive = play.drive;
    }

    out
}

/// Sorts a play log by game and then chronologically within each game.
pub fn sort_chronologically(plays: &mut [PlayRecord]) {
    plays.sort_by(|a, b| {
        a.game_id
            .cmp(&b.game_id)
            .then(a.qtr.cmp(&b.qtr))
            .then(
                b.game_seconds_remaining
                    .partial_cmp(&a.game_seconds_remaining)
                    .unwrap_or(Ordering::Equal),
            )
            .then(a.play_id.cmp(&b.play_id))
    });
}
